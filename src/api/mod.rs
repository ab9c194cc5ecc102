//! HTTP surface of the service

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use serde::Serialize;

use crate::AppState;

mod auth;
mod friend_requests;
mod friends;
mod login;
mod search;
mod signup;

/// `{"Success": ...}` envelope around successful mutations
#[derive(Serialize)]
struct Success<T> {
    #[serde(rename = "Success")]
    success: T,
}

impl<T: Serialize> Success<T> {
    fn new(success: T) -> Self {
        Self { success }
    }
}

pub fn router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/logout", post(login::logout))
        .route("/search", get(search::get))
        .route("/friendrequests", get(friend_requests::get))
        .route("/list-friends", get(friends::get))
        .route(
            "/accept-reject",
            post(friend_requests::accept).delete(friend_requests::reject),
        )
        .route(
            "/send-request",
            post(friend_requests::send).route_layer(from_fn_with_state(
                app_state.clone(),
                friend_requests::throttle_send,
            )),
        )
        .route_layer(from_fn_with_state(app_state, auth::require_auth));

    Router::new()
        .route("/signup", post(signup::post))
        .route("/login", post(login::post))
        .merge(protected)
}
