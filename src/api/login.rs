//! `/login` and `/logout` Session handling

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use serde::Serialize;

use super::auth::{Caller, CurrentUser};
use crate::{
    AppState,
    error::Error,
    services::session::{self, LoginInformation},
};

#[derive(Serialize)]
struct Response {
    token: String,
}

#[derive(Serialize)]
struct LoggedOut {
    success: &'static str,
}

/// `POST /login` Exchanges credentials for a session token
///
/// requires auth: no
///
/// ### Request Example
/// ```
/// json!({
///     "email": "john@example.com",
///     "password": "hunter22"
/// });
/// ```
///
/// ### Responses
/// 200 `{"token": "9b1f0c6d2a8e4f7b3c5d1e9a0f2b4c6d"}`
///
/// 400 Incorrect Email or Password
///
pub async fn post(
    State(app_state): State<Arc<AppState>>,
    WithRejection(Json(login_information), _): WithRejection<Json<LoginInformation>, Error>,
) -> Result<impl IntoResponse, Error> {
    let token = session::login(
        app_state.store.as_ref(),
        &app_state.argon2,
        login_information,
    )
    .await?;

    Ok((StatusCode::OK, Json(Response { token })))
}

/// `POST /logout` Revokes the token used for this request
///
/// requires auth: yes
pub async fn logout(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser<Caller>>,
) -> Result<impl IntoResponse, Error> {
    session::logout(app_state.store.as_ref(), &caller.token).await?;

    Ok((
        StatusCode::OK,
        Json(LoggedOut {
            success: "Successfully logged out",
        }),
    ))
}
