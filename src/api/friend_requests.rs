//! `/friendrequests`, `/accept-reject` and `/send-request` Friend request endpoints

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use super::{
    Success,
    auth::{Caller, CurrentUser},
};
use crate::{
    AppState,
    error::Error,
    objects::{Page, PageQuery},
    services::friend_requests,
};

#[derive(Deserialize)]
pub struct FriendRequestId {
    friend_request_id: i64,
}

#[derive(Deserialize)]
pub struct SendRequest {
    user_id: i64,
}

/// `GET /friendrequests` Lists unresolved requests sent to the caller
///
/// requires auth: yes
///
/// ### Response Example
/// ```
/// json!([
///     {
///         "friend_request_id": 7,
///         "first_name": "John",
///         "last_name": "Doe",
///         "email": "john@example.com"
///     }
/// ]);
/// ```
pub async fn get(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser<Caller>>,
    WithRejection(Query(page_query), _): WithRejection<Query<PageQuery>, Error>,
) -> Result<impl IntoResponse, Error> {
    let page = Page::from_query(&page_query)?;

    let pending =
        friend_requests::list_pending(app_state.store.as_ref(), &caller.account, page).await?;

    Ok((StatusCode::OK, Json(pending)))
}

/// `POST /accept-reject` Accepts a friend request
///
/// requires auth: yes
///
/// ### Request Example
/// ```
/// json!({
///     "friend_request_id": 7
/// });
/// ```
///
/// ### Responses
/// 201 Accepted
///
/// 404 No unresolved request with that id is addressed to you
///
pub async fn accept(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser<Caller>>,
    WithRejection(Json(body), _): WithRejection<Json<FriendRequestId>, Error>,
) -> Result<impl IntoResponse, Error> {
    friend_requests::accept(
        app_state.store.as_ref(),
        &caller.account,
        body.friend_request_id,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Success::new("Successfully accepted friend request")),
    ))
}

/// `DELETE /accept-reject?friend_request_id=` Rejects a friend request, deleting it
///
/// requires auth: yes
///
/// ### Responses
/// 204 Rejected
///
/// 404 No unresolved request with that id is addressed to you
///
pub async fn reject(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser<Caller>>,
    WithRejection(Query(query), _): WithRejection<Query<FriendRequestId>, Error>,
) -> Result<impl IntoResponse, Error> {
    friend_requests::reject(
        app_state.store.as_ref(),
        &caller.account,
        query.friend_request_id,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /send-request` Sends a friend request
///
/// requires auth: yes, limited to 3 requests a minute by default
///
/// ### Request Example
/// ```
/// json!({
///     "user_id": 2
/// });
/// ```
///
/// ### Responses
/// 201 Sent
///
/// 400 Yourself, already friends or a request is already pending
///
/// 404 Not Found
///
/// 429 Too Many Requests
///
pub async fn send(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser<Caller>>,
    WithRejection(Json(body), _): WithRejection<Json<SendRequest>, Error>,
) -> Result<impl IntoResponse, Error> {
    friend_requests::send(app_state.store.as_ref(), &caller.account, body.user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(Success::new("Successfully sent friend request")),
    ))
}

/// Counts every send attempt against the caller, whatever its outcome
pub async fn throttle_send(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser<Caller>>,
    req: Request,
    next: Next,
) -> Result<Response, Error> {
    app_state.send_throttle.check(caller.account.id)?;

    Ok(next.run(req).await)
}
