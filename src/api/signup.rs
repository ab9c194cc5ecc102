//! `/signup` Account registration

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;

use super::Success;
use crate::{
    AppState,
    error::Error,
    services::registration::{self, SignupInformation},
};

/// `POST /signup` Creates a user and its account
///
/// requires auth: no
///
/// ### Request Example
/// ```
/// json!({
///     "first_name": "John",
///     "last_name": "Doe",
///     "email": "john@example.com",
///     "password": "hunter22",
///     "password2": "hunter22"
/// });
/// ```
///
/// ### Responses
/// 201 `{"Success": {"first_name": "John", "last_name": "Doe", "email": "john@example.com"}}`
///
/// 400 Bad Request
///
pub async fn post(
    State(app_state): State<Arc<AppState>>,
    WithRejection(Json(signup_information), _): WithRejection<Json<SignupInformation>, Error>,
) -> Result<impl IntoResponse, Error> {
    let signed_up = registration::register(
        app_state.store.as_ref(),
        &app_state.argon2,
        signup_information,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(Success::new(signed_up))))
}
