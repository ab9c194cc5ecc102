use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use super::auth::{Caller, CurrentUser};
use crate::{
    AppState,
    error::Error,
    objects::{Page, PageQuery},
    services::directory,
};

#[derive(Deserialize)]
pub struct SearchParams {
    search_param: Option<String>,
}

/// `GET /search?search_param=` Finds other users by exact email or partial name
///
/// requires auth: yes
///
/// ### Response Example
/// ```
/// json!([
///     {
///         "user_id": 2,
///         "first_name": "Jane",
///         "last_name": "Doe",
///         "email": "jane@example.com"
///     }
/// ]);
/// ```
pub async fn get(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser<Caller>>,
    WithRejection(Query(params), _): WithRejection<Query<SearchParams>, Error>,
    WithRejection(Query(page_query), _): WithRejection<Query<PageQuery>, Error>,
) -> Result<impl IntoResponse, Error> {
    let page = Page::from_query(&page_query)?;

    let profiles = directory::search(
        app_state.store.as_ref(),
        &caller.account,
        params.search_param.as_deref(),
        page,
    )
    .await?;

    Ok((StatusCode::OK, Json(profiles)))
}
