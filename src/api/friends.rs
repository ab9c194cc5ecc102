use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use super::auth::{Caller, CurrentUser};
use crate::{
    AppState,
    error::Error,
    objects::{Page, PageQuery},
    services::friend_requests,
};

/// `GET /list-friends` Returns a page of the caller's friends
///
/// requires auth: yes
pub async fn get(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser<Caller>>,
    WithRejection(Query(page_query), _): WithRejection<Query<PageQuery>, Error>,
) -> Result<impl IntoResponse, Error> {
    let page = Page::from_query(&page_query)?;

    let friends =
        friend_requests::list_friends(app_state.store.as_ref(), &caller.account, page).await?;

    Ok((StatusCode::OK, Json(friends)))
}
