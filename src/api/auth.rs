//! Token authentication for the protected endpoints

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{AppState, error::Error, objects::Account, services::session, utils::get_auth_header};

#[derive(Clone)]
pub struct CurrentUser<T>(pub T);

/// The authenticated account and the token it presented
#[derive(Clone)]
pub struct Caller {
    pub account: Account,
    pub token: String,
}

pub async fn require_auth(
    State(app_state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Error> {
    let token = get_auth_header(req.headers())?.to_string();

    let account = session::authenticate(app_state.store.as_ref(), &token).await?;

    req.extensions_mut()
        .insert(CurrentUser(Caller { account, token }));

    Ok(next.run(req).await)
}
