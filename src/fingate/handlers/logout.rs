use crate::gate::Gate;
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect},
};
use std::sync::Arc;
use tracing::error;

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 303, description = "Session cookie cleared, redirect to the login page")
    ),
    tag = "session"
)]
pub async fn logout(gate: Extension<Arc<Gate>>) -> impl IntoResponse {
    // Always clear the cookie, a stale or forged one included.
    let mut headers = HeaderMap::new();
    match gate.cookie().clear() {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(e) => error!("Failed to build session cookie: {e}"),
    }

    (headers, Redirect::to(gate.targets().login()))
}
