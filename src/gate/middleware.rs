//! axum middleware wrapping the gate.

use super::{identity, Decision, Gate};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::info;

/// Redirect or forward every request according to the gate's decision table.
pub async fn redirect_gate(State(gate): State<Arc<Gate>>, request: Request, next: Next) -> Response {
    match gate.evaluate(request.uri().path(), request.headers()) {
        Decision::PassThrough => next.run(request).await,
        Decision::Redirect(target) => {
            info!(from = request.uri().path(), to = %target, "redirecting");
            Redirect::temporary(&target).into_response()
        }
    }
}

/// Reject requests that cannot be attributed to a user, otherwise expose the
/// [`Identity`](super::Identity) as a request extension.
pub async fn require_identity(
    State(gate): State<Arc<Gate>>,
    mut request: Request,
    next: Next,
) -> Response {
    match identity::resolve(&gate, request.headers()) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}
