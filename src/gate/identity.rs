//! Resolve the user behind a request for endpoints that need it.

use super::{
    cookie::{bearer, Bearer},
    Gate,
};
use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;

/// Authenticated user attached to the request by `require_identity`.
#[derive(ToSchema, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    /// Unix seconds after which the credential stops being valid.
    pub expires_at: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid authorization format")]
    AuthorizationFormat,
    #[error("missing credentials")]
    MissingCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid subject in token")]
    InvalidSubject,
}

impl IdentityError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidSubject => StatusCode::BAD_REQUEST,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}

/// Bearer header first, then the session cookie.
///
/// # Errors
/// Returns the client facing reason the request cannot be attributed to a user.
pub fn resolve(gate: &Gate, headers: &HeaderMap) -> Result<Identity, IdentityError> {
    let token = match bearer(headers) {
        Bearer::Token(token) => token,
        Bearer::Malformed => return Err(IdentityError::AuthorizationFormat),
        Bearer::Absent => gate
            .cookie()
            .extract(headers)
            .ok_or(IdentityError::MissingCredentials)?,
    };

    let claims = gate
        .verifier()
        .inspect(token)
        .map_err(|rejection| {
            debug!("identity rejected: {rejection}");
            IdentityError::InvalidToken
        })?;

    let user_id = claims
        .subject()
        .and_then(|sub| sub.parse::<i64>().ok())
        .ok_or(IdentityError::InvalidSubject)?;

    Ok(Identity {
        user_id,
        expires_at: claims.exp,
    })
}
