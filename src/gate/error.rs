use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

/// Why a session credential was not accepted.
///
/// The redirect decision only ever sees a boolean; the reason is kept for logs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("no credential supplied")]
    Missing,
    #[error("malformed token")]
    Malformed,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token not yet valid")]
    Immature,
    #[error("missing required claim: {0}")]
    MissingClaim(String),
    #[error("unsupported algorithm")]
    Algorithm,
    #[error("token rejected: {0}")]
    Other(String),
}

impl From<jsonwebtoken::errors::Error> for Rejection {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::Immature,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::MissingRequiredClaim(claim) => Self::MissingClaim(claim.clone()),
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => Self::Algorithm,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Self::Malformed,
            _ => Self::Other(err.to_string()),
        }
    }
}

/// Errors raised while building a gate from configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("empty jwt secret")]
    EmptySecret,
    #[error("invalid route pattern: {0}")]
    Pattern(String),
    #[error("invalid redirect target: {0}")]
    Target(String),
    #[error("route {path} is both public-only and private-only")]
    Overlap { path: String },
    #[error("invalid cookie name: {0}")]
    CookieName(String),
    #[error("regex error")]
    Regex(#[from] regex::Error),
}
