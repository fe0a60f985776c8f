//! The session gate: credential verification plus route based redirects.

pub mod cookie;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod routes;
pub mod verifier;

pub use self::cookie::SessionCookie;
pub use self::error::{Error, Rejection};
pub use self::identity::Identity;
pub use self::routes::{Classification, Decision, RedirectTargets, RouteClassifier, RoutePattern};
pub use self::verifier::{SessionClaims, SessionVerifier};

use axum::http::HeaderMap;
use tracing::debug;

/// Immutable per-process gate, shared by every request.
#[derive(Debug, Clone)]
pub struct Gate {
    verifier: SessionVerifier,
    classifier: RouteClassifier,
    targets: RedirectTargets,
    cookie: SessionCookie,
}

impl Gate {
    #[must_use]
    pub fn new(
        verifier: SessionVerifier,
        classifier: RouteClassifier,
        targets: RedirectTargets,
        cookie: SessionCookie,
    ) -> Self {
        Self {
            verifier,
            classifier,
            targets,
            cookie,
        }
    }

    #[must_use]
    pub fn verifier(&self) -> &SessionVerifier {
        &self.verifier
    }

    #[must_use]
    pub fn cookie(&self) -> &SessionCookie {
        &self.cookie
    }

    #[must_use]
    pub fn targets(&self) -> &RedirectTargets {
        &self.targets
    }

    /// Classify `path` and apply the decision table for an already known verification result.
    #[must_use]
    pub fn decide(&self, path: &str, is_valid: bool) -> Decision {
        routes::decide(self.classifier.classify(path), is_valid, &self.targets)
    }

    /// Full gate evaluation for one request.
    ///
    /// Neutral paths skip verification since the outcome cannot depend on it.
    #[must_use]
    pub fn evaluate(&self, path: &str, headers: &HeaderMap) -> Decision {
        let classification = self.classifier.classify(path);
        if classification == Classification::Neutral {
            return Decision::PassThrough;
        }

        let is_valid = self.verifier.verify(self.cookie.extract(headers));
        let decision = routes::decide(classification, is_valid, &self.targets);

        debug!(
            path,
            ?classification,
            is_valid,
            ?decision,
            "gate evaluated"
        );

        decision
    }
}
