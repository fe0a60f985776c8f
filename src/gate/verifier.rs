//! Session credential verification.

use super::error::{Error, Rejection};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use tracing::debug;

/// Claims the gate reads from a session credential.
///
/// Only `exp` is required. Everything else the auth service puts in the
/// token is carried as is or ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<Value>,
    #[serde(deserialize_with = "numeric_date")]
    pub exp: u64,
}

impl SessionClaims {
    /// The subject, when it is a JSON string.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_ref().and_then(Value::as_str)
    }
}

// NumericDate allows fractional seconds; truncate to whole seconds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn numeric_date<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    number
        .as_u64()
        .or_else(|| {
            number
                .as_f64()
                .filter(|value| value.is_finite() && *value >= 0.0)
                .map(|value| value as u64)
        })
        .ok_or_else(|| D::Error::custom(format!("invalid NumericDate: {number}")))
}

/// Verifies HMAC signed session credentials against a shared secret.
#[derive(Clone)]
pub struct SessionVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for SessionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionVerifier")
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}

impl SessionVerifier {
    /// Build a verifier bound to `secret`.
    ///
    /// # Errors
    /// Returns an error if the secret is empty.
    pub fn new(secret: &SecretString) -> Result<Self, Error> {
        let secret = secret.expose_secret();
        if secret.is_empty() {
            return Err(Error::EmptySecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = 0;

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Tolerated clock skew, in seconds, when checking `exp`.
    #[must_use]
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.validation.leeway = seconds;
        self
    }

    /// `true` only for a present, well formed, correctly signed and unexpired credential.
    pub fn verify(&self, credential: Option<&str>) -> bool {
        let Some(token) = credential else {
            return false;
        };

        match self.inspect(token) {
            Ok(_) => true,
            Err(rejection) => {
                debug!("session credential rejected: {rejection}");
                false
            }
        }
    }

    /// Decode and validate a credential, keeping the failure reason.
    ///
    /// # Errors
    /// Returns the [`Rejection`] describing why the token is not acceptable.
    pub fn inspect(&self, token: &str) -> Result<SessionClaims, Rejection> {
        if token.is_empty() {
            return Err(Rejection::Missing);
        }

        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }
}
