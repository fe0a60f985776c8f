//! Route classification and the redirect decision table.

use super::error::Error;
use regex::Regex;
use std::fmt;

/// A single path rule.
///
/// `/login` matches only `/login`; `/profile/*` matches `/profile` and everything below it.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    anchor: String,
    subtree: bool,
    regex: Regex,
}

impl RoutePattern {
    /// Parse an exact (`/login`) or subtree (`/profile/*`) pattern.
    ///
    /// # Errors
    /// Returns an error if the pattern is not an absolute path.
    pub fn parse(pattern: &str) -> Result<Self, Error> {
        let pattern = pattern.trim();
        let (anchor, subtree) = match pattern.strip_suffix("/*") {
            Some(base) => (base, true),
            None => (pattern, false),
        };

        if !anchor.starts_with('/') && !(subtree && anchor.is_empty()) {
            return Err(Error::Pattern(pattern.to_string()));
        }
        if anchor.contains('*') {
            return Err(Error::Pattern(pattern.to_string()));
        }

        let escaped = regex::escape(anchor);
        let regex = if subtree {
            Regex::new(&format!("^{escaped}(/.*)?$"))?
        } else {
            Regex::new(&format!("^{escaped}$"))?
        };

        Ok(Self {
            anchor: if anchor.is_empty() {
                "/".to_string()
            } else {
                anchor.to_string()
            },
            subtree,
            regex,
        })
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// The literal path the pattern is rooted at.
    #[must_use]
    pub fn anchor(&self) -> &str {
        &self.anchor
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subtree {
            write!(f, "{}/*", self.anchor.trim_end_matches('/'))
        } else {
            f.write_str(&self.anchor)
        }
    }
}

/// Parse a comma separated list of patterns, skipping blanks.
///
/// # Errors
/// Returns an error on the first invalid pattern.
pub fn parse_patterns(list: &str) -> Result<Vec<RoutePattern>, Error> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(RoutePattern::parse)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Only reachable without a session (login page).
    PublicOnly,
    /// Only reachable with a session.
    PrivateOnly,
    Neutral,
}

/// Two disjoint pattern sets partitioning routes by required auth state.
#[derive(Debug, Clone)]
pub struct RouteClassifier {
    public_only: Vec<RoutePattern>,
    private_only: Vec<RoutePattern>,
}

impl RouteClassifier {
    /// # Errors
    /// Returns [`Error::Overlap`] if a pattern of one set matches the anchor of a pattern in the
    /// other set.
    pub fn new(
        public_only: Vec<RoutePattern>,
        private_only: Vec<RoutePattern>,
    ) -> Result<Self, Error> {
        for public in &public_only {
            for private in &private_only {
                if private.matches(public.anchor()) || public.matches(private.anchor()) {
                    return Err(Error::Overlap {
                        path: public.anchor().to_string(),
                    });
                }
            }
        }

        Ok(Self {
            public_only,
            private_only,
        })
    }

    #[must_use]
    pub fn classify(&self, path: &str) -> Classification {
        if self.public_only.iter().any(|p| p.matches(path)) {
            Classification::PublicOnly
        } else if self.private_only.iter().any(|p| p.matches(path)) {
            Classification::PrivateOnly
        } else {
            Classification::Neutral
        }
    }
}

/// Where each redirecting branch of the decision table points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTargets {
    login: String,
    landing: String,
}

impl RedirectTargets {
    /// # Errors
    /// Returns an error unless both targets are absolute paths.
    pub fn new(login: impl Into<String>, landing: impl Into<String>) -> Result<Self, Error> {
        let login = login.into();
        let landing = landing.into();
        for target in [&login, &landing] {
            if !target.starts_with('/') || target.starts_with("//") {
                return Err(Error::Target(target.clone()));
            }
        }
        Ok(Self { login, landing })
    }

    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    #[must_use]
    pub fn landing(&self) -> &str {
        &self.landing
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    PassThrough,
    Redirect(String),
}

/// Apply the decision table to a classified path.
#[must_use]
pub fn decide(classification: Classification, is_valid: bool, targets: &RedirectTargets) -> Decision {
    match (is_valid, classification) {
        (true, Classification::PublicOnly) => Decision::Redirect(targets.landing().to_string()),
        (false, Classification::PrivateOnly) => Decision::Redirect(targets.login().to_string()),
        _ => Decision::PassThrough,
    }
}
