//! Session cookie and bearer header plumbing.

use super::error::Error;
use axum::http::{
    header::{InvalidHeaderValue, AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};

pub const DEFAULT_COOKIE_NAME: &str = "access_token";

/// Name and attributes of the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    name: String,
    secure: bool,
}

impl SessionCookie {
    /// # Errors
    /// Returns an error if `name` is not a valid cookie name token.
    pub fn new(name: impl Into<String>, secure: bool) -> Result<Self, Error> {
        let name = name.into();
        let valid = !name.is_empty()
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));
        if !valid {
            return Err(Error::CookieName(name));
        }
        Ok(Self { name, secure })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the session cookie, if the request carries a non-empty one.
    #[must_use]
    pub fn extract<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|header| header.to_str().ok())
            .flat_map(|value| value.split(';'))
            .find_map(|pair| {
                let (key, val) = pair.trim().split_once('=')?;
                (key.trim() == self.name).then(|| val.trim())
            })
            .filter(|val| !val.is_empty())
    }

    /// `Set-Cookie` value that removes the session cookie from the browser.
    ///
    /// # Errors
    /// Returns an error if the header value cannot be built.
    pub fn clear(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", self.name);
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }
}

/// Outcome of reading the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bearer<'a> {
    Absent,
    Malformed,
    Token(&'a str),
}

#[must_use]
pub fn bearer(headers: &HeaderMap) -> Bearer<'_> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Bearer::Absent;
    };
    let Ok(value) = value.to_str() else {
        return Bearer::Malformed;
    };

    match value
        .trim()
        .strip_prefix("Bearer ")
        .or_else(|| value.trim().strip_prefix("bearer "))
        .map(str::trim)
    {
        Some(token) if !token.is_empty() => Bearer::Token(token),
        _ => Bearer::Malformed,
    }
}
