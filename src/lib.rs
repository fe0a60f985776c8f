//! Session gate for the FinanceTracker web front-end.
//!
//! Every request is checked against the session cookie: signed-in users are
//! kept away from public-only pages (login) and anonymous users away from
//! private pages (profile, subscriptions). Everything else is forwarded to
//! the page renderer untouched.

pub mod cli;
pub mod fingate;
pub mod gate;
