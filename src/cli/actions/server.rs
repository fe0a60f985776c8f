use crate::fingate::{self, proxy::Upstream};
use crate::gate::{
    routes::parse_patterns, Gate, RedirectTargets, RouteClassifier, SessionCookie,
    SessionVerifier,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::debug;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub jwt_secret: SecretString,
    pub jwt_leeway_seconds: u64,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub public_only: String,
    pub private_only: String,
    pub login_path: String,
    pub landing_path: String,
    pub upstream_url: String,
    pub upstream_timeout_seconds: u64,
}

/// Build the gate from validated arguments.
///
/// # Errors
/// Returns an error if the secret, a route pattern, a redirect target or the cookie name is
/// invalid, or if the public-only and private-only sets overlap.
pub fn gate(args: &Args) -> Result<Gate> {
    let verifier = SessionVerifier::new(&args.jwt_secret)
        .context("Invalid JWT secret")?
        .with_leeway(args.jwt_leeway_seconds);

    let public_only = parse_patterns(&args.public_only).context("Invalid public-only routes")?;
    let private_only =
        parse_patterns(&args.private_only).context("Invalid private-only routes")?;
    let classifier = RouteClassifier::new(public_only, private_only)?;

    let targets = RedirectTargets::new(args.login_path.as_str(), args.landing_path.as_str())?;
    let cookie = SessionCookie::new(args.cookie_name.as_str(), args.cookie_secure)?;

    Ok(Gate::new(verifier, classifier, targets, cookie))
}

/// Build the upstream forwarder from validated arguments.
///
/// # Errors
/// Returns an error if the upstream URL is invalid.
pub fn upstream(args: &Args) -> Result<Upstream> {
    let url = Url::parse(&args.upstream_url)
        .with_context(|| format!("Invalid upstream URL: {}", args.upstream_url))?;
    Upstream::new(url, Duration::from_secs(args.upstream_timeout_seconds))
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let gate = Arc::new(gate(&args)?);
    let upstream = Arc::new(upstream(&args)?);

    debug!("gate: {:?}", gate);
    debug!("upstream: {}", upstream.base());

    fingate::new(args.port, gate, upstream).await
}
