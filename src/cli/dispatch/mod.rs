//! Map parsed CLI arguments to the action the binary runs.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{gate, upstream};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let gate_opts = gate::Options::parse(matches)?;
    let upstream_opts = upstream::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        jwt_secret: gate_opts.jwt_secret,
        jwt_leeway_seconds: gate_opts.jwt_leeway_seconds,
        cookie_name: gate_opts.cookie_name,
        cookie_secure: gate_opts.cookie_secure,
        public_only: gate_opts.public_only,
        private_only: gate_opts.private_only,
        login_path: gate_opts.login_path,
        landing_path: gate_opts.landing_path,
        upstream_url: upstream_opts.url,
        upstream_timeout_seconds: upstream_opts.timeout_seconds,
    }))
}
