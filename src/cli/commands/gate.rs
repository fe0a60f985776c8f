use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_JWT_LEEWAY: &str = "jwt-leeway";
pub const ARG_COOKIE_NAME: &str = "cookie-name";
pub const ARG_COOKIE_INSECURE: &str = "cookie-insecure";
pub const ARG_PUBLIC_ONLY: &str = "public-only";
pub const ARG_PRIVATE_ONLY: &str = "private-only";
pub const ARG_LOGIN_PATH: &str = "login-path";
pub const ARG_LANDING_PATH: &str = "landing-path";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Shared secret used to verify session tokens")
                .env("FINGATE_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_JWT_LEEWAY)
                .long(ARG_JWT_LEEWAY)
                .help("Clock skew tolerated when checking token expiry, in seconds")
                .default_value("0")
                .env("FINGATE_JWT_LEEWAY")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_COOKIE_NAME)
                .long(ARG_COOKIE_NAME)
                .help("Name of the session cookie")
                .default_value(crate::gate::cookie::DEFAULT_COOKIE_NAME)
                .env("FINGATE_COOKIE_NAME"),
        )
        .arg(
            Arg::new(ARG_COOKIE_INSECURE)
                .long(ARG_COOKIE_INSECURE)
                .help("Do not mark cookies as Secure (plain HTTP development setups)")
                .env("FINGATE_COOKIE_INSECURE")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_PUBLIC_ONLY)
                .long(ARG_PUBLIC_ONLY)
                .help("Comma separated routes only reachable without a session, `/path` or `/path/*`")
                .default_value("/login")
                .env("FINGATE_PUBLIC_ONLY"),
        )
        .arg(
            Arg::new(ARG_PRIVATE_ONLY)
                .long(ARG_PRIVATE_ONLY)
                .help("Comma separated routes only reachable with a session, `/path` or `/path/*`")
                .default_value("/profile/*,/subscriptions/*")
                .env("FINGATE_PRIVATE_ONLY"),
        )
        .arg(
            Arg::new(ARG_LOGIN_PATH)
                .long(ARG_LOGIN_PATH)
                .help("Where anonymous users are sent from private routes")
                .default_value("/login")
                .env("FINGATE_LOGIN_PATH"),
        )
        .arg(
            Arg::new(ARG_LANDING_PATH)
                .long(ARG_LANDING_PATH)
                .help("Where signed-in users are sent from public-only routes")
                .default_value("/profile")
                .env("FINGATE_LANDING_PATH"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub jwt_secret: SecretString,
    pub jwt_leeway_seconds: u64,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub public_only: String,
    pub private_only: String,
    pub login_path: String,
    pub landing_path: String,
}

impl Options {
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let jwt_secret = matches
            .get_one::<String>(ARG_JWT_SECRET)
            .cloned()
            .context("missing required argument: --jwt-secret")?;

        let string = |id: &str| -> Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .with_context(|| format!("missing required argument: --{id}"))
        };

        Ok(Self {
            jwt_secret: SecretString::from(jwt_secret),
            jwt_leeway_seconds: matches.get_one::<u64>(ARG_JWT_LEEWAY).copied().unwrap_or(0),
            cookie_name: string(ARG_COOKIE_NAME)?,
            cookie_secure: !matches.get_flag(ARG_COOKIE_INSECURE),
            public_only: string(ARG_PUBLIC_ONLY)?,
            private_only: string(ARG_PRIVATE_ONLY)?,
            login_path: string(ARG_LOGIN_PATH)?,
            landing_path: string(ARG_LANDING_PATH)?,
        })
    }
}
