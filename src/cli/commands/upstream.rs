use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

pub const ARG_UPSTREAM_URL: &str = "upstream-url";
pub const ARG_UPSTREAM_TIMEOUT: &str = "upstream-timeout";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_UPSTREAM_URL)
                .long(ARG_UPSTREAM_URL)
                .help("Base URL of the page renderer requests are forwarded to")
                .default_value("http://localhost:3000")
                .env("FINGATE_UPSTREAM_URL"),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_TIMEOUT)
                .long(ARG_UPSTREAM_TIMEOUT)
                .help("Timeout for forwarded requests, in seconds")
                .default_value("30")
                .env("FINGATE_UPSTREAM_TIMEOUT")
                .value_parser(clap::value_parser!(u64)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub timeout_seconds: u64,
}

impl Options {
    /// # Errors
    /// Returns an error if the upstream URL is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            url: matches
                .get_one::<String>(ARG_UPSTREAM_URL)
                .cloned()
                .context("missing required argument: --upstream-url")?,
            timeout_seconds: matches
                .get_one::<u64>(ARG_UPSTREAM_TIMEOUT)
                .copied()
                .unwrap_or(30),
        })
    }
}
