use crate::api::Environment;
use anyhow::Result;
use clap::{Arg, ArgAction, Command, builder::BoolishValueParser};
use secrecy::SecretString;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_AUTH_BYPASS: &str = "auth-bypass";
pub const ARG_ENVIRONMENT: &str = "environment";

pub fn with_args(command: Command) -> Command {
    command
        .arg(jwt_secret_arg())
        .arg(
            Arg::new(ARG_AUTH_BYPASS)
                .long(ARG_AUTH_BYPASS)
                .help("Skip authentication and authorization (local testing only)")
                .env("DIARIO_AUTH_BYPASS")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .long(ARG_ENVIRONMENT)
                .help("Deployment environment: production, development or test")
                .long_help(
                    "Deployment environment. Outside production, unexpected errors include a details field in the response body.",
                )
                .env("DIARIO_ENVIRONMENT")
                .default_value("production")
                .value_parser(clap::value_parser!(Environment)),
        )
}

/// HS256 secret shared with the session issuer; also used by `token`.
pub fn jwt_secret_arg() -> Arg {
    Arg::new(ARG_JWT_SECRET)
        .long(ARG_JWT_SECRET)
        .help("HS256 secret used to verify session tokens")
        .env("DIARIO_JWT_SECRET")
        .hide_env_values(true)
}

#[derive(Debug)]
pub struct Options {
    pub jwt_secret: Option<SecretString>,
    pub bypass: bool,
    pub environment: Environment,
}

impl Options {
    /// # Errors
    /// Never fails today; kept fallible like the other option groups.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let jwt_secret = matches
            .get_one::<String>(ARG_JWT_SECRET)
            .filter(|secret| !secret.is_empty())
            .map(|secret| SecretString::from(secret.clone()));

        Ok(Self {
            jwt_secret,
            bypass: matches.get_flag(ARG_AUTH_BYPASS),
            environment: matches
                .get_one::<Environment>(ARG_ENVIRONMENT)
                .copied()
                .unwrap_or_default(),
        })
    }
}
