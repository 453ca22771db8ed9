//! Maps validated CLI matches to an [`Action`].

use crate::cli::actions::{Action, server, token};
use crate::cli::commands::{self, ARG_TTL_SECONDS, ARG_USER_ID, CMD_TOKEN, auth};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    if let Some(sub) = matches.subcommand_matches(CMD_TOKEN) {
        return token_action(sub);
    }

    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;
    let frontend_origin = matches.get_one::<String>("frontend-origin").cloned();

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(server::Args {
        port,
        dsn,
        frontend_origin,
        jwt_secret: auth_opts.jwt_secret,
        bypass: auth_opts.bypass,
        environment: auth_opts.environment,
    }))
}

fn token_action(matches: &clap::ArgMatches) -> Result<Action> {
    let user_id = matches
        .get_one::<i64>(ARG_USER_ID)
        .copied()
        .context("missing required argument: --user-id")?;
    let ttl_seconds = matches
        .get_one::<i64>(ARG_TTL_SECONDS)
        .copied()
        .unwrap_or(3600);
    let secret = matches
        .get_one::<String>(commands::auth::ARG_JWT_SECRET)
        .filter(|secret| !secret.is_empty())
        .cloned()
        .context("missing required argument: --jwt-secret")?;

    Ok(Action::Token(token::Args {
        user_id,
        ttl_seconds,
        jwt_secret: SecretString::from(secret),
    }))
}
