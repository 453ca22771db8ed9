use crate::api::handlers::auth::now_unix_seconds;
use crate::session_token::{SessionClaims, sign_hs256};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

#[derive(Debug)]
pub struct Args {
    pub user_id: i64,
    pub ttl_seconds: i64,
    pub jwt_secret: SecretString,
}

/// Sign a session token for `args.user_id`.
///
/// # Errors
/// Returns an error if the claims cannot be signed.
pub fn mint(args: &Args, now: i64) -> Result<String> {
    let claims = SessionClaims::new(args.user_id, now, args.ttl_seconds);
    sign_hs256(args.jwt_secret.expose_secret().as_bytes(), &claims)
        .context("Failed to sign session token")
}

/// Print a freshly minted token to stdout.
/// # Errors
/// Returns an error if signing fails.
pub fn execute(args: &Args) -> Result<()> {
    warn!(
        user_id = args.user_id,
        ttl_seconds = args.ttl_seconds,
        "minting a session token outside the session issuer"
    );
    let token = mint(args, now_unix_seconds())?;
    println!("{token}");
    Ok(())
}
