//! Bearer credential validation.
//!
//! Pure: takes the raw `Authorization` value and a clock reading, returns the
//! decoded claims. Nothing here touches storage.

use secrecy::{ExposeSecret, SecretString};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error};

use super::error::AuthError;
use crate::session_token::{self, SessionClaims};

/// Shortest token substring worth handing to the signature check.
pub const MIN_TOKEN_LEN: usize = 10;

pub struct SessionVerifier {
    secret: Option<SecretString>,
}

impl SessionVerifier {
    #[must_use]
    pub fn new(secret: Option<SecretString>) -> Self {
        Self { secret }
    }

    /// Validate an `Authorization` header value against the current time.
    ///
    /// # Errors
    /// See [`SessionVerifier::verify_at`].
    pub fn verify(&self, authorization: Option<&str>) -> Result<SessionClaims, AuthError> {
        self.verify_at(authorization, now_unix_seconds())
    }

    /// Validate an `Authorization` header value at `now_unix_seconds`.
    ///
    /// # Errors
    /// - `MissingCredential` when the header is absent or not a bearer value,
    /// - `MalformedCredential` when the token is shorter than [`MIN_TOKEN_LEN`],
    /// - `ServerMisconfigured` when no signing secret is configured,
    /// - `InvalidOrExpiredCredential` on any signature, expiry or claim failure.
    pub fn verify_at(
        &self,
        authorization: Option<&str>,
        now_unix_seconds: i64,
    ) -> Result<SessionClaims, AuthError> {
        let token = extract_bearer_token(authorization).ok_or(AuthError::MissingCredential)?;
        if token.len() < MIN_TOKEN_LEN {
            return Err(AuthError::MalformedCredential);
        }

        let Some(secret) = &self.secret else {
            error!("session signing secret is not configured");
            return Err(AuthError::ServerMisconfigured);
        };

        let claims =
            session_token::verify_hs256(token, secret.expose_secret().as_bytes(), now_unix_seconds)
                .map_err(|err| {
                    debug!("session token rejected: {err}");
                    AuthError::InvalidOrExpiredCredential
                })?;

        if let Err(err) = claims.user_id() {
            debug!("session token rejected: {err}");
            return Err(AuthError::InvalidOrExpiredCredential);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for SessionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionVerifier")
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .finish()
    }
}

fn extract_bearer_token(value: Option<&str>) -> Option<&str> {
    let trimmed = value?.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?;
    Some(token.trim())
}

#[must_use]
pub fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
        })
}
