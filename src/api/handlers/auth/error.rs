use thiserror::Error;

use crate::store::StoreError;

/// Failures of the authentication half of the pipeline.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer credential")]
    MissingCredential,
    #[error("malformed bearer credential")]
    MalformedCredential,
    #[error("invalid or expired credential")]
    InvalidOrExpiredCredential,
    #[error("session signing secret is not configured")]
    ServerMisconfigured,
    #[error("unknown or inactive principal")]
    UnknownOrInactivePrincipal,
    #[error(transparent)]
    Store(#[from] StoreError),
}
