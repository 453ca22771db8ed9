//! Principal resolution and the bypass switch.
//!
//! Flow Overview: verify the bearer token, load the active user it names, and
//! hand downstream handlers an [`AuthResult`]. When the bypass switch is on the
//! first two steps are skipped and a fixed principal is returned instead; the
//! rest of the request pipeline is the same for both variants.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use tracing::{debug, warn};

use super::{error::AuthError, state::AuthState};
use crate::access::{self, Action, Decision};
use crate::store::{
    GazetteStore,
    models::{Principal, Role},
};

pub const BYPASS_USER_ID: i64 = 0;

/// The hardcoded principal used when authentication is bypassed.
#[must_use]
pub fn bypass_principal() -> Principal {
    Principal {
        id: BYPASS_USER_ID,
        name: "Usuário de Teste (bypass)".to_string(),
        email: "bypass@diario.local".to_string(),
        role: Role::Admin,
        tenant_id: None,
    }
}

/// Who is making the request and how we know.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthResult {
    /// Verified token, active user.
    Authenticated(Principal),
    /// Bypass switch on; nothing was verified.
    Bypassed(Principal),
}

impl AuthResult {
    #[must_use]
    pub fn principal(&self) -> &Principal {
        match self {
            Self::Authenticated(principal) | Self::Bypassed(principal) => principal,
        }
    }

    #[must_use]
    pub fn is_bypassed(&self) -> bool {
        matches!(self, Self::Bypassed(_))
    }

    /// Run the authorization guard; bypassed requests are always allowed.
    #[must_use]
    pub fn authorize(&self, resource_tenant_id: i64, action: Action) -> Decision {
        match self {
            Self::Authenticated(principal) => {
                access::authorize(principal, resource_tenant_id, action)
            }
            Self::Bypassed(_) => Decision::Allow,
        }
    }
}

/// Map a user id to an active principal.
///
/// # Errors
/// Returns `UnknownOrInactivePrincipal` when no active user has this id, or
/// `Store` when the lookup itself fails.
pub async fn resolve_principal(
    store: &dyn GazetteStore,
    user_id: i64,
) -> Result<Principal, AuthError> {
    match store.find_active_user(user_id).await? {
        Some(principal) => Ok(principal),
        None => {
            debug!(user_id, "no active user for token subject");
            Err(AuthError::UnknownOrInactivePrincipal)
        }
    }
}

/// Authenticate a request from its headers.
///
/// # Errors
/// Returns the first failing step of token verification or principal lookup.
pub async fn authenticate(
    headers: &HeaderMap,
    auth_state: &AuthState,
    store: &dyn GazetteStore,
) -> Result<AuthResult, AuthError> {
    if auth_state.config().bypass() {
        warn!("AUTH BYPASS: request served with the synthetic test principal");
        return Ok(AuthResult::Bypassed(bypass_principal()));
    }

    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let claims = auth_state.verifier().verify(authorization)?;
    let user_id = claims
        .user_id()
        .map_err(|_| AuthError::InvalidOrExpiredCredential)?;

    let principal = resolve_principal(store, user_id).await?;
    Ok(AuthResult::Authenticated(principal))
}
