//! Tenant ownership checks.
//!
//! Two tiers: cross-tenant roles are always allowed, tenant-scoped roles must
//! belong to the secretaria that owns the resource. The guard never looks at
//! the resource itself, so read and delete share one code path and a deny
//! carries no hint about what the resource is.

use tracing::debug;

use super::{Decision, DenyReason};
use crate::store::models::Principal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Read,
    Delete,
}

impl Action {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Delete => "delete",
        }
    }
}

/// Decide whether `principal` may perform `action` on a resource owned by
/// `resource_tenant_id`.
#[must_use]
pub fn authorize(principal: &Principal, resource_tenant_id: i64, action: Action) -> Decision {
    if principal.role.is_cross_tenant() {
        return Decision::Allow;
    }

    if principal.tenant_id == Some(resource_tenant_id) {
        return Decision::Allow;
    }

    debug!(
        user_id = principal.id,
        role = %principal.role,
        action = action.as_str(),
        "tenant mismatch"
    );
    Decision::Deny(DenyReason::AccessDenied)
}
