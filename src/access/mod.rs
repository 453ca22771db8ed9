//! Access decisions for matter attachments.
//!
//! Both guards are pure: they take already-resolved facts (principal, tenant,
//! status) and return a [`Decision`]. Handlers run authorization first and the
//! lifecycle check second, so a `403` is never reported as a `400`.

pub mod authorization;
pub mod lifecycle;

pub use authorization::{Action, authorize};
pub use lifecycle::{Mutation, check_mutation_allowed};

use crate::store::models::MatterStatus;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DenyReason {
    /// Principal may not touch resources of this secretaria.
    AccessDenied,
    /// The owning matter left its editable phase.
    InvalidLifecycleState(MatterStatus),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Converts the decision into a `Result` so callers can use `?`.
    ///
    /// # Errors
    /// Returns the deny reason when the decision is `Deny`.
    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(reason),
        }
    }
}
