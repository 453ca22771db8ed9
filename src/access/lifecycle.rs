//! Status gate for mutations on a matter's attachments.

use super::{Decision, DenyReason};
use crate::store::models::MatterStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    RemoveAttachment,
}

/// Decide whether `operation` may run while the owning matter is in `status`.
///
/// Attachments can only be removed while the matter is still a draft or has
/// been submitted; anything later in the lifecycle is frozen.
#[must_use]
pub fn check_mutation_allowed(status: &MatterStatus, operation: Mutation) -> Decision {
    match operation {
        Mutation::RemoveAttachment => match status {
            MatterStatus::Draft | MatterStatus::Submitted => Decision::Allow,
            other => Decision::Deny(DenyReason::InvalidLifecycleState(other.clone())),
        },
    }
}
