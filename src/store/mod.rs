//! Persistence seam for users, matters and attachments.
//!
//! Handlers only talk to [`GazetteStore`]. `PgStore` is the production
//! backend; `MemoryStore` keeps the same contract in process for tests and
//! local runs.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::access::DenyReason;
use models::{AttachmentRecord, MatterStatus, Principal};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Lifecycle check re-run by the store under its matter lock.
pub type LifecycleGate = for<'s> fn(&'s MatterStatus) -> Result<(), DenyReason>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt row: {0}")]
    CorruptRow(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Result of a transactional attachment removal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Row removed; `has_attachments` was recomputed from `remaining`.
    Deleted {
        matter_id: i64,
        remaining: i64,
        has_attachments: bool,
    },
    /// The attachment vanished before the matter lock was taken.
    NotFound,
    /// The matter changed status under the lock and is no longer editable.
    Rejected(DenyReason),
}

#[async_trait]
pub trait GazetteStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Look up an active user by id. Inactive users resolve to `None`.
    async fn find_active_user(&self, user_id: i64) -> Result<Option<Principal>, StoreError>;

    /// Look up an attachment joined to its parent matter.
    async fn find_attachment(
        &self,
        attachment_id: i64,
    ) -> Result<Option<AttachmentRecord>, StoreError>;

    /// Delete an attachment, recount its siblings and persist the matter's
    /// `has_attachments` flag as one atomic unit.
    ///
    /// Implementations must serialize concurrent removals on the same matter
    /// and re-run `allowed` against the status seen under that serialization.
    async fn delete_attachment(
        &self,
        attachment_id: i64,
        allowed: LifecycleGate,
    ) -> Result<DeleteOutcome, StoreError>;

    /// Cheap liveness check for `/health`.
    async fn ping(&self) -> Result<(), StoreError>;
}
