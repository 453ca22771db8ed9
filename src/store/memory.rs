//! In-process backend.
//!
//! All state sits behind one `tokio::sync::Mutex`, which gives the same
//! all-or-nothing delete semantics as the Postgres transaction. Failure
//! injection lets tests prove that a failed flag update leaves no trace.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use super::{
    DeleteOutcome, GazetteStore, LifecycleGate, StoreError,
    models::{Attachment, AttachmentRecord, Matter, MatterStatus, Principal},
};

#[derive(Clone, Debug)]
struct UserRow {
    principal: Principal,
    active: bool,
}

#[derive(Clone, Debug)]
struct MatterRow {
    matter: Matter,
    has_attachments: bool,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<i64, UserRow>,
    matters: BTreeMap<i64, MatterRow>,
    attachments: BTreeMap<i64, Attachment>,
}

impl State {
    fn count_attachments(&self, matter_id: i64) -> i64 {
        let total = self
            .attachments
            .values()
            .filter(|attachment| attachment.matter_id == matter_id)
            .count();
        i64::try_from(total).unwrap_or(i64::MAX)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_flag_update: AtomicBool,
    offline: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, principal: Principal, active: bool) {
        self.state
            .lock()
            .await
            .users
            .insert(principal.id, UserRow { principal, active });
    }

    pub async fn insert_matter(&self, matter: Matter) {
        let mut state = self.state.lock().await;
        let has_attachments = state.count_attachments(matter.id) > 0;
        state.matters.insert(
            matter.id,
            MatterRow {
                matter,
                has_attachments,
            },
        );
    }

    /// Insert an attachment and raise the parent's flag, like an upload would.
    ///
    /// # Errors
    /// Returns `StoreError::CorruptRow` if the parent matter does not exist.
    pub async fn insert_attachment(&self, attachment: Attachment) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let Some(row) = state.matters.get_mut(&attachment.matter_id) else {
            return Err(StoreError::CorruptRow(format!(
                "attachment {} references missing matter {}",
                attachment.id, attachment.matter_id
            )));
        };
        row.has_attachments = true;
        state.attachments.insert(attachment.id, attachment);
        Ok(())
    }

    pub async fn set_matter_status(&self, matter_id: i64, status: MatterStatus) {
        if let Some(row) = self.state.lock().await.matters.get_mut(&matter_id) {
            row.matter.status = status;
        }
    }

    pub async fn has_attachments(&self, matter_id: i64) -> Option<bool> {
        self.state
            .lock()
            .await
            .matters
            .get(&matter_id)
            .map(|row| row.has_attachments)
    }

    pub async fn attachment(&self, attachment_id: i64) -> Option<Attachment> {
        self.state
            .lock()
            .await
            .attachments
            .get(&attachment_id)
            .cloned()
    }

    pub async fn attachment_count(&self, matter_id: i64) -> i64 {
        self.state.lock().await.count_attachments(matter_id)
    }

    /// Make the `has_attachments` update fail on the next deletes.
    pub fn fail_flag_update(&self, fail: bool) {
        self.fail_flag_update.store(fail, Ordering::SeqCst);
    }

    /// Make every query fail as if the database were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl GazetteStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn find_active_user(&self, user_id: i64) -> Result<Option<Principal>, StoreError> {
        self.check_online()?;
        Ok(self
            .state
            .lock()
            .await
            .users
            .get(&user_id)
            .filter(|row| row.active)
            .map(|row| row.principal.clone()))
    }

    async fn find_attachment(
        &self,
        attachment_id: i64,
    ) -> Result<Option<AttachmentRecord>, StoreError> {
        self.check_online()?;
        let state = self.state.lock().await;
        let Some(attachment) = state.attachments.get(&attachment_id) else {
            return Ok(None);
        };
        let Some(row) = state.matters.get(&attachment.matter_id) else {
            return Err(StoreError::CorruptRow(format!(
                "attachment {attachment_id} has no parent matter"
            )));
        };
        Ok(Some(AttachmentRecord {
            attachment: attachment.clone(),
            matter: row.matter.clone(),
        }))
    }

    async fn delete_attachment(
        &self,
        attachment_id: i64,
        allowed: LifecycleGate,
    ) -> Result<DeleteOutcome, StoreError> {
        self.check_online()?;
        let mut state = self.state.lock().await;

        let Some(matter_id) = state
            .attachments
            .get(&attachment_id)
            .map(|attachment| attachment.matter_id)
        else {
            return Ok(DeleteOutcome::NotFound);
        };
        let Some(row) = state.matters.get(&matter_id) else {
            return Err(StoreError::CorruptRow(format!(
                "attachment {attachment_id} has no parent matter"
            )));
        };
        if let Err(reason) = allowed(&row.matter.status) {
            return Ok(DeleteOutcome::Rejected(reason));
        }

        // Work out the new state before touching anything so a failure
        // leaves the store untouched.
        let remaining = state.count_attachments(matter_id) - 1;
        let has_attachments = remaining > 0;
        if self.fail_flag_update.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "injected failure updating tem_anexos".to_string(),
            ));
        }

        state.attachments.remove(&attachment_id);
        if let Some(row) = state.matters.get_mut(&matter_id) {
            row.has_attachments = has_attachments;
        }

        Ok(DeleteOutcome::Deleted {
            matter_id,
            remaining,
            has_attachments,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }
}
