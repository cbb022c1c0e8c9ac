use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::activity::{Activity, ActivityContent, ActivityStatus, Attachment};
use crate::models::taxonomy::{AuthorType, UnknownTypeError};

pub mod fs;
pub mod memory;
pub mod mongo;

/// Path prefix for attachments uploaded before the activity has an id.
pub const DRAFT_ATTACHMENT_PREFIX: &str = "drafts/";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend failure: {0}")]
    Backend(#[from] anyhow::Error),
    #[error(transparent)]
    UnknownType(#[from] UnknownTypeError),
}

/// Partial update for an activity row. `None` fields are left untouched,
/// so a caller never has to rewrite the whole record to change one field.
/// `created_at` is never part of a patch and is preserved across updates.
#[derive(Debug, Clone, Default)]
pub struct ActivityPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author_type: Option<AuthorType>,
    pub max_score: Option<f64>,
    pub content: Option<ActivityContent>,
    pub status: Option<ActivityStatus>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Inserts a new row and returns the storage-assigned id. The id on
    /// the passed activity is ignored.
    async fn insert(&self, activity: &Activity) -> Result<String, StoreError>;

    async fn update(&self, id: &str, patch: ActivityPatch) -> Result<(), StoreError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Activity>, StoreError>;
}

/// Read-only view of the external submission store. This subsystem never
/// writes submissions; it only asks whether any exist for an activity.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn exists_for_activity(&self, activity_id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<Attachment, StoreError>;

    /// Relocates a draft upload under its final activity id and returns
    /// the new path.
    async fn move_draft(&self, draft_path: &str, activity_id: &str)
        -> Result<String, StoreError>;
}
