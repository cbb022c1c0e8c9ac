use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::activity::{Activity, Attachment};
use crate::storage::{
    ActivityPatch, ActivityStore, AttachmentStore, StoreError, SubmissionStore,
    DRAFT_ATTACHMENT_PREFIX,
};

/// In-memory activity store. Backs the integration tests and local
/// development without a MongoDB instance; ids use the same hex shape the
/// Mongo store assigns.
#[derive(Default)]
pub struct InMemoryActivityStore {
    rows: RwLock<HashMap<String, Activity>>,
}

impl InMemoryActivityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityStore for InMemoryActivityStore {
    async fn insert(&self, activity: &Activity) -> Result<String, StoreError> {
        let id = ObjectId::new().to_hex();
        let mut row = activity.clone();
        row.id = id.clone();
        self.rows.write().await.insert(id.clone(), row);
        Ok(id)
    }

    async fn update(&self, id: &str, patch: ActivityPatch) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(id)
            .ok_or_else(|| StoreError::Backend(anyhow!("Activity not found: {}", id)))?;

        if let Some(title) = patch.title {
            row.title = title;
        }
        if let Some(description) = patch.description {
            row.description = description;
        }
        if let Some(author_type) = patch.author_type {
            row.author_type = author_type;
        }
        if let Some(max_score) = patch.max_score {
            row.max_score = max_score;
        }
        if let Some(content) = patch.content {
            row.content = content;
        }
        if let Some(status) = patch.status {
            row.status = status;
        }
        if let Some(due_date) = patch.due_date {
            row.due_date = due_date;
        }
        row.updated_at = patch.updated_at.unwrap_or_else(Utc::now);
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Activity>, StoreError> {
        Ok(self.rows.read().await.get(id).cloned())
    }
}

/// In-memory stand-in for the external submission store. Tests mark an
/// activity as graded with [`record_submission`](Self::record_submission).
#[derive(Default)]
pub struct InMemorySubmissionStore {
    graded: RwLock<HashSet<String>>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_submission(&self, activity_id: &str) {
        self.graded.write().await.insert(activity_id.to_string());
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn exists_for_activity(&self, activity_id: &str) -> Result<bool, StoreError> {
        Ok(self.graded.read().await.contains(activity_id))
    }
}

/// In-memory attachment store; keeps metadata only and records the
/// draft-to-activity relocations it performed.
#[derive(Default)]
pub struct InMemoryAttachmentStore {
    moves: RwLock<Vec<(String, String)>>,
}

impl InMemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn moves(&self) -> Vec<(String, String)> {
        self.moves.read().await.clone()
    }
}

#[async_trait]
impl AttachmentStore for InMemoryAttachmentStore {
    async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<Attachment, StoreError> {
        let path = format!("{}{}/{}", DRAFT_ATTACHMENT_PREFIX, Uuid::new_v4(), name);
        Ok(Attachment {
            name: name.to_string(),
            url: format!("memory://{}", path),
            path,
            size: bytes.len() as u64,
            mime_type: mime_type.to_string(),
        })
    }

    async fn move_draft(
        &self,
        draft_path: &str,
        activity_id: &str,
    ) -> Result<String, StoreError> {
        let file_name = draft_path
            .rsplit('/')
            .next()
            .ok_or_else(|| StoreError::Backend(anyhow!("Empty attachment path")))?;
        let new_path = format!("activities/{}/{}", activity_id, file_name);
        self.moves
            .write()
            .await
            .push((draft_path.to_string(), new_path.clone()));
        Ok(new_path)
    }
}
