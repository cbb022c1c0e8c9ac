use anyhow::{anyhow, Context};
use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

use crate::models::activity::Attachment;
use crate::storage::{AttachmentStore, StoreError, DRAFT_ATTACHMENT_PREFIX};

/// Local filesystem attachment store. Draft uploads land under
/// `<root>/drafts/<uuid>/` and are renamed under
/// `<root>/activities/<id>/` once the activity has an id.
pub struct LocalAttachmentStore {
    root: PathBuf,
}

impl LocalAttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn absolute(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

#[async_trait]
impl AttachmentStore for LocalAttachmentStore {
    async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<Attachment, StoreError> {
        let file_name = sanitize_file_name(name);
        let relative = format!("{}{}/{}", DRAFT_ATTACHMENT_PREFIX, Uuid::new_v4(), file_name);
        let target = self.absolute(&relative);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create attachment directory")?;
        }
        let size = bytes.len() as u64;
        tokio::fs::write(&target, bytes)
            .await
            .with_context(|| format!("Failed to write attachment {}", relative))?;

        Ok(Attachment {
            name: name.to_string(),
            url: format!("file://{}", target.display()),
            path: relative,
            size,
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
        let relative = format!("activities/{}/{}", activity_id, file_name);
        let target = self.absolute(&relative);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create attachment directory")?;
        }
        tokio::fs::rename(self.absolute(draft_path), &target)
            .await
            .with_context(|| format!("Failed to relocate attachment {}", draft_path))?;

        Ok(relative)
    }
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "attachment".to_string()
    } else {
        cleaned
    }
}
