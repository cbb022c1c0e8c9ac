use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::activity::{Activity, ActivityStatus, Attachment, Question};
use crate::models::validation::{ValidationReport, ValidationWarning};
use crate::models::{ActivityDraft, SaveOutcome};
use crate::services::lock_policy::{AuthoringSession, LockedStructure, SessionRegistry};
use crate::services::validation_service::validate_draft;
use crate::services::AuthoringError;
use crate::storage::{
    ActivityPatch, ActivityStore, AttachmentStore, SubmissionStore, DRAFT_ATTACHMENT_PREFIX,
};

#[derive(Debug)]
pub enum PublishOutcome {
    Published(Activity),
    /// The draft is valid but carries advisory warnings; nothing was
    /// written. The caller must confirm explicitly to proceed.
    PendingConfirmation(Vec<ValidationWarning>),
}

/// Lifecycle Controller: the only component that writes activities to
/// persistent storage. All writes route through the session's lock
/// snapshot first.
pub struct ActivityService {
    activities: Arc<dyn ActivityStore>,
    submissions: Arc<dyn SubmissionStore>,
    attachments: Arc<dyn AttachmentStore>,
    sessions: Arc<SessionRegistry>,
}

impl ActivityService {
    pub fn new(
        activities: Arc<dyn ActivityStore>,
        submissions: Arc<dyn SubmissionStore>,
        attachments: Arc<dyn AttachmentStore>,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            activities,
            submissions,
            attachments,
            sessions,
        }
    }

    /// Opens an editing session. For existing activities the submission
    /// check runs here, exactly once; a submission arriving later in the
    /// session is not detected (accepted staleness).
    pub async fn open_session(
        &self,
        owner_id: &str,
        activity_id: Option<&str>,
    ) -> Result<(AuthoringSession, Option<Activity>), AuthoringError> {
        let (session, activity) = match activity_id {
            Some(id) => {
                let activity = self.reload(id).await?;
                let has_submissions = self.submissions.exists_for_activity(id).await?;
                let lock = if has_submissions {
                    tracing::info!(
                        activity_id = id,
                        "Submissions exist; structural fields frozen for this session"
                    );
                    Some(LockedStructure::capture(&activity))
                } else {
                    None
                };
                (
                    AuthoringSession::new(owner_id, Some(id.to_string()), lock),
                    Some(activity),
                )
            }
            None => (AuthoringSession::new(owner_id, None, None), None),
        };

        self.sessions.insert(session.clone()).await;
        Ok((session, activity))
    }

    pub fn validate(&self, draft: &ActivityDraft) -> ValidationReport {
        validate_draft(draft)
    }

    /// Explicit save. Storage failures propagate to the caller; the
    /// activity status never changes here.
    pub async fn save_draft(
        &self,
        session_id: Uuid,
        draft: ActivityDraft,
    ) -> Result<SaveOutcome, AuthoringError> {
        let session = self.require_session(session_id).await?;
        self.persist(&session, draft).await
    }

    /// Best-effort autosave. Storage failures are swallowed and logged;
    /// the draft stays staged on the session and the retry worker picks
    /// it up on the next tick.
    pub async fn autosave(
        &self,
        session_id: Uuid,
        draft: ActivityDraft,
    ) -> Result<(), AuthoringError> {
        let session = self.require_session(session_id).await?;
        self.sessions.stage_autosave(session_id, draft.clone()).await;

        match self.persist(&session, draft).await {
            Ok(_) => self.sessions.clear_autosave(session_id).await,
            Err(err) => tracing::warn!(
                session_id = %session_id,
                error = %err,
                "Autosave failed; draft staged for retry"
            ),
        }
        Ok(())
    }

    /// Re-attempts every staged autosave draft. Returns how many flushed.
    pub async fn flush_pending_autosaves(&self) -> usize {
        let staged = self.sessions.staged().await;
        let mut flushed = 0;
        for (session_id, draft) in staged {
            let Some(session) = self.sessions.get(session_id).await else {
                continue;
            };
            match self.persist(&session, draft).await {
                Ok(_) => {
                    self.sessions.clear_autosave(session_id).await;
                    flushed += 1;
                }
                Err(err) => tracing::warn!(
                    session_id = %session_id,
                    error = %err,
                    "Autosave retry failed; keeping draft staged"
                ),
            }
        }
        flushed
    }

    /// Publish gate: blocking errors fail, warnings pause for explicit
    /// confirmation without writing anything.
    pub async fn publish(
        &self,
        session_id: Uuid,
        draft: ActivityDraft,
    ) -> Result<PublishOutcome, AuthoringError> {
        let report = validate_draft(&draft);
        if !report.is_publishable() {
            return Err(AuthoringError::ValidationFailed(report.errors));
        }
        if report.has_warnings() {
            return Ok(PublishOutcome::PendingConfirmation(report.warnings));
        }
        self.publish_validated(session_id, draft)
            .await
            .map(PublishOutcome::Published)
    }

    /// Publish after the author confirmed the warnings. Blocking errors
    /// still refuse.
    pub async fn confirm_publish(
        &self,
        session_id: Uuid,
        draft: ActivityDraft,
    ) -> Result<Activity, AuthoringError> {
        let report = validate_draft(&draft);
        if !report.is_publishable() {
            return Err(AuthoringError::ValidationFailed(report.errors));
        }
        self.publish_validated(session_id, draft).await
    }

    pub async fn archive(&self, id: &str) -> Result<Activity, AuthoringError> {
        self.transition(id, ActivityStatus::Archived).await
    }

    pub async fn unarchive(&self, id: &str) -> Result<Activity, AuthoringError> {
        self.transition(id, ActivityStatus::Draft).await
    }

    /// Version fork: a brand-new draft derived from the original, which
    /// is left entirely unmodified. The designated escape hatch when a
    /// locked activity's assessment needs to change, so the lock policy
    /// is deliberately not consulted here.
    pub async fn fork(&self, id: &str) -> Result<Activity, AuthoringError> {
        let original = self.reload(id).await?;
        let next_version = original.version() + 1;

        let mut content = original.content.clone();
        content.advanced_settings.version = next_version;
        content.advanced_settings.previous_activity_id = Some(original.id.clone());

        let now = Utc::now();
        let mut forked = Activity {
            id: String::new(),
            title: format!("{} - Version {}", original.title, next_version),
            description: original.description.clone(),
            author_type: original.author_type,
            max_score: original.max_score,
            content,
            status: ActivityStatus::Draft,
            owner_id: original.owner_id.clone(),
            due_date: original.due_date,
            created_at: now,
            updated_at: now,
        };
        forked.id = self.activities.insert(&forked).await?;

        tracing::info!(
            source = %original.id,
            fork = %forked.id,
            version = next_version,
            "Forked activity"
        );
        Ok(forked)
    }

    pub async fn get(&self, id: &str) -> Result<Activity, AuthoringError> {
        self.reload(id).await
    }

    /// Stores an upload under the draft prefix. The metadata goes into the
    /// draft's `content.attachments`; the file is relocated under the
    /// activity id on the first save.
    pub async fn upload_attachment(
        &self,
        name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<Attachment, AuthoringError> {
        let attachment = self.attachments.upload(name, bytes, mime_type).await?;
        tracing::info!(
            name = attachment.name.as_str(),
            path = attachment.path.as_str(),
            size = attachment.size,
            "Stored draft attachment"
        );
        Ok(attachment)
    }

    async fn publish_validated(
        &self,
        session_id: Uuid,
        draft: ActivityDraft,
    ) -> Result<Activity, AuthoringError> {
        let session = self.require_session(session_id).await?;

        // A refused publish writes nothing, so the transition is checked
        // before the draft is persisted. Unbound sessions create a fresh
        // draft, which can always publish.
        if let Some(id) = &session.activity_id {
            let current = self.reload(id).await?;
            if !current.status.can_transition_to(ActivityStatus::Published) {
                return Err(AuthoringError::InvalidTransition {
                    from: current.status,
                    to: ActivityStatus::Published,
                });
            }
        }

        let saved = self.persist(&session, draft).await?.activity;

        self.activities
            .update(
                &saved.id,
                ActivityPatch {
                    status: Some(ActivityStatus::Published),
                    updated_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(activity_id = %saved.id, "Activity published");
        self.reload(&saved.id).await
    }

    async fn transition(
        &self,
        id: &str,
        to: ActivityStatus,
    ) -> Result<Activity, AuthoringError> {
        let activity = self.reload(id).await?;
        if !activity.status.can_transition_to(to) {
            return Err(AuthoringError::InvalidTransition {
                from: activity.status,
                to,
            });
        }

        self.activities
            .update(
                id,
                ActivityPatch {
                    status: Some(to),
                    updated_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(activity_id = id, status = to.as_str(), "Activity status changed");
        self.reload(id).await
    }

    /// The single write path for drafts. Structural fields route through
    /// the session's lock snapshot before anything reaches storage.
    async fn persist(
        &self,
        session: &AuthoringSession,
        mut draft: ActivityDraft,
    ) -> Result<SaveOutcome, AuthoringError> {
        let structure_restored = match (&session.lock, &session.activity_id) {
            (Some(lock), Some(id)) => {
                let changed = lock.restore_into(&mut draft);
                if changed {
                    tracing::warn!(
                        activity_id = id.as_str(),
                        "Discarded attempted structural edit on a locked activity"
                    );
                }
                changed
            }
            _ => false,
        };

        // Storage only ever holds a single correct alternative per question.
        for question in &mut draft.content.questions {
            if let Question::Closed(closed) = question {
                closed.enforce_single_correct();
            }
        }

        match &session.activity_id {
            Some(id) => {
                let current = self.reload(id).await?;
                // Lifecycle bookkeeping stays server-owned.
                draft.content.advanced_settings.version = current.version();
                draft.content.advanced_settings.previous_activity_id =
                    current.previous_activity_id().map(str::to_string);

                self.activities
                    .update(
                        id,
                        ActivityPatch {
                            title: Some(draft.title),
                            description: Some(draft.description),
                            author_type: Some(draft.author_type),
                            max_score: Some(draft.max_score),
                            content: Some(draft.content),
                            due_date: Some(draft.due_date),
                            status: None,
                            updated_at: Some(Utc::now()),
                        },
                    )
                    .await?;

                let activity = self.reload(id).await?;
                Ok(SaveOutcome {
                    activity,
                    structure_restored,
                })
            }
            None => {
                let now = Utc::now();
                let mut activity = Activity {
                    id: String::new(),
                    title: draft.title,
                    description: draft.description,
                    author_type: draft.author_type,
                    max_score: draft.max_score,
                    content: draft.content,
                    status: ActivityStatus::Draft,
                    owner_id: session.owner_id.clone(),
                    due_date: draft.due_date,
                    created_at: now,
                    updated_at: now,
                };
                activity.content.advanced_settings.version = 1;
                activity.content.advanced_settings.previous_activity_id = None;

                let id = self.activities.insert(&activity).await?;
                activity.id = id.clone();
                self.sessions.bind_activity(session.id, &id).await;

                let mut relocated = false;
                for attachment in &mut activity.content.attachments {
                    if attachment.path.starts_with(DRAFT_ATTACHMENT_PREFIX) {
                        attachment.path =
                            self.attachments.move_draft(&attachment.path, &id).await?;
                        relocated = true;
                    }
                }
                if relocated {
                    self.activities
                        .update(
                            &id,
                            ActivityPatch {
                                content: Some(activity.content.clone()),
                                updated_at: Some(now),
                                ..Default::default()
                            },
                        )
                        .await?;
                }

                tracing::info!(activity_id = %id, "Created activity draft");
                Ok(SaveOutcome {
                    activity,
                    structure_restored,
                })
            }
        }
    }

    async fn reload(&self, id: &str) -> Result<Activity, AuthoringError> {
        self.activities
            .get_by_id(id)
            .await?
            .ok_or_else(|| AuthoringError::NotFound(id.to_string()))
    }

    async fn require_session(&self, id: Uuid) -> Result<AuthoringSession, AuthoringError> {
        self.sessions
            .get(id)
            .await
            .ok_or(AuthoringError::SessionNotFound(id))
    }
}
