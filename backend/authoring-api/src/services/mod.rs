use mongodb::{Client as MongoClient, Database};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::models::activity::ActivityStatus;
use crate::models::taxonomy::UnknownTypeError;
use crate::models::validation::ValidationError;
use crate::storage::fs::LocalAttachmentStore;
use crate::storage::mongo::{MongoActivityStore, MongoSubmissionStore};
use crate::storage::{ActivityStore, AttachmentStore, StoreError, SubmissionStore};

pub mod activity_service;
pub mod autosave;
pub mod lock_policy;
pub mod validation_service;

use activity_service::ActivityService;
use lock_policy::SessionRegistry;

#[derive(Debug, Error)]
pub enum AuthoringError {
    #[error("Activity not found: {0}")]
    NotFound(String),
    #[error("Editing session not found: {0}")]
    SessionNotFound(Uuid),
    #[error("Invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: ActivityStatus,
        to: ActivityStatus,
    },
    #[error("Publication blocked by {} validation error(s)", .0.len())]
    ValidationFailed(Vec<ValidationError>),
    #[error(transparent)]
    UnknownType(#[from] UnknownTypeError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub struct AppState {
    pub config: Config,
    /// Present only when running against MongoDB; the health check pings it.
    pub mongo: Option<Database>,
    pub activities: Arc<dyn ActivityStore>,
    pub submissions: Arc<dyn SubmissionStore>,
    pub attachments: Arc<dyn AttachmentStore>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub async fn new(config: Config, mongo_client: MongoClient) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);

        tracing::info!("Verifying MongoDB connection...");
        mongo
            .run_command(mongodb::bson::doc! { "ping": 1 })
            .await?;
        tracing::info!("MongoDB connection established");

        Ok(Self {
            activities: Arc::new(MongoActivityStore::new(mongo.clone())),
            submissions: Arc::new(MongoSubmissionStore::new(mongo.clone())),
            attachments: Arc::new(LocalAttachmentStore::new(config.attachments_root.clone())),
            sessions: Arc::new(SessionRegistry::new()),
            mongo: Some(mongo),
            config,
        })
    }

    /// Wires explicit store implementations. Used by the tests and by
    /// anything that runs without a MongoDB instance.
    pub fn with_stores(
        config: Config,
        activities: Arc<dyn ActivityStore>,
        submissions: Arc<dyn SubmissionStore>,
        attachments: Arc<dyn AttachmentStore>,
    ) -> Self {
        Self {
            config,
            mongo: None,
            activities,
            submissions,
            attachments,
            sessions: Arc::new(SessionRegistry::new()),
        }
    }

    pub fn activity_service(&self) -> ActivityService {
        ActivityService::new(
            self.activities.clone(),
            self.submissions.clone(),
            self.attachments.clone(),
            self.sessions.clone(),
        )
    }
}
