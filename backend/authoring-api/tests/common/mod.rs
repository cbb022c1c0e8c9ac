#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use authoring_api::config::Config;
use authoring_api::models::activity::{
    Activity, ActivityContent, AdvancedSettings, Alternative, ClosedQuestion, Difficulty,
    Question,
};
use authoring_api::models::taxonomy::AuthorType;
use authoring_api::models::ActivityDraft;
use authoring_api::services::AppState;
use authoring_api::storage::memory::{
    InMemoryActivityStore, InMemoryAttachmentStore, InMemorySubmissionStore,
};
use authoring_api::storage::{ActivityPatch, ActivityStore, StoreError};

pub struct TestApp {
    pub state: Arc<AppState>,
    pub activities: Arc<InMemoryActivityStore>,
    pub submissions: Arc<InMemorySubmissionStore>,
    pub attachments: Arc<InMemoryAttachmentStore>,
}

pub fn test_config() -> Config {
    Config {
        mongo_uri: "mongodb://unused".to_string(),
        mongo_database: "unused".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        autosave_interval_secs: 60,
        attachments_root: "./target/test-attachments".to_string(),
    }
}

pub fn create_test_app() -> TestApp {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let activities = Arc::new(InMemoryActivityStore::new());
    let submissions = Arc::new(InMemorySubmissionStore::new());
    let attachments = Arc::new(InMemoryAttachmentStore::new());

    let state = Arc::new(AppState::with_stores(
        test_config(),
        activities.clone(),
        submissions.clone(),
        attachments.clone(),
    ));

    TestApp {
        state,
        activities,
        submissions,
        attachments,
    }
}

/// Wraps the in-memory store and fails writes on demand, to exercise the
/// failure semantics of explicit save versus autosave.
pub struct FlakyActivityStore {
    inner: InMemoryActivityStore,
    fail_writes: AtomicBool,
}

impl FlakyActivityStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryActivityStore::new(),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Backend(anyhow!("injected storage outage")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ActivityStore for FlakyActivityStore {
    async fn insert(&self, activity: &Activity) -> Result<String, StoreError> {
        self.check()?;
        self.inner.insert(activity).await
    }

    async fn update(&self, id: &str, patch: ActivityPatch) -> Result<(), StoreError> {
        self.check()?;
        self.inner.update(id, patch).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Activity>, StoreError> {
        self.inner.get_by_id(id).await
    }
}

/// Test app wired onto a [`FlakyActivityStore`].
pub fn flaky_app() -> (Arc<AppState>, Arc<FlakyActivityStore>) {
    let store = Arc::new(FlakyActivityStore::new());
    let state = Arc::new(AppState::with_stores(
        test_config(),
        store.clone(),
        Arc::new(InMemorySubmissionStore::new()),
        Arc::new(InMemoryAttachmentStore::new()),
    ));
    (state, store)
}

pub fn closed_question(id: &str, text: &str, points: f64) -> Question {
    Question::Closed(ClosedQuestion {
        id: id.to_string(),
        text: text.to_string(),
        points: Some(points),
        alternatives: vec![
            Alternative {
                id: format!("{}-a", id),
                letter: "A".to_string(),
                text: "3".to_string(),
                is_correct: false,
            },
            Alternative {
                id: format!("{}-b", id),
                letter: "B".to_string(),
                text: "4".to_string(),
                is_correct: true,
            },
            Alternative {
                id: format!("{}-c", id),
                letter: "C".to_string(),
                text: "5".to_string(),
                is_correct: false,
            },
        ],
        explanation: None,
        hint: None,
    })
}

/// A draft that validates clean: "Quiz 1", one closed question worth the
/// whole maximum score, tags and estimated time filled in.
pub fn quiz_draft() -> ActivityDraft {
    ActivityDraft {
        title: "Quiz 1".to_string(),
        description: "Short quiz on basics".to_string(),
        author_type: AuthorType::Closed,
        max_score: 10.0,
        due_date: None,
        content: ActivityContent {
            subject: "math".to_string(),
            tags: vec!["arithmetic".to_string()],
            difficulty: Difficulty::Easy,
            estimated_time_minutes: Some(15),
            questions: vec![closed_question("q1", "What is 2+2?", 10.0)],
            attachments: Vec::new(),
            advanced_settings: AdvancedSettings::default(),
        },
    }
}
