use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod activity;
pub mod taxonomy;
pub mod validation;

use activity::{Activity, ActivityContent};
use taxonomy::AuthorType;
use validation::ValidationWarning;

/// Editor-side shape of an activity: everything the author controls,
/// nothing storage assigns. Lifecycle bookkeeping inside
/// `content.advanced_settings` (`version`, `previous_activity_id`) is
/// overwritten from the persisted record on every save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityDraft {
    pub title: String,
    pub description: String,
    pub author_type: AuthorType,
    pub max_score: f64,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub content: ActivityContent,
}

#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    #[serde(default)]
    pub activity_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OpenSessionResponse {
    pub session_id: Uuid,
    /// True when submissions already reference the activity and the
    /// structural fields are frozen for this session.
    pub locked: bool,
    pub activity: Option<Activity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub activity: Activity,
    /// True when the structural lock displaced something the author
    /// attempted to change; the write went through with the frozen values.
    pub structure_restored: bool,
}

#[derive(Debug, Serialize)]
pub struct PendingConfirmationResponse {
    pub pending_confirmation: bool,
    pub warnings: Vec<ValidationWarning>,
}
