use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::activity::{Activity, AdvancedSettings, Question};
use crate::models::taxonomy::PersistedType;
use crate::models::ActivityDraft;

/// Frozen snapshot of the structural fields, taken from the persisted
/// record at session open when submissions already reference the
/// activity. While a session holds one of these, every write substitutes
/// the frozen values for whatever the author attempted to change.
#[derive(Debug, Clone, PartialEq)]
pub struct LockedStructure {
    pub persisted_type: PersistedType,
    pub max_score: f64,
    pub questions: Vec<Question>,
    pub advanced_settings: AdvancedSettings,
}

impl LockedStructure {
    /// Captures the snapshot from the persisted record, never from
    /// in-memory edits.
    pub fn capture(persisted: &Activity) -> Self {
        Self {
            persisted_type: persisted.persisted_type(),
            max_score: persisted.max_score,
            questions: persisted.content.questions.clone(),
            advanced_settings: persisted.content.advanced_settings.clone(),
        }
    }

    /// Overwrites the structural fields of the draft with the frozen
    /// values. Returns true when this changed what would have been
    /// written, so callers can surface the discarded edit.
    pub fn restore_into(&self, draft: &mut ActivityDraft) -> bool {
        let mut changed = false;

        if draft.author_type.to_persisted() != self.persisted_type {
            draft.author_type = self.persisted_type.to_author();
            changed = true;
        }
        if draft.max_score != self.max_score {
            draft.max_score = self.max_score;
            changed = true;
        }
        if draft.content.questions != self.questions {
            draft.content.questions = self.questions.clone();
            changed = true;
        }
        if draft.content.advanced_settings != self.advanced_settings {
            draft.content.advanced_settings = self.advanced_settings.clone();
            changed = true;
        }

        changed
    }
}

/// One author editing one activity. The lock snapshot is evaluated once,
/// here, at open time; it is deliberately not re-checked afterwards, so a
/// submission arriving mid-session goes unnoticed until the next session.
#[derive(Debug, Clone)]
pub struct AuthoringSession {
    pub id: Uuid,
    pub owner_id: String,
    /// None until the first save of a brand-new activity assigns an id.
    pub activity_id: Option<String>,
    pub lock: Option<LockedStructure>,
    /// Draft staged by a failed or pending autosave, retried on the next
    /// worker tick.
    pub pending_autosave: Option<ActivityDraft>,
    pub opened_at: DateTime<Utc>,
}

impl AuthoringSession {
    pub fn new(owner_id: &str, activity_id: Option<String>, lock: Option<LockedStructure>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            activity_id,
            lock,
            pending_autosave: None,
            opened_at: Utc::now(),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }
}

/// Registry of open editing sessions, shared between the handlers and the
/// autosave retry worker.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, AuthoringSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: AuthoringSession) {
        self.sessions.write().await.insert(session.id, session);
    }

    pub async fn get(&self, id: Uuid) -> Option<AuthoringSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Binds a session to the id storage assigned on first insert.
    pub async fn bind_activity(&self, id: Uuid, activity_id: &str) {
        if let Some(session) = self.sessions.write().await.get_mut(&id) {
            session.activity_id = Some(activity_id.to_string());
        }
    }

    pub async fn stage_autosave(&self, id: Uuid, draft: ActivityDraft) {
        if let Some(session) = self.sessions.write().await.get_mut(&id) {
            session.pending_autosave = Some(draft);
        }
    }

    pub async fn clear_autosave(&self, id: Uuid) {
        if let Some(session) = self.sessions.write().await.get_mut(&id) {
            session.pending_autosave = None;
        }
    }

    /// Sessions with a staged draft, for the retry worker.
    pub async fn staged(&self) -> Vec<(Uuid, ActivityDraft)> {
        self.sessions
            .read()
            .await
            .values()
            .filter_map(|s| s.pending_autosave.clone().map(|d| (s.id, d)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::LockedStructure;
    use crate::models::activity::{
        ActivityContent, AdvancedSettings, Alternative, ClosedQuestion, Difficulty, Question,
    };
    use crate::models::taxonomy::{AuthorType, PersistedType};
    use crate::models::ActivityDraft;

    fn question(id: &str) -> Question {
        Question::Closed(ClosedQuestion {
            id: id.to_string(),
            text: "What is 2+2?".to_string(),
            points: Some(5.0),
            alternatives: vec![
                Alternative {
                    id: "a".to_string(),
                    letter: "A".to_string(),
                    text: "3".to_string(),
                    is_correct: false,
                },
                Alternative {
                    id: "b".to_string(),
                    letter: "B".to_string(),
                    text: "4".to_string(),
                    is_correct: true,
                },
            ],
            explanation: None,
            hint: None,
        })
    }

    fn draft(questions: Vec<Question>) -> ActivityDraft {
        ActivityDraft {
            title: "Quiz 1".to_string(),
            description: "Short quiz on basics".to_string(),
            author_type: AuthorType::Closed,
            max_score: 10.0,
            due_date: None,
            content: ActivityContent {
                subject: "math".to_string(),
                tags: Vec::new(),
                difficulty: Difficulty::Easy,
                estimated_time_minutes: None,
                questions,
                attachments: Vec::new(),
                advanced_settings: AdvancedSettings::default(),
            },
        }
    }

    fn snapshot() -> LockedStructure {
        LockedStructure {
            persisted_type: PersistedType::Objective,
            max_score: 10.0,
            questions: vec![question("q1"), question("q2")],
            advanced_settings: AdvancedSettings::default(),
        }
    }

    #[test]
    fn untouched_structure_is_not_reported_as_restored() {
        let lock = snapshot();
        let mut draft = draft(vec![question("q1"), question("q2")]);
        assert!(!lock.restore_into(&mut draft));
    }

    #[test]
    fn removed_question_is_put_back() {
        let lock = snapshot();
        let mut draft = draft(vec![question("q1")]);

        assert!(lock.restore_into(&mut draft));
        assert_eq!(draft.content.questions.len(), 2);
    }

    #[test]
    fn type_and_score_changes_are_substituted() {
        let lock = snapshot();
        let mut draft = draft(vec![question("q1"), question("q2")]);
        draft.author_type = AuthorType::Open;
        draft.max_score = 20.0;

        assert!(lock.restore_into(&mut draft));
        assert_eq!(draft.author_type, AuthorType::Closed);
        assert_eq!(draft.max_score, 10.0);
    }
}
