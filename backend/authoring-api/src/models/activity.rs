use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::taxonomy::{AuthorType, PersistedType};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Draft,
    Published,
    Archived,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Draft => "draft",
            ActivityStatus::Published => "published",
            ActivityStatus::Archived => "archived",
        }
    }

    /// Saves never change status; publish, archive and unarchive are the
    /// only transitions. Nothing is ever deleted.
    pub fn can_transition_to(&self, next: ActivityStatus) -> bool {
        matches!(
            (self, next),
            (ActivityStatus::Draft, ActivityStatus::Published)
                | (ActivityStatus::Published, ActivityStatus::Archived)
                | (ActivityStatus::Archived, ActivityStatus::Draft)
        )
    }
}

impl FromStr for ActivityStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "draft" => Ok(ActivityStatus::Draft),
            "published" => Ok(ActivityStatus::Published),
            "archived" => Ok(ActivityStatus::Archived),
            _ => Err(format!("Invalid activity status: {}", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    VeryHard,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alternative {
    pub id: String,
    pub letter: String,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RubricCriterion {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub max_points: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenQuestion {
    pub id: String,
    pub text: String,
    pub points: Option<f64>,
    #[serde(default)]
    pub max_lines: Option<u32>,
    #[serde(default)]
    pub max_characters: Option<u32>,
    #[serde(default)]
    pub rubric: Vec<RubricCriterion>,
    #[serde(default)]
    pub expected_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClosedQuestion {
    pub id: String,
    pub text: String,
    pub points: Option<f64>,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl ClosedQuestion {
    /// Marks the given alternative as the single correct one, clearing the
    /// flag on all siblings first. At most one alternative may carry
    /// `is_correct` at any time.
    pub fn set_correct_alternative(&mut self, alternative_id: &str) -> Result<(), String> {
        if !self.alternatives.iter().any(|a| a.id == alternative_id) {
            return Err(format!(
                "Alternative {} does not belong to question {}",
                alternative_id, self.id
            ));
        }
        for alternative in &mut self.alternatives {
            alternative.is_correct = alternative.id == alternative_id;
        }
        Ok(())
    }

    pub fn correct_alternative(&self) -> Option<&Alternative> {
        self.alternatives.iter().find(|a| a.is_correct)
    }

    /// Clears every `is_correct` flag after the first one, so at most one
    /// alternative stays marked no matter what the client sent.
    pub fn enforce_single_correct(&mut self) {
        let mut seen = false;
        for alternative in &mut self.alternatives {
            if alternative.is_correct {
                if seen {
                    alternative.is_correct = false;
                }
                seen = true;
            }
        }
    }
}

/// One gradable item. Open questions are answered as free text and graded
/// against a rubric; closed questions carry multiple-choice alternatives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Question {
    Open(OpenQuestion),
    Closed(ClosedQuestion),
}

impl Question {
    pub fn id(&self) -> &str {
        match self {
            Question::Open(q) => &q.id,
            Question::Closed(q) => &q.id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Question::Open(q) => &q.text,
            Question::Closed(q) => &q.text,
        }
    }

    pub fn points(&self) -> Option<f64> {
        match self {
            Question::Open(q) => q.points,
            Question::Closed(q) => q.points,
        }
    }
}

/// Attachment metadata only; the bytes live in the external attachment
/// store. Draft uploads sit under a drafts/ prefix until first persist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub name: String,
    pub url: String,
    pub path: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LatePenaltyType {
    Percentage,
    Points,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttemptScoring {
    Best,
    Last,
    Average,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlagiarismSensitivity {
    Low,
    Medium,
    High,
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdvancedSettings {
    #[serde(default)]
    pub allow_late_submission: bool,
    #[serde(default)]
    pub late_penalty_type: Option<LatePenaltyType>,
    #[serde(default)]
    pub late_penalty_value: Option<f64>,
    #[serde(default)]
    pub max_late_days: Option<u32>,
    #[serde(default)]
    pub allow_multiple_attempts: bool,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub attempt_scoring: Option<AttemptScoring>,
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
    #[serde(default)]
    pub show_score_immediately: bool,
    #[serde(default)]
    pub show_answer_key: bool,
    #[serde(default)]
    pub release_answer_after_deadline: bool,
    #[serde(default)]
    pub plagiarism_enabled: bool,
    #[serde(default)]
    pub plagiarism_sensitivity: Option<PlagiarismSensitivity>,
    #[serde(default)]
    pub plagiarism_min_originality: Option<f64>,
    #[serde(default)]
    pub shuffle_questions: bool,
    #[serde(default)]
    pub shuffle_alternatives: bool,
    // Lifecycle bookkeeping, written by version forks, never user-editable.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub previous_activity_id: Option<String>,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            allow_late_submission: false,
            late_penalty_type: None,
            late_penalty_value: None,
            max_late_days: None,
            allow_multiple_attempts: false,
            max_attempts: None,
            attempt_scoring: None,
            time_limit_minutes: None,
            show_score_immediately: false,
            show_answer_key: false,
            release_answer_after_deadline: false,
            plagiarism_enabled: false,
            plagiarism_sensitivity: None,
            plagiarism_min_originality: None,
            shuffle_questions: false,
            shuffle_alternatives: false,
            version: 1,
            previous_activity_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityContent {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub estimated_time_minutes: Option<u32>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub advanced_settings: AdvancedSettings,
}

/// The central entity: a gradable unit of work authored by a teacher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author_type: AuthorType,
    pub max_score: f64,
    pub content: ActivityContent,
    pub status: ActivityStatus,
    pub owner_id: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    /// Storage-side classification, always derived through the taxonomy
    /// mapper and never independently settable.
    pub fn persisted_type(&self) -> PersistedType {
        self.author_type.to_persisted()
    }

    pub fn version(&self) -> u32 {
        self.content.advanced_settings.version
    }

    pub fn previous_activity_id(&self) -> Option<&str> {
        self.content
            .advanced_settings
            .previous_activity_id
            .as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ActivityStatus, Alternative, ClosedQuestion, Difficulty, OpenQuestion, Question,
    };

    fn closed_question() -> ClosedQuestion {
        ClosedQuestion {
            id: "q1".to_string(),
            text: "What is 2+2?".to_string(),
            points: Some(10.0),
            alternatives: vec![
                Alternative {
                    id: "a".to_string(),
                    letter: "A".to_string(),
                    text: "3".to_string(),
                    is_correct: true,
                },
                Alternative {
                    id: "b".to_string(),
                    letter: "B".to_string(),
                    text: "4".to_string(),
                    is_correct: false,
                },
            ],
            explanation: None,
            hint: None,
        }
    }

    #[test]
    fn activity_status_transitions() {
        assert!(ActivityStatus::Draft.can_transition_to(ActivityStatus::Published));
        assert!(ActivityStatus::Published.can_transition_to(ActivityStatus::Archived));
        assert!(ActivityStatus::Archived.can_transition_to(ActivityStatus::Draft));
        assert!(!ActivityStatus::Draft.can_transition_to(ActivityStatus::Archived));
        assert!(!ActivityStatus::Published.can_transition_to(ActivityStatus::Draft));
    }

    #[test]
    fn marking_correct_clears_previous_flag() {
        let mut question = closed_question();
        question.set_correct_alternative("b").expect("b exists");

        let correct: Vec<_> = question
            .alternatives
            .iter()
            .filter(|a| a.is_correct)
            .collect();
        assert_eq!(correct.len(), 1);
        assert_eq!(correct[0].id, "b");
    }

    #[test]
    fn enforcing_single_correct_keeps_the_first_flag() {
        let mut question = closed_question();
        for alternative in &mut question.alternatives {
            alternative.is_correct = true;
        }

        question.enforce_single_correct();
        let correct: Vec<_> = question
            .alternatives
            .iter()
            .filter(|a| a.is_correct)
            .collect();
        assert_eq!(correct.len(), 1);
        assert_eq!(correct[0].id, "a");
    }

    #[test]
    fn marking_unknown_alternative_fails() {
        let mut question = closed_question();
        assert!(question.set_correct_alternative("z").is_err());
        // The previous flag is untouched on failure.
        assert_eq!(question.correct_alternative().map(|a| a.id.as_str()), Some("a"));
    }

    #[test]
    fn question_union_is_tagged_by_kind() {
        let open = Question::Open(OpenQuestion {
            id: "q2".to_string(),
            text: "Explain photosynthesis".to_string(),
            points: Some(5.0),
            max_lines: Some(20),
            max_characters: None,
            rubric: Vec::new(),
            expected_answer: None,
        });
        let json = serde_json::to_value(&open).expect("serializes");
        assert_eq!(json["kind"], "open");

        let closed = Question::Closed(closed_question());
        let json = serde_json::to_value(&closed).expect("serializes");
        assert_eq!(json["kind"], "closed");

        let back: Question = serde_json::from_value(json).expect("deserializes");
        assert_eq!(back.id(), "q1");
        assert_eq!(back.points(), Some(10.0));
    }

    #[test]
    fn difficulty_uses_snake_case() {
        let json = serde_json::to_string(&Difficulty::VeryHard).expect("serializes");
        assert_eq!(json, "\"very_hard\"");
    }
}
