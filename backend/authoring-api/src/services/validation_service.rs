use crate::models::activity::Question;
use crate::models::validation::{
    ValidationErrorCode, ValidationReport, ValidationWarningCode,
};
use crate::models::ActivityDraft;

const MIN_TITLE_CHARS: usize = 3;
const MIN_DESCRIPTION_CHARS: usize = 10;
const MIN_QUESTION_TEXT_CHARS: usize = 5;
const MIN_ALTERNATIVES: usize = 2;
/// Floating-point tolerance for the points-vs-max-score comparison.
const POINTS_TOLERANCE: f64 = 0.1;

/// Computes the blocking errors and advisory warnings for a draft.
/// Never mutates its input; publish is gated on `errors` being empty and
/// warnings require explicit confirmation by the caller.
pub fn validate_draft(draft: &ActivityDraft) -> ValidationReport {
    let mut report = ValidationReport::default();

    if draft.title.chars().count() < MIN_TITLE_CHARS {
        report.error(
            "title",
            ValidationErrorCode::MissingTitle,
            format!("Title must have at least {} characters", MIN_TITLE_CHARS),
        );
    }

    if draft.description.chars().count() < MIN_DESCRIPTION_CHARS {
        report.error(
            "description",
            ValidationErrorCode::MissingDescription,
            format!(
                "Description must have at least {} characters",
                MIN_DESCRIPTION_CHARS
            ),
        );
    }

    if draft.content.questions.is_empty() {
        report.error(
            "questions",
            ValidationErrorCode::NoQuestions,
            "Activity must have at least one question",
        );
    }

    for (index, question) in draft.content.questions.iter().enumerate() {
        let field = format!("questions[{}]", index);

        if question.text().chars().count() < MIN_QUESTION_TEXT_CHARS {
            report.error(
                format!("{}.text", field),
                ValidationErrorCode::QuestionTextTooShort,
                format!(
                    "Question {} text must have at least {} characters",
                    index + 1,
                    MIN_QUESTION_TEXT_CHARS
                ),
            );
        }

        match question.points() {
            Some(points) if points > 0.0 => {}
            _ => report.error(
                format!("{}.points", field),
                ValidationErrorCode::InvalidPoints,
                format!("Question {} must be worth more than 0 points", index + 1),
            ),
        }

        if let Question::Closed(closed) = question {
            if closed.alternatives.len() < MIN_ALTERNATIVES {
                report.error(
                    format!("{}.alternatives", field),
                    ValidationErrorCode::InsufficientAlternatives,
                    format!(
                        "Question {} must have at least {} alternatives",
                        index + 1,
                        MIN_ALTERNATIVES
                    ),
                );
            }
            match closed.alternatives.iter().filter(|a| a.is_correct).count() {
                0 => report.error(
                    format!("{}.alternatives", field),
                    ValidationErrorCode::NoCorrectAlternative,
                    format!("Question {} has no alternative marked correct", index + 1),
                ),
                1 => {}
                _ => report.error(
                    format!("{}.alternatives", field),
                    ValidationErrorCode::MultipleCorrectAlternatives,
                    format!(
                        "Question {} has more than one alternative marked correct",
                        index + 1
                    ),
                ),
            }
        }
    }

    if draft.content.tags.is_empty() {
        report.warning(
            "tags",
            ValidationWarningCode::MissingTags,
            "Tags help students find the activity",
        );
    }

    if draft.content.estimated_time_minutes.is_none() {
        report.warning(
            "estimated_time_minutes",
            ValidationWarningCode::MissingEstimatedTime,
            "No estimated completion time set",
        );
    }

    let points_total: f64 = draft
        .content
        .questions
        .iter()
        .filter_map(Question::points)
        .sum();
    if (points_total - draft.max_score).abs() > POINTS_TOLERANCE {
        report.warning(
            "max_score",
            ValidationWarningCode::PointsMismatch,
            format!(
                "Question points add up to {} but the maximum score is {}",
                points_total, draft.max_score
            ),
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::validate_draft;
    use crate::models::activity::{
        ActivityContent, AdvancedSettings, Alternative, ClosedQuestion, Difficulty, Question,
    };
    use crate::models::taxonomy::AuthorType;
    use crate::models::validation::{ValidationErrorCode, ValidationWarningCode};
    use crate::models::ActivityDraft;

    fn closed_question(points: f64) -> Question {
        Question::Closed(ClosedQuestion {
            id: format!("q-{}", points),
            text: "What is 2+2?".to_string(),
            points: Some(points),
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

    fn draft_with_points(points: &[f64]) -> ActivityDraft {
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
                questions: points.iter().copied().map(closed_question).collect(),
                attachments: Vec::new(),
                advanced_settings: AdvancedSettings::default(),
            },
        }
    }

    #[test]
    fn clean_draft_passes_without_issues() {
        let report = validate_draft(&draft_with_points(&[5.0, 5.0]));
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn zero_questions_always_block() {
        let report = validate_draft(&draft_with_points(&[]));
        assert!(report
            .errors
            .iter()
            .any(|e| e.code == ValidationErrorCode::NoQuestions));
        assert!(!report.is_publishable());
    }

    #[test]
    fn short_title_and_description_block() {
        let mut draft = draft_with_points(&[10.0]);
        draft.title = "Ab".to_string();
        draft.description = "Too short".to_string();

        let report = validate_draft(&draft);
        let codes: Vec<_> = report.errors.iter().map(|e| e.code).collect();
        assert!(codes.contains(&ValidationErrorCode::MissingTitle));
        assert!(codes.contains(&ValidationErrorCode::MissingDescription));
    }

    #[test]
    fn closed_question_needs_two_alternatives_and_a_correct_one() {
        let mut draft = draft_with_points(&[10.0]);
        if let Question::Closed(closed) = &mut draft.content.questions[0] {
            closed.alternatives.truncate(1);
            closed.alternatives[0].is_correct = false;
        }

        let report = validate_draft(&draft);
        let codes: Vec<_> = report.errors.iter().map(|e| e.code).collect();
        assert!(codes.contains(&ValidationErrorCode::InsufficientAlternatives));
        assert!(codes.contains(&ValidationErrorCode::NoCorrectAlternative));
    }

    #[test]
    fn multiple_correct_alternatives_block() {
        let mut draft = draft_with_points(&[10.0]);
        if let Question::Closed(closed) = &mut draft.content.questions[0] {
            for alternative in &mut closed.alternatives {
                alternative.is_correct = true;
            }
        }

        let report = validate_draft(&draft);
        assert!(!report.is_publishable());
        assert!(report
            .errors
            .iter()
            .any(|e| e.code == ValidationErrorCode::MultipleCorrectAlternatives));
    }

    #[test]
    fn missing_points_block() {
        let mut draft = draft_with_points(&[10.0]);
        if let Question::Closed(closed) = &mut draft.content.questions[0] {
            closed.points = None;
        }

        let report = validate_draft(&draft);
        assert!(report
            .errors
            .iter()
            .any(|e| e.code == ValidationErrorCode::InvalidPoints));
    }

    #[test]
    fn points_mismatch_respects_tolerance() {
        // 5 + 5 == 10: clean.
        let report = validate_draft(&draft_with_points(&[5.0, 5.0]));
        assert!(report.warnings.is_empty());

        // 5 + 4 == 9: one mismatch warning.
        let report = validate_draft(&draft_with_points(&[5.0, 4.0]));
        let mismatches: Vec<_> = report
            .warnings
            .iter()
            .filter(|w| w.code == ValidationWarningCode::PointsMismatch)
            .collect();
        assert_eq!(mismatches.len(), 1);

        // 5 + 5.05 == 10.05: inside the 0.1 tolerance.
        let report = validate_draft(&draft_with_points(&[5.0, 5.05]));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn missing_tags_and_time_are_advisory_only() {
        let mut draft = draft_with_points(&[10.0]);
        draft.content.tags.clear();
        draft.content.estimated_time_minutes = None;

        let report = validate_draft(&draft);
        assert!(report.is_publishable());
        let codes: Vec<_> = report.warnings.iter().map(|w| w.code).collect();
        assert!(codes.contains(&ValidationWarningCode::MissingTags));
        assert!(codes.contains(&ValidationWarningCode::MissingEstimatedTime));
    }
}
