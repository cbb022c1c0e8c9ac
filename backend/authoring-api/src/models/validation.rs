use serde::{Deserialize, Serialize};

/// Blocking rule identifiers. Publication cannot proceed while any of
/// these are present on the draft.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorCode {
    MissingTitle,
    MissingDescription,
    NoQuestions,
    QuestionTextTooShort,
    InvalidPoints,
    InsufficientAlternatives,
    NoCorrectAlternative,
    MultipleCorrectAlternatives,
}

/// Advisory rule identifiers. Surfaced but non-blocking; publication
/// proceeds only after explicit confirmation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationWarningCode {
    MissingTags,
    MissingEstimatedTime,
    PointsMismatch,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub code: ValidationErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationWarning {
    pub field: String,
    pub code: ValidationWarningCode,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_publishable(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub(crate) fn error(&mut self, field: impl Into<String>, code: ValidationErrorCode, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.into(),
            code,
            message: message.into(),
        });
    }

    pub(crate) fn warning(&mut self, field: impl Into<String>, code: ValidationWarningCode, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            field: field.into(),
            code,
            message: message.into(),
        });
    }
}
