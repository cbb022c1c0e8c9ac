use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Raised when a persisted type string is not one this subsystem knows.
/// The read/write in progress fails; we never coerce to a default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown persisted activity type: {0}")]
pub struct UnknownTypeError(pub String);

/// The classification an author selects and sees in the editor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AuthorType {
    Open,
    Closed,
    Mixed,
    FileUpload,
}

impl AuthorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorType::Open => "open",
            AuthorType::Closed => "closed",
            AuthorType::Mixed => "mixed",
            AuthorType::FileUpload => "fileUpload",
        }
    }

    /// Storage-side classification for this author-facing type.
    pub fn to_persisted(self) -> PersistedType {
        match self {
            AuthorType::Open => PersistedType::Assignment,
            AuthorType::Closed => PersistedType::Objective,
            AuthorType::Mixed => PersistedType::Mixed,
            AuthorType::FileUpload => PersistedType::Project,
        }
    }
}

/// The classification written to storage. Every storage read and write
/// goes through this mapping; nothing else compares raw persisted strings
/// against author-facing constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PersistedType {
    Assignment,
    Objective,
    Mixed,
    Project,
}

impl PersistedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersistedType::Assignment => "assignment",
            PersistedType::Objective => "objective",
            PersistedType::Mixed => "mixed",
            PersistedType::Project => "project",
        }
    }

    pub fn to_author(self) -> AuthorType {
        match self {
            PersistedType::Assignment => AuthorType::Open,
            PersistedType::Objective => AuthorType::Closed,
            PersistedType::Mixed => AuthorType::Mixed,
            PersistedType::Project => AuthorType::FileUpload,
        }
    }
}

impl FromStr for PersistedType {
    type Err = UnknownTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "assignment" => Ok(PersistedType::Assignment),
            // Legacy records wrote "open" before the assignment rename.
            "open" => Ok(PersistedType::Assignment),
            "objective" => Ok(PersistedType::Objective),
            "mixed" => Ok(PersistedType::Mixed),
            "project" => Ok(PersistedType::Project),
            other => Err(UnknownTypeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthorType, PersistedType};
    use std::str::FromStr;

    #[test]
    fn author_types_round_trip_through_persisted() {
        let all = [
            AuthorType::Open,
            AuthorType::Closed,
            AuthorType::Mixed,
            AuthorType::FileUpload,
        ];
        for author in all {
            assert_eq!(author.to_persisted().to_author(), author);
        }
    }

    #[test]
    fn persisted_strings_parse_back() {
        for persisted in [
            PersistedType::Assignment,
            PersistedType::Objective,
            PersistedType::Mixed,
            PersistedType::Project,
        ] {
            assert_eq!(PersistedType::from_str(persisted.as_str()), Ok(persisted));
        }
    }

    #[test]
    fn legacy_open_literal_reads_as_assignment() {
        assert_eq!(
            PersistedType::from_str("open"),
            Ok(PersistedType::Assignment)
        );
    }

    #[test]
    fn unknown_persisted_value_fails_closed() {
        let err = PersistedType::from_str("quizz").unwrap_err();
        assert_eq!(err.0, "quizz");
    }
}
