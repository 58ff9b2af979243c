//! Problem domain model.
//!
//! # Responsibility
//! - Define the canonical record stored in the `problems` table.
//! - Validate identifiers and names before they reach storage.
//!
//! # Invariants
//! - `id` is stable and never reused for another problem.
//! - `id` matches `[A-Za-z0-9_-]{1,64}`.
//! - `name` and `full_name` are non-blank after trim.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static PROBLEM_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid problem id regex"));

/// Maximum number of characters shown for a problem name in list entries.
pub const SHORT_NAME_MAX_CHARS: usize = 15;

/// Stable problem identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemId(String);

impl ProblemId {
    /// Parses and validates one identifier.
    pub fn parse(value: impl Into<String>) -> Result<Self, ProblemValidationError> {
        let value = value.into();
        if !PROBLEM_ID_RE.is_match(&value) {
            return Err(ProblemValidationError::InvalidId(value));
        }
        Ok(Self(value))
    }

    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProblemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validation failures for problem records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemValidationError {
    /// Identifier is empty, too long, or uses disallowed characters.
    InvalidId(String),
    /// Short display name is blank.
    BlankName,
    /// Full name is blank.
    BlankFullName,
}

impl Display for ProblemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId(value) => write!(
                f,
                "invalid problem id `{value}`; expected 1-64 characters of [A-Za-z0-9_-]"
            ),
            Self::BlankName => write!(f, "problem name must not be blank"),
            Self::BlankFullName => write!(f, "problem full name must not be blank"),
        }
    }
}

impl Error for ProblemValidationError {}

/// Canonical contest problem record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: ProblemId,
    /// Short name used in the problem list.
    pub name: String,
    /// Name used in statements and export listings.
    pub full_name: String,
    /// Problem body. Format is owned by the authoring front end.
    pub content: String,
    /// Epoch ms. Zero until the record is persisted.
    #[serde(default)]
    pub created_at: i64,
    /// Epoch ms. Zero until the record is persisted.
    #[serde(default)]
    pub updated_at: i64,
}

impl Problem {
    /// Creates a problem with a generated identifier and empty content.
    pub fn new(name: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self::with_id(ProblemId::generate(), name, full_name)
    }

    /// Creates a problem with a caller-provided identifier.
    pub fn with_id(id: ProblemId, name: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            full_name: full_name.into(),
            content: String::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), ProblemValidationError> {
        if !PROBLEM_ID_RE.is_match(self.id.as_str()) {
            return Err(ProblemValidationError::InvalidId(self.id.0.clone()));
        }
        if self.name.trim().is_empty() {
            return Err(ProblemValidationError::BlankName);
        }
        if self.full_name.trim().is_empty() {
            return Err(ProblemValidationError::BlankFullName);
        }
        Ok(())
    }

    /// Name shown in list entries, cut to [`SHORT_NAME_MAX_CHARS`] characters.
    pub fn short_name(&self) -> String {
        if self.name.chars().count() <= SHORT_NAME_MAX_CHARS {
            return self.name.clone();
        }
        let mut short = self
            .name
            .chars()
            .take(SHORT_NAME_MAX_CHARS)
            .collect::<String>();
        short.push_str("...");
        short
    }
}

#[cfg(test)]
mod tests {
    use super::{Problem, ProblemId, ProblemValidationError};

    #[test]
    fn parse_rejects_blank_and_symbols() {
        assert!(ProblemId::parse("").is_err());
        assert!(ProblemId::parse("a b").is_err());
        assert!(ProblemId::parse("x".repeat(65)).is_err());
        assert_eq!(ProblemId::parse("p-1_A").unwrap().as_str(), "p-1_A");
    }

    #[test]
    fn generated_ids_pass_validation() {
        let id = ProblemId::generate();
        assert!(ProblemId::parse(id.as_str()).is_ok());
    }

    #[test]
    fn short_name_truncates_on_characters() {
        let problem = Problem::new("Árvore de segmentos", "Full");
        assert_eq!(problem.short_name(), "Árvore de segme...");

        let exact = Problem::new("fifteen chars!!", "Full");
        assert_eq!(exact.short_name(), "fifteen chars!!");
    }

    #[test]
    fn validate_rejects_blank_names() {
        let problem = Problem::new("  ", "Full");
        assert_eq!(problem.validate(), Err(ProblemValidationError::BlankName));

        let problem = Problem::new("Short", "");
        assert_eq!(problem.validate(), Err(ProblemValidationError::BlankFullName));
    }

    #[test]
    fn json_fields_are_camel_case() {
        let mut problem = Problem::with_id(ProblemId::parse("p1").unwrap(), "Alpha", "Alpha Full");
        problem.created_at = 10;
        problem.updated_at = 20;

        let value = serde_json::to_value(&problem).unwrap();
        assert_eq!(value["fullName"], "Alpha Full");
        assert_eq!(value["createdAt"], 10);
        assert_eq!(value["updatedAt"], 20);
        assert!(value.get("full_name").is_none());

        let back: Problem = serde_json::from_value(value).unwrap();
        assert_eq!(back, problem);
    }
}
