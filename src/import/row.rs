//! Rows of a bulk-import batch

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::normalize::normalize_name;

/// Import lifecycle of a row. `Success` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    #[default]
    Pending,
    Success,
    Error,
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowStatus::Pending => write!(f, "pending"),
            RowStatus::Success => write!(f, "success"),
            RowStatus::Error => write!(f, "error"),
        }
    }
}

/// One question/answer pair read from an import file, plus its import state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRow {
    /// Question text as read from the file
    pub raw_name: Option<String>,
    /// Identifier derived from `raw_name`; empty means not importable
    pub name: String,
    /// Paraphrases of the question; starts with the question itself
    pub examples: Vec<String>,
    /// Answer text
    pub response: Option<String>,
    #[serde(default)]
    pub status: RowStatus,
    /// Last backend error message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Pre-flight validation message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
}

impl ParsedRow {
    /// Build a row from a question and optional answer
    pub fn new(question: &str, answer: Option<&str>) -> Self {
        let question = question.trim();
        let response = answer
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        Self {
            raw_name: Some(question.to_string()).filter(|q| !q.is_empty()),
            name: normalize_name(question),
            examples: vec![question.to_string()],
            response,
            status: RowStatus::Pending,
            error: None,
            validation_error: None,
        }
    }

    /// Examples with non-blank text
    pub fn non_empty_examples(&self) -> impl Iterator<Item = &str> {
        self.examples
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
    }

    pub fn example_count(&self) -> usize {
        self.non_empty_examples().count()
    }

    /// Answer text when present and non-blank
    pub fn response_text(&self) -> Option<&str> {
        self.response
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    pub fn is_imported(&self) -> bool {
        self.status == RowStatus::Success
    }

    /// Text used to seed example generation
    pub fn seed_example(&self) -> Option<&str> {
        self.non_empty_examples()
            .next()
            .or_else(|| self.raw_name.as_deref())
    }
}
