//! `define` documents attached to intents, responses and stories
//!
//! The dialogue engine consumes these as YAML. They are built as typed
//! documents and serialized through `serde_yml`, so example text containing
//! `:` or a leading `-` never breaks the document structure.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::normalize::response_name;

#[derive(Debug, Error)]
pub enum DefineError {
    #[error("cannot build definition: {0}")]
    Serialize(String),
}

/// `nlu:` document defining one intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentDefine {
    pub nlu: Vec<NluEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NluEntry {
    pub intent: String,
    /// Block of `- example` lines, one per example
    pub examples: String,
}

/// `responses:` document defining one utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDefine {
    pub responses: BTreeMap<String, Vec<ResponseText>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseText {
    pub text: String,
}

/// `stories:` document linking an intent to its response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryDefine {
    pub stories: Vec<StoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryEntry {
    pub story: String,
    pub steps: Vec<StoryStep>,
}

/// One step: exactly one of `intent` or `action` is set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl StoryStep {
    pub fn intent(name: impl Into<String>) -> Self {
        Self {
            intent: Some(name.into()),
            action: None,
        }
    }

    pub fn action(name: impl Into<String>) -> Self {
        Self {
            intent: None,
            action: Some(name.into()),
        }
    }
}

/// Name of the story generated for an intent
pub fn story_name(intent_name: &str) -> String {
    format!("story_{}", intent_name)
}

/// Collapse internal line breaks and runs of whitespace to single spaces
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl IntentDefine {
    /// Blank examples are dropped
    pub fn new<S: AsRef<str>>(name: &str, examples: &[S]) -> Self {
        let mut block = String::new();
        for example in examples {
            let line = single_line(example.as_ref());
            if line.is_empty() {
                continue;
            }
            block.push_str("- ");
            block.push_str(&line);
            block.push('\n');
        }

        Self {
            nlu: vec![NluEntry {
                intent: name.to_string(),
                examples: block,
            }],
        }
    }

    /// The examples back out of the block, in order
    pub fn examples(&self) -> Vec<String> {
        self.nlu
            .iter()
            .flat_map(|entry| entry.examples.lines())
            .filter_map(|line| line.strip_prefix("- "))
            .map(str::to_string)
            .collect()
    }
}

impl ResponseDefine {
    /// Keyed by `utter_<intent_name>`
    pub fn new(intent_name: &str, text: &str) -> Self {
        let mut responses = BTreeMap::new();
        responses.insert(
            response_name(intent_name),
            vec![ResponseText {
                text: text.trim().to_string(),
            }],
        );
        Self { responses }
    }
}

impl StoryDefine {
    /// Two steps: the intent, then its `utter_` response
    pub fn new(intent_name: &str) -> Self {
        Self {
            stories: vec![StoryEntry {
                story: story_name(intent_name),
                steps: vec![
                    StoryStep::intent(intent_name),
                    StoryStep::action(response_name(intent_name)),
                ],
            }],
        }
    }
}

/// Serialize a definition document to YAML
pub fn to_yaml<T: Serialize>(document: &T) -> Result<String, DefineError> {
    serde_yml::to_string(document).map_err(|e| DefineError::Serialize(e.to_string()))
}
