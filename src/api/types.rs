//! Request and response shapes exchanged with the chatbot backend
//!
//! The backend is not consistent about envelopes: some endpoints return the
//! record itself, others wrap it in `{ "data": ... }`. Every wrapper is
//! flattened here so callers only ever see one shape.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record kinds managed through the backend CRUD endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum EntityKind {
    Intent,
    Response,
    Story,
    Entity,
    Action,
}

impl EntityKind {
    /// Collection path relative to the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            EntityKind::Intent => "intents",
            EntityKind::Response => "responses",
            EntityKind::Story => "stories",
            EntityKind::Entity => "entities",
            EntityKind::Action => "actions",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Intent => "intent",
            EntityKind::Response => "response",
            EntityKind::Story => "story",
            EntityKind::Entity => "entity",
            EntityKind::Action => "action",
        };
        write!(f, "{}", s)
    }
}

/// Body for creating an intent or a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinePayload {
    pub name: String,
    pub description: String,
    pub define: String,
}

/// Body for creating a story linking created intents and responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryPayload {
    pub name: String,
    pub description: String,
    pub define: String,
    pub intents: Vec<String>,
    pub responses: Vec<String>,
    pub action: Vec<String>,
    pub entities: Vec<String>,
    pub slots: Vec<String>,
    pub roles: Vec<String>,
}

impl StoryPayload {
    /// A story that references only intents and responses
    pub fn linking(
        name: impl Into<String>,
        description: impl Into<String>,
        define: impl Into<String>,
        intents: Vec<String>,
        responses: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            define: define.into(),
            intents,
            responses,
            action: Vec::new(),
            entities: Vec::new(),
            slots: Vec::new(),
            roles: Vec::new(),
        }
    }
}

/// A record as returned by create/list endpoints
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<String>,
}

/// Create endpoints return either the record or `{ "data": record }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CreatedEnvelope {
    Wrapped { data: RemoteRecord },
    Bare(RemoteRecord),
}

impl From<CreatedEnvelope> for RemoteRecord {
    fn from(envelope: CreatedEnvelope) -> Self {
        match envelope {
            CreatedEnvelope::Wrapped { data } => data,
            CreatedEnvelope::Bare(record) => record,
        }
    }
}

/// Body for the example generation endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    pub example: String,
    pub num: usize,
    pub response: String,
}

/// Example generation returns `string[]` or `{ "data": { "examples": string[] } }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GeneratedExamples {
    List(Vec<String>),
    Wrapped { data: GeneratedData },
}

#[derive(Debug, Deserialize)]
pub struct GeneratedData {
    #[serde(default)]
    pub examples: Vec<String>,
}

impl GeneratedExamples {
    pub fn into_examples(self) -> Vec<String> {
        match self {
            GeneratedExamples::List(examples) => examples,
            GeneratedExamples::Wrapped { data } => data.examples,
        }
    }
}

/// Paging and filtering for list endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            search: None,
        }
    }
}

/// One page of records
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    pub items: Vec<RemoteRecord>,
    pub total: Option<u64>,
}

/// List endpoints return an array or `{ "data": [...], "total": n }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope {
    Bare(Vec<RemoteRecord>),
    Wrapped {
        data: Vec<RemoteRecord>,
        #[serde(default)]
        total: Option<u64>,
    },
}

impl From<ListEnvelope> for Page {
    fn from(envelope: ListEnvelope) -> Self {
        match envelope {
            ListEnvelope::Bare(items) => Page { items, total: None },
            ListEnvelope::Wrapped { data, total } => Page { items: data, total },
        }
    }
}
