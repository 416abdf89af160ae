//! Chatbot backend contract

pub mod client;
pub mod types;

pub use client::{extract_error_message, ApiError, ChatbotApi, HttpApi, GENERIC_FAILURE};
pub use types::{
    DefinePayload, EntityKind, GenerateRequest, ListQuery, Page, RemoteRecord, StoryPayload,
};
