//! botadmin: chatbot admin console
//!
//! Bulk-imports question/answer spreadsheets into a chatbot backend as
//! intents, responses and the stories linking them.

pub mod api;
pub mod cli;
pub mod core;
pub mod import;
pub mod schema;
