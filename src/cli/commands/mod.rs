//! CLI command implementations

pub mod completions;
pub mod config;
pub mod import;
pub mod init;
pub mod manage;
pub mod parse;
pub mod template;
