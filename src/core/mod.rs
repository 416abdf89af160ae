//! Core module - configuration, project discovery and naming rules

pub mod config;
pub mod normalize;
pub mod project;
pub mod tenant;

pub use config::{Config, ConfigError};
pub use normalize::{normalize_name, response_name};
pub use project::{Project, ProjectError};
pub use tenant::TenantContext;
