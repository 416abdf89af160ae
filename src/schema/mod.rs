//! Definition documents and the import template

pub mod define;
pub mod template;

pub use define::{story_name, to_yaml, DefineError, IntentDefine, ResponseDefine, StoryDefine};
pub use template::{TemplateError, TemplateGenerator, TemplateOutput};
