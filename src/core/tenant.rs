//! Tenant scoping for backend requests
//!
//! Every call against the backend is scoped to one chatbot. The scope is an
//! explicit value handed to the client constructor rather than ambient state.

use std::fmt;

/// Query parameter carrying the chatbot id on every request
pub const BOT_ID_PARAM: &str = "bot_id";

/// The chatbot a session of backend calls belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    bot_id: String,
}

impl TenantContext {
    /// Create a context for the given chatbot id (surrounding whitespace is ignored)
    pub fn new(bot_id: impl Into<String>) -> Option<Self> {
        let bot_id = bot_id.into().trim().to_string();
        if bot_id.is_empty() {
            None
        } else {
            Some(Self { bot_id })
        }
    }

    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    /// Query pairs to append to a request
    pub fn query(&self) -> [(&'static str, &str); 1] {
        [(BOT_ID_PARAM, self.bot_id.as_str())]
    }
}

impl fmt::Display for TenantContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bot_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_bot_id_rejected() {
        assert!(TenantContext::new("").is_none());
        assert!(TenantContext::new("   ").is_none());
    }

    #[test]
    fn test_query_pairs() {
        let tenant = TenantContext::new(" bot-42 ").unwrap();
        assert_eq!(tenant.bot_id(), "bot-42");
        assert_eq!(tenant.query(), [("bot_id", "bot-42")]);
        assert_eq!(tenant.to_string(), "bot-42");
    }
}
