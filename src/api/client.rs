//! Backend client
//!
//! `ChatbotApi` is the seam the import session talks through; `HttpApi` is the
//! blocking HTTP implementation used by the CLI.

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::api::types::{
    CreatedEnvelope, DefinePayload, EntityKind, GenerateRequest, GeneratedExamples, ListEnvelope,
    ListQuery, Page, RemoteRecord, StoryPayload,
};
use crate::core::{Config, TenantContext};

/// Path of the paraphrase generation endpoint
pub const GENERATE_EXAMPLES_PATH: &str = "intents/generate-examples";

/// Shown when a failure carries no usable message
pub const GENERIC_FAILURE: &str = "Request failed";

/// Longest plain-text body echoed back as an error message
const MAX_TEXT_MESSAGE: usize = 200;

/// Operations the import session and management commands need from the backend
pub trait ChatbotApi {
    fn create_intent(&self, payload: &DefinePayload) -> Result<RemoteRecord, ApiError>;

    fn create_response(&self, payload: &DefinePayload) -> Result<RemoteRecord, ApiError>;

    fn create_story(&self, payload: &StoryPayload) -> Result<RemoteRecord, ApiError>;

    fn generate_examples(&self, request: &GenerateRequest) -> Result<Vec<String>, ApiError>;

    fn list(&self, kind: EntityKind, query: &ListQuery) -> Result<Page, ApiError>;

    fn delete(&self, kind: EntityKind, id: &str) -> Result<(), ApiError>;
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or(GENERIC_FAILURE))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Best-effort message for a person: server-provided text first, then the
    /// error itself, then a generic fallback
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Status { status, .. } => format!("{} (HTTP {})", GENERIC_FAILURE, status.as_u16()),
            other => {
                let text = other.to_string();
                if text.trim().is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    text
                }
            }
        }
    }
}

/// Pull a human-readable message out of an error response body
pub fn extract_error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "detail", "error"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {
                    return Some(s.trim().to_string());
                }
                Some(nested @ serde_json::Value::Object(_)) => {
                    if let Some(s) = nested.get("message").and_then(|m| m.as_str()) {
                        if !s.trim().is_empty() {
                            return Some(s.trim().to_string());
                        }
                    }
                }
                _ => {}
            }
        }
        return None;
    }

    if body.chars().count() <= MAX_TEXT_MESSAGE && !body.starts_with('<') {
        Some(body.to_string())
    } else {
        None
    }
}

/// Blocking HTTP implementation of [`ChatbotApi`]
pub struct HttpApi {
    client: Client,
    base: Url,
    tenant: TenantContext,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(
        api_url: &str,
        tenant: TenantContext,
        token: Option<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, ApiError> {
        let base = parse_base_url(api_url)?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base,
            tenant,
            token,
        })
    }

    /// Build a client from layered configuration
    pub fn from_config(config: &Config, tenant: TenantContext) -> Result<Self, ApiError> {
        Self::new(&config.api_url(), tenant, config.token.clone(), config.timeout())
    }

    pub fn tenant(&self) -> &TenantContext {
        &self.tenant
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path).map_err(|e| ApiError::InvalidUrl {
            url: format!("{}{}", self.base, path),
            reason: e.to_string(),
        })
    }

    fn prepare(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.query(&self.tenant.query());
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "POST");
        let response = self.prepare(self.client.post(url)).json(body).send()?;
        read_json(response)
    }
}

fn parse_base_url(api_url: &str) -> Result<Url, ApiError> {
    let mut normalized = api_url.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl {
        url: api_url.to_string(),
        reason: e.to_string(),
    })
}

fn read_body(response: reqwest::blocking::Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text()?;
    if status.is_success() {
        Ok(body)
    } else {
        tracing::debug!(%status, body = %body, "backend rejected request");
        Err(ApiError::Status {
            status,
            message: extract_error_message(&body),
        })
    }
}

fn read_json<T: DeserializeOwned>(response: reqwest::blocking::Response) -> Result<T, ApiError> {
    let body = read_body(response)?;
    serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

impl ChatbotApi for HttpApi {
    fn create_intent(&self, payload: &DefinePayload) -> Result<RemoteRecord, ApiError> {
        let created: CreatedEnvelope = self.post(EntityKind::Intent.path(), payload)?;
        Ok(created.into())
    }

    fn create_response(&self, payload: &DefinePayload) -> Result<RemoteRecord, ApiError> {
        let created: CreatedEnvelope = self.post(EntityKind::Response.path(), payload)?;
        Ok(created.into())
    }

    fn create_story(&self, payload: &StoryPayload) -> Result<RemoteRecord, ApiError> {
        let created: CreatedEnvelope = self.post(EntityKind::Story.path(), payload)?;
        Ok(created.into())
    }

    fn generate_examples(&self, request: &GenerateRequest) -> Result<Vec<String>, ApiError> {
        let generated: GeneratedExamples = self.post(GENERATE_EXAMPLES_PATH, request)?;
        Ok(generated.into_examples())
    }

    fn list(&self, kind: EntityKind, query: &ListQuery) -> Result<Page, ApiError> {
        let url = self.endpoint(kind.path())?;
        tracing::debug!(%url, page = query.page, limit = query.limit, "GET");

        let mut builder = self
            .prepare(self.client.get(url))
            .query(&[("page", query.page), ("limit", query.limit)]);
        if let Some(search) = &query.search {
            builder = builder.query(&[("search", search.as_str())]);
        }

        let envelope: ListEnvelope = read_json(builder.send()?)?;
        Ok(envelope.into())
    }

    fn delete(&self, kind: EntityKind, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("{}/{}", kind.path(), id))?;
        tracing::debug!(%url, "DELETE");
        read_body(self.prepare(self.client.delete(url)).send()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn api(url: &str) -> HttpApi {
        HttpApi::new(
            url,
            TenantContext::new("bot").unwrap(),
            None,
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = api("http://localhost:8000/api");
        assert_eq!(
            api.endpoint("intents").unwrap().as_str(),
            "http://localhost:8000/api/intents"
        );
        assert_eq!(
            api.endpoint(GENERATE_EXAMPLES_PATH).unwrap().as_str(),
            "http://localhost:8000/api/intents/generate-examples"
        );
    }

    #[test]
    fn test_endpoint_with_trailing_slash() {
        let api = api("http://localhost:8000/api/");
        assert_eq!(
            api.endpoint("stories/abc").unwrap().as_str(),
            "http://localhost:8000/api/stories/abc"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpApi::new(
            "not a url",
            TenantContext::new("bot").unwrap(),
            None,
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(ApiError::InvalidUrl { .. })));
    }

    #[test]
    fn test_extract_error_message_json_keys() {
        assert_eq!(
            extract_error_message(r#"{"message": "Intent already exists"}"#).as_deref(),
            Some("Intent already exists")
        );
        assert_eq!(
            extract_error_message(r#"{"detail": "bad define"}"#).as_deref(),
            Some("bad define")
        );
        assert_eq!(
            extract_error_message(r#"{"error": {"message": "nested"}}"#).as_deref(),
            Some("nested")
        );
        assert_eq!(extract_error_message(r#"{"status": 500}"#), None);
    }

    #[test]
    fn test_extract_error_message_text() {
        assert_eq!(
            extract_error_message("  Service unavailable \n").as_deref(),
            Some("Service unavailable")
        );
        assert_eq!(extract_error_message(""), None);
        assert_eq!(extract_error_message("<html><body>502</body></html>"), None);
        assert_eq!(extract_error_message(&"x".repeat(500)), None);
    }

    #[test]
    fn test_user_message_precedence() {
        let with_body = ApiError::Status {
            status: StatusCode::CONFLICT,
            message: Some("Intent already exists".into()),
        };
        assert_eq!(with_body.user_message(), "Intent already exists");

        let without_body = ApiError::Status {
            status: StatusCode::BAD_GATEWAY,
            message: None,
        };
        assert_eq!(without_body.user_message(), "Request failed (HTTP 502)");

        let decode = ApiError::Decode("missing field `_id`".into());
        assert!(decode.user_message().contains("_id"));
    }
}
