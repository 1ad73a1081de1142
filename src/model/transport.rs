//! Model service boundary.
//!
//! [`ModelTransport`] is the seam between the retrying client and the wire.
//! [`OpenAiTransport`] speaks the OpenAI Responses API over blocking HTTP;
//! tests substitute scripted transports.

use crate::config::ModelSettings;
use crate::error::ModelError;
use crate::model::response::ModelResponse;
use serde::{Deserialize, Serialize};

/// Message author role. Prompts are always sent as user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End-user input.
    User,
}

/// A role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author role.
    pub role: Role,
    /// Message text.
    pub content: String,
}

/// A single request to the model service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelRequest {
    /// Model identifier.
    pub model: String,
    /// Input messages.
    pub input: Vec<Message>,
}

impl ModelRequest {
    /// Creates a request with one user message.
    #[must_use]
    pub fn user(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: vec![Message {
                role: Role::User,
                content: prompt.into(),
            }],
        }
    }

    /// Returns the text of the last user message.
    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        self.input
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Sends one request to a model service.
///
/// Implementations perform exactly one attempt; retrying is the client's
/// job.
pub trait ModelTransport: Send {
    /// Sends the request and parses the response.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] for transport failures, error statuses, and
    /// unparseable bodies.
    fn send(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError>;
}

/// Longest error body echoed into an error message.
const MAX_ERROR_BODY: usize = 200;

/// OpenAI Responses API transport.
pub struct OpenAiTransport {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiTransport {
    /// Creates a transport for the configured service.
    ///
    /// No request timeout is set; a call runs until the service answers or
    /// the connection fails.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Transport`] if the HTTP client cannot be built.
    pub fn new(settings: &ModelSettings) -> Result<Self, ModelError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(None::<std::time::Duration>)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: responses_endpoint(&settings.api_base),
            api_key: settings.api_key.clone(),
        })
    }

    /// Returns the resolved endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Resolves the responses endpoint from a base URL.
fn responses_endpoint(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with("/responses") {
        base.to_string()
    } else {
        format!("{base}/responses")
    }
}

/// Pulls `error.message` out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| body.chars().take(MAX_ERROR_BODY).collect(),
        |parsed| parsed.error.message,
    )
}

impl ModelTransport for OpenAiTransport {
    fn send(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(ModelError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        ModelResponse::from_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_API_BASE, DEFAULT_MODEL, RetryPolicy};

    #[test]
    fn test_request_body_shape() {
        let request = ModelRequest::user("gpt-5-mini", "How much?");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "gpt-5-mini",
                "input": [{"role": "user", "content": "How much?"}]
            })
        );
        assert_eq!(request.prompt(), Some("How much?"));
    }

    #[test]
    fn test_responses_endpoint() {
        assert_eq!(
            responses_endpoint("https://api.openai.com/v1"),
            "https://api.openai.com/v1/responses"
        );
        assert_eq!(
            responses_endpoint("http://localhost:8080/v1/"),
            "http://localhost:8080/v1/responses"
        );
        assert_eq!(
            responses_endpoint("http://proxy/v1/responses"),
            "http://proxy/v1/responses"
        );
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Incorrect API key provided");

        let long = "x".repeat(500);
        assert_eq!(error_message(&long).len(), MAX_ERROR_BODY);
    }

    #[test]
    fn test_transport_from_settings() {
        let settings = ModelSettings::new(
            Some("sk-test".to_string()),
            DEFAULT_MODEL,
            DEFAULT_API_BASE,
            RetryPolicy::default(),
        )
        .unwrap();
        let transport = OpenAiTransport::new(&settings).unwrap();
        assert_eq!(transport.endpoint(), "https://api.openai.com/v1/responses");
    }
}
