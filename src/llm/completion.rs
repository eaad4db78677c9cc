use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::prompt::GenerationRequest;
use crate::config::GenerationSettings;
use crate::error::{GenerateError, GenerateResult};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Anything that can turn a generation request into raw completion text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &GenerationRequest) -> GenerateResult<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Pulls `choices[0].message.content` out of a chat-completion response body.
pub fn parse_completion_envelope(body: &str) -> GenerateResult<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GenerateError::GenerationFailed(format!("malformed response body: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| {
            GenerateError::GenerationFailed("response has no message content".to_string())
        })
}

/// Chat-completion client for OpenAI-compatible endpoints (OpenAI, Groq, ...).
#[derive(Clone)]
pub struct ChatCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl fmt::Debug for ChatCompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ChatCompletionClient {
    pub fn new(settings: &GenerationSettings, api_key: impl Into<String>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_http(builder.build()?, settings, api_key))
    }

    /// Uses a caller-built HTTP client, e.g. one with custom proxy settings.
    pub fn with_http(
        http: reqwest::Client,
        settings: &GenerationSettings,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: settings.endpoint.clone(),
            api_key: api_key.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionClient {
    async fn complete(&self, request: &GenerationRequest) -> GenerateResult<String> {
        let messages = request.messages();
        let body = ChatRequest {
            model: &request.model,
            messages: messages
                .iter()
                .map(|message| ChatMessage {
                    role: message.role.as_str(),
                    content: &message.content,
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(
            endpoint = %self.endpoint,
            model = %request.model,
            messages = body.messages.len(),
            "sending completion request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerateError::GenerationFailed(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerateError::GenerationFailed(format!(
                "service responded with {status}"
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| GenerateError::GenerationFailed(format!("failed to read body: {e}")))?;

        parse_completion_envelope(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_content_is_returned_verbatim() {
        let body = r#"{"choices":[{"message":{"content":"Sure!\n[{\"question\":\"Q\",\"answer\":\"A\"}]"}}]}"#;
        let content = parse_completion_envelope(body).unwrap();
        assert_eq!(content, "Sure!\n[{\"question\":\"Q\",\"answer\":\"A\"}]");
    }

    #[test]
    fn envelope_tolerates_extra_fields() {
        let body = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "model": "llama3-8b-8192",
            "choices": [
                {"index": 0, "finish_reason": "stop", "message": {"role": "assistant", "content": "hi"}},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ],
            "usage": {"total_tokens": 12}
        }"#;
        assert_eq!(parse_completion_envelope(body).unwrap(), "hi");
    }

    #[test]
    fn envelope_without_content_fails() {
        for body in [
            r#"{"choices":[]}"#,
            r#"{}"#,
            r#"{"choices":[{"message":{"role":"assistant"}}]}"#,
            r#"{"choices":[{"finish_reason":"length"}]}"#,
            r#"{"error":{"message":"invalid api key"}}"#,
        ] {
            assert!(
                matches!(
                    parse_completion_envelope(body),
                    Err(GenerateError::GenerationFailed(_))
                ),
                "expected failure for {body}"
            );
        }
    }

    #[test]
    fn envelope_that_is_not_json_fails() {
        assert!(matches!(
            parse_completion_envelope("<html>Bad Gateway</html>"),
            Err(GenerateError::GenerationFailed(_))
        ));
    }

    #[test]
    fn request_body_shape() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            temperature: 0.5,
            max_tokens: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "hello"}],
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn debug_output_hides_key() {
        let client =
            ChatCompletionClient::new(&GenerationSettings::default(), "sk-very-secret").unwrap();
        let printed = format!("{client:?}");
        assert!(!printed.contains("sk-very-secret"));
        assert!(printed.contains("redacted"));
    }
}
