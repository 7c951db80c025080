//! Relay to the vision model — builds the one chat-completions request per
//! cycle and post-processes the draft that comes back.
//!
//! This is the single outbound network call in the whole tool. There is no
//! retry, no streaming, and no partial result: the caller gets either the
//! final normalized text or one error.

use crate::compose::normalize_reply;
use crate::platform::Platform;
use crate::prompt::PromptSet;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("OpenAI API key not provided")]
    MissingCredential,

    #[error("No {0} provided")]
    MissingInput(&'static str),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Network error. Please check your internet connection.")]
    Connection(#[source] reqwest::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No response generated from AI")]
    EmptyResponse,
}

impl RelayError {
    /// Classify a transport-level failure: connect/timeout failures get the
    /// connectivity message, everything else passes through unchanged.
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            RelayError::Connection(err)
        } else {
            RelayError::Http(err)
        }
    }
}

/// Relay client configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

// ============================================================================
// Chat-completions wire types (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
    detail: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ============================================================================
// RelayClient
// ============================================================================

/// Client for the chat-completions endpoint of an OpenAI-compatible provider.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: Client,
    config: RelayConfig,
    prompts: PromptSet,
}

impl RelayClient {
    pub fn new(config: RelayConfig, prompts: PromptSet) -> Result<Self, RelayError> {
        if config.api_key.trim().is_empty() {
            return Err(RelayError::MissingCredential);
        }

        Ok(Self {
            client: Client::new(),
            config,
            prompts,
        })
    }

    /// Draft a reply to the post shown in `screenshot`.
    ///
    /// `screenshot` is a PNG data URL; `instructions` is the user's saved
    /// drafting guidance. Returns the normalized reply text.
    pub async fn generate(
        &self,
        screenshot: &str,
        instructions: &str,
        platform: Platform,
    ) -> Result<String, RelayError> {
        if screenshot.trim().is_empty() {
            return Err(RelayError::MissingInput("screenshot"));
        }
        if instructions.trim().is_empty() {
            return Err(RelayError::MissingInput("instructions"));
        }

        let system_content = PromptSet::system_content(instructions);
        let user_text = self.prompts.instruction_for(platform);

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(&system_content),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text { text: user_text },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: screenshot,
                                detail: "high",
                            },
                        },
                    ]),
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        tracing::debug!(
            model = %self.config.model,
            platform = %platform,
            instruction = user_text,
            "sending chat-completions request"
        );

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(RelayError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let provider_message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .map(|e| e.message)
                .filter(|m| !m.is_empty());

            let message = provider_message.unwrap_or_else(|| match status.as_u16() {
                401 => "Invalid API key. Please check your OpenAI API key.".to_string(),
                429 => "Rate limit exceeded. Please wait a moment and try again.".to_string(),
                code => format!("API request failed: {code}"),
            });

            tracing::error!(status = status.as_u16(), message = %message, "chat completion failed");

            return Err(RelayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await?;
        let raw = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(RelayError::EmptyResponse)?;

        tracing::debug!(raw = %raw, "received completion");

        let text = normalize_reply(&raw, platform);
        if text.is_empty() {
            return Err(RelayError::EmptyResponse);
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_key: &str, base_url: &str) -> RelayConfig {
        RelayConfig {
            api_key: api_key.to_string(),
            model: "gpt-4o".to_string(),
            base_url: base_url.to_string(),
            max_tokens: 150,
            temperature: 0.7,
        }
    }

    fn test_client(server: &MockServer) -> RelayClient {
        RelayClient::new(test_config("sk-test", &server.uri()), PromptSet::default())
            .expect("Failed to create client")
    }

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{ "message": { "content": content } }]
        })
    }

    #[test]
    fn empty_credential_is_rejected_at_construction() {
        let result = RelayClient::new(test_config("", "http://unused"), PromptSet::default());
        assert!(matches!(result, Err(RelayError::MissingCredential)));
    }

    #[tokio::test]
    async fn empty_screenshot_fails_fast() {
        let server = MockServer::start().await;
        let client = test_client(&server);
        let result = client.generate("", "be nice", Platform::X).await;
        assert!(matches!(result, Err(RelayError::MissingInput("screenshot"))));
    }

    #[tokio::test]
    async fn empty_instructions_fail_fast() {
        let server = MockServer::start().await;
        let client = test_client(&server);
        let result = client
            .generate("data:image/png;base64,AAAA", "  ", Platform::X)
            .await;
        assert!(matches!(
            result,
            Err(RelayError::MissingInput("instructions"))
        ));
    }

    #[tokio::test]
    async fn sends_expected_payload_and_returns_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "max_tokens": 150,
                "temperature": 0.7
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Love this!")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client
            .generate("data:image/png;base64,AAAA", "be nice", Platform::Instagram)
            .await;

        assert_eq!(result.unwrap(), "Love this!");
    }

    #[tokio::test]
    async fn image_part_is_tagged_for_high_detail() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "messages": [
                    { "role": "system" },
                    { "role": "user", "content": [
                        { "type": "text" },
                        { "type": "image_url", "image_url": {
                            "url": "data:image/png;base64,AAAA",
                            "detail": "high"
                        }}
                    ]}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client
            .generate("data:image/png;base64,AAAA", "be nice", Platform::X)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unauthorized_maps_to_invalid_key_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .generate("data:image/png;base64,AAAA", "be nice", Platform::X)
            .await
            .unwrap_err();

        match err {
            RelayError::Api { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("Invalid API key"));
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limit_maps_to_wait_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .generate("data:image/png;base64,AAAA", "be nice", Platform::X)
            .await
            .unwrap_err();

        match err {
            RelayError::Api { status, message } => {
                assert_eq!(status, 429);
                assert!(message.contains("Rate limit"));
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn provider_message_wins_over_status_mapping() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "message": "image too large" }
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .generate("data:image/png;base64,AAAA", "be nice", Platform::X)
            .await
            .unwrap_err();

        match err {
            RelayError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "image too large");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_completion_is_empty_response_not_a_crash() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .generate("data:image/png;base64,AAAA", "be nice", Platform::X)
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::EmptyResponse));
    }

    #[tokio::test]
    async fn whitespace_only_completion_is_empty_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("   ")))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .generate("data:image/png;base64,AAAA", "be nice", Platform::X)
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::EmptyResponse));
    }

    #[tokio::test]
    async fn quoted_dashed_completion_is_normalized() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_body("\"—great point—\"")),
            )
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client
            .generate("data:image/png;base64,AAAA", "be nice", Platform::X)
            .await;

        assert_eq!(result.unwrap(), "...great point...");
    }
}
