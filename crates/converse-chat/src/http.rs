//! HTTP implementation of `MessageTransport`.

use std::time::Duration;

use async_trait::async_trait;
use converse_core::config::AssistantConfig;
use converse_core::ConversationContext;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::reply::{AssistantReply, MessageRequest};
use crate::transport::MessageTransport;

#[derive(Debug, Serialize)]
struct MessageInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    input: MessageInput<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a ConversationContext>,
    #[serde(rename = "isFirstCall")]
    is_first_call: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
    assistant_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReplyEnvelope {
    result: AssistantReply,
}

/// Talks to the message service over HTTP with JSON bodies.
#[derive(Clone)]
pub struct HttpMessageClient {
    base_url: String,
    message_path: String,
    session_path: String,
    assistant_id: String,
    http_client: reqwest::Client,
}

impl HttpMessageClient {
    pub fn new(
        base_url: String,
        assistant_id: String,
        message_path: String,
        session_path: String,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            base_url,
            message_path,
            session_path,
            assistant_id,
            http_client,
        }
    }

    /// Build a client with the configured endpoints and request timeout.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, ChatError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|err| ChatError::Transport(format!("failed to build http client: {err}")))?;
        Ok(Self::new(
            config.base_url.clone(),
            config.assistant_id.clone(),
            config.message_path.clone(),
            config.session_path.clone(),
            http_client,
        ))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl MessageTransport for HttpMessageClient {
    async fn create_session(&self) -> Result<String, ChatError> {
        let response = self
            .http_client
            .get(self.url(&self.session_path))
            .send()
            .await
            .map_err(|err| ChatError::SessionUnavailable(err.to_string()))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ChatError::SessionUnavailable(err.to_string()))?;

        if !(200..300).contains(&status) {
            let (code, message) = error_fields(&bytes, status);
            return Err(ChatError::SessionUnavailable(format!("{code}: {message}")));
        }

        let body: serde_json::Value = serde_json::from_slice(&bytes).map_err(|err| {
            ChatError::SessionUnavailable(format!("failed to parse session response: {err}"))
        })?;
        body.pointer("/result/session_id")
            .or_else(|| body.get("session_id"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| ChatError::SessionUnavailable("response has no session_id".to_string()))
    }

    async fn send_message(&self, request: &MessageRequest) -> Result<AssistantReply, ChatError> {
        let body = MessageBody {
            input: MessageInput {
                text: &request.text,
            },
            context: request.context.as_ref(),
            is_first_call: request.is_first_turn,
            session_id: request.session_id.as_deref(),
            assistant_id: &self.assistant_id,
        };

        let response = self
            .http_client
            .post(self.url(&self.message_path))
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ChatError::Transport(format!("request timed out: {err}"))
                } else {
                    ChatError::Transport(err.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ChatError::Transport(format!("failed to read response body: {err}")))?;

        if !(200..300).contains(&status) {
            let (code, message) = error_fields(&bytes, status);
            return Err(ChatError::Service { code, message });
        }

        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|err| ChatError::InvalidReply(format!("response is not json: {err}")))?;

        if value.get("result").is_none() {
            // Unconfigured service answers 200 with a bare `output.text`.
            if let Some(text) = value.pointer("/output/text").and_then(|v| v.as_str()) {
                return Err(ChatError::Configuration(text.to_string()));
            }
            if value.get("code").is_some() || value.get("error").is_some() {
                let (code, message) = error_fields(&bytes, status);
                return Err(ChatError::Service { code, message });
            }
        }

        let envelope: ReplyEnvelope = serde_json::from_value(value)
            .map_err(|err| ChatError::InvalidReply(format!("failed to parse reply: {err}")))?;
        Ok(envelope.result)
    }
}

/// Status code and message of an error-shaped body. Falls back to the HTTP
/// status and a generic message.
fn error_fields(bytes: &[u8], status: u16) -> (u16, String) {
    let body: serde_json::Value = serde_json::from_slice(bytes).unwrap_or_default();
    let code = body
        .get("code")
        .and_then(|v| v.as_u64())
        .and_then(|c| u16::try_from(c).ok())
        .unwrap_or(status);
    let message = ["error", "message"]
        .iter()
        .find_map(|key| body.get(*key).and_then(|v| v.as_str()))
        .unwrap_or("unknown error")
        .to_string();
    (code, message)
}
