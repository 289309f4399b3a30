//! The message-orchestration collaborator.

use async_trait::async_trait;

use crate::error::ChatError;
use crate::reply::{AssistantReply, MessageRequest};

/// Request/response access to the assistant service.
///
/// Implementations map network failures and timeouts to
/// `ChatError::Transport`, error-shaped payloads to `ChatError::Service`,
/// and a service that reports it is not configured to
/// `ChatError::Configuration`.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Obtain a session identifier before the first turn.
    async fn create_session(&self) -> Result<String, ChatError>;

    async fn send_message(&self, request: &MessageRequest) -> Result<AssistantReply, ChatError>;
}
