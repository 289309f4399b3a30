//! Error types for the action executors.

/// Errors from client action handler execution.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Action handler failed: {0}")]
    HandlerFailed(String),
    #[error("Action not registered: {0}")]
    UnregisteredHandler(String),
    #[error("Payload validation failed: {0}")]
    InvalidPayload(String),
    #[error("Action execution timed out after {0} seconds")]
    Timeout(u64),
}
