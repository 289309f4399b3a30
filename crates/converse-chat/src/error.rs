//! Error types for the turn engine.

use converse_core::ConverseError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("service error {code}: {message}")]
    Service { code: u16, message: String },
    #[error("invalid reply: {0}")]
    InvalidReply(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("session unavailable: {0}")]
    SessionUnavailable(String),
    #[error("invalid turn transition: {from} -> {to}")]
    InvalidTransition {
        from: converse_core::TurnStatus,
        to: converse_core::TurnStatus,
    },
    #[error("playback closed")]
    PlaybackClosed,
    #[error(transparent)]
    Core(#[from] ConverseError),
}

impl ChatError {
    /// Whether this error fails the turn: status becomes failed and the fixed
    /// apology is shown.
    pub fn is_turn_failure(&self) -> bool {
        matches!(
            self,
            ChatError::Transport(_) | ChatError::Service { .. } | ChatError::InvalidReply(_)
        )
    }
}
