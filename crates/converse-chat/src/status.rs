//! Turn status state machine.
//!
//! Valid transitions:
//! - Idle -> InProgress (message sent)
//! - InProgress -> Completed | Failed (reply or error)
//! - InProgress -> Idle (turn abandoned before the request left)
//! - Completed | Failed -> Idle (next send)
//!
//! Status changes are published on a watch channel so the host can render
//! them without polling.

use converse_core::TurnStatus;
use tokio::sync::watch;

use crate::error::ChatError;

/// Owner of the live `TurnStatus`.
#[derive(Debug)]
pub struct TurnState {
    tx: watch::Sender<TurnStatus>,
}

impl Default for TurnState {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnState {
    /// A state machine starting at `Idle`.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(TurnStatus::Idle);
        Self { tx }
    }

    pub fn current(&self) -> TurnStatus {
        *self.tx.borrow()
    }

    /// Receive every status change from now on.
    pub fn subscribe(&self) -> watch::Receiver<TurnStatus> {
        self.tx.subscribe()
    }

    /// Attempt to transition to `target`.
    pub fn transition(&self, target: TurnStatus) -> Result<(), ChatError> {
        let from = self.current();
        if !from.can_transition_to(&target) {
            return Err(ChatError::InvalidTransition { from, to: target });
        }
        tracing::debug!("Turn status: {} -> {}", from, target);
        self.tx.send_replace(target);
        Ok(())
    }

    /// Start a turn, passing through `Idle` when the previous turn settled.
    pub fn begin(&self) -> Result<(), ChatError> {
        if self.current().is_settled() {
            self.transition(TurnStatus::Idle)?;
        }
        self.transition(TurnStatus::InProgress)
    }
}

// =============================================================================
// Tests
// =============================================================================
