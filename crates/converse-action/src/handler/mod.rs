//! Client action handler registry and trait definition.
//!
//! Defines the `ClientActionHandler` async trait and provides the registry
//! that dispatches actions to the handler registered under their name.

pub mod statement;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ActionError;
use crate::types::{ClientAction, ClientActionOutcome};

pub use statement::StatementHandler;

/// Default upper bound on a single client action.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// An external, side-effecting action the assistant can request by name.
#[async_trait]
pub trait ClientActionHandler: Send + Sync {
    /// Name the assistant uses to request this action.
    fn name(&self) -> &str;

    async fn execute(&self, action: &ClientAction) -> Result<ClientActionOutcome, ActionError>;

    /// Short human-readable description, used in logs.
    fn describe(&self, action: &ClientAction) -> String {
        format!("Run client action: {}", action.name)
    }
}

/// Capability set of client actions, keyed by name.
pub struct ActionRegistry {
    handlers: HashMap<String, Arc<dyn ClientActionHandler>>,
    timeout: Duration,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRegistry {
    /// Create an empty registry with the default timeout.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-action timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a handler, replacing any handler with the same name.
    pub fn register(&mut self, handler: Arc<dyn ClientActionHandler>) {
        let name = handler.name().to_string();
        if self.handlers.insert(name.clone(), handler).is_some() {
            tracing::warn!(action = %name, "Replaced existing client action handler");
        }
    }

    /// Register the built-in handlers.
    pub fn register_defaults(&mut self) {
        self.register(Arc::new(StatementHandler::new()));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ClientActionHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Registered action names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the handler registered under `action.name`.
    ///
    /// Unknown names yield `UnregisteredHandler`; a handler that outlives the
    /// timeout yields `Timeout`.
    pub async fn execute(&self, action: &ClientAction) -> Result<ClientActionOutcome, ActionError> {
        let handler = self
            .get(&action.name)
            .ok_or_else(|| ActionError::UnregisteredHandler(action.name.clone()))?;

        tracing::debug!(action = %action.name, "{}", handler.describe(action));

        match tokio::time::timeout(self.timeout, handler.execute(action)).await {
            Ok(result) => result,
            Err(_) => Err(ActionError::Timeout(self.timeout.as_secs())),
        }
    }
}
