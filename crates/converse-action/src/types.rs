//! Client action request and result types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result string that marks a statement to be rendered client-side.
const STATEMENT_RESULT: &str = "statement";

/// A programmatic action requested by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientAction {
    /// Name the handler is registered under.
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    /// Arbitrary handler input. The assistant sends it as `parameters`.
    #[serde(default, alias = "parameters")]
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_variable: Option<String>,
}

impl ClientAction {
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            action_type: Some("client".to_string()),
            payload,
            result_variable: None,
        }
    }
}

/// What a client action resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClientActionResult {
    /// Render a statement from the outcome's dates.
    Statement,
    /// Plain text, sent back to the assistant as a follow-up message.
    Text(String),
}

impl From<String> for ClientActionResult {
    fn from(value: String) -> Self {
        if value == STATEMENT_RESULT {
            ClientActionResult::Statement
        } else {
            ClientActionResult::Text(value)
        }
    }
}

impl From<ClientActionResult> for String {
    fn from(value: ClientActionResult) -> Self {
        match value {
            ClientActionResult::Statement => STATEMENT_RESULT.to_string(),
            ClientActionResult::Text(text) => text,
        }
    }
}

impl fmt::Display for ClientActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientActionResult::Statement => write!(f, "{}", STATEMENT_RESULT),
            ClientActionResult::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Outcome returned by a client action handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientActionOutcome {
    pub result: ClientActionResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<serde_json::Value>,
}

impl ClientActionOutcome {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            result: ClientActionResult::Text(text.into()),
            dates: None,
        }
    }

    pub fn statement(dates: serde_json::Value) -> Self {
        Self {
            result: ClientActionResult::Statement,
            dates: Some(dates),
        }
    }

    pub fn is_statement(&self) -> bool {
        self.result == ClientActionResult::Statement
    }
}
