use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// =============================================================================
// Conversation context
// =============================================================================

/// Server-defined conversation state, passed back on every turn.
///
/// The client never inspects the shape beyond the digression marker under
/// `system`. It is replaced wholesale after each successful turn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationContext(serde_json::Value);

impl ConversationContext {
    /// Wrap a raw JSON value.
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// An empty object context.
    pub fn empty() -> Self {
        Self(serde_json::Value::Object(serde_json::Map::new()))
    }

    /// Borrow the underlying JSON.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Consume and return the underlying JSON.
    pub fn into_value(self) -> serde_json::Value {
        self.0
    }

    /// Whether the assistant reports that a digression occurred.
    ///
    /// Presence of `system.digressed` is what counts, not its value.
    pub fn digressed(&self) -> bool {
        self.0
            .get("system")
            .and_then(|system| system.get("digressed"))
            .is_some()
    }
}

impl From<serde_json::Value> for ConversationContext {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

// =============================================================================
// Display events
// =============================================================================

/// A selectable option offered by the assistant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptionItem {
    pub label: String,
    /// Raw option value; the text to send back lives at `input.text`.
    #[serde(default)]
    pub value: serde_json::Value,
}

impl OptionItem {
    pub fn new(label: impl Into<String>, input_text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: serde_json::json!({ "input": { "text": input_text.into() } }),
        }
    }

    /// The text submitted when this option is picked. Falls back to the label.
    pub fn input_text(&self) -> &str {
        self.value
            .pointer("/input/text")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.label)
    }
}

/// A side-channel notification, never part of the transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Notification {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// One unit of the chat transcript.
///
/// Events are immutable once created; the transcript only ever appends them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayEvent {
    UserText { text: String },
    BotText { text: String },
    OptionList { options: Vec<OptionItem> },
    OptionButtons { options: Vec<OptionItem> },
    Image { source: String },
    /// Playback delay; never appended to the transcript itself.
    Pause { duration_ms: u64, typing: bool },
    /// Raw search hits, rendered by the host.
    SearchResults { results: Vec<serde_json::Value> },
}

impl DisplayEvent {
    pub fn user_text(text: impl Into<String>) -> Self {
        DisplayEvent::UserText { text: text.into() }
    }

    pub fn bot_text(text: impl Into<String>) -> Self {
        DisplayEvent::BotText { text: text.into() }
    }

    pub fn pause(duration_ms: u64, typing: bool) -> Self {
        DisplayEvent::Pause {
            duration_ms,
            typing,
        }
    }

    /// User-authored events do not trigger a scroll after they are appended.
    pub fn is_user(&self) -> bool {
        matches!(self, DisplayEvent::UserText { .. })
    }

    pub fn is_pause(&self) -> bool {
        matches!(self, DisplayEvent::Pause { .. })
    }

    /// The options carried by a list or button event.
    pub fn options(&self) -> Option<&[OptionItem]> {
        match self {
            DisplayEvent::OptionList { options } | DisplayEvent::OptionButtons { options } => {
                Some(options)
            }
            _ => None,
        }
    }

    /// Stable kind name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DisplayEvent::UserText { .. } => "user_text",
            DisplayEvent::BotText { .. } => "bot_text",
            DisplayEvent::OptionList { .. } => "option_list",
            DisplayEvent::OptionButtons { .. } => "option_buttons",
            DisplayEvent::Image { .. } => "image",
            DisplayEvent::Pause { .. } => "pause",
            DisplayEvent::SearchResults { .. } => "search_results",
        }
    }
}

/// An item produced by a workspace action: either something to display or a
/// notification routed to the side channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseItem {
    Display(DisplayEvent),
    Notification(Notification),
}

/// Convert a pause event's duration into a `Duration`.
pub fn pause_duration(duration_ms: u64) -> Duration {
    Duration::from_millis(duration_ms)
}

// =============================================================================
// Turn status
// =============================================================================

/// Status of the current turn. Exactly one value is live at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    #[default]
    Idle,
    InProgress,
    Completed,
    Failed,
}

impl TurnStatus {
    /// Returns whether a transition from `self` to `target` is valid.
    ///
    /// `InProgress -> Idle` is only used when a turn is abandoned before the
    /// request leaves, e.g. on a configuration problem.
    pub fn can_transition_to(&self, target: &TurnStatus) -> bool {
        matches!(
            (self, target),
            (TurnStatus::Idle, TurnStatus::InProgress)
                | (TurnStatus::InProgress, TurnStatus::Completed)
                | (TurnStatus::InProgress, TurnStatus::Failed)
                | (TurnStatus::InProgress, TurnStatus::Idle)
                | (TurnStatus::Completed, TurnStatus::Idle)
                | (TurnStatus::Failed, TurnStatus::Idle)
        )
    }

    /// Whether the turn has finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self, TurnStatus::Completed | TurnStatus::Failed)
    }
}

impl fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnStatus::Idle => write!(f, "idle"),
            TurnStatus::InProgress => write!(f, "in_progress"),
            TurnStatus::Completed => write!(f, "completed"),
            TurnStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TurnStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(TurnStatus::Idle),
            "in_progress" => Ok(TurnStatus::InProgress),
            "completed" => Ok(TurnStatus::Completed),
            "failed" => Ok(TurnStatus::Failed),
            _ => Err(format!("Unknown turn status: {}", s)),
        }
    }
}
