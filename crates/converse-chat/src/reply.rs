//! Assistant reply and message request types.
//!
//! A reply is owned by the orchestrator for the duration of one turn and is
//! never persisted.

use converse_action::ClientAction;
use converse_core::{ConversationContext, OptionItem};
use serde::{Deserialize, Deserializer, Serialize};

/// One generic output fragment emitted by the assistant.
///
/// Fields are lenient so a sparse fragment still renders: `null` reads as the
/// field's default and a fractional pause time is rounded down. A kind this
/// client does not know deserializes to `Unknown` and is skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "response_type", rename_all = "snake_case")]
pub enum GenericFragment {
    Title {
        #[serde(default, deserialize_with = "null_as_default")]
        text: String,
    },
    Option {
        #[serde(default, deserialize_with = "null_as_default")]
        title: String,
        #[serde(default, deserialize_with = "null_as_default")]
        options: Vec<OptionItem>,
        /// `"list"` or `"button"`; absent means list.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        preference: Option<String>,
    },
    Pause {
        /// Duration in milliseconds.
        #[serde(default, deserialize_with = "lenient_millis")]
        time: u64,
        #[serde(default, deserialize_with = "null_as_default")]
        typing: bool,
    },
    Text {
        #[serde(default, deserialize_with = "null_as_default")]
        text: String,
    },
    Image {
        #[serde(default, deserialize_with = "null_as_default")]
        source: String,
    },
    Search {
        #[serde(default, deserialize_with = "null_as_default")]
        header: String,
        #[serde(default, deserialize_with = "null_as_default")]
        results: Vec<serde_json::Value>,
    },
    #[serde(other)]
    Unknown,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Milliseconds from any JSON number or numeric string. Fractions round down;
/// negative or non-numeric values read as 0.
fn lenient_millis<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().map(floor_millis)),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok().map(floor_millis),
        _ => None,
    };
    Ok(millis.unwrap_or(0))
}

fn floor_millis(value: f64) -> u64 {
    if value > 0.0 {
        value as u64
    } else {
        0
    }
}

/// Parse each fragment on its own; a malformed one becomes `Unknown` instead
/// of failing the whole reply.
fn lenient_fragments<'de, D>(deserializer: D) -> Result<Option<Vec<GenericFragment>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw.map(|values| {
        values
            .into_iter()
            .map(|value| {
                serde_json::from_value(value).unwrap_or_else(|e| {
                    tracing::debug!(error = %e, "Skipping malformed output fragment");
                    GenericFragment::Unknown
                })
            })
            .collect()
    }))
}

/// Workspace action payloads carried under `output.user_defined`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDefined {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_action: Option<serde_json::Value>,
}

/// The unprocessed output of one reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAssistantOutput {
    #[serde(
        default,
        deserialize_with = "lenient_fragments",
        skip_serializing_if = "Option::is_none"
    )]
    pub generic: Option<Vec<GenericFragment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ClientAction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_defined: Option<UserDefined>,
}

impl RawAssistantOutput {
    pub fn fragments(&self) -> &[GenericFragment] {
        self.generic.as_deref().unwrap_or(&[])
    }

    pub fn client_actions(&self) -> &[ClientAction] {
        self.actions.as_deref().unwrap_or(&[])
    }

    /// The `action` and `ui_action` payloads, in that order, skipping absent ones.
    pub fn workspace_payloads(&self) -> impl Iterator<Item = &serde_json::Value> {
        self.user_defined
            .iter()
            .flat_map(|ud| [ud.action.as_ref(), ud.ui_action.as_ref()])
            .flatten()
    }
}

/// A successful reply: the output to render and the context for the next turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantReply {
    #[serde(default)]
    pub output: RawAssistantOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ConversationContext>,
}

impl AssistantReply {
    pub fn new(output: RawAssistantOutput, context: Option<ConversationContext>) -> Self {
        Self { output, context }
    }
}

/// An outgoing message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRequest {
    pub text: String,
    pub context: Option<ConversationContext>,
    pub is_first_turn: bool,
    pub session_id: Option<String>,
}
