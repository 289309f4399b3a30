//! Workspace actions: structured instructions embedded in an assistant reply.
//!
//! A workspace action is a pure transformation of its payload into response
//! items. Display items go into the turn's event list; notifications are
//! routed to the side channel and never enter the transcript.

use chrono::NaiveDate;
use converse_core::{DisplayEvent, Notification, OptionItem, ResponseItem};
use serde::Deserialize;

/// Key of the statement payload produced from a `statement` client action.
pub const STATEMENT_DISPLAY_KEY: &str = "statement_display";

/// Turns a workspace action payload into response items, synchronously.
pub trait WorkspaceActionExecutor: Send + Sync {
    fn execute(&self, payload: &serde_json::Value) -> Vec<ResponseItem>;
}

/// Response items split by destination, each in executor output order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitioned {
    pub events: Vec<DisplayEvent>,
    pub notifications: Vec<Notification>,
}

/// Split response items into transcript events and notifications.
pub fn partition(items: Vec<ResponseItem>) -> Partitioned {
    let mut out = Partitioned::default();
    for item in items {
        match item {
            ResponseItem::Display(event) => out.events.push(event),
            ResponseItem::Notification(notification) => out.notifications.push(notification),
        }
    }
    out
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WorkspaceAction {
    Text {
        text: String,
    },
    Image {
        source: String,
    },
    Options {
        #[serde(default)]
        title: Option<String>,
        options: Vec<OptionItem>,
        #[serde(default)]
        preference: Option<String>,
    },
    Notification {
        text: String,
        #[serde(default)]
        link: Option<String>,
    },
}

/// The built-in workspace action vocabulary.
///
/// Accepts a single action object or an array of them. Recognised shapes:
/// `text`, `image`, `options`, `notification` (by `type`) and
/// `{"statement_display": {"start", "end"}}`. Anything else is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultWorkspaceActions;

impl WorkspaceActionExecutor for DefaultWorkspaceActions {
    fn execute(&self, payload: &serde_json::Value) -> Vec<ResponseItem> {
        let mut items = Vec::new();
        match payload {
            serde_json::Value::Array(actions) => {
                for action in actions {
                    expand_action(action, &mut items);
                }
            }
            other => expand_action(other, &mut items),
        }
        items
    }
}

fn expand_action(action: &serde_json::Value, items: &mut Vec<ResponseItem>) {
    if let Some(dates) = action.get(STATEMENT_DISPLAY_KEY) {
        items.push(ResponseItem::Display(DisplayEvent::bot_text(
            statement_summary(dates),
        )));
        return;
    }

    let parsed = match WorkspaceAction::deserialize(action) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unrecognised workspace action");
            return;
        }
    };

    match parsed {
        WorkspaceAction::Text { text } => {
            items.push(ResponseItem::Display(DisplayEvent::bot_text(text)));
        }
        WorkspaceAction::Image { source } => {
            items.push(ResponseItem::Display(DisplayEvent::Image { source }));
        }
        WorkspaceAction::Options {
            title,
            options,
            preference,
        } => {
            if let Some(title) = title.filter(|t| !t.is_empty()) {
                items.push(ResponseItem::Display(DisplayEvent::bot_text(title)));
            }
            let event = if preference.as_deref() == Some("button") {
                DisplayEvent::OptionButtons { options }
            } else {
                DisplayEvent::OptionList { options }
            };
            items.push(ResponseItem::Display(event));
        }
        WorkspaceAction::Notification { text, link } => {
            items.push(ResponseItem::Notification(Notification { text, link }));
        }
    }
}

/// Human-readable summary of a statement date range.
fn statement_summary(dates: &serde_json::Value) -> String {
    let start = dates.get("start").and_then(|v| v.as_str()).map(format_date);
    let end = dates.get("end").and_then(|v| v.as_str()).map(format_date);
    match (start, end) {
        (Some(start), Some(end)) => {
            format!("Here is your statement from {} to {}.", start, end)
        }
        (Some(start), None) => format!("Here is your statement since {}.", start),
        _ => "Here is your latest statement.".to_string(),
    }
}

/// Format `YYYY-MM-DD` (optionally followed by a time) as e.g. "March 1, 2024".
/// Unparseable input is returned as-is.
fn format_date(raw: &str) -> String {
    let day = raw.split_whitespace().next().unwrap_or(raw);
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}
