//! Display summaries of document-search hits.

use converse_core::config::SearchConfig;

const ELLIPSIS: &str = "...";

/// A search hit reduced to what the transcript shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: Option<String>,
    pub title: String,
    pub text: String,
}

impl SearchHit {
    /// Read a raw hit. The title is the first `title` element, falling back
    /// to the first `subtitle` element; either may also be a plain string.
    pub fn from_raw(raw: &serde_json::Value) -> Self {
        let title = first_text(raw.get("title"))
            .or_else(|| first_text(raw.get("subtitle")))
            .unwrap_or_default();
        let text = first_text(raw.get("text")).unwrap_or_default();
        let id = raw
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Self { id, title, text }
    }

    /// Truncate title and text to the configured limits.
    pub fn truncated(mut self, config: &SearchConfig) -> Self {
        self.title = truncate(&self.title, config.title_max_chars);
        self.text = truncate(&self.text, config.text_max_chars);
        self
    }
}

/// The hits a search-results event shows: at most `max_results_shown`,
/// each truncated.
pub fn summarize_hits(results: &[serde_json::Value], config: &SearchConfig) -> Vec<SearchHit> {
    results
        .iter()
        .take(config.max_results_shown)
        .map(|raw| SearchHit::from_raw(raw).truncated(config))
        .collect()
}

fn first_text(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => items.first()?.as_str().map(str::to_string),
        _ => None,
    }
}

/// Cut `s` to `max` characters, ending in "..." when it was longer.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}
