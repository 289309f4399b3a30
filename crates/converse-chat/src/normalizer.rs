//! Output normalizer: generic fragments to display events.

use converse_core::DisplayEvent;

use crate::reply::GenericFragment;

/// Converts a reply's generic fragments into an ordered list of display
/// events. Output is a pure function of the input.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutputNormalizer;

impl OutputNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize fragments in order.
    ///
    /// - `title` → bot-text
    /// - `option` → bot-text (title) + option list or buttons
    /// - `pause` → pause
    /// - `text` → bot-text, only when non-empty
    /// - `image` → image
    /// - `search` → bot-text (header) + search results
    /// - unknown kinds → nothing
    pub fn normalize(&self, fragments: &[GenericFragment]) -> Vec<DisplayEvent> {
        let mut events = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            match fragment {
                GenericFragment::Title { text } => {
                    events.push(DisplayEvent::bot_text(text.clone()));
                }
                GenericFragment::Option {
                    title,
                    options,
                    preference,
                } => {
                    events.push(DisplayEvent::bot_text(title.clone()));
                    let options = options.clone();
                    events.push(match preference.as_deref() {
                        Some("button") => DisplayEvent::OptionButtons { options },
                        _ => DisplayEvent::OptionList { options },
                    });
                }
                GenericFragment::Pause { time, typing } => {
                    events.push(DisplayEvent::pause(*time, *typing));
                }
                GenericFragment::Text { text } => {
                    if !text.is_empty() {
                        events.push(DisplayEvent::bot_text(text.clone()));
                    }
                }
                GenericFragment::Image { source } => {
                    events.push(DisplayEvent::Image {
                        source: source.clone(),
                    });
                }
                GenericFragment::Search { header, results } => {
                    events.push(DisplayEvent::bot_text(header.clone()));
                    events.push(DisplayEvent::SearchResults {
                        results: results.clone(),
                    });
                }
                GenericFragment::Unknown => {
                    tracing::debug!("Skipping unrecognised generic fragment");
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converse_core::OptionItem;
    use serde_json::json;

    fn fragments(value: serde_json::Value) -> Vec<GenericFragment> {
        serde_json::from_value(value).unwrap()
    }

    fn normalize(value: serde_json::Value) -> Vec<DisplayEvent> {
        OutputNormalizer::new().normalize(&fragments(value))
    }

    #[test]
    fn test_title_then_option() {
        let events = normalize(json!([
            {"response_type": "title", "text": "Hi"},
            {"response_type": "option", "title": "Pick one",
             "options": [{"label": "A"}, {"label": "B"}]}
        ]));
        assert_eq!(
            events,
            vec![
                DisplayEvent::bot_text("Hi"),
                DisplayEvent::bot_text("Pick one"),
                DisplayEvent::OptionList {
                    options: vec![
                        serde_json::from_value::<OptionItem>(json!({"label": "A"})).unwrap(),
                        serde_json::from_value::<OptionItem>(json!({"label": "B"})).unwrap(),
                    ]
                },
            ]
        );
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(normalize(json!([{"response_type": "text", "text": ""}])).is_empty());
    }

    #[test]
    fn test_whitespace_text_is_kept() {
        assert_eq!(
            normalize(json!([{"response_type": "text", "text": " "}])),
            vec![DisplayEvent::bot_text(" ")]
        );
    }

    #[test]
    fn test_option_always_two_events() {
        for preference in [json!(null), json!("list"), json!("button"), json!("dropdown")] {
            let events = normalize(json!([
                {"response_type": "option", "title": "", "options": [], "preference": preference}
            ]));
            assert_eq!(events.len(), 2);
            assert_eq!(events[0], DisplayEvent::bot_text(""));
            assert!(events[1].options().is_some());
        }
    }

    #[test]
    fn test_option_preference_button() {
        let events = normalize(json!([
            {"response_type": "option", "title": "Go?", "preference": "button",
             "options": [{"label": "Yes"}]}
        ]));
        assert!(matches!(events[1], DisplayEvent::OptionButtons { .. }));
    }

    #[test]
    fn test_option_preference_defaults_to_list() {
        let events = normalize(json!([
            {"response_type": "option", "title": "Go?", "options": [{"label": "Yes"}]}
        ]));
        assert!(matches!(events[1], DisplayEvent::OptionList { .. }));
    }

    #[test]
    fn test_pause_carries_duration_and_typing() {
        assert_eq!(
            normalize(json!([{"response_type": "pause", "time": 2000, "typing": true}])),
            vec![DisplayEvent::pause(2000, true)]
        );
    }

    #[test]
    fn test_image() {
        assert_eq!(
            normalize(json!([{"response_type": "image", "source": "https://img.test/a.png"}])),
            vec![DisplayEvent::Image {
                source: "https://img.test/a.png".to_string()
            }]
        );
    }

    #[test]
    fn test_search_header_then_results() {
        let events = normalize(json!([
            {"response_type": "search", "header": "I found this:",
             "results": [{"id": "d1", "title": ["Fees"]}]}
        ]));
        assert_eq!(
            events,
            vec![
                DisplayEvent::bot_text("I found this:"),
                DisplayEvent::SearchResults {
                    results: vec![json!({"id": "d1", "title": ["Fees"]})]
                },
            ]
        );
    }

    #[test]
    fn test_unknown_kinds_skipped_in_place() {
        let events = normalize(json!([
            {"response_type": "text", "text": "one"},
            {"response_type": "connect_to_agent"},
            {"response_type": "text", "text": "two"}
        ]));
        assert_eq!(
            events,
            vec![DisplayEvent::bot_text("one"), DisplayEvent::bot_text("two")]
        );
    }

    #[test]
    fn test_null_text_and_fractional_pause() {
        let events = OutputNormalizer::new().normalize(&fragments(json!([
            {"response_type": "text", "text": "fine"},
            {"response_type": "text", "text": null},
            {"response_type": "pause", "time": 1500.0, "typing": true}
        ])));
        assert_eq!(
            events,
            vec![DisplayEvent::bot_text("fine"), DisplayEvent::pause(1500, true)]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(OutputNormalizer::new().normalize(&[]).is_empty());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let input = fragments(json!([
            {"response_type": "title", "text": "Hi"},
            {"response_type": "pause", "time": 500, "typing": false},
            {"response_type": "text", "text": ""},
            {"response_type": "option", "title": "Pick", "options": [{"label": "A"}]}
        ]));
        let normalizer = OutputNormalizer::new();
        assert_eq!(normalizer.normalize(&input), normalizer.normalize(&input));
    }
}
