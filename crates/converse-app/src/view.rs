//! Terminal rendering of the chat transcript.

use std::io::Write;
use std::sync::{Arc, Mutex};

use converse_chat::{summarize_hits, ChatView, UserInput};
use converse_core::config::SearchConfig;
use converse_core::{DisplayEvent, Notification, OptionItem};

/// The options most recently shown, so a typed number can pick one.
#[derive(Debug, Clone, Default)]
pub struct ShownOptions {
    inner: Arc<Mutex<Vec<OptionItem>>>,
}

impl ShownOptions {
    fn replace(&self, options: &[OptionItem]) {
        if let Ok(mut shown) = self.inner.lock() {
            *shown = options.to_vec();
        }
    }

    fn clear(&self) {
        self.replace(&[]);
    }

    /// Turn a typed line into a submission.
    ///
    /// A number matching a shown option submits that option's input text and
    /// retires the options; anything else is typed text.
    pub fn resolve(&self, line: &str) -> UserInput {
        let picked = line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| {
                let mut shown = self.inner.lock().ok()?;
                let text = shown.get(i)?.input_text().to_string();
                shown.clear();
                Some(text)
            });
        match picked {
            Some(text) => UserInput::option(text),
            None => UserInput::text(line),
        }
    }
}

/// Writes the transcript as plain lines.
pub struct TerminalView {
    out: Box<dyn Write + Send>,
    search: SearchConfig,
    options: ShownOptions,
}

impl TerminalView {
    pub fn new(out: Box<dyn Write + Send>, search: SearchConfig) -> Self {
        Self {
            out,
            search,
            options: ShownOptions::default(),
        }
    }

    pub fn stdout(search: SearchConfig) -> Self {
        Self::new(Box::new(std::io::stdout()), search)
    }

    /// Shared handle to the options currently on screen.
    pub fn shown_options(&self) -> ShownOptions {
        self.options.clone()
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            tracing::warn!(error = %e, "Failed to write to terminal");
        }
    }

    fn render_options(&mut self, options: &[OptionItem], buttons: bool) {
        self.options.replace(options);
        for (i, option) in options.iter().enumerate() {
            let line = if buttons {
                format!("  [{}] {}", i + 1, option.label)
            } else {
                format!("  {}. {}", i + 1, option.label)
            };
            self.line(&line);
        }
    }
}

impl ChatView for TerminalView {
    fn append(&mut self, event: &DisplayEvent) {
        match event {
            DisplayEvent::UserText { text } => {
                self.options.clear();
                self.line(&format!("you> {}", text));
            }
            DisplayEvent::BotText { text } => {
                if !text.is_empty() {
                    self.line(&format!("bot> {}", text));
                }
            }
            DisplayEvent::OptionList { options } => self.render_options(options, false),
            DisplayEvent::OptionButtons { options } => self.render_options(options, true),
            DisplayEvent::Image { source } => self.line(&format!("bot> [image] {}", source)),
            DisplayEvent::SearchResults { results } => {
                for hit in summarize_hits(results, &self.search) {
                    self.line(&format!("  * {}", hit.title));
                    if !hit.text.is_empty() {
                        self.line(&format!("    {}", hit.text));
                    }
                }
            }
            DisplayEvent::Pause { .. } => {}
        }
    }

    fn scroll_to_latest(&mut self) {
        if let Err(e) = self.out.flush() {
            tracing::warn!(error = %e, "Failed to flush terminal");
        }
    }

    fn set_composing(&mut self, busy: bool, placeholder: &str) {
        if busy {
            self.line(&format!("   ({})", placeholder));
        }
    }

    fn show_notification(&mut self, notification: &Notification) {
        let line = match &notification.link {
            Some(link) => format!("[notice] {} ({})", notification.text, link),
            None => format!("[notice] {}", notification.text),
        };
        self.line(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converse_chat::InputKind;
    use serde_json::json;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn view() -> (TerminalView, SharedBuf) {
        let buf = SharedBuf::default();
        (
            TerminalView::new(Box::new(buf.clone()), SearchConfig::default()),
            buf,
        )
    }

    #[test]
    fn test_renders_text_and_skips_empty_bot_text() {
        let (mut view, buf) = view();
        view.append(&DisplayEvent::user_text("hi"));
        view.append(&DisplayEvent::bot_text(""));
        view.append(&DisplayEvent::bot_text("hello"));
        assert_eq!(buf.text(), "you> hi\nbot> hello\n");
    }

    #[test]
    fn test_numbered_options_resolve_to_input_text() {
        let (mut view, buf) = view();
        let shown = view.shown_options();
        view.append(&DisplayEvent::OptionList {
            options: vec![
                OptionItem::new("Checking", "checking account"),
                OptionItem::new("Savings", "savings account"),
            ],
        });
        assert!(buf.text().contains("  2. Savings"));

        let input = shown.resolve(" 2 ");
        assert_eq!(input.kind, InputKind::Option);
        assert_eq!(input.text, "savings account");
    }

    #[test]
    fn test_options_retired_after_pick() {
        let (mut view, _buf) = view();
        let shown = view.shown_options();
        view.append(&DisplayEvent::OptionList {
            options: vec![OptionItem::new("Checking", "checking account")],
        });

        assert_eq!(shown.resolve("1"), UserInput::option("checking account"));
        assert_eq!(shown.resolve("1"), UserInput::text("1"));
    }

    #[test]
    fn test_options_retired_after_typed_reply() {
        let (mut view, _buf) = view();
        let shown = view.shown_options();
        view.append(&DisplayEvent::OptionList {
            options: vec![
                OptionItem::new("Checking", "checking account"),
                OptionItem::new("Savings", "savings account"),
            ],
        });
        view.append(&DisplayEvent::user_text("something else"));
        view.append(&DisplayEvent::bot_text("How many accounts do you have?"));

        assert_eq!(shown.resolve("2"), UserInput::text("2"));
    }

    #[test]
    fn test_out_of_range_number_is_text() {
        let (view, _buf) = view();
        let shown = view.shown_options();
        assert_eq!(shown.resolve("1"), UserInput::text("1"));
        assert_eq!(shown.resolve("0"), UserInput::text("0"));
        assert_eq!(shown.resolve("balance"), UserInput::text("balance"));
    }

    #[test]
    fn test_buttons_render_bracketed() {
        let (mut view, buf) = view();
        view.append(&DisplayEvent::OptionButtons {
            options: vec![OptionItem::new("Yes", "yes")],
        });
        assert_eq!(buf.text(), "  [1] Yes\n");
    }

    #[test]
    fn test_search_results_truncated() {
        let (mut view, buf) = view();
        view.append(&DisplayEvent::SearchResults {
            results: vec![
                json!({"title": ["a".repeat(60)], "text": ["body"]}),
                json!({"subtitle": ["Sub"], "text": "x"}),
            ],
        });
        let text = buf.text();
        assert!(text.contains(&format!("  * {}...", "a".repeat(47))));
        assert!(text.contains("  * Sub"));
    }

    #[test]
    fn test_notification_and_typing() {
        let (mut view, buf) = view();
        view.show_notification(&Notification::new("Payment due").with_link("https://bank.test"));
        view.set_composing(true, "Watson is typing...");
        view.set_composing(false, "Type here...");
        assert_eq!(
            buf.text(),
            "[notice] Payment due (https://bank.test)\n   (Watson is typing...)\n"
        );
    }
}
