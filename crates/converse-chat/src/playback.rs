//! Playback scheduler: reveals a turn's events into the transcript one at a
//! time.
//!
//! A single task owns the view and a FIFO of pending events. Non-pause events
//! are appended as soon as they reach the head of the queue; a pause holds
//! everything behind it until its duration elapses. Each non-user append
//! schedules a scroll to the newest message after a short delay. Turns queue
//! up behind each other, so their events never interleave.
//!
//! Dropping the scheduler stops the task and with it every pending pause and
//! scroll timer.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use converse_core::config::PlaybackConfig;
use converse_core::{pause_duration, DisplayEvent, Notification};
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Sleep};

use crate::error::ChatError;

/// The visible chat surface. Owned by the playback task.
pub trait ChatView: Send + 'static {
    /// Append one event to the transcript.
    fn append(&mut self, event: &DisplayEvent);

    /// Bring the newest transcript entry into view.
    fn scroll_to_latest(&mut self);

    /// Switch the composing indicator, with the placeholder to show.
    fn set_composing(&mut self, busy: bool, placeholder: &str);

    /// Show a notification on the side channel.
    fn show_notification(&mut self, notification: &Notification);
}

enum PlaybackCommand {
    Enqueue(Vec<DisplayEvent>),
    AppendNow(DisplayEvent),
    Notify(Notification),
    Flush(oneshot::Sender<()>),
}

/// Handle to the playback task.
pub struct PlaybackScheduler {
    commands: mpsc::UnboundedSender<PlaybackCommand>,
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl PlaybackScheduler {
    /// Spawn the playback task on the current runtime.
    pub fn spawn<V: ChatView>(view: V, config: PlaybackConfig) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(Notify::new());
        let task = tokio::spawn(run(view, config, rx, Arc::clone(&shutdown)));
        Self {
            commands,
            shutdown,
            task: Some(task),
        }
    }

    /// Queue a turn's events behind anything still playing.
    pub fn enqueue(&self, events: Vec<DisplayEvent>) -> Result<(), ChatError> {
        if events.is_empty() {
            return Ok(());
        }
        self.send(PlaybackCommand::Enqueue(events))
    }

    /// Append one event right away, bypassing the queue.
    pub fn append_now(&self, event: DisplayEvent) -> Result<(), ChatError> {
        self.send(PlaybackCommand::AppendNow(event))
    }

    /// Route a notification to the side channel.
    pub fn notify(&self, notification: Notification) -> Result<(), ChatError> {
        self.send(PlaybackCommand::Notify(notification))
    }

    /// Wait until every queued event is shown, no pause is pending and every
    /// scheduled scroll has fired.
    pub async fn wait_idle(&self) -> Result<(), ChatError> {
        let (tx, rx) = oneshot::channel();
        self.send(PlaybackCommand::Flush(tx))?;
        rx.await.map_err(|_| ChatError::PlaybackClosed)
    }

    /// Stop the task. Pending events and timers are discarded.
    pub fn shutdown(&mut self) {
        self.shutdown.notify_one();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn send(&self, command: PlaybackCommand) -> Result<(), ChatError> {
        self.commands
            .send(command)
            .map_err(|_| ChatError::PlaybackClosed)
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Player<V> {
    view: V,
    config: PlaybackConfig,
    scroll_delay: Duration,
    queue: VecDeque<DisplayEvent>,
    pause_until: Option<Instant>,
    /// The current pause switched the composing indicator to busy.
    composing: bool,
    scrolls: VecDeque<Instant>,
    flushes: Vec<oneshot::Sender<()>>,
}

impl<V: ChatView> Player<V> {
    fn new(view: V, config: PlaybackConfig) -> Self {
        let scroll_delay = Duration::from_millis(config.scroll_delay_ms);
        Self {
            view,
            config,
            scroll_delay,
            queue: VecDeque::new(),
            pause_until: None,
            composing: false,
            scrolls: VecDeque::new(),
            flushes: Vec::new(),
        }
    }

    fn handle(&mut self, command: PlaybackCommand) {
        match command {
            PlaybackCommand::Enqueue(events) => self.queue.extend(events),
            PlaybackCommand::AppendNow(event) => self.append(&event),
            PlaybackCommand::Notify(notification) => {
                tracing::debug!(text = %notification.text, "Showing notification");
                self.view.show_notification(&notification);
            }
            PlaybackCommand::Flush(done) => self.flushes.push(done),
        }
    }

    fn append(&mut self, event: &DisplayEvent) {
        tracing::debug!(kind = event.kind(), "Appending event");
        self.view.append(event);
        if !event.is_user() {
            self.scrolls.push_back(Instant::now() + self.scroll_delay);
        }
    }

    /// Reveal queued events until a pause blocks or the queue drains.
    fn advance(&mut self) {
        while self.pause_until.is_none() {
            let Some(event) = self.queue.pop_front() else {
                break;
            };
            match event {
                DisplayEvent::Pause {
                    duration_ms,
                    typing,
                } => {
                    if typing {
                        self.view
                            .set_composing(true, &self.config.typing_placeholder);
                        self.composing = true;
                    }
                    self.pause_until = Some(Instant::now() + pause_duration(duration_ms));
                }
                event => self.append(&event),
            }
        }
    }

    fn end_pause(&mut self) {
        self.pause_until = None;
        if std::mem::take(&mut self.composing) {
            self.view
                .set_composing(false, &self.config.idle_placeholder);
        }
    }

    fn scroll(&mut self) {
        self.scrolls.pop_front();
        self.view.scroll_to_latest();
    }

    fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.pause_until.is_none() && self.scrolls.is_empty()
    }

    fn release_flushes(&mut self) {
        if self.is_idle() {
            for done in self.flushes.drain(..) {
                let _ = done.send(());
            }
        }
    }
}

fn sleep_until(deadline: Option<Instant>) -> Sleep {
    tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now))
}

async fn run<V: ChatView>(
    view: V,
    config: PlaybackConfig,
    mut commands: mpsc::UnboundedReceiver<PlaybackCommand>,
    shutdown: Arc<Notify>,
) {
    let mut player = Player::new(view, config);

    loop {
        player.advance();
        player.release_flushes();

        let pause_until = player.pause_until;
        let next_scroll = player.scrolls.front().copied();

        tokio::select! {
            biased;

            _ = shutdown.notified() => {
                tracing::debug!("Playback shutting down");
                break;
            }

            _ = sleep_until(pause_until), if pause_until.is_some() => {
                player.end_pause();
            }

            _ = sleep_until(next_scroll), if next_scroll.is_some() => {
                player.scroll();
            }

            command = commands.recv() => match command {
                Some(command) => player.handle(command),
                None => break,
            },
        }
    }
}

// =============================================================================
// RecordingView
// =============================================================================

/// One call made on a `ChatView`.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewOp {
    Append(DisplayEvent),
    Scroll,
    Composing { busy: bool, placeholder: String },
    Notification(Notification),
}

/// A `ChatView` that records every call, for headless hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    ops: Arc<Mutex<Vec<ViewOp>>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in call order.
    pub fn ops(&self) -> Vec<ViewOp> {
        self.ops.lock().map(|ops| ops.clone()).unwrap_or_default()
    }

    /// Only the appended events, i.e. the transcript.
    pub fn transcript(&self) -> Vec<DisplayEvent> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                ViewOp::Append(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                ViewOp::Notification(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: ViewOp) {
        if let Ok(mut ops) = self.ops.lock() {
            ops.push(op);
        }
    }
}

impl ChatView for RecordingView {
    fn append(&mut self, event: &DisplayEvent) {
        self.record(ViewOp::Append(event.clone()));
    }

    fn scroll_to_latest(&mut self) {
        self.record(ViewOp::Scroll);
    }

    fn set_composing(&mut self, busy: bool, placeholder: &str) {
        self.record(ViewOp::Composing {
            busy,
            placeholder: placeholder.to_string(),
        });
    }

    fn show_notification(&mut self, notification: &Notification) {
        self.record(ViewOp::Notification(notification.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn() -> (PlaybackScheduler, RecordingView) {
        let view = RecordingView::new();
        let scheduler = PlaybackScheduler::spawn(view.clone(), PlaybackConfig::default());
        (scheduler, view)
    }

    /// Let the playback task process everything that is ready.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_plays_events_in_order() {
        let (scheduler, view) = spawn();
        scheduler
            .enqueue(vec![
                DisplayEvent::bot_text("one"),
                DisplayEvent::bot_text("two"),
            ])
            .unwrap();
        scheduler.wait_idle().await.unwrap();
        assert_eq!(
            view.transcript(),
            vec![DisplayEvent::bot_text("one"), DisplayEvent::bot_text("two")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_is_not_appended_and_delays_rest() {
        let (scheduler, view) = spawn();
        scheduler
            .enqueue(vec![
                DisplayEvent::bot_text("before"),
                DisplayEvent::pause(1000, true),
                DisplayEvent::bot_text("after"),
            ])
            .unwrap();

        settle().await;
        assert_eq!(view.transcript(), vec![DisplayEvent::bot_text("before")]);

        tokio::time::advance(Duration::from_millis(999)).await;
        settle().await;
        assert_eq!(view.transcript().len(), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(
            view.transcript(),
            vec![DisplayEvent::bot_text("before"), DisplayEvent::bot_text("after")]
        );
        assert!(view.transcript().iter().all(|e| !e.is_pause()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_pause_toggles_composing() {
        let (scheduler, view) = spawn();
        scheduler
            .enqueue(vec![DisplayEvent::pause(500, true)])
            .unwrap();
        scheduler.wait_idle().await.unwrap();

        let composing: Vec<_> = view
            .ops()
            .into_iter()
            .filter(|op| matches!(op, ViewOp::Composing { .. }))
            .collect();
        assert_eq!(
            composing,
            vec![
                ViewOp::Composing {
                    busy: true,
                    placeholder: "Watson is typing...".to_string()
                },
                ViewOp::Composing {
                    busy: false,
                    placeholder: "Type here...".to_string()
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_pause_leaves_composing_untouched() {
        let (scheduler, view) = spawn();
        scheduler
            .enqueue(vec![DisplayEvent::pause(500, false)])
            .unwrap();
        scheduler.wait_idle().await.unwrap();
        assert!(!view
            .ops()
            .iter()
            .any(|op| matches!(op, ViewOp::Composing { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_pauses_toggle_composing_once() {
        let (scheduler, view) = spawn();
        scheduler
            .enqueue(vec![
                DisplayEvent::pause(300, true),
                DisplayEvent::pause(300, false),
            ])
            .unwrap();
        scheduler.wait_idle().await.unwrap();

        let busy: Vec<bool> = view
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                ViewOp::Composing { busy, .. } => Some(busy),
                _ => None,
            })
            .collect();
        assert_eq!(busy, vec![true, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_after_bot_append_only() {
        let (scheduler, view) = spawn();
        scheduler
            .append_now(DisplayEvent::user_text("hi"))
            .unwrap();
        scheduler.wait_idle().await.unwrap();
        assert_eq!(view.ops(), vec![ViewOp::Append(DisplayEvent::user_text("hi"))]);

        scheduler
            .enqueue(vec![DisplayEvent::bot_text("hello")])
            .unwrap();
        settle().await;
        assert_eq!(view.ops().last(), Some(&ViewOp::Append(DisplayEvent::bot_text("hello"))));

        tokio::time::advance(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(view.ops().last(), Some(&ViewOp::Scroll));
    }

    #[tokio::test(start_paused = true)]
    async fn test_turns_queue_without_interleaving() {
        let (scheduler, view) = spawn();
        scheduler
            .enqueue(vec![
                DisplayEvent::bot_text("t1-a"),
                DisplayEvent::pause(1000, false),
                DisplayEvent::bot_text("t1-b"),
            ])
            .unwrap();
        scheduler
            .enqueue(vec![DisplayEvent::bot_text("t2-a")])
            .unwrap();
        scheduler.wait_idle().await.unwrap();
        assert_eq!(
            view.transcript(),
            vec![
                DisplayEvent::bot_text("t1-a"),
                DisplayEvent::bot_text("t1-b"),
                DisplayEvent::bot_text("t2-a"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_append_now_during_pause() {
        let (scheduler, view) = spawn();
        scheduler
            .enqueue(vec![
                DisplayEvent::pause(1000, false),
                DisplayEvent::bot_text("late"),
            ])
            .unwrap();
        scheduler
            .append_now(DisplayEvent::user_text("typed meanwhile"))
            .unwrap();
        settle().await;
        assert_eq!(
            view.transcript(),
            vec![DisplayEvent::user_text("typed meanwhile")]
        );
        scheduler.wait_idle().await.unwrap();
        assert_eq!(view.transcript().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_goes_to_side_channel() {
        let (scheduler, view) = spawn();
        scheduler.notify(Notification::new("Heads up")).unwrap();
        scheduler.wait_idle().await.unwrap();
        assert!(view.transcript().is_empty());
        assert_eq!(view.notifications(), vec![Notification::new("Heads up")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_timers() {
        let (mut scheduler, view) = spawn();
        scheduler
            .enqueue(vec![
                DisplayEvent::bot_text("shown"),
                DisplayEvent::pause(1000, true),
                DisplayEvent::bot_text("never shown"),
            ])
            .unwrap();
        settle().await;
        scheduler.shutdown();

        let before = view.ops();
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(view.ops(), before);
        assert_eq!(view.transcript(), vec![DisplayEvent::bot_text("shown")]);
        assert!(matches!(
            scheduler.enqueue(vec![DisplayEvent::bot_text("x")]),
            Err(ChatError::PlaybackClosed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_playback() {
        let (scheduler, view) = spawn();
        scheduler
            .enqueue(vec![
                DisplayEvent::pause(1000, false),
                DisplayEvent::bot_text("never shown"),
            ])
            .unwrap();
        settle().await;
        drop(scheduler);
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert!(view.transcript().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enqueue_empty_is_noop() {
        let (scheduler, view) = spawn();
        scheduler.enqueue(Vec::new()).unwrap();
        scheduler.wait_idle().await.unwrap();
        assert!(view.ops().is_empty());
    }
}
