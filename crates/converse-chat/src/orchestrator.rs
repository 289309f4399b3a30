//! Turn orchestrator: the chat session state machine.
//!
//! Owns turn status and the context store, sends messages, merges the
//! normalized generic output with workspace-action events, and hands each
//! turn's events to the playback scheduler.
//!
//! Client actions run as spawned tasks. Their completions are posted to an
//! inbox that the host drains through [`ChatSession::next_action_completion`]
//! and [`ChatSession::apply_action_completion`], so action-derived events are
//! always queued after the turn that requested them.

use std::sync::Arc;
use std::time::Duration;

use converse_action::{
    partition, ActionError, ActionRegistry, ClientAction, ClientActionOutcome,
    DefaultWorkspaceActions, WorkspaceActionExecutor, STATEMENT_DISPLAY_KEY,
};
use converse_core::config::ChatConfig;
use converse_core::{ConversationContext, ConverseConfig, DisplayEvent, Notification, TurnStatus};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::context::ContextStore;
use crate::error::ChatError;
use crate::normalizer::OutputNormalizer;
use crate::playback::PlaybackScheduler;
use crate::reply::{AssistantReply, MessageRequest};
use crate::status::TurnState;
use crate::telemetry::{Telemetry, TelemetryEvent, TracingTelemetry};
use crate::transport::MessageTransport;

/// Where a submission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Typed by the user; echoed into the transcript.
    Text,
    /// Picked from a rendered option list; not echoed.
    Option,
}

/// One user submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInput {
    pub kind: InputKind,
    pub text: String,
}

impl UserInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: InputKind::Text,
            text: text.into(),
        }
    }

    pub fn option(text: impl Into<String>) -> Self {
        Self {
            kind: InputKind::Option,
            text: text.into(),
        }
    }
}

/// The out-of-band result of one client action.
#[derive(Debug)]
pub struct ActionCompletion {
    pub turn_id: Uuid,
    pub action: String,
    /// Whether the reply that requested the action carried a context.
    pub reply_had_context: bool,
    pub outcome: Result<ClientActionOutcome, ActionError>,
}

/// One conversation with the assistant.
pub struct ChatSession {
    transport: Arc<dyn MessageTransport>,
    actions: Arc<ActionRegistry>,
    workspace: Arc<dyn WorkspaceActionExecutor>,
    telemetry: Arc<dyn Telemetry>,
    normalizer: OutputNormalizer,
    context: ContextStore,
    state: TurnState,
    playback: PlaybackScheduler,
    inbox_tx: mpsc::UnboundedSender<ActionCompletion>,
    inbox_rx: mpsc::UnboundedReceiver<ActionCompletion>,
    config: ChatConfig,
    config_problems: Vec<String>,
    session_id: Option<String>,
}

impl ChatSession {
    /// Create a session with the built-in client actions and workspace
    /// executor, and tracing telemetry.
    pub fn new(
        transport: Arc<dyn MessageTransport>,
        playback: PlaybackScheduler,
        config: &ConverseConfig,
    ) -> Self {
        let mut actions = ActionRegistry::new()
            .with_timeout(Duration::from_secs(config.chat.client_action_timeout_secs));
        actions.register_defaults();

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let seed = config
            .chat
            .initial_context
            .clone()
            .map(ConversationContext::new);

        Self {
            transport,
            actions: Arc::new(actions),
            workspace: Arc::new(DefaultWorkspaceActions),
            telemetry: Arc::new(TracingTelemetry),
            normalizer: OutputNormalizer::new(),
            context: ContextStore::new(seed),
            state: TurnState::new(),
            playback,
            inbox_tx,
            inbox_rx,
            config: config.chat.clone(),
            config_problems: config.missing_identifiers(),
            session_id: None,
        }
    }

    /// Replace the client action registry.
    pub fn with_actions(mut self, actions: ActionRegistry) -> Self {
        self.actions = Arc::new(actions);
        self
    }

    /// Replace the workspace action executor.
    pub fn with_workspace(mut self, workspace: Arc<dyn WorkspaceActionExecutor>) -> Self {
        self.workspace = workspace;
        self
    }

    /// Replace the telemetry sink.
    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn status(&self) -> TurnStatus {
        self.state.current()
    }

    /// Receive every turn status change.
    pub fn subscribe_status(&self) -> watch::Receiver<TurnStatus> {
        self.state.subscribe()
    }

    /// The context returned by the last successful turn.
    pub fn context(&self) -> Option<&ConversationContext> {
        self.context.current()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn playback(&self) -> &PlaybackScheduler {
        &self.playback
    }

    /// Bootstrap the session, then send the greeting turn when enabled.
    ///
    /// Failing to obtain a session id is fatal; a failed greeting behaves like
    /// any failed turn.
    pub async fn start(&mut self) -> Result<TurnStatus, ChatError> {
        if !self.config_problems.is_empty() {
            return self.report_config_problems();
        }

        let session_id = self.transport.create_session().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to create session");
            match e {
                ChatError::SessionUnavailable(_) => e,
                other => ChatError::SessionUnavailable(other.to_string()),
            }
        })?;
        tracing::info!(session_id = %session_id, "Session created");
        self.session_id = Some(session_id);

        if !self.config.greet_on_start {
            return Ok(self.status());
        }
        let context = self.context.outgoing();
        self.send_message(String::new(), context).await
    }

    /// Handle one user submission.
    ///
    /// Empty or whitespace-only input is rejected before anything is shown.
    /// Typed input is echoed into the transcript; option picks are not.
    pub async fn submit(&mut self, input: UserInput) -> Result<TurnStatus, ChatError> {
        self.telemetry.track(&TelemetryEvent::sent_message());

        if input.text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        if input.kind != InputKind::Option {
            self.playback
                .append_now(DisplayEvent::user_text(input.text.clone()))?;
        }

        let context = self.context.outgoing();
        self.send_message(input.text, context).await
    }

    /// Send one message and process the reply.
    async fn send_message(
        &mut self,
        text: String,
        context: Option<ConversationContext>,
    ) -> Result<TurnStatus, ChatError> {
        if !self.config_problems.is_empty() {
            return self.report_config_problems();
        }

        let turn_id = Uuid::new_v4();
        self.state.begin()?;

        let request = MessageRequest {
            text,
            context,
            is_first_turn: self.context.is_first_turn(),
            session_id: self.session_id.clone(),
        };
        tracing::info!(%turn_id, first_turn = request.is_first_turn, "Sending message");

        match self.transport.send_message(&request).await {
            Ok(reply) => {
                self.state.transition(TurnStatus::Completed)?;
                if let Ok(raw) = serde_json::to_string(&reply) {
                    tracing::debug!(%turn_id, reply = %raw, "Assistant reply");
                }

                let events = self.assemble(turn_id, &reply)?;
                tracing::info!(%turn_id, events = events.len(), "Turn completed");
                self.playback.enqueue(events)?;
                self.context.replace(reply.context);
                Ok(TurnStatus::Completed)
            }
            Err(ChatError::Configuration(message)) => {
                tracing::warn!(%turn_id, %message, "Assistant service is not configured");
                self.state.transition(TurnStatus::Idle)?;
                self.playback.enqueue(vec![DisplayEvent::bot_text(message)])?;
                Ok(TurnStatus::Idle)
            }
            Err(err) => {
                self.state.transition(TurnStatus::Failed)?;
                self.playback
                    .enqueue(vec![DisplayEvent::bot_text(self.config.apology_text.clone())])?;
                tracing::error!(%turn_id, error = %err, "Turn failed");
                Err(err)
            }
        }
    }

    /// Show local configuration problems as bot text. Status stays idle.
    fn report_config_problems(&self) -> Result<TurnStatus, ChatError> {
        let message = self.config_problems.join(" ");
        tracing::warn!(%message, "Message not sent: client is not configured");
        self.playback.enqueue(vec![DisplayEvent::bot_text(message)])?;
        Ok(self.status())
    }

    /// Build the turn's event list and route its notifications.
    ///
    /// Generic-output events come first, then events from `action` and
    /// `ui_action`. Client actions are spawned here; their results arrive
    /// later through the inbox.
    fn assemble(
        &self,
        turn_id: Uuid,
        reply: &AssistantReply,
    ) -> Result<Vec<DisplayEvent>, ChatError> {
        let output = &reply.output;
        let mut events = self.normalizer.normalize(output.fragments());

        if !output.client_actions().is_empty() {
            self.spawn_client_actions(turn_id, output.client_actions(), reply.context.is_some());
        }

        let mut notified = 0usize;
        for payload in output.workspace_payloads() {
            let parts = partition(self.workspace.execute(payload));
            events.extend(parts.events);
            for notification in parts.notifications {
                self.playback.notify(notification)?;
                notified += 1;
            }
        }

        if notified == 0
            && reply
                .context
                .as_ref()
                .is_some_and(ConversationContext::digressed)
        {
            tracing::debug!(%turn_id, "Digression detected");
            self.playback
                .notify(Notification::new(self.config.digression_text.clone()))?;
        }

        Ok(events)
    }

    fn spawn_client_actions(
        &self,
        turn_id: Uuid,
        actions: &[ClientAction],
        reply_had_context: bool,
    ) {
        for action in actions.iter().cloned() {
            let registry = Arc::clone(&self.actions);
            let inbox = self.inbox_tx.clone();
            tracing::debug!(%turn_id, action = %action.name, "Spawning client action");
            tokio::spawn(async move {
                let outcome = registry.execute(&action).await;
                let _ = inbox.send(ActionCompletion {
                    turn_id,
                    action: action.name,
                    reply_had_context,
                    outcome,
                });
            });
        }
    }

    /// Wait for the next client action to finish.
    pub async fn next_action_completion(&mut self) -> Option<ActionCompletion> {
        self.inbox_rx.recv().await
    }

    /// Apply a finished client action.
    ///
    /// A failed action is logged and otherwise ignored. A result for a reply
    /// that had no context is sent back as a new message; a `statement`
    /// result is rendered through the workspace executor.
    pub async fn apply_action_completion(
        &mut self,
        completion: ActionCompletion,
    ) -> Result<(), ChatError> {
        let ActionCompletion {
            turn_id,
            action,
            reply_had_context,
            outcome,
        } = completion;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(%turn_id, %action, error = %e, "Client action failed");
                return Ok(());
            }
        };

        if !reply_had_context {
            tracing::info!(%turn_id, %action, "Sending client action result");
            self.send_message(outcome.result.to_string(), None).await?;
            return Ok(());
        }

        if outcome.is_statement() {
            let payload = serde_json::json!({
                STATEMENT_DISPLAY_KEY: outcome.dates.unwrap_or(serde_json::Value::Null)
            });
            let parts = partition(self.workspace.execute(&payload));
            for notification in parts.notifications {
                self.playback.notify(notification)?;
            }
            self.playback.enqueue(parts.events)?;
            return Ok(());
        }

        tracing::debug!(%turn_id, %action, "Client action result not used");
        Ok(())
    }

    /// Apply every completion that has already arrived, without waiting.
    pub async fn drain_action_completions(&mut self) -> Result<usize, ChatError> {
        let mut applied = 0;
        while let Ok(completion) = self.inbox_rx.try_recv() {
            self.apply_action_completion(completion).await?;
            applied += 1;
        }
        Ok(applied)
    }
}
