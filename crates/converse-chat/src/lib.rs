//! Conversational turn engine for Converse.
//!
//! Sends user messages to the assistant service, turns each reply into an
//! ordered list of display events, and plays them into the chat view with
//! the pauses and typing indicator the assistant asked for.

pub mod context;
pub mod error;
pub mod http;
pub mod normalizer;
pub mod orchestrator;
pub mod playback;
pub mod reply;
pub mod search;
pub mod status;
pub mod telemetry;
pub mod transport;

pub use context::ContextStore;
pub use error::ChatError;
pub use http::HttpMessageClient;
pub use normalizer::OutputNormalizer;
pub use orchestrator::{ActionCompletion, ChatSession, InputKind, UserInput};
pub use playback::{ChatView, PlaybackScheduler, RecordingView, ViewOp};
pub use reply::{AssistantReply, GenericFragment, MessageRequest, RawAssistantOutput, UserDefined};
pub use search::{summarize_hits, SearchHit};
pub use status::TurnState;
pub use telemetry::{NoopTelemetry, Telemetry, TelemetryEvent, TracingTelemetry};
pub use transport::MessageTransport;
