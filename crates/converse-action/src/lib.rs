//! Action executors for Converse.
//!
//! Runs the client programmatic actions an assistant reply asks for through
//! pluggable async handlers, and turns workspace actions into display events
//! and side-channel notifications.

pub mod error;
pub mod handler;
pub mod types;
pub mod workspace;

pub use error::ActionError;
pub use handler::{ActionRegistry, ClientActionHandler};
pub use types::{ClientAction, ClientActionOutcome, ClientActionResult};
pub use workspace::{
    partition, DefaultWorkspaceActions, Partitioned, WorkspaceActionExecutor, STATEMENT_DISPLAY_KEY,
};
