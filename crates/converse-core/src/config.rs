use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConverseError, Result};

/// Placeholder values shipped in sample configs that count as "not configured".
const ASSISTANT_ID_PLACEHOLDER: &str = "<assistant-id>";
const COLLECTION_ID_PLACEHOLDER: &str = "<discovery-id>";
const ENVIRONMENT_ID_PLACEHOLDER: &str = "<environment-id>";

/// Top-level configuration for the Converse chat client.
///
/// Loaded from `~/.converse/config.toml` by default. Each section corresponds
/// to one concern of the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConverseConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

impl ConverseConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ConverseConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConverseError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Human-readable descriptions of every required identifier that is
    /// missing. An empty list means the client can talk to the assistant.
    pub fn missing_identifiers(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if is_unset(&self.assistant.assistant_id, ASSISTANT_ID_PLACEHOLDER) {
            missing.push(
                "The app has not been configured with a ASSISTANT_ID environment variable."
                    .to_string(),
            );
        }
        if self.search.enabled {
            if is_unset(&self.search.collection_id, COLLECTION_ID_PLACEHOLDER) {
                missing.push(
                    "The app has not been configured with a DISCOVERY_COLLECTION_ID environment variable."
                        .to_string(),
                );
            }
            if is_unset(&self.search.environment_id, ENVIRONMENT_ID_PLACEHOLDER) {
                missing.push(
                    "The app has not been configured with a DISCOVERY_ENVIRONMENT_ID environment variable."
                        .to_string(),
                );
            }
        }
        missing
    }
}

fn is_unset(value: &str, placeholder: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == placeholder
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Connection settings for the message-orchestration service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Base URL of the service, e.g. `http://localhost:3000`.
    pub base_url: String,
    /// Assistant identifier sent with every message.
    pub assistant_id: String,
    /// Path of the message endpoint.
    pub message_path: String,
    /// Path of the session bootstrap endpoint.
    pub session_path: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            assistant_id: ASSISTANT_ID_PLACEHOLDER.to_string(),
            message_path: "/api/message".to_string(),
            session_path: "/api/session".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Document search settings and search-hit rendering limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Whether the service routes queries to document search.
    pub enabled: bool,
    pub collection_id: String,
    pub environment_id: String,
    /// Hits shown per search-results event.
    pub max_results_shown: usize,
    /// Titles longer than this are truncated.
    pub title_max_chars: usize,
    /// Hit bodies longer than this are truncated.
    pub text_max_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            collection_id: COLLECTION_ID_PLACEHOLDER.to_string(),
            environment_id: ENVIRONMENT_ID_PLACEHOLDER.to_string(),
            max_results_shown: 3,
            title_max_chars: 50,
            text_max_chars: 200,
        }
    }
}

/// Turn orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Fixed transcript message shown when a turn fails.
    pub apology_text: String,
    /// Notification shown when the assistant digressed and no explicit
    /// notification was produced.
    pub digression_text: String,
    /// Upper bound on one client action, in seconds.
    pub client_action_timeout_secs: u64,
    /// Send an empty first turn on start so the assistant can greet.
    pub greet_on_start: bool,
    /// Context seed used on the very first turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_context: Option<serde_json::Value>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            apology_text: "I'm having trouble connecting to the server, please refresh the page."
                .to_string(),
            digression_text: "The virtual assistant is able to answer an unrelated question and return back to the original flow using the Digressions feature.".to_string(),
            client_action_timeout_secs: 15,
            greet_on_start: true,
            initial_context: None,
        }
    }
}

/// Playback pacing and composer indicator text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Delay before scrolling to the newest message, in milliseconds.
    pub scroll_delay_ms: u64,
    /// Composer placeholder while the assistant is "typing".
    pub typing_placeholder: String,
    /// Composer placeholder otherwise.
    pub idle_placeholder: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            scroll_delay_ms: 100,
            typing_placeholder: "Watson is typing...".to_string(),
            idle_placeholder: "Type here...".to_string(),
        }
    }
}
