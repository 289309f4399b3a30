//! CLI argument definitions for the Converse terminal client.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use converse_core::ConverseConfig;
use std::path::PathBuf;

/// Converse: chat with a remote assistant from the terminal.
#[derive(Parser, Debug)]
#[command(name = "converse", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Base URL of the message service.
    #[arg(short = 'u', long = "url")]
    pub url: Option<String>,

    /// Assistant identifier.
    #[arg(short = 'a', long = "assistant-id")]
    pub assistant_id: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Skip the greeting turn on start.
    #[arg(long = "no-greeting")]
    pub no_greeting: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CONVERSE_CONFIG env var > ~/.converse/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CONVERSE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Apply environment and flag overrides to a loaded config.
    pub fn apply_overrides(&self, config: &mut ConverseConfig) {
        self.apply_overrides_from(config, |key| std::env::var(key).ok());
    }

    /// Apply overrides with `env` as the environment lookup.
    ///
    /// ASSISTANT_URL / ASSISTANT_ID env vars replace the file values; the
    /// --url / --assistant-id flags replace both.
    pub fn apply_overrides_from<F>(&self, config: &mut ConverseConfig, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = self.url.clone().or_else(|| env("ASSISTANT_URL")) {
            config.assistant.base_url = url;
        }
        if let Some(id) = self.assistant_id.clone().or_else(|| env("ASSISTANT_ID")) {
            config.assistant.assistant_id = id;
        }
        if self.no_greeting {
            config.chat.greet_on_start = false;
        }
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value. RUST_LOG, when set,
    /// takes precedence over both at subscriber setup.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".converse").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".converse").join("config.toml");
    }
    PathBuf::from("config.toml")
}
