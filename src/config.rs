//! Listener configuration.
//!
//! Subscriptions, the sink roster, and chat settings come from three layers:
//! CLI flags override the optional YAML config file, which overrides the
//! built-in defaults. Nothing the dispatch path consumes is hardcoded at a
//! call site.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::constants::PROCESS_LOG_STDERR;

/// Default chat API endpoint (a HipChat-compatible v2 REST surface).
pub const DEFAULT_CHAT_BASE_URL: &str = "https://api.hipchat.com";

/// Environment variable the chat token is read from unless overridden.
pub const DEFAULT_TOKEN_ENV: &str = "CRASHCAST_CHAT_TOKEN";

/// Settings for the chat sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Rooms every notification is delivered to, in order.
    pub rooms: Vec<String>,
    /// Message color understood by the chat backend.
    pub color: String,
    /// Whether the backend should actively alert room members.
    pub notify: bool,
    /// API base URL; overridable so tests can point at a local server.
    pub base_url: String,
    /// Environment variable holding the API token.
    pub token_env: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            rooms: Vec::new(),
            color: "red".to_string(),
            notify: false,
            base_url: DEFAULT_CHAT_BASE_URL.to_string(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
        }
    }
}

/// Top-level listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Event names to subscribe to; every other event is acknowledged
    /// unread.
    pub events: Vec<String>,
    /// Register the chat sink at startup.
    pub enable_chat: bool,
    /// Register the placeholder mail sink at startup.
    pub enable_mail: bool,
    pub chat: ChatConfig,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            events: vec![PROCESS_LOG_STDERR.to_string()],
            enable_chat: true,
            enable_mail: true,
            chat: ChatConfig::default(),
        }
    }
}

impl ListenerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// The subscription set consumed by the filter.
    pub fn subscription_set(&self) -> HashSet<String> {
        self.events.iter().cloned().collect()
    }
}
