//! Chat-room notification sink.
//!
//! Speaks a HipChat-v2-shaped REST API: one POST per configured room with an
//! HTML-rendered crash message. The API token is resolved once, at
//! construction; a missing token fails this sink, not the listener.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde_json::json;
use tracing::debug;

use crate::config::ChatConfig;
use crate::models::NotificationEvent;
use crate::publisher::Sink;
use crate::sinks::credentials::CredentialProvider;

const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Sends crash notices to a fixed list of chat rooms.
#[derive(Debug)]
pub struct ChatSink {
    client: Client,
    base_url: String,
    token: String,
    rooms: Vec<String>,
    color: String,
    notify: bool,
}

impl ChatSink {
    /// Construct the sink, resolving the API token up front.
    pub fn new(config: &ChatConfig, credentials: &dyn CredentialProvider) -> Result<Self> {
        let token = credentials
            .token("chat")
            .context("chat sink cannot start without an API token")?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("crashcast/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            rooms: config.rooms.clone(),
            color: config.color.clone(),
            notify: config.notify,
        })
    }

    /// Add a target room. Duplicates are allowed and delivered to twice.
    pub fn add_room(&mut self, room: impl Into<String>) {
        self.rooms.push(room.into());
    }

    /// Remove the first occurrence of `room`; unknown rooms are a no-op.
    pub fn remove_room(&mut self, room: &str) {
        if let Some(idx) = self.rooms.iter().position(|r| r == room) {
            self.rooms.remove(idx);
        }
    }

    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    fn post_notification(&self, room: &str, message: &str) -> Result<()> {
        let url = format!("{}/v2/room/{}/notification", self.base_url, room);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({
                "message": message,
                "message_format": "html",
                "color": self.color,
                "notify": self.notify,
            }))
            .send()
            .with_context(|| format!("Failed to reach chat API for room '{room}'"))?;

        if !response.status().is_success() {
            let status = response.status();
            bail!(
                "chat API rejected notification for room '{room}': HTTP {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            );
        }

        Ok(())
    }
}

impl Sink for ChatSink {
    fn name(&self) -> &str {
        "chat"
    }

    fn notify(&self, event: &NotificationEvent) -> Result<()> {
        let message = event.render_html();
        for room in &self.rooms {
            self.post_notification(room, &message)?;
            debug!(room = room.as_str(), "chat notification delivered");
        }
        Ok(())
    }
}
