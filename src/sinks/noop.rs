//! Do-nothing sink.
//!
//! Placeholder for channels that are configured but not yet implemented
//! (mail, SMS). Registering one alongside real sinks also exercises the
//! publisher's guarantee that every sink runs on every accepted event.

use anyhow::Result;

use crate::models::NotificationEvent;
use crate::publisher::Sink;

/// Accepts every event and performs no observable action.
pub struct NoopSink {
    name: String,
}

impl NoopSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Sink for NoopSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn notify(&self, _event: &NotificationEvent) -> Result<()> {
        Ok(())
    }
}
