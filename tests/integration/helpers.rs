//! Shared fixtures: wire-format frame builders and observable sinks.

use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use crashcast::models::NotificationEvent;
use crashcast::publisher::Sink;

/// Delivery log shared between test sinks and assertions: one entry per
/// `notify` call, carrying the sink name and the event it received.
pub type DeliveryLog = Arc<Mutex<Vec<(String, NotificationEvent)>>>;

pub fn delivery_log() -> DeliveryLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Serialize one protocol frame the way supervisord puts it on the wire.
pub fn frame(event_name: &str, payload: &str) -> String {
    format!(
        "ver:3.0 server:supervisor serial:21 pool:listener poolserial:10 eventname:{} len:{}\n{}",
        event_name,
        payload.len(),
        payload
    )
}

/// Sink that records every delivery into a shared log.
pub struct RecordingSink {
    name: &'static str,
    log: DeliveryLog,
}

impl RecordingSink {
    pub fn new(name: &'static str, log: &DeliveryLog) -> Self {
        Self {
            name,
            log: Arc::clone(log),
        }
    }
}

impl Sink for RecordingSink {
    fn name(&self) -> &str {
        self.name
    }

    fn notify(&self, event: &NotificationEvent) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push((self.name.to_string(), event.clone()));
        Ok(())
    }
}

/// Sink that records the delivery attempt, then fails it.
pub struct FailingSink {
    name: &'static str,
    log: DeliveryLog,
}

impl FailingSink {
    pub fn new(name: &'static str, log: &DeliveryLog) -> Self {
        Self {
            name,
            log: Arc::clone(log),
        }
    }
}

impl Sink for FailingSink {
    fn name(&self) -> &str {
        self.name
    }

    fn notify(&self, event: &NotificationEvent) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push((self.name.to_string(), event.clone()));
        bail!("simulated delivery failure")
    }
}
