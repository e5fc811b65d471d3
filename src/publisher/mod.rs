//! Sink registry and the event-listener dispatch loop.
//!
//! One thread drives everything: read a frame, filter it, build the record,
//! notify every sink in registration order, acknowledge. Delivery is
//! best-effort and at-most-once per event: a failing sink is logged and
//! skipped so the sinks after it still run and the protocol cycle always
//! completes with its acknowledgement.

use std::collections::HashSet;
use std::io::{BufRead, Write};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::error::ProtocolError;
use crate::filter;
use crate::models::NotificationEvent;
use crate::protocol::{self, Listener};

/// A notification destination.
///
/// Implementations report delivery trouble through the returned error and
/// must not panic; the publisher logs the error and moves on. There are no
/// retries.
pub trait Sink {
    /// Short stable name used in logs and for identity removal.
    fn name(&self) -> &str;

    /// Deliver one event. Called synchronously on the dispatch thread.
    fn notify(&self, event: &NotificationEvent) -> Result<()>;
}

/// Owns the protocol listener, the subscription set, and the ordered sinks.
///
/// Single-threaded by contract: `register` and `remove` must not be called
/// while `run_forever` is driving the loop. There is exactly one thread of
/// execution, so this is a documented precondition rather than a lock.
pub struct Publisher<R, W> {
    listener: Listener<R, W>,
    subscriptions: HashSet<String>,
    sinks: Vec<Box<dyn Sink>>,
}

impl<R: BufRead, W: Write> Publisher<R, W> {
    pub fn new(listener: Listener<R, W>, subscriptions: HashSet<String>) -> Self {
        Self {
            listener,
            subscriptions,
            sinks: Vec::new(),
        }
    }

    /// Append a sink; notification order is registration order.
    ///
    /// Duplicates are allowed and will be notified once per registration.
    pub fn register(&mut self, sink: Box<dyn Sink>) {
        self.sinks.push(sink);
    }

    /// Remove the first registered sink with this name.
    ///
    /// Unknown names are a no-op.
    pub fn remove(&mut self, name: &str) {
        if let Some(idx) = self.sinks.iter().position(|sink| sink.name() == name) {
            self.sinks.remove(idx);
        }
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Deliver `event` to every registered sink in order.
    ///
    /// Returns the number of sinks that failed; a failing sink never stops
    /// the ones registered after it.
    pub fn notify_all(&self, event: &NotificationEvent) -> usize {
        let mut failures = 0;
        for sink in &self.sinks {
            if let Err(err) = sink.notify(event) {
                failures += 1;
                warn!(sink = sink.name(), error = %err, "sink delivery failed");
            }
        }
        failures
    }

    /// Drive the protocol until the supervisor closes the input stream.
    ///
    /// Every frame is acknowledged exactly once, whether it was filtered
    /// out, delivered, or delivery failed. Protocol errors propagate without
    /// acknowledging: once the stream may be misaligned there is no safe way
    /// to keep reading.
    pub fn run_forever(&mut self) -> Result<(), ProtocolError> {
        while let Some(frame) = self.listener.wait()? {
            if filter::accept(&frame, &self.subscriptions) {
                let (payload_headers, body) = protocol::parse_payload(&frame.payload);
                let event = NotificationEvent::build(&payload_headers, &body);

                info!(
                    event = frame.event_name(),
                    process = crate::models::event::or_unknown(&event.process_name),
                    "crash event detected, notifying sinks"
                );
                self.notify_all(&event);
            } else {
                debug!(event = frame.event_name(), "frame filtered out");
            }

            self.listener.ack_ok()?;
        }
        Ok(())
    }
}
