//! Crash-event filtering.
//!
//! A pure predicate over a decoded frame and the configured subscription
//! set. No I/O happens here; the dispatch loop owns acknowledgement
//! regardless of the verdict.

use std::collections::{HashMap, HashSet};

use crate::models::constants::payload;
use crate::protocol::{self, RawFrame};

/// Decide whether `frame` is a crash worth notifying about.
///
/// Frames outside `subscriptions` are rejected without touching the payload.
/// For subscribed frames, an explicit non-zero `expected` field in the
/// nested payload headers marks a deliberate stop or restart and suppresses
/// notification. An absent `expected` field, or one that does not parse as
/// an integer, never suppresses.
pub fn accept(frame: &RawFrame, subscriptions: &HashSet<String>) -> bool {
    if !subscriptions.contains(frame.event_name()) {
        return false;
    }

    let (payload_headers, _) = protocol::parse_payload(&frame.payload);
    !is_expected_exit(&payload_headers)
}

/// True when the nested headers carry `expected` with a non-zero integer
/// value.
pub fn is_expected_exit(payload_headers: &HashMap<String, String>) -> bool {
    payload_headers
        .get(payload::EXPECTED)
        .and_then(|raw| raw.parse::<i64>().ok())
        .is_some_and(|flag| flag != 0)
}
