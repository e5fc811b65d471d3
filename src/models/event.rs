//! The normalized notification record handed to sinks.

use std::collections::HashMap;

use chrono::Local;

use super::constants::{payload, UNKNOWN_FIELD};

/// One crash notification, built from an accepted frame.
///
/// Immutable once built; owned by the dispatch cycle that created it and
/// dropped when that cycle's acknowledgement goes out. Optional fields stay
/// `None` when the supervisor did not send them and render as the
/// [`UNKNOWN_FIELD`] sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEvent {
    pub process_name: Option<String>,
    pub group_name: Option<String>,
    pub pid: Option<String>,
    pub from_state: Option<String>,
    /// Wall-clock build time in supervisord's asctime format
    /// (`YYYY-MM-DD HH:MM:SS,mmm`).
    pub happened_at: String,
    /// Raw payload body, e.g. the captured stderr tail.
    pub detail_text: String,
}

impl NotificationEvent {
    /// Build the record from a frame's nested payload headers and body.
    ///
    /// The timestamp is stamped here, at build time, not at frame receipt.
    pub fn build(payload_headers: &HashMap<String, String>, body: &str) -> Self {
        Self {
            process_name: payload_headers.get(payload::PROCESS_NAME).cloned(),
            group_name: payload_headers.get(payload::GROUP_NAME).cloned(),
            pid: payload_headers.get(payload::PID).cloned(),
            from_state: payload_headers.get(payload::FROM_STATE).cloned(),
            happened_at: asctime_now(),
            detail_text: body.to_string(),
        }
    }

    /// HTML crash message used by chat-style sinks, `<br />` line breaks
    /// included.
    pub fn render_html(&self) -> String {
        format!(
            "Process {} in group {} exited unexpectedly (pid {}) from state {} at {}<br /><br />Error log:<br />{}",
            or_unknown(&self.process_name),
            or_unknown(&self.group_name),
            or_unknown(&self.pid),
            or_unknown(&self.from_state),
            self.happened_at,
            self.detail_text,
        )
    }
}

/// Render an optional frame field, falling back to the sentinel.
pub fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(UNKNOWN_FIELD)
}

/// Current local time in supervisord's asctime format (comma-separated
/// milliseconds, matching the supervisor's own log lines).
fn asctime_now() -> String {
    let now = Local::now();
    format!(
        "{},{:03}",
        now.format("%Y-%m-%d %H:%M:%S"),
        now.timestamp_subsec_millis()
    )
}
