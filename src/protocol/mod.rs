//! Supervisord event-listener wire protocol.
//!
//! Implements the listener half of the handshake: emit `READY`, block on a
//! header line plus `len` payload bytes, and acknowledge with `RESULT 2\nOK`
//! once the frame has been handled. Streams are injected so tests can drive
//! the codec from in-memory buffers instead of real process I/O.

use std::collections::HashMap;
use std::io::{BufRead, Read, Write};

use crate::error::ProtocolError;

/// Token emitted when the listener is ready for the next event.
pub const READY_TOKEN: &[u8] = b"READY\n";

/// Acknowledgement emitted after a frame has been fully handled.
pub const OK_RESULT: &[u8] = b"RESULT 2\nOK";

/// Header key carrying the event name; required on every frame.
pub const HEADER_EVENTNAME: &str = "eventname";

/// Header key carrying the payload byte count; required on every frame.
pub const HEADER_LEN: &str = "len";

/// One decoded protocol frame: outer headers plus the raw payload.
///
/// Ephemeral: produced once per cycle and consumed by the filter and the
/// event builder before the acknowledgement goes out.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub headers: HashMap<String, String>,
    pub payload: String,
}

impl RawFrame {
    /// The event name the supervisor stamped on this frame.
    pub fn event_name(&self) -> &str {
        self.headers
            .get(HEADER_EVENTNAME)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Listener side of the event protocol, generic over the injected streams.
pub struct Listener<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Listener<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Signal readiness and block until the supervisor sends one frame.
    ///
    /// Returns `Ok(None)` when the input stream closes between frames; that
    /// is the normal shutdown path for an event listener (the supervisor
    /// owns liveness, there is no in-protocol termination message).
    pub fn wait(&mut self) -> Result<Option<RawFrame>, ProtocolError> {
        self.output.write_all(READY_TOKEN)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim_end_matches('\n');

        let headers = parse_header_line(line)?;
        let len = parse_payload_len(&headers)?;

        let mut payload = vec![0u8; len];
        let mut got = 0;
        while got < len {
            let n = self.input.read(&mut payload[got..])?;
            if n == 0 {
                return Err(ProtocolError::TruncatedPayload { wanted: len, got });
            }
            got += n;
        }

        Ok(Some(RawFrame {
            headers,
            payload: String::from_utf8_lossy(&payload).into_owned(),
        }))
    }

    /// Acknowledge the current frame so the supervisor resumes sending.
    ///
    /// Must be called exactly once per frame returned by [`Listener::wait`],
    /// after any notification attempt, whether or not delivery succeeded.
    pub fn ack_ok(&mut self) -> Result<(), ProtocolError> {
        self.output.write_all(OK_RESULT)?;
        self.output.flush()?;
        Ok(())
    }
}

/// Parse the outer header line of space-separated `key:value` tokens.
///
/// A token without a colon or a missing required key means the stream is not
/// positioned where we think it is, and continuing would desynchronize every
/// following frame.
pub fn parse_header_line(line: &str) -> Result<HashMap<String, String>, ProtocolError> {
    let mut headers = HashMap::new();
    for token in line.split_ascii_whitespace() {
        let Some((key, value)) = token.split_once(':') else {
            return Err(ProtocolError::MalformedHeader {
                token: token.to_string(),
                line: line.to_string(),
            });
        };
        headers.insert(key.to_string(), value.to_string());
    }

    for key in [HEADER_EVENTNAME, HEADER_LEN] {
        if !headers.contains_key(key) {
            return Err(ProtocolError::MissingHeader {
                key,
                line: line.to_string(),
            });
        }
    }

    Ok(headers)
}

fn parse_payload_len(headers: &HashMap<String, String>) -> Result<usize, ProtocolError> {
    // Presence was checked by parse_header_line.
    let raw = &headers[HEADER_LEN];
    raw.parse::<usize>()
        .map_err(|_| ProtocolError::InvalidLength { value: raw.clone() })
}

/// Split an event payload into its nested header block and body.
///
/// Several event kinds (state changes, log captures) nest a second
/// `key:value` header line ahead of the captured data, so the payload gets
/// its own sub-parser. The split needs a newline terminator to find the
/// header/body boundary; one is appended when the payload lacks it.
///
/// Unlike the outer header line this parser is lenient: tokens without a
/// colon are skipped rather than rejected, since payload bodies are
/// free-form and only the recognized keys matter downstream.
pub fn parse_payload(payload: &str) -> (HashMap<String, String>, String) {
    let normalized = if payload.ends_with('\n') {
        payload.to_string()
    } else {
        format!("{payload}\n")
    };

    let (first_line, body) = normalized
        .split_once('\n')
        .unwrap_or((normalized.as_str(), ""));

    let mut headers = HashMap::new();
    for token in first_line.split_ascii_whitespace() {
        if let Some((key, value)) = token.split_once(':') {
            headers.insert(key.to_string(), value.to_string());
        }
    }

    (headers, body.to_string())
}
