//! Typed errors for the listener core.
//!
//! Sink delivery failures travel as `anyhow::Error` and are swallowed by the
//! dispatch loop; the enums here cover the failures that are *not* best-effort:
//! protocol desync (fatal for the process) and missing credentials (fatal for
//! the sink being constructed).

use thiserror::Error;

/// Fatal wire-protocol errors.
///
/// Once one of these occurs the input stream can no longer be trusted to be
/// frame-aligned, so the listener must exit instead of attempting to resync.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The header line lacked a key the protocol requires on every event.
    #[error("missing required header key '{key}' in header line '{line}'")]
    MissingHeader { key: &'static str, line: String },

    /// A header-line token was not a `key:value` pair.
    #[error("malformed header token '{token}' in header line '{line}'")]
    MalformedHeader { token: String, line: String },

    /// The `len` header was present but not a valid byte count.
    #[error("unparsable payload length '{value}'")]
    InvalidLength { value: String },

    /// The stream ended inside a frame's payload.
    #[error("input stream closed mid-frame (wanted {wanted} payload bytes, got {got})")]
    TruncatedPayload { wanted: usize, got: usize },

    #[error("protocol stream I/O failed")]
    Io(#[from] std::io::Error),
}

/// Failure to resolve a secret a sink needs at construction time.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The configured source has no value for this credential.
    #[error("credential for '{service}' unavailable: environment variable {variable} is not set")]
    Unavailable { service: String, variable: String },
}
