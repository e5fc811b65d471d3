/// Event names from the supervisor protocol vocabulary that this listener
/// works with. Subscriptions are free-form strings supplied by configuration;
/// these constants cover the kinds the defaults and the tests use.
pub const PROCESS_LOG_STDERR: &str = "PROCESS_LOG_STDERR";
pub const PROCESS_LOG_STDOUT: &str = "PROCESS_LOG_STDOUT";
pub const PROCESS_STATE_EXITED: &str = "PROCESS_STATE_EXITED";
pub const PROCESS_COMMUNICATION_STDOUT: &str = "PROCESS_COMMUNICATION_STDOUT";

/// Rendered in place of optional frame fields the supervisor did not send.
pub const UNKNOWN_FIELD: &str = "unknown";

/// Canonical nested-payload key names shared by the crash-relevant event
/// kinds. Always use these constants instead of string literals so the
/// filter and the event builder stay in agreement.
pub mod payload {
    pub const PROCESS_NAME: &str = "processname";
    pub const GROUP_NAME: &str = "groupname";
    pub const PID: &str = "pid";
    pub const FROM_STATE: &str = "from_state";
    pub const EXPECTED: &str = "expected";
}
