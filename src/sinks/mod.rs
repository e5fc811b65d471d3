//! Concrete notification sinks and their credential seam.

pub mod chat;
pub mod credentials;
pub mod noop;

pub use chat::ChatSink;
pub use credentials::{CredentialProvider, EnvCredentials};
pub use noop::NoopSink;
