//! Pluggable credential resolution for sinks that need a secret.
//!
//! Resolution happens once, at sink construction, so a missing credential
//! surfaces at startup instead of mid-loop. A sink that cannot get its
//! secret fails alone; the listener keeps whatever sinks did construct.

use std::env;

use crate::error::CredentialError;

/// Source of API tokens for notification backends.
pub trait CredentialProvider {
    /// Resolve the token for `service`.
    fn token(&self, service: &str) -> Result<String, CredentialError>;
}

/// Reads tokens from the process environment.
pub struct EnvCredentials {
    variable: String,
}

impl EnvCredentials {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl CredentialProvider for EnvCredentials {
    fn token(&self, service: &str) -> Result<String, CredentialError> {
        env::var(&self.variable)
            .ok()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| CredentialError::Unavailable {
                service: service.to_string(),
                variable: self.variable.clone(),
            })
    }
}
