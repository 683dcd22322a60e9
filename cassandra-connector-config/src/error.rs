use std::io;
use std::path::PathBuf;
use std::result;
use thiserror::Error as ThisError;

pub type Result<T> = result::Result<T, Error>;

/// Errors raised while assembling configuration and opening sessions. None of them are retried
/// by this crate - retries only apply to requests issued on an already established session.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Malformed or missing configuration value.
    #[error("Invalid configuration: {0}")]
    ConfigValidation(String),
    /// Key or trust store could not be read or parsed.
    #[error("Cannot load credentials from {}: {reason}", path.display())]
    CredentialLoad { path: PathBuf, reason: String },
    /// No connection factory registered under given name.
    #[error("Connection factory not found: {0}")]
    Resolution(String),
    /// No contact point could be reached.
    #[error("Connection error: {0}")]
    Connection(String),
    /// Timed out waiting for an operation to complete.
    #[error("Timeout: {0}")]
    Timeout(String),
    /// Credentials were rejected or could not be produced.
    #[error("Authentication error: {0}")]
    Authentication(String),
    /// Internal IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn invalid_value(key: &str, value: &str, expected: &str) -> Self {
        Error::ConfigValidation(format!(
            "Invalid value '{value}' for '{key}': expected {expected}"
        ))
    }

    /// Creates a credential error for given keystore path.
    pub fn credential_load<P: Into<PathBuf>, R: ToString>(path: P, reason: R) -> Self {
        Error::CredentialLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<String> for Error {
    fn from(err: String) -> Error {
        Error::ConfigValidation(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Error {
        Error::ConfigValidation(err.to_string())
    }
}
