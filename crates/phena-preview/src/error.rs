//! Error types for preview construction and panel lifecycle

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the preview crate's error type
pub type Result<T> = std::result::Result<T, PreviewError>;

/// Errors that abort a preview command
///
/// Syntax errors in the sketch are not in here: those are reported to the
/// user through the host and the command ends normally.
#[derive(Error, Debug)]
pub enum PreviewError {
    /// The document template could not be loaded
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The OS random source failed while generating a nonce
    #[error("Failed to generate CSP nonce: {0}")]
    Entropy(#[from] getrandom::Error),

    /// The host editor refused an operation
    #[error(transparent)]
    Host(#[from] HostError),
}

/// The template resource is missing or malformed
///
/// Either case means the installation is broken, so there is no fallback.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Template file could not be read
    #[error("Failed to read preview template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required placeholder token is absent
    #[error("Preview template is missing the {0} placeholder")]
    MissingPlaceholder(&'static str),
}

/// Failure reported by a host adapter
#[derive(Error, Debug)]
#[error("Host error: {0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<std::io::Error> for HostError {
    fn from(err: std::io::Error) -> Self {
        Self(err.to_string())
    }
}
