//! Common error types for Hearth

use thiserror::Error;

/// Common result type for Hearth operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Hearth crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed TOML configuration file
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote function answered with a non-success status
    #[error("Remote function error {status}: {message}")]
    Remote { status: u16, message: String },

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Acting member lacks the capability for this action
    #[error("Permission denied: {role} may not {permission}")]
    PermissionDenied { role: String, permission: String },

    /// Asynchronous generation job reported failure
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Job still incomplete after the maximum number of polls
    #[error("Job did not complete after {attempts} attempts")]
    PollTimeout { attempts: u32 },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
