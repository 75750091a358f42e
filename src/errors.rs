/*!
 * Error types for the extractsubs application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading, merging and writing subtitle tracks
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The input subtitle file does not exist
    #[error("Subtitle file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The content could not be decoded as cue records
    #[error("Failed to parse subtitle: {0}")]
    ParseError(String),

    /// The file could not be read, created or written
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path involved in the failed operation
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl SubtitleError {
    /// Wrap an I/O error with the path it happened on
    pub fn io<P: AsRef<Path>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether this error came from malformed cue data
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::ParseError(_))
    }
}

/// Errors raised by the external mkvtoolnix binaries
#[derive(Error, Debug)]
pub enum ToolError {
    /// The tool could not be started at all
    #[error("Failed to execute {tool}: {message}")]
    Spawn {
        /// Tool name
        tool: String,
        /// Error message from the OS
        message: String,
    },

    /// The tool did not finish in time
    #[error("{tool} timed out after {secs} seconds")]
    Timeout {
        /// Tool name
        tool: String,
        /// Timeout that elapsed
        secs: u64,
    },

    /// The tool exited with a failing status
    #[error("{tool} failed with exit code {code:?}: {output}")]
    Failed {
        /// Tool name
        tool: String,
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
        /// Captured output explaining the failure
        output: String,
    },
}

/// Errors raised by online subtitle providers
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The HTTP request could not be sent or its body could not be read
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// The provider answered with a body we could not decode
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The provider answered with an error status
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Too many requests
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Missing or rejected credentials
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The downloaded subtitle could not be stored
    #[error("Failed to save subtitle: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Whether waiting and trying again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded(_) | Self::RequestFailed(_))
    }
}
