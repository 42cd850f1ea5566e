//! Error types for the listload sync pipeline.
//!
//! One enum per phase of a run:
//!
//! - [`ConfigError`] - Configuration file and environment errors
//! - [`ParseError`] - CSV loading errors
//! - [`RemoteError`] - Snapshot fetch and write errors
//! - [`SyncError`] - Top-level run errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading, validating or saving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Cannot read config '{}': {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be written.
    #[error("Cannot write config '{}': {source}", .path.display())]
    Unwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for the expected shape.
    #[error("Malformed config: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A required option is empty or absent.
    #[error("Missing config option: {0}")]
    MissingField(&'static str),

    /// An option is present but unusable.
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors while turning CSV input into a dataset.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read the CSV file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Input has no bytes at all.
    #[error("CSV content is empty")]
    EmptyInput,

    /// Header row is missing or has no columns.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// A row could not be read.
    #[error("Malformed CSV at line {line}: {message}")]
    Malformed { line: u64, message: String },
}

// =============================================================================
// Remote API Errors
// =============================================================================

/// Which write a remote error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOp::Create => write!(f, "creating list"),
            WriteOp::Update => write!(f, "updating list"),
        }
    }
}

/// Errors talking to the list-management API.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Snapshot request failed in transport or returned a non-success status.
    #[error("Failed to fetch lists: {message}")]
    Fetch {
        status: Option<u16>,
        message: String,
    },

    /// Snapshot body is not a list of collections.
    #[error("Failed to decode lists: {0}")]
    Decode(String),

    /// Transport failure while sending a write.
    #[error("Request failed while {operation} '{label}': {message}")]
    Request {
        operation: WriteOp,
        label: String,
        message: String,
    },

    /// The service answered a write with something other than 204.
    #[error("Unexpected status code {operation} '{label}': {status}")]
    UnexpectedStatus {
        operation: WriteOp,
        label: String,
        status: u16,
    },

    /// A collection could not be serialized.
    #[error("Failed to serialize list: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl RemoteError {
    /// Status code returned by the service, if the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Fetch { status, .. } => *status,
            RemoteError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// =============================================================================
// Sync Errors (top-level)
// =============================================================================

/// Top-level run errors.
///
/// This is the error type returned by [`crate::sync::Reconciler::run`]. The display
/// names the phase that failed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration error.
    #[error("Failed to load config: {0}")]
    Config(#[from] ConfigError),

    /// CSV error.
    #[error("Failed to read CSV data: {0}")]
    Parse(#[from] ParseError),

    /// Remote API error.
    #[error("Failed to sync data: {0}")]
    Remote(#[from] RemoteError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for CSV operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Result type for a whole run.
pub type SyncResult<T> = Result<T, SyncError>;
