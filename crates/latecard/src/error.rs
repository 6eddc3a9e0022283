//! Error types for latecard.
//!
//! This module defines all error types used throughout the latecard crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for latecard operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Camera / Scan Errors ===
    /// The camera could not be acquired (permission denied, no device,
    /// or device busy).
    #[error("camera unavailable: {reason}")]
    CameraUnavailable {
        /// Human-readable reason suitable for display with a retry prompt.
        reason: String,
    },

    /// The camera was acquired but the decode stream failed to start.
    #[error("failed to start scan stream: {reason}")]
    StreamStart {
        /// Description of what went wrong.
        reason: String,
    },

    /// The decode stream failed while running.
    #[error("scan stream failed: {reason}")]
    StreamFailed {
        /// Description of what went wrong.
        reason: String,
    },

    // === Roster Errors ===
    /// Failed to open or create the roster database.
    #[error("failed to open roster database at {path}: {source}")]
    RosterOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A roster database query failed.
    #[error("roster query failed: {0}")]
    RosterQuery(#[from] rusqlite::Error),

    // === Record Errors ===
    /// A tardiness record failed validation.
    #[error("invalid tardiness record: {message}")]
    RecordInvalid {
        /// Description of the validation failure.
        message: String,
    },

    // === Submission Errors ===
    /// The submission endpoint is not configured.
    #[error("no submission endpoint configured")]
    SubmissionNotConfigured,

    /// The submission request failed at the transport level.
    #[error("submission transport failed: {0}")]
    SubmissionTransport(#[from] reqwest::Error),

    /// The submission endpoint rejected the record.
    #[error("submission rejected: {message}")]
    SubmissionRejected {
        /// Description of the rejection.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for latecard operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a camera-unavailable error.
    #[must_use]
    pub fn camera_unavailable(reason: impl Into<String>) -> Self {
        Self::CameraUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a stream-start error.
    #[must_use]
    pub fn stream_start(reason: impl Into<String>) -> Self {
        Self::StreamStart {
            reason: reason.into(),
        }
    }

    /// Create a stream-failed error.
    #[must_use]
    pub fn stream_failed(reason: impl Into<String>) -> Self {
        Self::StreamFailed {
            reason: reason.into(),
        }
    }

    /// Create a record validation error.
    #[must_use]
    pub fn record_invalid(message: impl Into<String>) -> Self {
        Self::RecordInvalid {
            message: message.into(),
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a camera acquisition failure.
    ///
    /// These are the errors worth offering a retry for: the caller may
    /// re-activate the session once the user grants access or frees the
    /// device.
    #[must_use]
    pub fn is_camera_error(&self) -> bool {
        matches!(
            self,
            Self::CameraUnavailable { .. } | Self::StreamStart { .. } | Self::StreamFailed { .. }
        )
    }

    /// Check if this error is a submission failure.
    #[must_use]
    pub fn is_submission_error(&self) -> bool {
        matches!(
            self,
            Self::SubmissionNotConfigured
                | Self::SubmissionTransport(_)
                | Self::SubmissionRejected { .. }
        )
    }
}
