//! Error types for bloodbank.
//!
//! This module defines the error types that abort an operation. Form input
//! problems are not errors in this sense; they are reported to the user as
//! notifications and live in [`ValidationError`].

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for bloodbank operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
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
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for bloodbank operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Check if this error came from the storage layer.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::DatabaseOpen { .. } | Self::DatabaseQuery(_) | Self::DatabaseMigration { .. }
        )
    }
}

/// A rejected form submission.
///
/// The `Display` output is the message shown to the user.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Donor name was blank.
    #[error("Name cannot be empty.")]
    EmptyDonorName,

    /// Patient name was blank.
    #[error("Patient name cannot be empty.")]
    EmptyPatientName,

    /// No blood group, or not one of the eight groups.
    #[error("Select blood group.")]
    MissingBloodGroup,

    /// Units did not parse as an integer greater than zero.
    #[error("Units must be positive.")]
    NonPositiveUnits,

    /// Hospital was blank.
    #[error("Hospital cannot be empty.")]
    EmptyHospital,

    /// The patient intake form was submitted while hidden.
    #[error("Check availability first.")]
    IntakeHidden,
}
