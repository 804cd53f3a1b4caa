//! Error types for the Vellum library.
//!
//! All errors are represented by the [`VellumError`] enum. The variants follow
//! the failure classes of a search execution: some abort the whole request
//! (a malformed query, an unreachable index, missing configuration), others are
//! local to a single document and are degraded by the caller (access denied,
//! data integrity problems).
//!
//! # Examples
//!
//! ```
//! use vellum::error::{Result, VellumError};
//!
//! fn splitting_char(value: &str) -> Result<char> {
//!     value
//!         .chars()
//!         .next()
//!         .ok_or_else(|| VellumError::configuration("DC has no splitting character"))
//! }
//!
//! assert!(splitting_char("").is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Vellum operations.
#[derive(Error, Debug)]
pub enum VellumError {
    /// User input cannot be turned into a valid backend query.
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// The index service is unreachable or returned no results object.
    #[error("Index service error: {0}")]
    TransientBackend(String),

    /// A required configuration value is absent or blank.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Access to a single document resource was denied.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// A document is missing data required to process it.
    #[error("Data integrity warning: {0}")]
    DataIntegrity(String),

    /// I/O errors (configuration files, full-text files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with VellumError.
pub type Result<T> = std::result::Result<T, VellumError>;

impl VellumError {
    /// Create a new malformed query error.
    pub fn malformed_query<S: Into<String>>(msg: S) -> Self {
        VellumError::MalformedQuery(msg.into())
    }

    /// Create a new backend error.
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        VellumError::TransientBackend(msg.into())
    }

    /// Create a new configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        VellumError::Configuration(msg.into())
    }

    /// Create a new access denied error.
    pub fn access_denied<S: Into<String>>(msg: S) -> Self {
        VellumError::AccessDenied(msg.into())
    }

    /// Create a new data integrity error.
    pub fn data_integrity<S: Into<String>>(msg: S) -> Self {
        VellumError::DataIntegrity(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        VellumError::Other(msg.into())
    }

    /// Whether this error aborts the whole search execution.
    ///
    /// Access-denied and data-integrity errors concern a single document and
    /// are handled locally (placeholder hit or skip).
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            VellumError::AccessDenied(_) | VellumError::DataIntegrity(_)
        )
    }
}
