use std::path::PathBuf;

use thiserror::Error;

/// Main application error type covering every batch-level failure
///
/// Per-document validation failures are not errors: they become
/// [`crate::EnrichedFailure`] records inside the batch report.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Invalid upload: {reason}")]
    InvalidUpload { reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system traversal error: {path} - {reason}")]
    FileSystemTraversal { path: PathBuf, reason: String },

    #[error("Concurrent operation error: {details}")]
    Concurrency { details: String },
}

impl ValidationError {
    pub fn invalid_upload(reason: impl Into<String>) -> Self {
        ValidationError::InvalidUpload {
            reason: reason.into(),
        }
    }
}

/// Schema-level failures; any of these aborts the whole batch
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema staging failed: {0}")]
    Staging(#[source] std::io::Error),

    #[error("Schema parsing error: {schema} - {details}")]
    Parse { schema: String, details: String },

    #[error("Schema engine internal error: {details}")]
    Internal { details: String },
}

/// LibXML2-specific error types
#[derive(Error, Debug)]
pub enum LibXml2Error {
    #[error("Schema parsing failed: null pointer returned")]
    SchemaParseFailed,

    #[error("Schema parser context creation failed: {path}")]
    ParserContextCreationFailed { path: PathBuf },

    #[error("Validation context creation failed")]
    ValidationContextCreationFailed,

    #[error("Document too large for libxml2: {size} bytes")]
    DocumentTooLarge { size: usize },

    #[error("Invalid schema path: {path}")]
    InvalidPath { path: PathBuf },

    #[error("Schema validation internal error: {details}")]
    InternalError { details: String },
}

/// Contact message store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid email address: {email}")]
    InvalidEmail { email: String },

    #[error("Message not found: {id}")]
    NotFound { id: u64 },

    #[error("Reply text must not be empty")]
    EmptyReply,
}

impl From<LibXml2Error> for SchemaError {
    fn from(err: LibXml2Error) -> Self {
        SchemaError::Internal {
            details: err.to_string(),
        }
    }
}

impl From<crate::config::ConfigError> for ValidationError {
    fn from(err: crate::config::ConfigError) -> Self {
        ValidationError::Config(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ValidationError>;

/// LibXML2 result type alias
pub type LibXml2Result<T> = std::result::Result<T, LibXml2Error>;

/// Message store result type alias
pub type StoreResult<T> = std::result::Result<T, StoreError>;
