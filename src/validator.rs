//! Batch validation orchestrator
//!
//! Validates one batch of uploaded documents against one uploaded schema:
//! - **Upload checks**: non-empty document list, allowed extensions, size limit
//! - **Schema staging**: the schema is written to a scoped temporary file that
//!   is removed on every exit path, then compiled exactly once
//! - **Document loop**: strictly in input order; a failing document never
//!   aborts the batch, it becomes an [`EnrichedFailure`]
//! - **Aggregation**: batch statistics over every failure
//!
//! The batch runs synchronously. Callers on an async runtime hand it to a
//! blocking task.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::engine::SchemaEngine;
use crate::enrichment::{EnrichedFailure, enrich};
use crate::error::{Result, SchemaError, ValidationError};
use crate::statistics::{BatchStatistics, aggregate};

/// Default upload size limit (16 MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Validation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    /// Largest accepted upload, in bytes
    pub max_file_size: u64,
    /// Extensions accepted for the schema upload
    pub schema_extensions: Vec<String>,
    /// Extensions accepted for document uploads
    pub document_extensions: Vec<String>,
    /// Directory for the staged schema; the system temp dir when unset
    pub upload_dir: Option<PathBuf>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            schema_extensions: vec!["xsd".to_string()],
            document_extensions: vec!["xml".to_string()],
            upload_dir: None,
        }
    }
}

/// An uploaded file: its client-side name and its bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub content: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// A file that passed (or the schema itself)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub filename: String,
    pub size: u64,
}

/// A document that failed, with its enriched failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidEntry {
    pub filename: String,
    pub size: u64,
    pub error: EnrichedFailure,
}

/// Outcome of one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub schema: FileEntry,
    pub valid: Vec<FileEntry>,
    pub invalid: Vec<InvalidEntry>,
    pub statistics: BatchStatistics,
    pub validated_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn total_documents(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }

    /// Check if every document conformed
    pub fn all_valid(&self) -> bool {
        self.invalid.is_empty()
    }

    /// Share of valid documents as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.total_documents();
        if total == 0 {
            0.0
        } else {
            (self.valid.len() as f64 / total as f64) * 100.0
        }
    }
}

/// Progress update for a batch
#[derive(Debug, Clone)]
pub struct ValidationProgress {
    /// Document currently being processed
    pub current_file: Option<String>,
    pub completed: usize,
    pub total: usize,
    pub phase: ValidationPhase,
}

/// Phase of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPhase {
    UploadCheck,
    SchemaLoading,
    Validation,
    Aggregation,
    Complete,
}

/// Progress callback type for validation updates
pub type ProgressCallback = Arc<dyn Fn(ValidationProgress) + Send + Sync>;

/// Case-insensitive extension check on a client-side filename
pub fn extension_allowed(filename: &str, allowed: &[String]) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Validates batches of documents against one schema at a time
pub struct BatchValidator<E: SchemaEngine> {
    engine: E,
    config: ValidationConfig,
    progress_callback: Option<ProgressCallback>,
}

impl<E: SchemaEngine> BatchValidator<E> {
    pub fn new(engine: E, config: ValidationConfig) -> Self {
        Self {
            engine,
            config,
            progress_callback: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    fn report_progress(
        &self,
        phase: ValidationPhase,
        current_file: Option<&str>,
        completed: usize,
        total: usize,
    ) {
        if let Some(ref callback) = self.progress_callback {
            callback(ValidationProgress {
                current_file: current_file.map(str::to_string),
                completed,
                total,
                phase,
            });
        }
    }

    /// Reject the upload before anything touches the disk
    pub fn check_upload(&self, schema: &Upload, documents: &[Upload]) -> Result<()> {
        if schema.filename.is_empty() {
            return Err(ValidationError::invalid_upload("XSD file is required"));
        }
        if documents.is_empty() {
            return Err(ValidationError::invalid_upload(
                "At least one XML file is required",
            ));
        }

        if !extension_allowed(&schema.filename, &self.config.schema_extensions) {
            return Err(ValidationError::invalid_upload(format!(
                "Invalid schema file type: {} (allowed: {})",
                schema.filename,
                self.config.schema_extensions.join(", ")
            )));
        }
        for document in documents {
            if !extension_allowed(&document.filename, &self.config.document_extensions) {
                return Err(ValidationError::invalid_upload(format!(
                    "Invalid document file type: {} (allowed: {})",
                    document.filename,
                    self.config.document_extensions.join(", ")
                )));
            }
        }

        for upload in std::iter::once(schema).chain(documents) {
            if upload.size() > self.config.max_file_size {
                return Err(ValidationError::invalid_upload(format!(
                    "File too large: {} ({} bytes, limit {} bytes)",
                    upload.filename,
                    upload.size(),
                    self.config.max_file_size
                )));
            }
        }

        Ok(())
    }

    /// Write the schema to a temporary file that is deleted when dropped
    fn stage_schema(&self, schema: &Upload) -> std::result::Result<NamedTempFile, SchemaError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("temp_").suffix(".xsd");

        let mut staged = match &self.config.upload_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(SchemaError::Staging)?;
                builder.tempfile_in(dir)
            }
            None => builder.tempfile(),
        }
        .map_err(SchemaError::Staging)?;

        staged
            .write_all(&schema.content)
            .and_then(|_| staged.flush())
            .map_err(SchemaError::Staging)?;

        Ok(staged)
    }

    /// Validate every document against the schema, in input order
    pub fn validate_batch(&self, schema: &Upload, documents: &[Upload]) -> Result<BatchReport> {
        let batch_start = Instant::now();
        let total = documents.len();

        self.report_progress(ValidationPhase::UploadCheck, None, 0, total);
        self.check_upload(schema, documents)?;

        info!(
            schema = %schema.filename,
            documents = total,
            "Starting batch validation"
        );

        // Phase 1: schema staging and compilation
        self.report_progress(ValidationPhase::SchemaLoading, Some(&schema.filename), 0, total);
        let compiled = {
            let staged = self.stage_schema(schema)?;
            debug!(path = %staged.path().display(), "Schema staged");

            self.engine.load_schema(staged.path()).map_err(|err| {
                warn!(schema = %schema.filename, error = %err, "Schema rejected");
                // Report the uploaded name, not the staged one
                let err = match err {
                    SchemaError::Parse { details, .. } => SchemaError::Parse {
                        schema: schema.filename.clone(),
                        details,
                    },
                    other => other,
                };
                ValidationError::Schema(err)
            })?
            // staged file removed here
        };

        // Phase 2: documents, strictly in input order
        let mut valid = Vec::new();
        let mut invalid = Vec::new();

        for (index, document) in documents.iter().enumerate() {
            self.report_progress(
                ValidationPhase::Validation,
                Some(&document.filename),
                index,
                total,
            );

            match compiled.validate(&document.content) {
                Ok(()) => {
                    debug!(document = %document.filename, "Document is valid");
                    valid.push(FileEntry {
                        filename: document.filename.clone(),
                        size: document.size(),
                    });
                }
                Err(failure) => {
                    let error = enrich(&failure);
                    debug!(
                        document = %document.filename,
                        category = %error.category,
                        error_type = %error.error_type,
                        "Document is invalid"
                    );
                    invalid.push(InvalidEntry {
                        filename: document.filename.clone(),
                        size: document.size(),
                        error,
                    });
                }
            }
        }

        // Phase 3: statistics
        self.report_progress(ValidationPhase::Aggregation, None, total, total);
        let statistics = aggregate(invalid.iter().map(|entry| &entry.error));

        info!(
            valid = valid.len(),
            invalid = invalid.len(),
            elapsed_ms = batch_start.elapsed().as_millis() as u64,
            "Batch validation complete"
        );
        self.report_progress(ValidationPhase::Complete, None, total, total);

        Ok(BatchReport {
            schema: FileEntry {
                filename: schema.filename.clone(),
                size: schema.size(),
            },
            valid,
            invalid,
            statistics,
            validated_at: Utc::now(),
        })
    }
}
