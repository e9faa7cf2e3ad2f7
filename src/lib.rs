//! # validate-xml-batch Library
//!
//! Validates a batch of XML documents against one XSD schema and turns every
//! failure into an explained, classified record with batch statistics.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod engine;
pub mod enrichment;
pub mod error;
pub mod error_reporter;
pub mod explanation;
pub mod extractor;
pub mod failure;
pub mod file_discovery;
pub mod libxml2;
pub mod logging;
pub mod output;
pub mod statistics;
pub mod store;
pub mod validator;

pub use classifier::{Classification, MessageClass, classify, classify_full};
pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use config::{Config, ConfigError, ConfigManager};
pub use engine::{CompiledSchema, SchemaEngine};
pub use enrichment::{EnrichedFailure, TechnicalInfo, enrich};
pub use error::{LibXml2Error, SchemaError, StoreError, ValidationError};
pub use error_reporter::ErrorReporter;
pub use explanation::{Explanation, Severity, explain};
pub use extractor::{ExtractedFields, extract};
pub use failure::{Category, ErrorType, NativeKind, RawFailure};
pub use file_discovery::{FileDiscovery, read_upload, read_uploads};
pub use libxml2::LibXml2Engine;
pub use logging::{LogFormat, LoggingConfig, init_logging};
pub use output::Output;
pub use statistics::{BatchStatistics, aggregate};
pub use store::{ContactMessage, JsonFileStore, MessageStatus, MessageStore, NewMessage};
pub use validator::{
    BatchReport, BatchValidator, FileEntry, InvalidEntry, ProgressCallback, Upload,
    ValidationConfig, ValidationPhase, ValidationProgress,
};
