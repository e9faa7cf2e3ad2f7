//! Structured logging setup
//!
//! Diagnostics go to stderr through `tracing`, so the report on stdout stays
//! machine-readable. `RUST_LOG` always wins over the configured level.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::Span;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::cli::VerbosityLevel;
use crate::error::{Result, ValidationError};

/// Identifier of the current process run, attached to every batch span
static RUN_ID: OnceLock<String> = OnceLock::new();

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact single-line events
    #[default]
    Compact,
    /// Full format with all details
    Full,
    /// JSON structured events
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "full" => Ok(LogFormat::Full),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Invalid log format: {}", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level filter, in `EnvFilter` directive syntax
    pub level: String,
    pub format: LogFormat,
    /// Include file and line numbers
    pub source_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            source_location: false,
        }
    }
}

impl LoggingConfig {
    /// Logging configuration matching a CLI verbosity level
    pub fn from_verbosity(verbosity: VerbosityLevel) -> Self {
        let mut config = Self::default();

        match verbosity {
            VerbosityLevel::Quiet => config.level = "error".to_string(),
            VerbosityLevel::Normal => config.level = "warn".to_string(),
            VerbosityLevel::Verbose => config.level = "info".to_string(),
            VerbosityLevel::Debug => {
                config.level = "debug".to_string();
                config.format = LogFormat::Full;
                config.source_location = true;
            }
        }

        config
    }
}

/// Build the event filter, preferring `RUST_LOG` when it is set and valid
pub fn create_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(&config.level).map_err(|e| {
        ValidationError::Config(format!("Invalid log level '{}': {}", config.level, e))
    })
}

/// Initialize the global logging system
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = create_env_filter(config)?;
    let ansi = atty::is(atty::Stream::Stderr);

    let installed = match config.format {
        LogFormat::Compact => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(ansi)
                .with_file(config.source_location)
                .with_line_number(config.source_location)
                .compact()
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
        LogFormat::Json => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(false)
                .with_file(config.source_location)
                .with_line_number(config.source_location)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
        LogFormat::Full => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(ansi)
                .with_thread_ids(true)
                .with_file(config.source_location)
                .with_line_number(config.source_location)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
    };
    installed.map_err(|e| ValidationError::Config(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(run_id = %current_run_id(), config = ?config, "Logging initialized");
    Ok(())
}

/// Generate a unique run identifier
pub fn generate_run_id() -> String {
    format!("run_{}", Uuid::new_v4().simple())
}

/// Identifier of this process run, generated on first use
pub fn current_run_id() -> &'static str {
    RUN_ID.get_or_init(generate_run_id)
}

/// Span covering one batch
pub fn batch_span(schema: &str, documents: usize) -> Span {
    tracing::info_span!(
        "batch",
        run_id = current_run_id(),
        schema = schema,
        documents = documents,
    )
}
