use crate::cli::VerbosityLevel;
use crate::config::ConfigError;
use crate::error::{SchemaError, ValidationError};

/// Reports batch-level errors on stderr with verbosity-dependent detail
pub struct ErrorReporter {
    verbosity: VerbosityLevel,
    show_timestamps: bool,
}

impl ErrorReporter {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_timestamps: false,
        }
    }

    pub fn with_timestamps(mut self, show_timestamps: bool) -> Self {
        self.show_timestamps = show_timestamps;
        self
    }

    /// Report a batch-level error with appropriate verbosity
    pub fn report_validation_error(&self, error: &ValidationError) {
        eprintln!("{}", self.format_validation_error(error));
    }

    /// Report a configuration error
    pub fn report_config_error(&self, error: &ConfigError) {
        eprintln!("{}", self.format_config_error(error));
    }

    pub fn format_validation_error(&self, error: &ValidationError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => self.format_error_brief(error),
            VerbosityLevel::Normal => self.format_error_normal(error),
            VerbosityLevel::Verbose => self.format_error_verbose(error),
            VerbosityLevel::Debug => self.format_error_debug(error),
        }
    }

    pub fn format_config_error(&self, error: &ConfigError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => format!("Config error: {}", error),
            VerbosityLevel::Normal | VerbosityLevel::Verbose => {
                format!("Configuration Error: {}\n{}", error, self.get_config_help(error))
            }
            VerbosityLevel::Debug => format!(
                "Configuration Error: {}\nDebug: {:?}\n{}",
                error,
                error,
                self.get_config_help(error)
            ),
        }
    }

    /// Short label used in quiet mode
    fn format_error_brief(&self, error: &ValidationError) -> String {
        match error {
            ValidationError::Schema(_) => format!("SCHEMA ERROR: {}", error),
            ValidationError::InvalidUpload { reason } => format!("REJECTED: {}", reason),
            _ => format!("ERROR: {}", error),
        }
    }

    fn format_error_normal(&self, error: &ValidationError) -> String {
        let timestamp = if self.show_timestamps {
            format!("[{}] ", chrono::Utc::now().format("%H:%M:%S"))
        } else {
            String::new()
        };

        format!("{}{}", timestamp, error)
    }

    fn format_error_verbose(&self, error: &ValidationError) -> String {
        let mut output = self.format_error_normal(error);
        if let Some(hint) = self.hint(error) {
            output.push_str("\nSuggestion: ");
            output.push_str(hint);
        }
        output
    }

    fn format_error_debug(&self, error: &ValidationError) -> String {
        let mut output = self.format_error_verbose(error);
        output.push_str(&format!("\nDebug Info: {:?}", error));

        output.push_str("\nError Chain:");
        let mut current_error: &dyn std::error::Error = error;
        let mut level = 0;
        while let Some(source) = current_error.source() {
            output.push_str(&format!("\n  {}: {}", level + 1, source));
            current_error = source;
            level += 1;
        }

        output
    }

    fn hint(&self, error: &ValidationError) -> Option<&'static str> {
        match error {
            ValidationError::Schema(SchemaError::Parse { .. }) => Some(
                "The XSD itself is invalid; fix the schema before validating documents against it",
            ),
            ValidationError::Schema(SchemaError::Staging(_)) => {
                Some("Check that the upload directory exists and is writable")
            }
            ValidationError::InvalidUpload { .. } => Some(
                "Provide one .xsd schema and at least one .xml document within the size limit",
            ),
            ValidationError::FileSystemTraversal { .. } => {
                Some("Check that the path exists and is readable")
            }
            ValidationError::Config(_) => Some("Check the configuration file and flags"),
            _ => None,
        }
    }

    fn get_config_help(&self, error: &ConfigError) -> String {
        match error {
            ConfigError::Io(_) => "Check that the configuration file exists and is readable".to_string(),
            ConfigError::TomlParsing(_) | ConfigError::JsonParsing(_) => {
                "Check the configuration file syntax (TOML/JSON format expected)".to_string()
            }
            ConfigError::UnsupportedFormat(ext) => {
                format!("Rename the configuration file from .{} to .toml or .json", ext)
            }
            ConfigError::Environment(_) => {
                "Fix or unset the VALIDATE_XML_BATCH_* environment variable".to_string()
            }
            ConfigError::Validation(_) => {
                "Resolve conflicting configuration values between file, environment, and CLI"
                    .to_string()
            }
        }
    }
}
