use crate::cli::{Cli, OutputFormat};
use crate::logging::{LogFormat, LoggingConfig};
use crate::validator;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "VALIDATE_XML_BATCH_";

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub validation: ValidationConfig,
    pub output: OutputConfig,
    pub files: FileConfig,
    pub logging: LoggingConfig,
}

/// Upload and validation limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationConfig {
    /// Largest accepted upload in megabytes
    pub max_file_size_mb: u64,
    /// Extensions accepted for the schema
    pub schema_extensions: Vec<String>,
    /// Extensions accepted for documents
    pub document_extensions: Vec<String>,
    /// Directory for the staged schema (system temp dir when unset)
    pub upload_dir: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormatConfig,
    /// Verbose output
    pub verbose: bool,
    /// Quiet mode (errors only)
    pub quiet: bool,
}

/// File discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// File extensions picked up when scanning directories
    pub extensions: Vec<String>,
    /// Include patterns (glob syntax)
    pub include_patterns: Vec<String>,
    /// Exclude patterns (glob syntax)
    pub exclude_patterns: Vec<String>,
}

/// Output format configuration (serializable version of CLI OutputFormat)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormatConfig {
    #[default]
    Human,
    Json,
    Summary,
}

impl From<OutputFormat> for OutputFormatConfig {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputFormatConfig::Human,
            OutputFormat::Json => OutputFormatConfig::Json,
            OutputFormat::Summary => OutputFormatConfig::Summary,
        }
    }
}

impl From<OutputFormatConfig> for OutputFormat {
    fn from(format: OutputFormatConfig) -> Self {
        match format {
            OutputFormatConfig::Human => OutputFormat::Human,
            OutputFormatConfig::Json => OutputFormat::Json,
            OutputFormatConfig::Summary => OutputFormat::Summary,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 16,
            schema_extensions: vec!["xsd".to_string()],
            document_extensions: vec!["xml".to_string()],
            upload_dir: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormatConfig::Human,
            verbose: false,
            quiet: false,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["xml".to_string()],
            include_patterns: vec![],
            exclude_patterns: vec![],
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        ConfigError::Environment(format!("Invalid {}{} value: {}", ENV_PREFIX, name, value))
    })
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(cli, &SystemEnvProvider).await
    }

    /// Same as [`ConfigManager::load_config`] with an explicit environment
    pub async fn load_config_with(cli: &Cli, env: &impl EnvProvider) -> Result<Config> {
        let mut config = Config::default();

        if let Some(config_path) = &cli.config {
            let file_config = Self::load_from_file(config_path).await?;
            config = Self::merge_configs(config, file_config);
        } else if let Some(found_config) = Self::find_config_file().await? {
            config = Self::merge_configs(config, found_config);
        }

        config = Self::apply_environment_overrides_with(env, config)?;

        // CLI arguments have the highest precedence
        config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<Config>> {
        let config_names = [
            "validate-xml-batch.toml",
            "validate-xml-batch.json",
            ".validate-xml-batch.toml",
            ".validate-xml-batch.json",
        ];

        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("validate-xml-batch");
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.exists() {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        let var = |name: &str| env.get(&format!("{}{}", ENV_PREFIX, name));

        // Validation settings
        if let Some(size) = var("MAX_FILE_SIZE") {
            config.validation.max_file_size_mb = parse_env("MAX_FILE_SIZE", &size)?;
        }
        if let Some(dir) = var("UPLOAD_DIR") {
            config.validation.upload_dir = Some(PathBuf::from(dir));
        }
        if let Some(extensions) = var("SCHEMA_EXTENSIONS") {
            config.validation.schema_extensions = split_list(&extensions);
        }
        if let Some(extensions) = var("DOCUMENT_EXTENSIONS") {
            config.validation.document_extensions = split_list(&extensions);
        }

        // Output settings
        if let Some(verbose) = var("VERBOSE") {
            config.output.verbose = parse_env("VERBOSE", &verbose)?;
        }
        if let Some(quiet) = var("QUIET") {
            config.output.quiet = parse_env("QUIET", &quiet)?;
        }
        if let Some(format) = var("FORMAT") {
            config.output.format = match format.to_lowercase().as_str() {
                "human" => OutputFormatConfig::Human,
                "json" => OutputFormatConfig::Json,
                "summary" => OutputFormatConfig::Summary,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid {}FORMAT value: {}",
                        ENV_PREFIX, format
                    )));
                }
            };
        }

        // File settings
        if let Some(extensions) = var("EXTENSIONS") {
            config.files.extensions = split_list(&extensions);
        }

        // Logging settings
        if let Some(level) = var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            config.logging.format = parse_env::<LogFormat>("LOG_FORMAT", &format)?;
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence when given)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        // Validation settings
        if let Some(size) = cli.max_file_size_mb {
            config.validation.max_file_size_mb = size;
        }
        if let Some(dir) = &cli.upload_dir {
            config.validation.upload_dir = Some(dir.clone());
        }

        // Output settings
        if let Some(format) = cli.output_format {
            config.output.format = format.into();
        }
        if cli.verbose || cli.debug {
            config.output.verbose = true;
            config.output.quiet = false;
        }
        if cli.quiet {
            config.output.quiet = true;
            config.output.verbose = false;
        }

        // File settings
        if let Some(extensions) = cli.get_extensions() {
            config.files.extensions = extensions;
        }
        if !cli.include_patterns.is_empty() {
            config.files.include_patterns = cli.include_patterns.clone();
        }
        if !cli.exclude_patterns.is_empty() {
            config.files.exclude_patterns = cli.exclude_patterns.clone();
        }

        // Logging settings
        if let Some(level) = &cli.log_level {
            config.logging.level = level.clone();
        } else if cli.verbose || cli.debug || cli.quiet {
            config.logging.level = LoggingConfig::from_verbosity(cli.verbosity()).level;
        }
        if let Some(format) = cli.log_format {
            config.logging.format = format;
        }

        config
    }

    /// Merge two configurations (second takes precedence)
    pub fn merge_configs(mut base: Config, override_config: Config) -> Config {
        // Validation settings
        base.validation.max_file_size_mb = override_config.validation.max_file_size_mb;
        if !override_config.validation.schema_extensions.is_empty() {
            base.validation.schema_extensions = override_config.validation.schema_extensions;
        }
        if !override_config.validation.document_extensions.is_empty() {
            base.validation.document_extensions = override_config.validation.document_extensions;
        }
        if override_config.validation.upload_dir.is_some() {
            base.validation.upload_dir = override_config.validation.upload_dir;
        }

        // Output settings
        base.output = override_config.output;

        // File settings
        if !override_config.files.extensions.is_empty() {
            base.files.extensions = override_config.files.extensions;
        }
        if !override_config.files.include_patterns.is_empty() {
            base.files.include_patterns = override_config.files.include_patterns;
        }
        if !override_config.files.exclude_patterns.is_empty() {
            base.files.exclude_patterns = override_config.files.exclude_patterns;
        }

        base.logging = override_config.logging;

        base
    }

    fn validate_extensions(label: &str, extensions: &[String]) -> Result<()> {
        if extensions.is_empty() {
            return Err(ConfigError::Validation(format!(
                "At least one {} extension must be specified",
                label
            )));
        }

        for ext in extensions {
            if ext.contains('/') || ext.contains('\\') || ext.contains('.') {
                return Err(ConfigError::Validation(format!(
                    "Invalid {} extension: {}",
                    label, ext
                )));
            }
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.validation.max_file_size_mb == 0 {
            return Err(ConfigError::Validation(
                "Maximum file size must be greater than 0".to_string(),
            ));
        }
        if config.validation.max_file_size_mb > 1024 {
            return Err(ConfigError::Validation(
                "Maximum file size cannot exceed 1024 MB".to_string(),
            ));
        }

        Self::validate_extensions("schema", &config.validation.schema_extensions)?;
        Self::validate_extensions("document", &config.validation.document_extensions)?;
        Self::validate_extensions("file", &config.files.extensions)?;

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        if config.logging.level.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Log level must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Validation settings for the batch validator
    pub fn get_validation_config(config: &Config) -> validator::ValidationConfig {
        validator::ValidationConfig {
            max_file_size: config.validation.max_file_size_mb * 1024 * 1024,
            schema_extensions: config.validation.schema_extensions.clone(),
            document_extensions: config.validation.document_extensions.clone(),
            upload_dir: config.validation.upload_dir.clone(),
        }
    }
}
