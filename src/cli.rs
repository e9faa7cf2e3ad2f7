use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show critical errors
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show every failure with suggestions
    Verbose,
    /// Show technical details as well
    Debug,
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Colourised report for terminals
    #[default]
    Human,
    /// Pretty-printed JSON report
    Json,
    /// One summary line
    Summary,
}

/// Validate a batch of XML documents against one XSD schema
#[derive(Parser, Debug, Clone)]
#[command(name = "validate-xml-batch")]
#[command(
    about = "Validate XML documents against an XSD schema and explain every failure in plain language"
)]
#[command(version)]
pub struct Cli {
    /// Schema every document is validated against
    #[arg(short = 's', long = "schema", help = "XSD schema file")]
    pub schema: PathBuf,

    /// Documents or directories to validate
    #[arg(required = true, help = "XML files or directories to validate")]
    pub paths: Vec<PathBuf>,

    /// File extensions to process in directories (comma-separated)
    #[arg(
        short = 'e',
        long = "extensions",
        help = "File extensions to process in directories (e.g., 'xml')"
    )]
    pub extensions: Option<String>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with_all = ["verbose", "debug"]
    )]
    pub quiet: bool,

    /// Show technical details for every failure
    #[arg(long = "debug")]
    pub debug: bool,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Include file patterns (glob syntax)
    #[arg(long = "include", action = clap::ArgAction::Append)]
    pub include_patterns: Vec<String>,

    /// Exclude file patterns (glob syntax)
    #[arg(long = "exclude", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Maximum size of any uploaded file, in MB
    #[arg(long = "max-file-size")]
    pub max_file_size_mb: Option<u64>,

    /// Directory used to stage the schema
    #[arg(long = "upload-dir")]
    pub upload_dir: Option<PathBuf>,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long = "log-format", value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn get_extensions(&self) -> Option<Vec<String>> {
        self.extensions.as_ref().map(|extensions| {
            extensions
                .split(',')
                .map(|s| s.trim().trim_start_matches('.').to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.debug {
            VerbosityLevel::Debug
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.schema.is_file() {
            return Err(format!("Schema file does not exist: {}", self.schema.display()));
        }
        for path in &self.paths {
            if !path.exists() {
                return Err(format!("Path does not exist: {}", path.display()));
            }
        }
        if let Some(size) = self.max_file_size_mb
            && size == 0
        {
            return Err("Maximum file size must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_cli_parsing() {
        let args = vec!["validate-xml-batch", "--schema", "order.xsd", "a.xml", "dir"];
        let cli = Cli::try_parse_from(args).unwrap();

        assert_eq!(cli.schema, PathBuf::from("order.xsd"));
        assert_eq!(cli.paths, vec![PathBuf::from("a.xml"), PathBuf::from("dir")]);
        assert_eq!(cli.output_format, None);
        assert_eq!(cli.get_extensions(), None);
        assert_eq!(cli.verbosity(), VerbosityLevel::Normal);
    }

    #[test]
    fn test_paths_are_required() {
        let result = Cli::try_parse_from(vec!["validate-xml-batch", "--schema", "order.xsd"]);
        assert!(result.is_err());

        let result = Cli::try_parse_from(vec!["validate-xml-batch", "a.xml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_extensions_and_format() {
        let cli = Cli::try_parse_from(vec![
            "validate-xml-batch",
            "-s",
            "s.xsd",
            "-e",
            "xml, .cmdi,,",
            "--format",
            "json",
            "dir",
        ])
        .unwrap();

        assert_eq!(
            cli.get_extensions(),
            Some(vec!["xml".to_string(), "cmdi".to_string()])
        );
        assert_eq!(cli.output_format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_verbosity_flags() {
        let cli = Cli::try_parse_from(vec!["validate-xml-batch", "-s", "s.xsd", "-q", "d"]).unwrap();
        assert_eq!(cli.verbosity(), VerbosityLevel::Quiet);

        let cli =
            Cli::try_parse_from(vec!["validate-xml-batch", "-s", "s.xsd", "--debug", "d"]).unwrap();
        assert_eq!(cli.verbosity(), VerbosityLevel::Debug);

        let result = Cli::try_parse_from(vec!["validate-xml-batch", "-s", "s.xsd", "-q", "-v", "d"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_checks_paths() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("s.xsd");
        std::fs::write(&schema, "<xs:schema/>").unwrap();

        let cli = Cli::try_parse_from(vec![
            "validate-xml-batch",
            "-s",
            schema.to_str().unwrap(),
            dir.path().to_str().unwrap(),
        ])
        .unwrap();
        assert!(cli.validate().is_ok());

        let cli = Cli::try_parse_from(vec![
            "validate-xml-batch",
            "-s",
            schema.to_str().unwrap(),
            "/nonexistent/docs",
        ])
        .unwrap();
        assert!(cli.validate().unwrap_err().contains("Path does not exist"));
    }
}
