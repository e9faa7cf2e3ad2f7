use std::process::ExitCode;

use anyhow::Context;
use tracing::info;

use validate_xml_batch::cli::{Cli, OutputFormat, VerbosityLevel};
use validate_xml_batch::config::{Config, ConfigError, ConfigManager};
use validate_xml_batch::error::ValidationError;
use validate_xml_batch::error_reporter::ErrorReporter;
use validate_xml_batch::file_discovery::{FileDiscovery, read_upload, read_uploads};
use validate_xml_batch::libxml2::LibXml2Engine;
use validate_xml_batch::logging::{batch_span, init_logging};
use validate_xml_batch::output::Output;
use validate_xml_batch::validator::{BatchReport, BatchValidator};

/// Every document conformed
const EXIT_VALID: u8 = 0;
/// At least one document failed validation
const EXIT_INVALID: u8 = 1;
/// The batch could not run
const EXIT_ERROR: u8 = 2;

fn effective_verbosity(cli: &Cli, config: &Config) -> VerbosityLevel {
    if config.output.quiet {
        VerbosityLevel::Quiet
    } else if cli.debug {
        VerbosityLevel::Debug
    } else if config.output.verbose {
        VerbosityLevel::Verbose
    } else {
        VerbosityLevel::Normal
    }
}

async fn run_batch(cli: &Cli, config: &Config) -> anyhow::Result<BatchReport> {
    let discovery = FileDiscovery::new()
        .with_extensions(config.files.extensions.clone())
        .with_include_patterns(config.files.include_patterns.clone())?
        .with_exclude_patterns(config.files.exclude_patterns.clone())?;

    let paths = discovery.discover_all(&cli.paths).await?;
    info!(documents = paths.len(), "Documents discovered");

    let schema = read_upload(&cli.schema).await?;
    let documents = read_uploads(&paths).await?;
    let validation_config = ConfigManager::get_validation_config(config);

    let span = batch_span(&schema.filename, documents.len());
    let report = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        BatchValidator::new(LibXml2Engine::new(), validation_config)
            .validate_batch(&schema, &documents)
    })
    .await
    .map_err(|e| ValidationError::Concurrency {
        details: e.to_string(),
    })??;

    Ok(report)
}

fn report_error(reporter: &ErrorReporter, error: &anyhow::Error) {
    if let Some(validation_error) = error.downcast_ref::<ValidationError>() {
        reporter.report_validation_error(validation_error);
    } else if let Some(config_error) = error.downcast_ref::<ConfigError>() {
        reporter.report_config_error(config_error);
    } else {
        eprintln!("Error: {:#}", error);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let reporter = ErrorReporter::new(cli.verbosity());

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        return ExitCode::from(EXIT_ERROR);
    }

    let config = match ConfigManager::load_config(&cli).await {
        Ok(config) => config,
        Err(error) => {
            reporter.report_config_error(&error);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if let Err(error) = init_logging(&config.logging) {
        reporter.report_validation_error(&error);
        return ExitCode::from(EXIT_ERROR);
    }

    let verbosity = effective_verbosity(&cli, &config);
    let reporter = ErrorReporter::new(verbosity);

    let report = match run_batch(&cli, &config).await {
        Ok(report) => report,
        Err(error) => {
            report_error(&reporter, &error);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let output = Output::new(OutputFormat::from(config.output.format), verbosity);
    match output.render(&report).context("Failed to render report") {
        Ok(rendered) => println!("{}", rendered),
        Err(error) => {
            report_error(&reporter, &error);
            return ExitCode::from(EXIT_ERROR);
        }
    }

    if report.all_valid() {
        ExitCode::from(EXIT_VALID)
    } else {
        ExitCode::from(EXIT_INVALID)
    }
}
