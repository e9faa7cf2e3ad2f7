//! Report Output
//!
//! Renders a [`BatchReport`] as colourised human text, pretty JSON or a
//! single summary line.

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::enrichment::EnrichedFailure;
use crate::error::{Result, ValidationError};
use crate::validator::{BatchReport, InvalidEntry};

/// Output formatter for batch reports
pub struct Output {
    format: OutputFormat,
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbosity: VerbosityLevel) -> Self {
        Self {
            format,
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// Render the report in the configured format
    pub fn render(&self, report: &BatchReport) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(self.format_human(report)),
            OutputFormat::Json => self.format_json(report),
            OutputFormat::Summary => Ok(self.format_summary_line(report)),
        }
    }

    pub fn format_json(&self, report: &BatchReport) -> Result<String> {
        serde_json::to_string_pretty(report)
            .map_err(|e| ValidationError::Config(format!("Failed to serialize report: {}", e)))
    }

    pub fn format_summary_line(&self, report: &BatchReport) -> String {
        let mut line = format!(
            "{}: {} documents, {} valid, {} invalid ({:.1}% valid)",
            report.schema.filename,
            report.total_documents(),
            report.valid.len(),
            report.invalid.len(),
            report.success_rate()
        );
        if let Some(dominant) = report.statistics.dominant_error_type() {
            line.push_str(&format!(", mostly {}", dominant));
        }
        line
    }

    pub fn format_human(&self, report: &BatchReport) -> String {
        let mut output = String::new();

        if self.verbosity == VerbosityLevel::Quiet {
            for entry in &report.invalid {
                output.push_str(&format!(
                    "INVALID: {} - {}\n",
                    entry.filename, entry.error.explanation.title
                ));
            }
            return output;
        }

        output.push_str(&format!(
            "Schema: {} ({} bytes)\n\n",
            report.schema.filename, report.schema.size
        ));

        for entry in &report.valid {
            output.push_str(&format!(
                "{}  {} ({} bytes)\n",
                self.colorize("✓ VALID", "32"),
                entry.filename,
                entry.size
            ));
        }
        for entry in &report.invalid {
            output.push_str(&self.format_invalid_entry(entry));
            output.push('\n');
        }

        output.push('\n');
        output.push_str(&self.format_summary(report));
        output
    }

    pub fn format_invalid_entry(&self, entry: &InvalidEntry) -> String {
        let error = &entry.error;
        let mut output = format!(
            "{}  {} ({} bytes) - {} {}",
            self.colorize("✗ INVALID", "31"),
            entry.filename,
            entry.size,
            error.explanation.icon,
            error.explanation.title
        );
        output.push_str(&format!("\n    {}", error.message));
        output.push_str(&format!(
            "\n    {}",
            error.explanation.user_friendly_explanation
        ));

        if self.verbosity >= VerbosityLevel::Verbose {
            for suggestion in &error.explanation.suggestions {
                output.push_str(&format!("\n    - {}", suggestion));
            }
            output.push_str(&format!(
                "\n    {} {}",
                self.colorize("Quick fix:", "36"),
                error.explanation.quick_fix
            ));
        }

        if self.verbosity == VerbosityLevel::Debug {
            output.push_str(&self.format_technical_info(error));
        }

        output
    }

    fn format_technical_info(&self, error: &EnrichedFailure) -> String {
        let info = &error.technical_info;
        let mut output = String::new();
        output.push_str("\n    Technical details:");
        output.push_str(&format!("\n      Error class: {}", info.error_class));
        output.push_str(&format!("\n      Validation rule: {}", info.validation_rule));
        output.push_str(&format!("\n      Category: {}", error.category));
        output.push_str(&format!("\n      Message class: {}", error.message_class));
        output.push_str(&format!("\n      Location: {}", info.xml_location));
        output.push_str(&format!("\n      Schema location: {}", info.schema_location));
        output.push_str(&format!(
            "\n      Element: {}",
            info.element_context.element_name
        ));
        output.push_str(&format!(
            "\n      Expected: {}",
            info.validation_context.expected_type
        ));
        output.push_str(&format!(
            "\n      Actual value: {}",
            info.validation_context.actual_value
        ));
        output
    }

    fn format_summary(&self, report: &BatchReport) -> String {
        let mut output = String::new();
        output.push_str("Validation Summary:\n");
        output.push_str(&format!("  Total documents: {}\n", report.total_documents()));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Valid:", "32"),
            report.valid.len()
        ));
        if !report.invalid.is_empty() {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Invalid:", "31"),
                report.invalid.len()
            ));
        }
        output.push_str(&format!("  Success rate: {:.1}%\n", report.success_rate()));

        let statistics = &report.statistics;
        if statistics.total_errors > 0 {
            output.push_str("\nError Types:\n");
            for (error_type, count) in &statistics.error_type_counts {
                let percentage = statistics
                    .error_type_percentages
                    .get(error_type)
                    .copied()
                    .unwrap_or(0.0);
                output.push_str(&format!(
                    "  {}: {} ({:.2}%)\n",
                    error_type, count, percentage
                ));
            }

            if self.verbosity >= VerbosityLevel::Verbose {
                output.push_str("\nMessage Classes:\n");
                for (class, count) in &statistics.message_class_counts {
                    output.push_str(&format!("  {}: {}\n", class.display_name(), count));
                }
            }
        }

        if self.verbosity == VerbosityLevel::Debug {
            output.push_str(&format!(
                "\nValidated at: {}\n",
                report.validated_at.to_rfc3339()
            ));
        }

        output
    }
}
