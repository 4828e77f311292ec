//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying publish
//! results and validation reports to the user.

use colored::Colorize;
use std::fmt::Write;

use crate::config::ValidationResult;
use crate::publisher::PublishOutcome;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a publish outcome for display.
    #[must_use]
    pub fn format_outcome(&self, outcome: &PublishOutcome) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(outcome).unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = String::new();

                let infrastructure = if outcome.provisioned {
                    "provisioned".yellow()
                } else {
                    "already present".green()
                };

                let _ = writeln!(
                    output,
                    "{} Site '{}' published",
                    "✓".green(),
                    outcome.app_name.bold()
                );
                let _ = writeln!(output, "  Infrastructure: {infrastructure}");
                let _ = writeln!(
                    output,
                    "  Directories created: {}",
                    outcome.directories_created
                );
                let _ = write!(output, "  Files uploaded: {}", outcome.files_uploaded);

                output
            }
        }
    }

    /// Formats a validation result for display.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, show_warnings: bool) -> String {
        match self.format {
            OutputFormat::Json => {
                let warnings: &[String] = if show_warnings { &result.warnings } else { &[] };
                serde_json::to_string_pretty(&serde_json::json!({
                    "valid": result.is_valid(),
                    "warnings": warnings,
                }))
                .unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = String::new();

                if result.is_valid() {
                    let _ = write!(output, "{} Configuration is valid", "✓".green());
                }

                if show_warnings && !result.warnings.is_empty() {
                    let _ = write!(output, "\n\nWarnings:");
                    for warning in &result.warnings {
                        let _ = write!(output, "\n  {} {warning}", "!".yellow());
                    }
                }

                output
            }
        }
    }

    /// Formats a cleanup confirmation for display.
    #[must_use]
    pub fn format_cleanup(&self, resource_group: &str) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "deleted": resource_group,
            }))
            .unwrap_or_default(),
            OutputFormat::Text => format!(
                "{} Resource group '{}' deleted",
                "✓".green(),
                resource_group.bold()
            ),
        }
    }
}
