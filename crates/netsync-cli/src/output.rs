//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use netsync_engine::SyncReport;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a run report.
    pub fn format_report(&self, report: &SyncReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Table => Ok(self.format_report_table(report)),
            OutputFormat::Quiet => Ok(format_report_quiet(report)),
        }
    }

    /// Decisions as a table, followed by problems and totals.
    fn format_report_table(&self, report: &SyncReport) -> String {
        let mut sections = Vec::new();

        if report.decisions.is_empty() {
            sections.push(self.colorize("No source networks selected.", "yellow"));
        } else {
            let mut builder = Builder::default();
            builder.push_record(["Source", "Action", "Target", "Reason"]);
            for decision in &report.decisions {
                builder.push_record([
                    decision.source.as_str(),
                    decision.action.as_str(),
                    decision.target.as_deref().unwrap_or("-"),
                    decision.reason.as_str(),
                ]);
            }

            let mut table = builder.build();
            table
                .with(Style::rounded())
                .with(Modify::new(Rows::first()).with(Alignment::center()));
            sections.push(table.to_string());
        }

        for entry in &report.quarantined {
            sections.push(self.warning(&format!(
                "Skipped {} network {}: provenance unreadable ({})",
                entry.side, entry.id, entry.message
            )));
        }
        for failure in &report.failures {
            sections.push(self.error(&format!(
                "{} failed at {}: {}",
                failure.record, failure.step, failure.message
            )));
        }
        for warning in &report.warnings {
            sections.push(self.warning(warning));
        }

        let totals = format!(
            "{} created, {} updated, {} read-only updated, {} skipped in {}ms",
            report.created,
            report.updated,
            report.updated_read_only,
            report.skipped,
            report.elapsed_ms
        );
        if report.dry_run {
            sections.push(self.info(&format!("Dry run, nothing written: {}", totals)));
        } else if report.has_failures() {
            sections.push(self.warning(&totals));
        } else {
            sections.push(self.success(&totals));
        }

        sections.join("\n")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// One line of counts.
fn format_report_quiet(report: &SyncReport) -> String {
    format!(
        "created={} updated={} updated_read_only={} skipped={} failures={}",
        report.created,
        report.updated,
        report.updated_read_only,
        report.skipped,
        report.failures.len() + report.quarantined.len()
    )
}
