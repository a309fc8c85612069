//! Audit logger for file rewrites

use crate::anonymization::report::FileReport;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Audit log entry
#[derive(Debug, Serialize)]
struct AuditLogEntry<'a> {
    timestamp: String,
    format: &'a str,
    input_path: &'a str,
    output_path: &'a str,
    /// SHA-256 of the input content, so the source can be matched later
    /// without keeping it
    input_sha256: String,
    lines_read: usize,
    lines_written: usize,
    lines_dropped: usize,
    bad_records: usize,
}

/// Audit logger for anonymization runs
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            if let Some(parent) = log_path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create audit log directory: {}", parent.display())
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
        })
    }

    /// Log one rewritten file
    ///
    /// `input_sha256` is the digest of the original content, see
    /// [`content_digest`].
    pub fn log_rewrite(&self, report: &FileReport, input_sha256: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let entry = AuditLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            format: &report.format,
            input_path: &report.input,
            output_path: &report.output,
            input_sha256: input_sha256.to_string(),
            lines_read: report.stats.lines_read,
            lines_written: report.stats.lines_written,
            lines_dropped: report.stats.lines_dropped,
            bad_records: report.stats.bad_records,
        };

        self.write_entry(&entry)
    }

    /// Write an audit entry to the log file
    fn write_entry(&self, entry: &AuditLogEntry<'_>) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open audit log: {}", self.log_path.display()))?;

        if self.json_format {
            let json_line =
                serde_json::to_string(entry).context("Failed to serialize audit entry")?;
            writeln!(file, "{json_line}").context("Failed to write audit entry")?;
        } else {
            writeln!(
                file,
                "[{}] {} | {} -> {} | Lines: {} read, {} written, {} dropped | Bad: {}",
                entry.timestamp,
                entry.format,
                entry.input_path,
                entry.output_path,
                entry.lines_read,
                entry.lines_written,
                entry.lines_dropped,
                entry.bad_records
            )
            .context("Failed to write audit entry")?;
        }

        Ok(())
    }
}

/// Hex SHA-256 of file content
pub fn content_digest(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    format!("{result:x}")
}
