//! File rewriters
//!
//! Each supported PBS text format has its own line-level rewriter; they all
//! drive the same [`Anonymizer`] session so a name gets the same pseudonym
//! in every file of an export.
//!
//! Rewriters work on whole texts and return a [`Rewritten`]. The file layer
//! in this module adds reading, writing to `<file><suffix>` (or in place)
//! and the non-fatal handling of unreadable inputs.

pub mod accounting;
pub mod kv;
pub mod records;
pub mod resource_group;
pub mod sched_config;
pub mod tabular;
pub mod tokenizer;

use crate::anonymization::audit::content_digest;
use crate::anonymization::report::{FileReport, RewriteStats};
use crate::anonymization::Anonymizer;
use crate::domain::{AnonError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileFormat {
    /// Fixed-width reports (`qstat -a` style) with a dash rule under the header
    Tabular,
    /// Free text with `key=value` pairs (`qmgr -c 'print server'`, `pbsnodes -a`)
    Kv,
    /// Accounting logs, `timestamp;type;id;k=v ...`
    Accounting,
    /// Fairshare `resource_group` files
    ResourceGroup,
    /// `sched_config`
    SchedConfig,
    /// JSON array of attribute objects
    Records,
}

impl FileFormat {
    pub const ALL: [FileFormat; 6] = [
        FileFormat::Tabular,
        FileFormat::Kv,
        FileFormat::Accounting,
        FileFormat::ResourceGroup,
        FileFormat::SchedConfig,
        FileFormat::Records,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FileFormat::Tabular => "tabular",
            FileFormat::Kv => "kv",
            FileFormat::Accounting => "accounting",
            FileFormat::ResourceGroup => "resource-group",
            FileFormat::SchedConfig => "sched-config",
            FileFormat::Records => "records",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FileFormat {
    type Err = AnonError;

    fn from_str(s: &str) -> Result<Self> {
        FileFormat::ALL
            .into_iter()
            .find(|format| format.label() == s)
            .ok_or_else(|| AnonError::Validation(format!("Unknown file format: {s}")))
    }
}

/// Where rewritten files go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    pub suffix: String,
    pub inplace: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            suffix: ".anon".to_string(),
            inplace: false,
        }
    }
}

impl OutputOptions {
    /// Output path for `input`
    pub fn output_path(&self, input: &Path) -> PathBuf {
        if self.inplace {
            return input.to_path_buf();
        }
        let mut name = input.as_os_str().to_os_string();
        name.push(&self.suffix);
        PathBuf::from(name)
    }
}

/// Text produced by a rewriter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub text: String,
    pub stats: RewriteStats,
}

/// A successfully rewritten file
#[derive(Debug, Clone)]
pub struct FileRewrite {
    pub output: PathBuf,
    pub report: FileReport,
    /// SHA-256 of the input content
    pub input_sha256: String,
}

/// Split text into lines, remembering whether it ended with a newline
pub(crate) fn split_lines(text: &str) -> (Vec<&str>, bool) {
    let trailing = text.ends_with('\n');
    let lines = text.lines().collect();
    (lines, trailing)
}

pub(crate) fn join_lines(lines: &[String], trailing: bool) -> String {
    let mut out = lines.join("\n");
    if trailing && !lines.is_empty() {
        out.push('\n');
    }
    out
}

impl Anonymizer {
    /// Rewrite `text` as `format`
    ///
    /// Only the records format can fail as a whole (invalid JSON); the line
    /// formats skip or count bad lines instead.
    pub fn rewrite_text(&mut self, format: FileFormat, text: &str) -> Result<Rewritten> {
        let rewritten = match format {
            FileFormat::Tabular => self.rewrite_tabular(text),
            FileFormat::Kv => self.rewrite_kv(text),
            FileFormat::Accounting => self.rewrite_accounting(text),
            FileFormat::ResourceGroup => self.rewrite_resource_group(text),
            FileFormat::SchedConfig => self.rewrite_sched_config(text),
            FileFormat::Records => self.rewrite_records_json(text)?,
        };
        Ok(rewritten)
    }

    /// Rewrite one file and report what happened
    pub fn rewrite_path(
        &mut self,
        format: FileFormat,
        path: &Path,
        options: &OutputOptions,
    ) -> Result<FileRewrite> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AnonError::Io(format!("Failed to read {}: {e}", path.display())))?;

        let rewritten = self.rewrite_text(format, &text)?;

        let output = options.output_path(path);
        std::fs::write(&output, &rewritten.text)
            .map_err(|e| AnonError::Io(format!("Failed to write {}: {e}", output.display())))?;

        Ok(FileRewrite {
            report: FileReport {
                input: path.display().to_string(),
                output: output.display().to_string(),
                format: format.label().to_string(),
                stats: rewritten.stats,
            },
            output,
            input_sha256: content_digest(&text),
        })
    }

    /// Rewrite one file, returning the output path
    ///
    /// Unreadable or unwritable files are logged and give `None`; the
    /// session stays usable for the remaining files.
    pub fn rewrite_file(
        &mut self,
        format: FileFormat,
        path: &Path,
        options: &OutputOptions,
    ) -> Option<PathBuf> {
        match self.rewrite_path(format, path, options) {
            Ok(done) => Some(done.output),
            Err(e) => {
                tracing::error!(path = %path.display(), format = %format, error = %e, "File not rewritten");
                None
            }
        }
    }
}
