//! Run reporting
//!
//! Every file rewrite yields [`RewriteStats`]; a [`RunReport`] collects them
//! for the end-of-run summary printed by the CLI.

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Line counts for one rewritten file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteStats {
    /// Lines read from the input
    pub lines_read: usize,
    /// Lines written to the output
    pub lines_written: usize,
    /// Lines removed because nothing identifying was left, or because they
    /// were continuation lines of a removed line
    pub lines_dropped: usize,
    /// Malformed records skipped (accounting logs)
    pub bad_records: usize,
}

impl AddAssign for RewriteStats {
    fn add_assign(&mut self, rhs: Self) {
        self.lines_read += rhs.lines_read;
        self.lines_written += rhs.lines_written;
        self.lines_dropped += rhs.lines_dropped;
        self.bad_records += rhs.bad_records;
    }
}

/// Outcome for one input file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub input: String,
    pub output: String,
    pub format: String,
    pub stats: RewriteStats,
}

/// Summary of one anonymization run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Files rewritten successfully
    pub files: Vec<FileReport>,

    /// Files that could not be read or written, with the reason
    pub failures: Vec<(String, String)>,

    /// Records rewritten through the structured path
    pub records_rewritten: usize,

    /// Totals over every file
    pub totals: RewriteStats,

    /// Pseudonym table entries at the end of the run
    pub mapping_entries: usize,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, report: FileReport) {
        self.totals += report.stats;
        self.files.push(report);
    }

    pub fn add_failure(&mut self, input: impl Into<String>, reason: impl Into<String>) {
        self.failures.push((input.into(), reason.into()));
    }

    /// True when every file was processed and no record was dropped as
    /// malformed
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.totals.bad_records == 0
    }

    /// Format report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                    ANONYMIZATION SUMMARY                      \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');
        output.push_str(&format!("  Files Rewritten:     {}\n", self.files.len()));
        output.push_str(&format!("  Files Failed:        {}\n", self.failures.len()));
        if self.records_rewritten > 0 {
            output.push_str(&format!("  Records Rewritten:   {}\n", self.records_rewritten));
        }
        output.push_str(&format!("  Lines Read:          {}\n", self.totals.lines_read));
        output.push_str(&format!("  Lines Written:       {}\n", self.totals.lines_written));
        output.push_str(&format!("  Lines Dropped:       {}\n", self.totals.lines_dropped));
        output.push_str(&format!("  Bad Records:         {}\n", self.totals.bad_records));
        output.push_str(&format!("  Pseudonyms Issued:   {}\n", self.mapping_entries));
        output.push('\n');

        if !self.files.is_empty() {
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for file in &self.files {
                output.push_str(&format!(
                    "  [{}] {} -> {} ({} lines, {} dropped)\n",
                    file.format,
                    file.input,
                    file.output,
                    file.stats.lines_written,
                    file.stats.lines_dropped
                ));
            }
            output.push('\n');
        }

        if !self.failures.is_empty() {
            output.push_str("⚠️  FAILURES\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for (input, reason) in &self.failures {
                output.push_str(&format!("  • {input}: {reason}\n"));
            }
            output.push('\n');
        }

        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output
    }

    /// Format report as JSON
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
