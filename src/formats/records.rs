//! JSON record files
//!
//! A file holds an array of objects, one per PBS entity, attribute name to
//! value. Key order survives the rewrite.

use crate::anonymization::engine::Anonymizer;
use crate::anonymization::report::RewriteStats;
use crate::domain::{AnonError, Record, Result};
use crate::formats::Rewritten;

impl Anonymizer {
    /// Rewrite a JSON array of records
    pub fn rewrite_records_json(&mut self, text: &str) -> Result<Rewritten> {
        let mut records: Vec<Record> = serde_json::from_str(text)
            .map_err(|e| AnonError::Parse(format!("Invalid record file: {e}")))?;

        self.rewrite_records(&mut records);

        let mut json = serde_json::to_string_pretty(&records)?;
        json.push('\n');
        Ok(Rewritten {
            text: json,
            stats: RewriteStats {
                lines_read: records.len(),
                lines_written: records.len(),
                ..RewriteStats::default()
            },
        })
    }
}
