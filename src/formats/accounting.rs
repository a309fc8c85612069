//! Accounting log rewriter
//!
//! Lines look like `timestamp;type;id;key=value key=value ...`. The
//! attribute list goes through the same per-attribute rewrite as records;
//! key order is kept.

use crate::anonymization::engine::Anonymizer;
use crate::anonymization::report::RewriteStats;
use crate::formats::{join_lines, split_lines, Rewritten};

/// Record types copied through untouched
const PASS_THROUGH_TYPES: [&str; 2] = ["A", "L"];

impl Anonymizer {
    /// Rewrite an accounting log
    ///
    /// A record with a token lacking `=` (or with fewer than four fields)
    /// is dropped and counted in
    /// [`bad_accounting_record_count`](Anonymizer::bad_accounting_record_count).
    pub fn rewrite_accounting(&mut self, text: &str) -> Rewritten {
        let (lines, trailing) = split_lines(text);
        let mut out = Vec::with_capacity(lines.len());
        let mut stats = RewriteStats {
            lines_read: lines.len(),
            ..RewriteStats::default()
        };

        for (number, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                stats.lines_dropped += 1;
                continue;
            }
            match self.rewrite_accounting_line(line) {
                Some(rewritten) => out.push(rewritten),
                None => {
                    self.count_bad_accounting_record();
                    stats.bad_records += 1;
                    crate::log_bad_record!("accounting", number + 1);
                }
            }
        }

        stats.lines_written = out.len();
        Rewritten {
            text: join_lines(&out, trailing),
            stats,
        }
    }

    /// One record; `None` when it is malformed
    fn rewrite_accounting_line(&mut self, line: &str) -> Option<String> {
        let mut fields = line.splitn(4, ';');
        let (Some(timestamp), Some(kind), Some(id), Some(message)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return None;
        };

        if PASS_THROUGH_TYPES.contains(&kind) {
            return Some(line.to_string());
        }

        let pairs = message
            .split_whitespace()
            .map(|token| token.split_once('='))
            .collect::<Option<Vec<_>>>()?;

        let specs = self.spec_handle();
        let attributes: Vec<String> = pairs
            .into_iter()
            .filter_map(|(key, value)| self.rewrite_attribute(&specs, key, value))
            .map(|(key, value)| format!("{key}={value}"))
            .collect();

        Some(format!("{timestamp};{kind};{id};{}", attributes.join(" ")))
    }
}
