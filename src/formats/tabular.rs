//! Fixed-width report rewriter (`qstat -a`, `qstat -Q`, `pbsnodes -aS`)
//!
//! The dash rule under the header gives the column layout: the i-th dash
//! run plus one separator is the i-th column, laid out from offset 0.
//! Offsets count characters, not bytes.

use crate::anonymization::engine::Anonymizer;
use crate::anonymization::report::RewriteStats;
use crate::anonymization::store::Table;
use crate::formats::{join_lines, split_lines, Rewritten};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ColumnAction {
    Blank,
    Anonymize(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Column {
    range: Range<usize>,
    action: ColumnAction,
}

fn is_dash_rule(line: &str) -> bool {
    line.contains('-') && line.chars().all(|c| c == '-' || c.is_whitespace())
}

fn starts_alphabetic(line: &str) -> bool {
    line.trim_start()
        .chars()
        .next()
        .is_some_and(char::is_alphabetic)
}

/// Index of the header line: the first alphabetic line with a dash rule
/// right below it
fn find_header(lines: &[&str]) -> Option<usize> {
    lines
        .windows(2)
        .position(|pair| starts_alphabetic(pair[0]) && is_dash_rule(pair[1]))
}

fn column_ranges(rule: &str) -> Vec<Range<usize>> {
    let mut start = 0;
    rule.split_whitespace()
        .map(|run| {
            let width = run.chars().count() + 1;
            let range = start..start + width;
            start += width;
            range
        })
        .collect()
}

fn char_slice(chars: &[char], range: &Range<usize>) -> String {
    let end = range.end.min(chars.len());
    let start = range.start.min(end);
    chars[start..end].iter().collect()
}

impl Anonymizer {
    /// Rewrite a fixed-width report
    ///
    /// Columns titled with an `attr_delete` name are blanked in place.
    /// Columns titled with an `attr_val` name have their stripped value
    /// replaced by its pseudonym; a pseudonym of another length shifts the
    /// rest of that line.
    pub fn rewrite_tabular(&mut self, text: &str) -> Rewritten {
        let specs = self.spec_handle();
        let (lines, trailing) = split_lines(text);
        let stats = RewriteStats {
            lines_read: lines.len(),
            lines_written: lines.len(),
            ..RewriteStats::default()
        };

        let Some(header) = find_header(&lines) else {
            tracing::warn!("No header with a dash rule found, report copied unchanged");
            return Rewritten {
                text: text.to_string(),
                stats,
            };
        };

        let header_chars: Vec<char> = lines[header].chars().collect();
        let columns: Vec<Column> = column_ranges(lines[header + 1])
            .into_iter()
            .filter_map(|range| {
                let title = char_slice(&header_chars, &range).trim().to_string();
                let action = if specs.attr_delete.contains(&title) {
                    ColumnAction::Blank
                } else if specs.attr_val.contains(&title) {
                    ColumnAction::Anonymize(title)
                } else {
                    return None;
                };
                Some(Column { range, action })
            })
            .collect();
        tracing::debug!(columns = columns.len(), "Report columns selected");

        let mut out: Vec<String> = lines[..=header + 1]
            .iter()
            .map(|line| line.to_string())
            .collect();
        for line in &lines[header + 2..] {
            out.push(self.rewrite_tabular_line(&columns, line));
        }

        Rewritten {
            text: join_lines(&out, trailing),
            stats,
        }
    }

    fn rewrite_tabular_line(&mut self, columns: &[Column], line: &str) -> String {
        let mut chars: Vec<char> = line.chars().collect();
        for column in columns {
            let end = column.range.end.min(chars.len());
            let start = column.range.start.min(end);
            match &column.action {
                ColumnAction::Blank => {
                    chars[start..end].iter_mut().for_each(|c| *c = ' ');
                }
                ColumnAction::Anonymize(title) => {
                    let slice: String = chars[start..end].iter().collect();
                    let stripped = slice.trim();
                    if stripped.is_empty() {
                        continue;
                    }
                    let pseudonym = self.anonymize_value(Table::AttrValue, title, stripped);
                    let replaced = slice.replacen(stripped, &pseudonym, 1);
                    chars.splice(start..end, replaced.chars());
                }
            }
        }
        chars.into_iter().collect()
    }
}
