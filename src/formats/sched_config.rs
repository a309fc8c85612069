//! `sched_config` rewriter

use crate::anonymization::engine::Anonymizer;
use crate::anonymization::report::RewriteStats;
use crate::formats::{join_lines, split_lines, Rewritten};

/// Settings whose values list resource names
const RESOURCE_SETTINGS: [&str; 3] = ["resources", "job_sort_key", "node_sort_key"];

impl Anonymizer {
    /// Rewrite a scheduler configuration
    ///
    /// Comment lines are dropped. Resource names in `resources`,
    /// `job_sort_key` and `node_sort_key` values are replaced by their
    /// `resc_key` pseudonyms.
    pub fn rewrite_sched_config(&mut self, text: &str) -> Rewritten {
        let (lines, trailing) = split_lines(text);
        let mut out = Vec::with_capacity(lines.len());
        let mut stats = RewriteStats {
            lines_read: lines.len(),
            ..RewriteStats::default()
        };

        for line in lines {
            if line.trim_start().starts_with('#') {
                stats.lines_dropped += 1;
                continue;
            }
            let rewritten = match line.split_once(':') {
                Some((setting, value)) if RESOURCE_SETTINGS.contains(&setting.trim()) => {
                    format!("{setting}:{}", self.replace_resource_names(value))
                }
                _ => line.to_string(),
            };
            out.push(rewritten);
        }

        stats.lines_written = out.len();
        Rewritten {
            text: join_lines(&out, trailing),
            stats,
        }
    }
}
