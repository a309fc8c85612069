//! Fairshare `resource_group` rewriter
//!
//! Lines are `entity[:group] id parent shares`. Entity and parent go
//! through the user bucket so a parent refers to the same pseudonym as the
//! entity line defining it; a `:group` suffix goes through the group
//! bucket.

use crate::anonymization::classifier::Bucket;
use crate::anonymization::engine::Anonymizer;
use crate::anonymization::report::RewriteStats;
use crate::anonymization::store::Table;
use crate::formats::{join_lines, split_lines, Rewritten};

/// Top of the share tree
const ROOT: &str = "root";

impl Anonymizer {
    /// Rewrite a fairshare resource group file
    ///
    /// Comment lines are dropped. Users and groups are only rewritten when
    /// their bucket is enabled in `attr_val`.
    pub fn rewrite_resource_group(&mut self, text: &str) -> Rewritten {
        let users = self.value_bucket_enabled(&Bucket::User);
        let groups = self.value_bucket_enabled(&Bucket::Group);
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
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                out.push(line.to_string());
                continue;
            }

            let mut rewritten: Vec<String> = fields.iter().map(|f| f.to_string()).collect();

            let (user, group) = match fields[0].split_once(':') {
                Some((user, group)) => (user, Some(group)),
                None => (fields[0], None),
            };
            let user = if users {
                self.anonymize_token(Table::AttrValue, &Bucket::User, user)
            } else {
                user.to_string()
            };
            rewritten[0] = match group {
                Some(group) if groups => format!(
                    "{user}:{}",
                    self.anonymize_token(Table::AttrValue, &Bucket::Group, group)
                ),
                Some(group) => format!("{user}:{group}"),
                None => user,
            };

            if users && fields.len() > 2 && fields[2] != ROOT {
                rewritten[2] = self.anonymize_token(Table::AttrValue, &Bucket::User, fields[2]);
            }

            out.push(rewritten.join("\t"));
        }

        stats.lines_written = out.len();
        Rewritten {
            text: join_lines(&out, trailing),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::engine::SpecSet;
    use crate::anonymization::spec::Spec;

    const GROUPS: &str = "\
# fairshare tree for jdoe and friends
physics 10 root 40
jdoe:staff 11 physics 20
asmith 12 physics 20
";

    #[test]
    fn test_parent_matches_entity_pseudonym() {
        let mut anon = Anonymizer::with_seed(
            SpecSet {
                attr_val: Spec::from_names(["euser", "egroup"]),
                ..SpecSet::default()
            },
            23,
        );
        let out = anon.rewrite_resource_group(GROUPS);
        let lines: Vec<&str> = out.text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(out.stats.lines_dropped, 1);

        let physics = anon.anonymize_token(Table::AttrValue, &Bucket::User, "physics");
        let jdoe = anon.anonymize_token(Table::AttrValue, &Bucket::User, "jdoe");
        let staff = anon.anonymize_token(Table::AttrValue, &Bucket::Group, "staff");
        assert_eq!(lines[0], format!("{physics}\t10\troot\t40"));
        assert_eq!(lines[1], format!("{jdoe}:{staff}\t11\t{physics}\t20"));
        assert!(!out.text.contains("jdoe"));
    }

    #[test]
    fn test_disabled_buckets_only_drop_comments() {
        let mut anon = Anonymizer::with_seed(SpecSet::default(), 23);
        let out = anon.rewrite_resource_group(GROUPS);
        assert_eq!(
            out.text,
            "physics\t10\troot\t40\njdoe:staff\t11\tphysics\t20\nasmith\t12\tphysics\t20\n"
        );
    }
}
