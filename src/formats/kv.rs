//! Free-text `key=value` rewriter
//!
//! Handles `qmgr -c 'print server'`, `pbsnodes -a`, `qstat -f` and similar
//! output where sensitive data shows up as `key<op>value` inside otherwise
//! arbitrary lines. Operators are `=`, `+=`, `-=` and `==`.

use crate::anonymization::classifier::classify;
use crate::anonymization::engine::{Anonymizer, SpecSet};
use crate::anonymization::report::RewriteStats;
use crate::anonymization::store::Table;
use crate::formats::tokenizer::next_token;
use crate::formats::{join_lines, split_lines, Rewritten};
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::OnceLock;

const OPERATORS: [&str; 4] = ["==", "+=", "-=", "="];

fn ipv4_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").unwrap())
}

/// A place where a key is used as a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    /// Byte offset of the key text
    pub key_start: usize,
    /// Start of the whole field; before `key_start` when the key is the
    /// resource part of `type.name`
    pub field_start: usize,
    /// Byte offset of the first non-blank character after the operator
    pub value_start: usize,
}

/// A value read after a key occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedValue {
    pub occurrence: Occurrence,
    /// Unquoted value
    pub value: String,
    /// Byte range of the value as written, quotes included
    pub raw: Range<usize>,
}

/// First place in `line` where `key` is followed by an operator and a value
///
/// The key must not be glued to alphanumerics on either side. `None` simply
/// means the key is not used as a key on this line.
pub fn find_valid_key_occurrence(line: &str, key: &str) -> Option<Occurrence> {
    find_occurrence_from(line, key, 0)
}

fn find_occurrence_from(line: &str, key: &str, from: usize) -> Option<Occurrence> {
    if key.is_empty() || from > line.len() {
        return None;
    }

    for (offset, _) in line[from..].match_indices(key) {
        let key_start = from + offset;
        if line[..key_start]
            .chars()
            .next_back()
            .is_some_and(char::is_alphanumeric)
        {
            continue;
        }

        let after = &line[key_start + key.len()..];
        if after.chars().next().is_some_and(char::is_alphanumeric) {
            continue;
        }

        let rest = after.trim_start();
        let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) else {
            continue;
        };
        let value = rest[op.len()..].trim_start();
        if value.is_empty() {
            continue;
        }

        return Some(Occurrence {
            key_start,
            field_start: field_start(line, key_start),
            value_start: line.len() - value.len(),
        });
    }

    None
}

/// Walk back over a `type.` prefix in front of a resource name
fn field_start(line: &str, key_start: usize) -> usize {
    let head = &line[..key_start];
    let Some(prefix) = head.strip_suffix('.') else {
        return key_start;
    };
    let kept = prefix.trim_end_matches(|c: char| c.is_alphanumeric() || c == '_');
    if kept.len() == prefix.len() {
        key_start
    } else {
        kept.len()
    }
}

/// Value of the first valid occurrence of `key` in `line`
///
/// A line that is exactly `key = value` yields the whole remainder. In any
/// other line the character before the field is the delimiter, and the
/// value is the first shell-style token up to that delimiter. Malformed
/// quoting gives `None`.
pub fn extract_value(line: &str, key: &str) -> Option<ExtractedValue> {
    extract_value_from(line, key, 0)
}

fn extract_value_from(line: &str, key: &str, from: usize) -> Option<ExtractedValue> {
    if from == 0 {
        if let Some(found) = extract_assignment(line, key) {
            return Some(found);
        }
    }

    let mut from = from;
    loop {
        let occurrence = find_occurrence_from(line, key, from)?;
        let delimiter = line[..occurrence.field_start]
            .chars()
            .next_back()
            .unwrap_or(' ');
        match next_token(&line[occurrence.value_start..], delimiter) {
            Some(token) => {
                let raw =
                    occurrence.value_start..occurrence.value_start + token.raw_len;
                return Some(ExtractedValue {
                    occurrence,
                    value: token.value,
                    raw,
                });
            }
            None => {
                tracing::debug!(key = key, "Unbalanced quoting after key, occurrence skipped");
                from = occurrence.value_start;
            }
        }
    }
}

/// `key = value` filling the whole line
fn extract_assignment(line: &str, key: &str) -> Option<ExtractedValue> {
    let mut words = line.split_whitespace();
    if words.next() != Some(key) || words.next() != Some("=") {
        return None;
    }
    let key_start = line.len() - line.trim_start().len();
    let eq = key_start + line[key_start..].find('=')?;
    let value = line[eq + 1..].trim();
    if value.is_empty() {
        return None;
    }
    let value_start = eq + 1 + (line[eq + 1..].len() - line[eq + 1..].trim_start().len());
    Some(ExtractedValue {
        occurrence: Occurrence {
            key_start,
            field_start: key_start,
            value_start,
        },
        value: value.to_string(),
        raw: value_start..value_start + value.len(),
    })
}

impl Anonymizer {
    /// Rewrite free text holding `key=value` pairs
    ///
    /// Per line: deletions, key renames (attributes then resources), value
    /// replacement (attributes then resources), then IPv4 addresses. A line
    /// left without alphanumerics by a deletion is dropped together with any
    /// tab-indented continuation lines that follow it.
    pub fn rewrite_kv(&mut self, text: &str) -> Rewritten {
        let specs = self.spec_handle();
        let (lines, trailing) = split_lines(text);
        let mut out = Vec::with_capacity(lines.len());
        let mut stats = RewriteStats {
            lines_read: lines.len(),
            ..RewriteStats::default()
        };

        let mut dropping = false;
        for line in lines {
            if dropping && line.starts_with('\t') {
                stats.lines_dropped += 1;
                continue;
            }
            dropping = false;

            match self.rewrite_kv_line(&specs, line) {
                Some(rewritten) => out.push(rewritten),
                None => {
                    stats.lines_dropped += 1;
                    dropping = true;
                }
            }
        }

        stats.lines_written = out.len();
        Rewritten {
            text: join_lines(&out, trailing),
            stats,
        }
    }

    /// One line; `None` when the line is to be dropped
    fn rewrite_kv_line(&mut self, specs: &SpecSet, line: &str) -> Option<String> {
        let mut line = line.to_string();

        let delete_keys: BTreeSet<&str> = specs
            .attr_delete
            .names()
            .chain(specs.resc_delete.names())
            .collect();
        let mut deleted = false;
        for key in delete_keys {
            deleted |= delete_key(&mut line, key);
        }
        if deleted && !line.chars().any(char::is_alphanumeric) {
            return None;
        }

        for key in specs.attr_key.names() {
            self.rename_kv_key(&mut line, Table::AttrKey, key);
        }
        for key in specs.resc_key.names() {
            self.rename_kv_key(&mut line, Table::RescKey, key);
        }
        for key in specs.attr_val.names() {
            self.rewrite_kv_values(&mut line, Table::AttrKey, Table::AttrValue, key);
        }
        for key in specs.resc_val.names() {
            self.rewrite_kv_values(&mut line, Table::RescKey, Table::RescValue, key);
        }

        if ipv4_pattern().is_match(&line) {
            line = ipv4_pattern()
                .replace_all(&line, |caps: &Captures| self.anonymize_ip(&caps[0]))
                .into_owned();
        }

        Some(line)
    }

    fn rename_kv_key(&mut self, line: &mut String, table: Table, key: &str) {
        let mut from = 0;
        while let Some(occurrence) = find_occurrence_from(line, key, from) {
            let pseudonym = self.anonymize_key(table, key);
            let key_range = occurrence.key_start..occurrence.key_start + key.len();
            line.replace_range(key_range, &pseudonym);
            from = occurrence.key_start + pseudonym.len();
        }
    }

    /// Replace the values of `key`, also under its renamed form when the
    /// key itself was anonymized earlier on
    fn rewrite_kv_values(&mut self, line: &mut String, key_table: Table, table: Table, key: &str) {
        let mut spellings = vec![key.to_string()];
        if let Some(renamed) = self.store().lookup(key_table, &classify(key), key) {
            spellings.push(renamed.to_string());
        }

        for spelling in &spellings {
            let mut from = 0;
            while let Some(found) = extract_value_from(line, spelling, from) {
                let pseudonym = self.anonymize_value(table, key, &found.value);
                let raw = &line[found.raw.clone()];
                let replaced = if raw.contains(found.value.as_str()) {
                    raw.replacen(&found.value, &pseudonym, 1)
                } else {
                    tracing::debug!(key = key, "Value split by quotes or escapes, replaced whole");
                    requote(raw, &pseudonym)
                };
                from = found.raw.start + replaced.len();
                line.replace_range(found.raw, &replaced);
            }
        }
    }
}

/// `pseudonym` wrapped in the quotes that enclose all of `raw`, if any
fn requote(raw: &str, pseudonym: &str) -> String {
    for quote in ['"', '\''] {
        let enclosed = raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote);
        if enclosed {
            return format!("{quote}{pseudonym}{quote}");
        }
    }
    pseudonym.to_string()
}

/// Remove every `key<op>value` field for `key`, with its leading delimiter
fn delete_key(line: &mut String, key: &str) -> bool {
    let mut deleted = false;
    let mut from = 0;
    while let Some(found) = extract_value_from(line, key, from) {
        let start = found.occurrence.field_start;
        let start = line[..start]
            .char_indices()
            .next_back()
            .map_or(start, |(idx, _)| idx);
        line.replace_range(start..found.raw.end, "");
        from = start;
        deleted = true;
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::spec::Spec;
    use test_case::test_case;

    fn session(specs: SpecSet) -> Anonymizer {
        Anonymizer::with_seed(specs, 11)
    }

    #[test_case("set server foo = bar", "foo", Some(11) ; "spaced operator")]
    #[test_case("a,foo+=3", "foo", Some(2) ; "append operator")]
    #[test_case("foo==x", "foo", Some(0) ; "comparison operator")]
    #[test_case("foobar=1", "foo", None ; "key is a prefix")]
    #[test_case("xfoo=1", "foo", None ; "key is a suffix")]
    #[test_case("foo is great", "foo", None ; "no operator")]
    #[test_case("foo=", "foo", None ; "nothing after operator")]
    #[test_case("foo bar, foo=1", "foo", Some(9) ; "second occurrence")]
    fn test_find_valid_key_occurrence(line: &str, key: &str, start: Option<usize>) {
        let found = find_valid_key_occurrence(line, key).map(|o| o.key_start);
        assert_eq!(found, start);
    }

    #[test]
    fn test_resource_prefix_is_part_of_field() {
        let line = "    resources_available.foo = bar";
        let occurrence = find_valid_key_occurrence(line, "foo").unwrap();
        assert_eq!(occurrence.field_start, 4);
        assert_eq!(occurrence.key_start, 24);
    }

    #[test_case("foo = bar baz", "bar baz" ; "whole line assignment")]
    #[test_case("x foo=\"a b\" y", "a b" ; "quoted value")]
    #[test_case("x,foo=a,b", "a" ; "comma delimiter")]
    #[test_case("  euser = jdoe  ", "jdoe" ; "indented assignment")]
    fn test_extract_value(line: &str, expected: &str) {
        assert_eq!(extract_value(line, "foo").or_else(|| extract_value(line, "euser")).unwrap().value, expected);
    }

    #[test]
    fn test_extract_value_malformed_quoting() {
        assert_eq!(extract_value("x foo=\"open", "foo"), None);
    }

    #[test]
    fn test_deleted_assignment_drops_line() {
        let mut anon = session(SpecSet {
            attr_delete: Spec::from_names(["foo"]),
            ..SpecSet::default()
        });
        let out = anon.rewrite_kv("foo = bar\n");
        assert_eq!(out.text, "");
        assert_eq!(out.stats.lines_dropped, 1);
        assert_eq!(out.stats.lines_written, 0);
    }

    #[test]
    fn test_partial_delete_keeps_rest_of_line() {
        let mut anon = session(SpecSet {
            attr_delete: Spec::from_names(["foo"]),
            ..SpecSet::default()
        });
        let out = anon.rewrite_kv("euser=jdoe foo=bar queue=workq");
        assert_eq!(out.text, "euser=jdoe queue=workq");
    }

    #[test]
    fn test_continuation_lines_follow_deleted_line() {
        let mut anon = session(SpecSet {
            attr_delete: Spec::from_names(["foo"]),
            ..SpecSet::default()
        });
        let out = anon.rewrite_kv("foo = a,\n\tb,\n\tc\nnext = 1\n\tkept\n");
        assert_eq!(out.text, "next = 1\n\tkept\n");
        assert_eq!(out.stats.lines_dropped, 3);
    }

    #[test]
    fn test_blank_lines_are_kept() {
        let mut anon = session(SpecSet {
            attr_delete: Spec::from_names(["foo"]),
            ..SpecSet::default()
        });
        let out = anon.rewrite_kv("a = 1\n\nb = 2\n");
        assert_eq!(out.text, "a = 1\n\nb = 2\n");
    }

    #[test]
    fn test_values_are_consistent_with_records() {
        let mut anon = session(SpecSet {
            attr_val: Spec::from_names(["euser"]),
            ..SpecSet::default()
        });
        let out = anon.rewrite_kv("euser = jdoe\njob 1 euser=jdoe state=R\n");
        let pseudonym = anon.anonymize_value(Table::AttrValue, "euser", "jdoe");
        assert_eq!(
            out.text,
            format!("euser = {pseudonym}\njob 1 euser={pseudonym} state=R\n")
        );
    }

    #[test]
    fn test_quoted_value_keeps_quotes() {
        let mut anon = session(SpecSet {
            attr_val: Spec::from_names(["Job_Owner"]),
            ..SpecSet::default()
        });
        let out = anon.rewrite_kv("x Job_Owner=\"jdoe\" y");
        let pseudonym = anon.anonymize_value(Table::AttrValue, "Job_Owner", "jdoe");
        assert_eq!(out.text, format!("x Job_Owner=\"{pseudonym}\" y"));
    }

    #[test]
    fn test_resource_key_and_value() {
        let mut anon = session(SpecSet {
            resc_key: Spec::from_names(["foo"]),
            resc_val: Spec::from_names(["foo"]),
            ..SpecSet::default()
        });
        let out = anon.rewrite_kv("    resources_available.foo = bar");
        let key = anon.anonymize_resc_key("foo");
        let value = anon.anonymize_value(Table::RescValue, "foo", "bar");
        assert_eq!(out.text, format!("    resources_available.{key} = {value}"));
        assert_ne!(value, "bar");
    }

    #[test]
    fn test_ip_addresses_replaced() {
        let mut anon = session(SpecSet::default());
        let out = anon.rewrite_kv("Mom = 10.1.22.3 and 10.1.22.3");
        assert!(!out.text.contains("10.1.22.3"));
        let ip = anon.anonymize_ip("10.1.22.3");
        assert_eq!(out.text, format!("Mom = {ip} and {ip}"));
        assert_eq!(ip.len(), "10.1.22.3".len());
    }

    #[test_case("x euser=jdoe\\ smith y", "x euser={} y" ; "escaped blank")]
    #[test_case("x euser='jd'oe y", "x euser={} y" ; "partly single quoted")]
    #[test_case("x euser=\"jd\"oe y", "x euser={} y" ; "partly double quoted")]
    #[test_case("x euser='jd''oe' y", "x euser='{}' y" ; "adjacent single quotes")]
    fn test_split_values_replaced_whole(line: &str, expected: &str) {
        let mut anon = session(SpecSet {
            attr_val: Spec::from_names(["euser"]),
            ..SpecSet::default()
        });
        let value = extract_value(line, "euser").unwrap().value;
        let out = anon.rewrite_kv(line);
        let pseudonym = anon.anonymize_value(Table::AttrValue, "euser", &value);
        assert_ne!(pseudonym, value);
        assert_eq!(out.text, expected.replace("{}", &pseudonym));
    }

    #[test]
    fn test_non_ascii_digits_are_not_addresses() {
        let mut anon = session(SpecSet::default());
        let line = "id = \u{0661}\u{0662}.1.2.3";
        assert_eq!(anon.rewrite_kv(line).text, line);
        assert!(anon.store().is_empty());
    }
}
