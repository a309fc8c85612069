//! Structured record rewriting
//!
//! Applies the six specifications to [`Record`]s. Every other rewriter
//! follows the same decisions; this one just has the attributes already
//! split out.

use crate::anonymization::classifier::Bucket;
use crate::anonymization::engine::{Anonymizer, SpecSet};
use crate::anonymization::store::Table;
use crate::domain::Record;
use regex::Captures;

/// Attribute-name prefixes whose values are FGC limit strings
const FGC_PREFIXES: [&str; 2] = ["max_run", "max_queued"];

/// Attributes whose values may mention resource names inline
const SORT_FORMULA: &str = "job_sort_formula";
const SCHEDSELECT: &str = "schedselect";
const SELECT: &str = "select";

/// Split `type.name` into `(Some(type), name)`; plain attributes give
/// `(None, attr)`
pub fn split_resource(attr: &str) -> (Option<&str>, &str) {
    match attr.split_once('.') {
        Some((kind, name)) => (Some(kind), name),
        None => (None, attr),
    }
}

impl Anonymizer {
    /// Anonymize one record in place
    ///
    /// Deleted attributes disappear; every other attribute keeps its slot
    /// even when its name is rewritten. A rename onto a name the record
    /// already uses is skipped so no value is lost.
    pub fn rewrite_record(&mut self, record: &mut Record) {
        let specs = self.spec_handle();
        let mut rewritten = Record::new();
        for (name, value) in record.iter() {
            let Some((renamed, value)) = self.rewrite_attribute(&specs, name, value) else {
                continue;
            };
            let taken =
                renamed != name && (record.contains(&renamed) || rewritten.contains(&renamed));
            if taken {
                tracing::warn!("Renamed attribute collides with an existing one, original name kept");
                rewritten.insert(name, value);
            } else {
                rewritten.insert(renamed, value);
            }
        }
        *record = rewritten;
    }

    /// Anonymize a single `name=value` attribute
    ///
    /// Returns `None` when the attribute is deleted. Otherwise the order is:
    /// FGC entity rewriting, value replacement, inline resource-name
    /// replacement in select/sort specs, and finally the key rename.
    pub(crate) fn rewrite_attribute(
        &mut self,
        specs: &SpecSet,
        name: &str,
        original: &str,
    ) -> Option<(String, String)> {
        let (kind, resc) = split_resource(name);
        if specs.attr_delete.contains(name) || (kind.is_some() && specs.resc_delete.contains(resc))
        {
            return None;
        }

        let mut value = original.to_string();

        let base = kind.unwrap_or(name);
        if FGC_PREFIXES.iter().any(|p| base.starts_with(p)) && self.fgc_aware() {
            value = self.anonymize_fgc_limits(name, &value);
        }

        match kind {
            Some(_) if specs.resc_val.contains(resc) => {
                value = self.anonymize_value(Table::RescValue, resc, &value);
            }
            None if specs.attr_val.contains(name) => {
                value = self.anonymize_value(Table::AttrValue, name, &value);
            }
            _ => {}
        }

        let embeds_resources =
            name == SORT_FORMULA || name == SCHEDSELECT || (kind.is_some() && resc == SELECT);
        if embeds_resources {
            value = self.replace_resource_names(&value);
        }

        let name = match kind {
            Some(kind) if specs.resc_key.contains(resc) => {
                format!("{kind}.{}", self.anonymize_resc_key(resc))
            }
            None if specs.attr_key.contains(name) => self.anonymize_attr_key(name),
            _ => name.to_string(),
        };

        Some((name, value))
    }

    /// FGC entity names are only rewritten when one of their buckets is
    fn fgc_aware(&self) -> bool {
        self.value_bucket_enabled(&Bucket::User)
            || self.value_bucket_enabled(&Bucket::Group)
            || self.value_bucket_enabled(&Bucket::project())
    }

    /// Anonymize a batch of records against this one session
    pub fn rewrite_records(&mut self, records: &mut [Record]) {
        for record in records.iter_mut() {
            self.rewrite_record(record);
        }
        tracing::debug!(records = records.len(), "Record batch rewritten");
    }

    /// Replace every textual occurrence of a `resc_key` resource name
    ///
    /// Done in one pass over the original text, so a name is never matched
    /// inside a pseudonym inserted for another one.
    pub(crate) fn replace_resource_names(&mut self, text: &str) -> String {
        let Some(pattern) = self.resource_name_pattern() else {
            return text.to_string();
        };
        pattern
            .replace_all(text, |caps: &Captures| self.anonymize_resc_key(&caps[0]))
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::spec::{normalize, RawEntry, RawSpec, Spec};
    use std::collections::BTreeMap;

    fn aliases(pairs: &[(&str, &str)]) -> Spec {
        let raw = RawSpec::Map(
            pairs
                .iter()
                .map(|(name, alias)| (name.to_string(), RawEntry::Alias(alias.to_string())))
                .collect::<BTreeMap<_, _>>(),
        );
        normalize(Some(&raw)).unwrap()
    }

    fn session(specs: SpecSet) -> Anonymizer {
        Anonymizer::with_seed(specs, 5)
    }

    #[test]
    fn test_split_resource() {
        assert_eq!(split_resource("Resource_List.ncpus"), (Some("Resource_List"), "ncpus"));
        assert_eq!(split_resource("euser"), (None, "euser"));
    }

    #[test]
    fn test_deletes_attributes_and_resources() {
        let mut anon = session(SpecSet {
            attr_delete: Spec::from_names(["Account_Name"]),
            resc_delete: Spec::from_names(["foo"]),
            ..SpecSet::default()
        });
        let mut record = Record::from_pairs([
            ("Account_Name", "secret"),
            ("Resource_List.foo", "1"),
            ("resources_used.foo", "2"),
            ("Resource_List.ncpus", "4"),
            ("foo", "kept because not a resource"),
        ]);
        anon.rewrite_record(&mut record);
        assert_eq!(record.names(), vec!["Resource_List.ncpus", "foo"]);
    }

    #[test]
    fn test_value_and_key_rewrites() {
        let mut anon = session(SpecSet {
            attr_val: Spec::from_names(["euser"]),
            attr_key: Spec::from_names(["Account_Name"]),
            resc_key: Spec::from_names(["foo"]),
            resc_val: Spec::from_names(["foo"]),
            ..SpecSet::default()
        });
        let mut record = Record::from_pairs([
            ("euser", "jdoe"),
            ("Account_Name", "proj1"),
            ("Resource_List.foo", "bar"),
            ("queue", "workq"),
        ]);
        anon.rewrite_record(&mut record);

        let names = record.names();
        assert_eq!(names[0], "euser");
        assert_ne!(record.get("euser"), Some("jdoe"));
        assert_eq!(record.get("euser").unwrap().len(), 4);

        let acct = anon.anonymize_attr_key("Account_Name");
        assert_eq!(names[1], acct);
        assert_eq!(record.get(&acct), Some("proj1"));

        let foo = anon.anonymize_resc_key("foo");
        assert_eq!(names[2], format!("Resource_List.{foo}"));
        let value = record.get(&names[2]).unwrap();
        assert_ne!(value, "bar");
        assert_eq!(value.len(), 3);

        assert_eq!(record.get("queue"), Some("workq"));
    }

    #[test]
    fn test_embedded_resource_names() {
        let mut anon = session(SpecSet {
            resc_key: Spec::from_names(["foo"]),
            ..SpecSet::default()
        });
        let mut record = Record::from_pairs([
            ("job_sort_formula", "2*foo+ncpus"),
            ("schedselect", "1:ncpus=2:foo=True"),
            ("Resource_List.select", "2:foo=abc"),
            ("comment", "foo is untouched here"),
        ]);
        anon.rewrite_record(&mut record);
        let foo = anon.anonymize_resc_key("foo");
        assert_eq!(record.get("job_sort_formula").unwrap(), format!("2*{foo}+ncpus"));
        assert_eq!(record.get("schedselect").unwrap(), format!("1:ncpus=2:{foo}=True"));
        assert_eq!(record.get("Resource_List.select").unwrap(), format!("2:{foo}=abc"));
        assert_eq!(record.get("comment"), Some("foo is untouched here"));
    }

    #[test]
    fn test_fgc_limits_in_records() {
        let mut anon = session(SpecSet {
            attr_val: Spec::from_names(["euser"]),
            ..SpecSet::default()
        });
        let mut record = Record::from_pairs([
            ("max_run", "[u:jdoe=4],[u:PBS_GENERIC=10]"),
            ("max_run_res.ncpus", "[u:jdoe=40]"),
            ("euser", "jdoe"),
        ]);
        anon.rewrite_record(&mut record);
        let jdoe = record.get("euser").unwrap().to_string();
        assert_eq!(
            record.get("max_run").unwrap(),
            format!("[u:{jdoe}=4],[u:PBS_GENERIC=10]")
        );
        assert_eq!(record.get("max_run_res.ncpus").unwrap(), format!("[u:{jdoe}=40]"));
    }

    #[test]
    fn test_batch_is_consistent_across_records() {
        let mut anon = session(SpecSet {
            attr_val: Spec::from_names(["euser", "egroup"]),
            ..SpecSet::default()
        });
        let mut records = vec![
            Record::from_pairs([("euser", "jdoe"), ("egroup", "staff")]),
            Record::from_pairs([("egroup", "staff"), ("euser", "jdoe")]),
        ];
        anon.rewrite_records(&mut records);
        assert_eq!(records[0].get("euser"), records[1].get("euser"));
        assert_eq!(records[0].get("egroup"), records[1].get("egroup"));
        assert_ne!(records[0].get("euser"), Some("jdoe"));
    }

    #[test]
    fn test_embedded_names_never_rematched_inside_pseudonyms() {
        let mut anon = session(SpecSet {
            resc_key: aliases(&[("foo", "xab"), ("ab", "qq")]),
            ..SpecSet::default()
        });
        let mut record = Record::from_pairs([
            ("Resource_List.foo", "1"),
            ("schedselect", "1:foo=1:ab=2"),
            ("job_sort_formula", "ab*foo"),
        ]);
        anon.rewrite_record(&mut record);
        assert_eq!(record.names()[0], "Resource_List.xab");
        assert_eq!(record.get("schedselect"), Some("1:xab=1:qq=2"));
        assert_eq!(record.get("job_sort_formula"), Some("qq*xab"));
    }

    #[test]
    fn test_embedded_names_match_key_pseudonyms_for_any_seed() {
        for seed in 0..200 {
            let mut anon = Anonymizer::with_seed(
                SpecSet {
                    resc_key: Spec::from_names(["foo", "a"]),
                    ..SpecSet::default()
                },
                seed,
            );
            let mut record = Record::from_pairs([("schedselect", "1:foo=1:a=2")]);
            anon.rewrite_record(&mut record);
            let foo = anon.anonymize_resc_key("foo");
            let a = anon.anonymize_resc_key("a");
            assert_eq!(
                record.get("schedselect").unwrap(),
                format!("1:{foo}=1:{a}=2"),
                "seed {seed}"
            );
        }
    }

    #[test]
    fn test_rename_onto_existing_name_keeps_both_values() {
        let mut anon = session(SpecSet {
            attr_key: aliases(&[("Account_Name", "queue")]),
            ..SpecSet::default()
        });
        let mut record = Record::from_pairs([("Account_Name", "p1"), ("queue", "workq")]);
        anon.rewrite_record(&mut record);
        assert_eq!(record.names(), vec!["Account_Name", "queue"]);
        assert_eq!(record.get("Account_Name"), Some("p1"));
        assert_eq!(record.get("queue"), Some("workq"));
    }
}
