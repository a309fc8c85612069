//! Anonymization session
//!
//! This module provides the [`Anonymizer`], the one object that carries
//! state through a whole export: the normalized specifications, the
//! [`MappingStore`], the pseudonym generator and the bad-record counter.
//!
//! # Lifecycle
//!
//! Create one session, drive it over every record and file of the export,
//! then optionally dump the tables:
//!
//! ```
//! use pbs_anonymize::anonymization::{Anonymizer, SpecSet, Spec, Table};
//!
//! let specs = SpecSet {
//!     attr_val: Spec::from_names(["euser"]),
//!     ..SpecSet::default()
//! };
//! let mut anon = Anonymizer::with_seed(specs, 7);
//!
//! let first = anon.anonymize_value(Table::AttrValue, "euser", "jdoe");
//! let again = anon.anonymize_value(Table::AttrValue, "User_List", "jdoe");
//! assert_eq!(first, again);
//! assert_eq!(first.len(), 4);
//! ```

use crate::anonymization::classifier::{classify, Bucket};
use crate::anonymization::pseudonym::PseudonymGenerator;
use crate::anonymization::spec::Spec;
use crate::anonymization::store::{MappingStore, Table};
use crate::domain::Result;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;

/// Value of the `project` attribute for jobs without an explicit project
pub const DEFAULT_PROJECT: &str = "_pbs_project_default";

/// FGC entity names that stand for "every entity" and are never rewritten
pub const FGC_GENERIC_ENTITIES: [&str; 2] = ["PBS_GENERIC", "PBS_ALL"];

/// Attributes whose values are comma-separated lists of identities
const LIST_ATTRIBUTES: &[&str] = &[
    "User_List",
    "group_list",
    "managers",
    "operators",
    "Mail_Users",
    "acl_users",
    "acl_groups",
    "acl_hosts",
    "acl_resv_users",
    "acl_resv_groups",
    "acl_resv_hosts",
    "authorized_users",
    "authorized_groups",
    "authorized_hosts",
];

/// `host/index+host/index...`
const EXEC_HOST: &str = "exec_host";

/// The six caller specifications, already normalized
#[derive(Debug, Clone, Default)]
pub struct SpecSet {
    /// Attributes removed outright
    pub attr_delete: Spec,
    /// Resources removed outright
    pub resc_delete: Spec,
    /// Attributes whose names are replaced
    pub attr_key: Spec,
    /// Attributes whose values are replaced
    pub attr_val: Spec,
    /// Resources whose names are replaced
    pub resc_key: Spec,
    /// Resources whose values are replaced
    pub resc_val: Spec,
}

impl SpecSet {
    /// True when no specification names anything
    pub fn is_empty(&self) -> bool {
        self.attr_delete.is_empty()
            && self.resc_delete.is_empty()
            && self.attr_key.is_empty()
            && self.attr_val.is_empty()
            && self.resc_key.is_empty()
            && self.resc_val.is_empty()
    }
}

/// One anonymization session
pub struct Anonymizer {
    specs: Arc<SpecSet>,
    store: MappingStore,
    generator: PseudonymGenerator,
    /// Alternation of every `resc_key` name, longest first
    resource_names: Option<Regex>,
    bad_accounting_records: usize,
}

impl Anonymizer {
    /// Create a session with an entropy-seeded generator
    pub fn new(specs: SpecSet) -> Self {
        Self::with_generator(specs, PseudonymGenerator::new())
    }

    /// Create a session whose pseudonyms are reproducible
    pub fn with_seed(specs: SpecSet, seed: u64) -> Self {
        Self::with_generator(specs, PseudonymGenerator::with_seed(seed))
    }

    /// Create a session with an explicit generator
    ///
    /// Explicit pseudonyms from the specifications are loaded into the
    /// tables before anything else runs, so they always win over generated
    /// ones.
    pub fn with_generator(specs: SpecSet, generator: PseudonymGenerator) -> Self {
        let mut store = MappingStore::new();
        preload(&mut store, Table::AttrKey, &specs.attr_key);
        preload(&mut store, Table::RescKey, &specs.resc_key);
        preload(&mut store, Table::AttrValue, &specs.attr_val);
        preload(&mut store, Table::RescValue, &specs.resc_val);

        tracing::debug!(
            attr_delete = specs.attr_delete.len(),
            resc_delete = specs.resc_delete.len(),
            attr_key = specs.attr_key.len(),
            attr_val = specs.attr_val.len(),
            resc_key = specs.resc_key.len(),
            resc_val = specs.resc_val.len(),
            preloaded = store.len(),
            "Anonymization session created"
        );

        Self {
            resource_names: resource_name_pattern(&specs.resc_key),
            specs: Arc::new(specs),
            store,
            generator,
            bad_accounting_records: 0,
        }
    }

    pub fn specs(&self) -> &SpecSet {
        &self.specs
    }

    /// Shared handle on the specifications, for rewriters that need to
    /// read them while mutating the session
    pub(crate) fn spec_handle(&self) -> Arc<SpecSet> {
        Arc::clone(&self.specs)
    }

    /// Pattern matching any `resc_key` name inside free text
    pub(crate) fn resource_name_pattern(&self) -> Option<Regex> {
        self.resource_names.clone()
    }

    pub fn store(&self) -> &MappingStore {
        &self.store
    }

    /// Accounting lines dropped so far because a field lacked `=`
    pub fn bad_accounting_record_count(&self) -> usize {
        self.bad_accounting_records
    }

    pub(crate) fn count_bad_accounting_record(&mut self) {
        self.bad_accounting_records += 1;
    }

    /// Whether some `attr_val` entry classifies into `bucket`
    pub fn value_bucket_enabled(&self, bucket: &Bucket) -> bool {
        self.specs.attr_val.names().any(|n| &classify(n) == bucket)
    }

    /// Whether host names are anonymized, including the host half of
    /// `user@host`
    pub fn host_anonymization_enabled(&self) -> bool {
        self.value_bucket_enabled(&Bucket::Host)
    }

    /// Pseudonym for a single token in `bucket`
    ///
    /// The first call for a token generates and stores a same-length
    /// pseudonym; later calls return the stored one. The default project is
    /// returned unchanged.
    pub fn anonymize_token(&mut self, table: Table, bucket: &Bucket, token: &str) -> String {
        if token.is_empty() || token == DEFAULT_PROJECT {
            return token.to_string();
        }
        if let Some(existing) = self.store.lookup(table, bucket, token) {
            return existing.to_string();
        }
        let store = &self.store;
        let pseudonym = self
            .generator
            .fresh_name(token, |c| store.is_issued(table, bucket, c));
        tracing::trace!(table = table.label(), bucket = %bucket, "New pseudonym issued");
        self.store.insert(table, bucket, token, pseudonym)
    }

    /// Pseudonym for the value of attribute (or resource) `attr`
    ///
    /// List-valued attributes are split and each element handled on its
    /// own; `user@host` elements have each side mapped in its own bucket.
    pub fn anonymize_value(&mut self, table: Table, attr: &str, raw: &str) -> String {
        if raw == DEFAULT_PROJECT {
            return raw.to_string();
        }
        let bucket = classify(attr);

        if attr == EXEC_HOST {
            return raw
                .split('+')
                .map(|chunk| match chunk.split_once('/') {
                    Some((host, rest)) => {
                        format!("{}/{}", self.anonymize_compound(table, &bucket, host), rest)
                    }
                    None => self.anonymize_compound(table, &bucket, chunk),
                })
                .collect::<Vec<_>>()
                .join("+");
        }

        if LIST_ATTRIBUTES.contains(&attr) {
            return raw
                .split(',')
                .map(|item| self.anonymize_list_item(table, &bucket, item))
                .collect::<Vec<_>>()
                .join(",");
        }

        self.anonymize_compound(table, &bucket, raw)
    }

    /// Pseudonym for an attribute or resource name in a key table
    pub fn anonymize_key(&mut self, table: Table, name: &str) -> String {
        let bucket = classify(name);
        self.anonymize_token(table, &bucket, name)
    }

    pub fn anonymize_attr_key(&mut self, name: &str) -> String {
        self.anonymize_key(Table::AttrKey, name)
    }

    pub fn anonymize_resc_key(&mut self, name: &str) -> String {
        self.anonymize_key(Table::RescKey, name)
    }

    /// Pseudonym for a dotted-quad address, kept in the attribute-key table
    pub fn anonymize_ip(&mut self, ip: &str) -> String {
        let bucket = Bucket::Custom("ip".to_string());
        if let Some(existing) = self.store.lookup(Table::AttrKey, &bucket, ip) {
            return existing.to_string();
        }
        let store = &self.store;
        let pseudonym = self
            .generator
            .fresh_ipv4(ip, |c| store.is_issued(Table::AttrKey, &bucket, c));
        self.store.insert(Table::AttrKey, &bucket, ip, pseudonym)
    }

    /// Rewrite the entity names of an FGC limit string
    ///
    /// Entries look like `u:jdoe=10` or `[g:staff=5]`. `u`, `g` and `p`
    /// entities are mapped through the user, group and project value
    /// buckets when that bucket is enabled in `attr_val`; generic entities
    /// and anything unparsable are left alone. Limits are never touched.
    pub fn anonymize_fgc_limits(&mut self, attr: &str, raw: &str) -> String {
        let rewritten = raw
            .split(',')
            .map(|entry| self.anonymize_fgc_entry(entry))
            .collect::<Vec<_>>()
            .join(",");
        if rewritten != raw {
            tracing::trace!(attribute = attr, "FGC limit entities rewritten");
        }
        rewritten
    }

    fn anonymize_fgc_entry(&mut self, entry: &str) -> String {
        let Some(colon) = entry.find(':') else {
            return entry.to_string();
        };
        let kind = entry[..colon].trim().trim_start_matches('[').trim();
        let bucket = match kind {
            "u" => Bucket::User,
            "g" => Bucket::Group,
            "p" => Bucket::project(),
            _ => return entry.to_string(),
        };
        let name_start = colon + 1;
        let Some(eq) = entry[name_start..].find('=') else {
            return entry.to_string();
        };
        let name_end = name_start + eq;
        let name = entry[name_start..name_end].trim();
        if name.is_empty()
            || FGC_GENERIC_ENTITIES.contains(&name)
            || !self.value_bucket_enabled(&bucket)
        {
            return entry.to_string();
        }
        let pseudonym = self.anonymize_token(Table::AttrValue, &bucket, name);
        let raw_name = &entry[name_start..name_end];
        format!(
            "{}{}{}",
            &entry[..name_start],
            raw_name.replacen(name, &pseudonym, 1),
            &entry[name_end..]
        )
    }

    /// One list element: keeps surrounding blanks and an ACL `+`/`-` sign
    fn anonymize_list_item(&mut self, table: Table, bucket: &Bucket, item: &str) -> String {
        let core = item.trim();
        if core.is_empty() {
            return item.to_string();
        }
        let lead = &item[..item.len() - item.trim_start().len()];
        let trail = &item[item.trim_end().len()..];
        let (sign, body) = match core.strip_prefix(['+', '-']) {
            Some(rest) => (&core[..1], rest),
            None => ("", core),
        };
        let anonymized = self.anonymize_compound(table, bucket, body);
        format!("{lead}{sign}{anonymized}{trail}")
    }

    /// A single value that may have the `user@host` shape
    fn anonymize_compound(&mut self, table: Table, bucket: &Bucket, token: &str) -> String {
        match token.split_once('@') {
            Some((user, host)) => {
                let user = self.anonymize_token(table, bucket, user);
                let host = if self.host_anonymization_enabled() {
                    self.anonymize_token(table, &Bucket::Host, host)
                } else {
                    host.to_string()
                };
                format!("{user}@{host}")
            }
            None => self.anonymize_token(table, bucket, token),
        }
    }

    /// Human-readable dump of every table
    pub fn describe(&self, hash_originals: bool) -> String {
        self.store.describe(hash_originals)
    }

    /// Write every table as pretty JSON
    pub fn write_mapping_dump(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.store.snapshot())?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), entries = self.store.len(), "Mapping dump written");
        Ok(())
    }
}

/// One alternation over every name so a single pass never revisits an
/// inserted pseudonym; at a given position the longest name wins
fn resource_name_pattern(spec: &Spec) -> Option<Regex> {
    let mut names: Vec<&str> = spec.names().collect();
    if names.is_empty() {
        return None;
    }
    names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    match Regex::new(&alternation) {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            tracing::error!(error = %e, "Resource name pattern not built, embedded names left as is");
            None
        }
    }
}

fn preload(store: &mut MappingStore, table: Table, spec: &Spec) {
    for (name, entry) in spec.entries() {
        let bucket = classify(name);
        match table {
            Table::AttrKey | Table::RescKey => {
                if let Some(alias) = &entry.alias {
                    store.insert(table, &bucket, name, alias.clone());
                }
            }
            Table::AttrValue | Table::RescValue => {
                for (original, pseudonym) in &entry.seeds {
                    store.insert(table, &bucket, original, pseudonym.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::spec::{normalize, RawEntry, RawSpec};
    use std::collections::BTreeMap;

    fn session(attr_val: &[&str]) -> Anonymizer {
        let specs = SpecSet {
            attr_val: Spec::from_names(attr_val),
            ..SpecSet::default()
        };
        Anonymizer::with_seed(specs, 11)
    }

    #[test]
    fn test_token_is_memoized_and_length_preserving() {
        let mut anon = session(&["euser"]);
        let a = anon.anonymize_token(Table::AttrValue, &Bucket::User, "jdoe");
        let b = anon.anonymize_token(Table::AttrValue, &Bucket::User, "jdoe");
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        assert_ne!(a, "jdoe");
    }

    #[test]
    fn test_default_project_passes_through() {
        let mut anon = session(&["project"]);
        assert_eq!(
            anon.anonymize_value(Table::AttrValue, "project", DEFAULT_PROJECT),
            DEFAULT_PROJECT
        );
        assert_eq!(
            anon.anonymize_token(Table::AttrValue, &Bucket::project(), DEFAULT_PROJECT),
            DEFAULT_PROJECT
        );
    }

    #[test]
    fn test_synonyms_share_a_bucket() {
        let mut anon = session(&["euser", "User_List"]);
        let a = anon.anonymize_value(Table::AttrValue, "euser", "jdoe");
        let b = anon.anonymize_value(Table::AttrValue, "requestor", "jdoe");
        assert_eq!(a, b);
    }

    #[test]
    fn test_list_value_rejoined_with_separator() {
        let mut anon = session(&["User_List"]);
        let out = anon.anonymize_value(Table::AttrValue, "User_List", "alice, bob");
        let parts: Vec<&str> = out.split(',').collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 5);
        assert!(parts[1].starts_with(' '));
        assert_eq!(parts[1].len(), 4);
        assert_eq!(parts[0], anon.anonymize_token(Table::AttrValue, &Bucket::User, "alice"));
    }

    #[test]
    fn test_acl_sign_kept() {
        let mut anon = session(&["acl_users"]);
        let out = anon.anonymize_value(Table::AttrValue, "acl_users", "+alice,-bob");
        assert!(out.starts_with('+'));
        assert!(out.contains(",-"));
        assert_eq!(out.len(), "+alice,-bob".len());
    }

    #[test]
    fn test_exec_host_keeps_indexes() {
        let mut anon = session(&["exec_host"]);
        let out = anon.anonymize_value(Table::AttrValue, "exec_host", "node01/0*2+node02/1");
        let chunks: Vec<&str> = out.split('+').collect();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].ends_with("/0*2"));
        assert!(chunks[1].ends_with("/1"));
        assert!(!out.contains("node01"));
        let host = anon.anonymize_token(Table::AttrValue, &Bucket::Host, "node01");
        assert!(chunks[0].starts_with(&host));
    }

    #[test]
    fn test_user_at_host_with_host_enabled() {
        let mut anon = session(&["Mail_Users", "exec_host"]);
        let out = anon.anonymize_value(Table::AttrValue, "Mail_Users", "jdoe@login1");
        let (user, host) = out.split_once('@').unwrap();
        assert_eq!(user, anon.anonymize_token(Table::AttrValue, &Bucket::User, "jdoe"));
        assert_eq!(host, anon.anonymize_token(Table::AttrValue, &Bucket::Host, "login1"));
    }

    #[test]
    fn test_user_at_host_with_host_disabled_keeps_host() {
        let mut anon = session(&["Job_Owner"]);
        let out = anon.anonymize_value(Table::AttrValue, "Job_Owner", "jdoe@login1");
        assert!(out.ends_with("@login1"));
        assert_ne!(out, "jdoe@login1");
    }

    #[test]
    fn test_fgc_rewrites_enabled_entities_only() {
        let mut anon = session(&["euser"]);
        let raw = "[u:PBS_GENERIC=10],[u:jdoe=5],[g:staff=3],[o:PBS_ALL=1]";
        let out = anon.anonymize_fgc_limits("max_run", raw);
        let entries: Vec<&str> = out.split(',').collect();
        assert_eq!(entries[0], "[u:PBS_GENERIC=10]");
        let jdoe = anon.anonymize_token(Table::AttrValue, &Bucket::User, "jdoe");
        assert_eq!(entries[1], format!("[u:{jdoe}=5]"));
        // group values are not enabled
        assert_eq!(entries[2], "[g:staff=3]");
        assert_eq!(entries[3], "[o:PBS_ALL=1]");
    }

    #[test]
    fn test_fgc_bare_entries_and_project() {
        let mut anon = session(&["project", "egroup"]);
        let out = anon.anonymize_fgc_limits("max_queued", "p:astro=4,g:PBS_ALL=2,g:staff=9");
        let entries: Vec<&str> = out.split(',').collect();
        assert!(entries[0].starts_with("p:"));
        assert!(entries[0].ends_with("=4"));
        assert_eq!(entries[0].len(), "p:astro=4".len());
        assert_eq!(entries[1], "g:PBS_ALL=2");
        assert_ne!(entries[2], "g:staff=9");
    }

    #[test]
    fn test_key_alias_preloaded() {
        let raw = RawSpec::Map(BTreeMap::from([(
            "Account_Name".to_string(),
            RawEntry::Alias("acct".to_string()),
        )]));
        let specs = SpecSet {
            attr_key: normalize(Some(&raw)).unwrap(),
            ..SpecSet::default()
        };
        let mut anon = Anonymizer::with_seed(specs, 1);
        assert_eq!(anon.anonymize_attr_key("Account_Name"), "acct");
    }

    #[test]
    fn test_value_seeds_preloaded() {
        let raw = RawSpec::Map(BTreeMap::from([(
            "euser".to_string(),
            RawEntry::Seeds(BTreeMap::from([("jdoe".to_string(), "alice".to_string())])),
        )]));
        let specs = SpecSet {
            attr_val: normalize(Some(&raw)).unwrap(),
            ..SpecSet::default()
        };
        let mut anon = Anonymizer::with_seed(specs, 1);
        assert_eq!(anon.anonymize_value(Table::AttrValue, "User_List", "jdoe"), "alice");
    }

    #[test]
    fn test_ip_pseudonym_is_consistent() {
        let mut anon = session(&[]);
        let a = anon.anonymize_ip("10.1.2.3");
        assert_eq!(a, anon.anonymize_ip("10.1.2.3"));
        assert_eq!(a.split('.').count(), 4);
        assert_eq!(a.len(), "10.1.2.3".len());
    }

    #[test]
    fn test_mapping_dump_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        let mut anon = session(&["euser"]);
        anon.anonymize_value(Table::AttrValue, "euser", "jdoe");
        anon.write_mapping_dump(&path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(json["attr_val"]["user"]["jdoe"].is_string());
    }
}
