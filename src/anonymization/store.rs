//! Session-lifetime pseudonym tables
//!
//! Four independent tables (attribute keys, resource keys, attribute
//! values, resource values), each split by [`Bucket`]. A table entry is
//! written once and never changed afterwards; that write-once rule is what
//! keeps one export internally consistent.

use crate::anonymization::classifier::Bucket;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

/// Which of the four tables an entry lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    AttrKey,
    RescKey,
    AttrValue,
    RescValue,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::AttrKey,
        Table::RescKey,
        Table::AttrValue,
        Table::RescValue,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::AttrKey => "attr_key",
            Self::RescKey => "resc_key",
            Self::AttrValue => "attr_val",
            Self::RescValue => "resc_val",
        }
    }
}

#[derive(Debug, Default)]
struct BucketMap {
    forward: BTreeMap<String, String>,
    issued: HashSet<String>,
}

/// Serializable view of every table, keyed by table and bucket label
pub type MappingSnapshot = BTreeMap<&'static str, BTreeMap<String, BTreeMap<String, String>>>;

/// The four pseudonym tables of one anonymization session
#[derive(Debug, Default)]
pub struct MappingStore {
    tables: BTreeMap<Table, BTreeMap<Bucket, BucketMap>>,
}

impl MappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pseudonym already assigned to `original`, if any
    pub fn lookup(&self, table: Table, bucket: &Bucket, original: &str) -> Option<&str> {
        self.tables
            .get(&table)?
            .get(bucket)?
            .forward
            .get(original)
            .map(String::as_str)
    }

    /// Record `original -> pseudonym`
    ///
    /// An existing entry is kept and returned unchanged.
    pub fn insert(
        &mut self,
        table: Table,
        bucket: &Bucket,
        original: &str,
        pseudonym: String,
    ) -> String {
        let map = self
            .tables
            .entry(table)
            .or_default()
            .entry(bucket.clone())
            .or_default();
        if let Some(existing) = map.forward.get(original) {
            return existing.clone();
        }
        map.issued.insert(pseudonym.clone());
        map.forward.insert(original.to_string(), pseudonym.clone());
        pseudonym
    }

    /// Whether `pseudonym` was already handed out in this table and bucket
    pub fn is_issued(&self, table: Table, bucket: &Bucket, pseudonym: &str) -> bool {
        self.tables
            .get(&table)
            .and_then(|t| t.get(bucket))
            .is_some_and(|m| m.issued.contains(pseudonym))
    }

    /// Number of entries across all tables
    pub fn len(&self) -> usize {
        self.tables
            .values()
            .flat_map(|t| t.values())
            .map(|m| m.forward.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every table for serialization
    pub fn snapshot(&self) -> MappingSnapshot {
        let mut out = MappingSnapshot::new();
        for (table, buckets) in &self.tables {
            let view = out.entry(table.label()).or_default();
            for (bucket, map) in buckets {
                if !map.forward.is_empty() {
                    view.insert(bucket.label().to_string(), map.forward.clone());
                }
            }
        }
        out
    }

    /// Human-readable `original => pseudonym` listing
    ///
    /// With `hash_originals` the originals are replaced by the first 12 hex
    /// digits of their SHA-256 digest.
    pub fn describe(&self, hash_originals: bool) -> String {
        let mut out = String::new();
        for table in Table::ALL {
            let Some(buckets) = self.tables.get(&table) else {
                continue;
            };
            if buckets.values().all(|m| m.forward.is_empty()) {
                continue;
            }
            let _ = writeln!(out, "[{}]", table.label());
            for (bucket, map) in buckets {
                if map.forward.is_empty() {
                    continue;
                }
                let _ = writeln!(out, "  {bucket}:");
                for (original, pseudonym) in &map.forward {
                    let shown = if hash_originals {
                        short_digest(original)
                    } else {
                        original.clone()
                    };
                    let _ = writeln!(out, "    {shown} => {pseudonym}");
                }
            }
        }
        out
    }
}

fn short_digest(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let hex = format!("{digest:x}");
    hex[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_write_once() {
        let mut store = MappingStore::new();
        let first = store.insert(Table::AttrValue, &Bucket::User, "jdoe", "abcd".into());
        let second = store.insert(Table::AttrValue, &Bucket::User, "jdoe", "wxyz".into());
        assert_eq!(first, "abcd");
        assert_eq!(second, "abcd");
        assert_eq!(store.lookup(Table::AttrValue, &Bucket::User, "jdoe"), Some("abcd"));
        assert!(store.is_issued(Table::AttrValue, &Bucket::User, "abcd"));
        assert!(!store.is_issued(Table::AttrValue, &Bucket::User, "wxyz"));
    }

    #[test]
    fn test_tables_and_buckets_are_independent() {
        let mut store = MappingStore::new();
        store.insert(Table::AttrValue, &Bucket::User, "x", "a".into());
        assert!(store.lookup(Table::RescValue, &Bucket::User, "x").is_none());
        assert!(store.lookup(Table::AttrValue, &Bucket::Group, "x").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_describe_plain_and_hashed() {
        let mut store = MappingStore::new();
        store.insert(Table::AttrValue, &Bucket::User, "jdoe", "qwer".into());
        store.insert(Table::RescKey, &Bucket::Custom("foo".into()), "foo", "bar".into());

        let plain = store.describe(false);
        assert!(plain.contains("[attr_val]"));
        assert!(plain.contains("  user:"));
        assert!(plain.contains("    jdoe => qwer"));
        assert!(plain.contains("[resc_key]"));

        let hashed = store.describe(true);
        assert!(!hashed.contains("jdoe"));
        assert!(hashed.contains("=> qwer"));
    }

    #[test]
    fn test_snapshot_shape() {
        let mut store = MappingStore::new();
        store.insert(Table::AttrKey, &Bucket::Custom("ip".into()), "10.0.0.1", "22.1.3.9".into());
        let snap = store.snapshot();
        assert_eq!(snap["attr_key"]["ip"]["10.0.0.1"], "22.1.3.9");
    }
}
