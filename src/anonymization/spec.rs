//! Key/value specification normalization
//!
//! Callers say which attributes and resources to touch as a comma string
//! (`"euser,egroup"`), a list (`["euser", "egroup"]`) or a table. The table
//! form can also carry explicit pseudonyms:
//!
//! ```toml
//! attr_key = { Account_Name = "acct" }       # rename this attribute
//! attr_val = { euser = { jdoe = "alice" } }  # pre-seeded value pseudonyms
//! ```
//!
//! Everything is resolved once into a [`Spec`]; nothing downstream looks
//! at the raw shape again.

use crate::domain::SpecError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A specification exactly as the caller supplied it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSpec {
    Text(String),
    List(Vec<String>),
    Map(BTreeMap<String, RawEntry>),
    /// Anything else; normalizing it fails with [`SpecError::InvalidSpecKind`]
    Other(toml::Value),
}

/// The value side of a table-form specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawEntry {
    Nothing,
    Alias(String),
    Seeds(BTreeMap<String, String>),
    Other(toml::Value),
}

/// One normalized specification entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpecEntry {
    /// Explicit pseudonym for the name itself (key specs)
    pub alias: Option<String>,
    /// Explicit `original -> pseudonym` pairs for values (value specs)
    pub seeds: BTreeMap<String, String>,
}

/// Canonical specification: raw attribute or resource name to entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Spec {
    entries: BTreeMap<String, SpecEntry>,
}

impl Spec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spec naming the given attributes with no explicit pseudonyms
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut spec = Self::new();
        for name in names {
            spec.add_name(name.as_ref());
        }
        spec
    }

    /// Normalize `raw`, logging and degrading to an empty spec on failure
    ///
    /// `label` names the configuration input (`attr_val`, ...) in the log.
    pub fn from_raw(label: &str, raw: Option<&RawSpec>) -> Self {
        match normalize(raw) {
            Ok(spec) => spec,
            Err(e) => {
                tracing::error!(spec = label, error = %e, "Ignoring unusable specification");
                Self::new()
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &SpecEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, name: &str) -> Option<&SpecEntry> {
        self.entries.get(name)
    }

    fn add_name(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.entries.entry(name.to_string()).or_default();
        }
    }
}

/// Resolve a raw specification into its canonical form
///
/// - `None` gives an empty spec
/// - a string is split on commas
/// - a list contributes one entry per element
/// - a table is taken as-is, string values becoming aliases and nested
///   tables becoming seed maps
pub fn normalize(raw: Option<&RawSpec>) -> Result<Spec, SpecError> {
    let Some(raw) = raw else {
        return Ok(Spec::new());
    };

    let mut spec = Spec::new();
    match raw {
        RawSpec::Text(text) => {
            for name in text.split(',') {
                spec.add_name(name);
            }
        }
        RawSpec::List(items) => {
            for name in items {
                spec.add_name(name);
            }
        }
        RawSpec::Map(map) => {
            for (name, entry) in map {
                let normalized = match entry {
                    RawEntry::Alias(alias) if !alias.is_empty() => SpecEntry {
                        alias: Some(alias.clone()),
                        seeds: BTreeMap::new(),
                    },
                    RawEntry::Seeds(seeds) => SpecEntry {
                        alias: None,
                        seeds: seeds.clone(),
                    },
                    _ => SpecEntry::default(),
                };
                spec.entries.insert(name.clone(), normalized);
            }
        }
        RawSpec::Other(value) => {
            return Err(SpecError::InvalidSpecKind(value.type_str().to_string()));
        }
    }
    Ok(spec)
}
