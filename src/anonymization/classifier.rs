//! Attribute-name classification
//!
//! PBS spells the same identity many ways (`euser`, `User_List`,
//! `Mail_Users`, `requestor`, ...). Folding those spellings onto one
//! [`Bucket`] lets every synonym share a single pseudonym table, so `jdoe`
//! becomes the same string whether it was found under `euser` in an
//! accounting record or under `User_List` in a `qstat -f` dump.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical semantic category used to key pseudonym tables
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    User,
    Group,
    Host,
    JobName,
    AccountName,
    /// Any other attribute or resource; the raw name is the bucket
    Custom(String),
}

impl Bucket {
    /// Bucket for `project` values (FGC `p:` entries, the `project` attribute)
    pub fn project() -> Self {
        Self::Custom("project".to_string())
    }

    /// Stable label used in dumps and logs
    pub fn label(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Host => "host",
            Self::JobName => "jobname",
            Self::AccountName => "account",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a raw attribute or resource name onto its bucket
///
/// Rules are checked in order, case-insensitively: `user` substring or
/// exactly `requestor`, then `group`, then `host` substrings, then the
/// exact names `Name`/`Jobname` and `account`. Anything else is its own
/// bucket.
pub fn classify(name: &str) -> Bucket {
    let lower = name.to_ascii_lowercase();
    if lower.contains("user") || lower == "requestor" {
        Bucket::User
    } else if lower.contains("group") {
        Bucket::Group
    } else if lower.contains("host") {
        Bucket::Host
    } else if lower == "name" || lower == "jobname" {
        Bucket::JobName
    } else if lower == "account" {
        Bucket::AccountName
    } else {
        Bucket::Custom(name.to_string())
    }
}
