//! Pseudonymization engine for PBS data
//!
//! This module turns attribute snapshots, accounting logs, configuration
//! dumps and tabular reports into shareable data by replacing user, group,
//! host and other site-specific names with consistent pseudonyms.
//!
//! # Architecture
//!
//! The engine consists of:
//! - **Specifications**: caller-supplied string/list/table settings normalized
//!   into [`Spec`]s
//! - **Classification**: attribute names mapped to a [`Bucket`]
//! - **Mapping store**: write-once pseudonym tables, one per [`Table`] and bucket
//! - **Session**: the [`Anonymizer`] tying the above together for one export
//! - **Audit**: per-file entries with content digests instead of content
//!
//! # Usage
//!
//! ```rust
//! use pbs_anonymize::anonymization::{Anonymizer, Spec, SpecSet};
//! use pbs_anonymize::domain::Record;
//!
//! let specs = SpecSet {
//!     attr_val: Spec::from_names(["euser"]),
//!     ..SpecSet::default()
//! };
//! let mut anon = Anonymizer::with_seed(specs, 1);
//! let mut record = Record::from_pairs([("euser", "jdoe"), ("queue", "workq")]);
//! anon.rewrite_record(&mut record);
//! assert_ne!(record.get("euser"), Some("jdoe"));
//! assert_eq!(record.get("queue"), Some("workq"));
//! ```

pub mod audit;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod pseudonym;
pub mod record;
pub mod report;
pub mod spec;
pub mod store;

// Re-export main types
pub use classifier::{classify, Bucket};
pub use config::AnonymizationConfig;
pub use engine::{Anonymizer, SpecSet, DEFAULT_PROJECT};
pub use report::{FileReport, RewriteStats, RunReport};
pub use spec::{normalize, RawSpec, Spec};
pub use store::{MappingStore, Table};
