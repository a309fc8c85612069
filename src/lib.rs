// pbs-anonymize - Pseudonymization for PBS workload manager data
// Copyright (c) 2025 pbs-anonymize Contributors
// Licensed under the MIT License

//! # pbs-anonymize
//!
//! Replaces user, group, host, job and site-specific resource names in PBS
//! data with consistent pseudonyms so logs and dumps can be shared for
//! debugging and analysis.
//!
//! ## Overview
//!
//! This library provides:
//! - **Specifications** of what to delete, what names to rename and what
//!   values to replace, given as strings, lists or tables
//! - **A session** ([`anonymization::Anonymizer`]) holding write-once
//!   pseudonym tables, so one name maps to one pseudonym across an export
//! - **Rewriters** for attribute records, accounting logs, fixed-width
//!   reports, `key=value` dumps, fairshare groups and `sched_config`
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`anonymization`] - Specifications, classification, pseudonym tables
//!   and the record rewriter
//! - [`formats`] - File-level rewriters
//! - [`domain`] - Records, errors and the result alias
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust
//! use pbs_anonymize::anonymization::{Anonymizer, Spec, SpecSet};
//!
//! let specs = SpecSet {
//!     attr_val: Spec::from_names(["euser"]),
//!     ..SpecSet::default()
//! };
//! let mut session = Anonymizer::with_seed(specs, 42);
//!
//! let log = "2024-01-01 00:00:00;E;123.host;euser=jdoe resources_used.walltime=00:01:00\n";
//! let out = session.rewrite_accounting(log);
//! assert!(!out.text.contains("jdoe"));
//! assert!(out.text.contains(";E;123.host;"));
//! assert!(out.text.contains("resources_used.walltime=00:01:00"));
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`domain::Result`]. A single bad line or
//! record is never an error: it is skipped or counted and the rewrite goes
//! on. Unusable specifications are logged and treated as empty.

pub mod anonymization;
pub mod cli;
pub mod config;
pub mod domain;
pub mod formats;
pub mod logging;
