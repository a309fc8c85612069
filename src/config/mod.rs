//! Configuration management
//!
//! TOML configuration with `${VAR}` substitution, `PBS_ANON_*` environment
//! overrides and validation on load.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pbs_anonymize::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("pbs-anonymize.toml")?;
//! let session = config.anonymization.build_session();
//! println!("{} pseudonyms preloaded", session.store().len());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level
//! - [`AnonymizationConfig`](crate::anonymization::AnonymizationConfig) -
//!   the six key/value specifications, output naming, seed, mapping dump
//!   and audit log
//! - [`LoggingConfig`] - optional rotating JSON log file
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [anonymization]
//! attr_delete = ["Account_Name", "Variable_List"]
//! attr_val = ["euser", "egroup", "Job_Owner", "exec_host"]
//! resc_key = { foo_license = "lic" }
//! output_suffix = ".anon"
//! mapping_dump = "${HOME}/pbs-anon-map.json"
//!
//! [anonymization.audit]
//! enabled = true
//! log_path = "./audit/anonymize.log"
//!
//! [logging]
//! local_enabled = false
//! ```
//!
//! # Environment Variables
//!
//! `PBS_ANON_ATTR_DELETE`, `PBS_ANON_ATTR_VAL` and the other spec variables
//! take comma-separated names. `PBS_ANON_LOG_LEVEL`, `PBS_ANON_SEED`,
//! `PBS_ANON_OUTPUT_SUFFIX`, `PBS_ANON_INPLACE`, `PBS_ANON_MAPPING_DUMP`,
//! `PBS_ANON_AUDIT_*` and `PBS_ANON_LOGGING_*` override the matching
//! settings.

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, load_config_or_default, parse_config};
pub use schema::{AnonymizeConfig, ApplicationConfig, LoggingConfig};
