//! Logging
//!
//! Structured logging through `tracing`: a console layer always, and an
//! optional rotating JSON file layer. Log events carry counts, paths,
//! tables and buckets; original identifiers are never logged at info level
//! or above.
//!
//! # Example
//!
//! ```no_run
//! use pbs_anonymize::logging::init_logging;
//! use pbs_anonymize::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(files = 3, "Anonymization started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a file rewrite
///
/// # Example
///
/// ```no_run
/// use pbs_anonymize::log_rewrite_start;
/// use std::path::Path;
///
/// log_rewrite_start!(Path::new("/var/spool/pbs/server_priv/accounting/20240101").display(), "accounting");
/// ```
#[macro_export]
macro_rules! log_rewrite_start {
    ($path:expr, $format:expr) => {
        tracing::info!(
            path = %$path,
            format = %$format,
            "Rewriting file"
        );
    };
}

/// Log the completion of a file rewrite
///
/// # Example
///
/// ```no_run
/// use pbs_anonymize::log_rewrite_complete;
/// use pbs_anonymize::anonymization::RewriteStats;
///
/// let stats = RewriteStats::default();
/// log_rewrite_complete!("out.anon", stats);
/// ```
#[macro_export]
macro_rules! log_rewrite_complete {
    ($output:expr, $stats:expr) => {
        tracing::info!(
            output = %$output,
            lines_read = $stats.lines_read,
            lines_written = $stats.lines_written,
            lines_dropped = $stats.lines_dropped,
            bad_records = $stats.bad_records,
            "File rewritten"
        );
    };
}

/// Log a record skipped as malformed
///
/// Only the position is logged, never the record content.
///
/// # Example
///
/// ```no_run
/// use pbs_anonymize::log_bad_record;
///
/// log_bad_record!("accounting", 42);
/// ```
#[macro_export]
macro_rules! log_bad_record {
    ($format:expr, $line:expr) => {
        tracing::warn!(
            format = $format,
            line = $line,
            "Malformed record skipped"
        );
    };
}

/// Log an error with context
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
