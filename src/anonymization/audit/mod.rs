//! Audit logging module
//!
//! Records which files were rewritten, with content digests instead of
//! content.

pub mod logger;

pub use logger::{content_digest, AuditLogger};
