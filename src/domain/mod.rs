//! Domain models and types.
//!
//! The domain layer provides:
//! - **Records** ([`Record`]): ordered attribute snapshots of PBS entities
//! - **Error types** ([`AnonError`], [`SpecError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, AnonError>`]:
//!
//! ```rust
//! use pbs_anonymize::domain::{AnonError, Result};
//!
//! fn example() -> Result<()> {
//!     Err(AnonError::Validation("empty output suffix".to_string()))
//! }
//! ```

pub mod errors;
pub mod record;
pub mod result;

pub use errors::{AnonError, SpecError};
pub use record::Record;
pub use result::Result;
