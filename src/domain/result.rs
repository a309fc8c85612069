//! Result type alias for the anonymizer
//!
//! This module provides a convenient Result type alias that uses AnonError
//! as the error type.

use super::errors::AnonError;

/// Result type alias for anonymizer operations
///
/// # Examples
///
/// ```
/// use pbs_anonymize::domain::result::Result;
/// use pbs_anonymize::domain::errors::AnonError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(AnonError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, AnonError>;
