//! Shared threshold validation helpers.
//!
//! Provides reusable range-checking functions for user-supplied alert limits.

use crate::error::CoreError;

/// Validate that `value` is finite and falls within `(0.0, max]`.
///
/// Returns a `CoreError::Validation` naming the field if out of range.
pub fn validate_positive_at_most(value: f64, max: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() || value <= 0.0 || value > max {
        return Err(CoreError::Validation(format!(
            "{name} must be greater than 0 and at most {max}, got {value}"
        )));
    }
    Ok(())
}
