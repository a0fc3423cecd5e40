//! Common utilities for element calculations.

use hf_core::numeric::ensure_finite;

use crate::error::{ComponentError, ComponentResult};

/// Ensure a value is finite, returning ComponentError if not.
pub fn check_finite(value: f64, what: &'static str) -> ComponentResult<f64> {
    ensure_finite(value, what).map_err(|_| ComponentError::NonPhysical { what })
}

/// Ensure a value is finite and not negative.
pub fn check_non_negative(value: f64, what: &'static str) -> ComponentResult<f64> {
    let value = check_finite(value, what)?;
    if value < 0.0 {
        return Err(ComponentError::NonPhysical { what });
    }
    Ok(value)
}
