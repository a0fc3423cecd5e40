//! Fluid property errors.

use hf_core::HfError;
use thiserror::Error;

use crate::units::UnitError;

/// Result type for fluid operations.
pub type FluidResult<T> = Result<T, FluidError>;

/// Errors that can occur during fluid property calculations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// Non-physical values (zero diameter, negative density, ...).
    #[error("Non-physical value for {what}: {value}")]
    NonPhysical { what: &'static str, value: f64 },

    /// Text quantity could not be parsed.
    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Core(#[from] HfError),
}
