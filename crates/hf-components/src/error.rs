//! Error types for element evaluation.

use hf_core::error::HfError;
use hf_fluids::FluidError;
use thiserror::Error;

/// Errors that can occur during element evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Fluid model error: {0}")]
    Fluid(#[from] FluidError),
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl From<ComponentError> for HfError {
    fn from(e: ComponentError) -> Self {
        match e {
            ComponentError::NonPhysical { what } => HfError::InvalidArg { what },
            ComponentError::Fluid(_) => HfError::InvalidArg {
                what: "fluid model error",
            },
        }
    }
}
