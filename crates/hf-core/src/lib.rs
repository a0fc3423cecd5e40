//! hf-core: stable foundation for hydraflow.
//!
//! Contains:
//! - units (uom SI types + hydraulic constructors: LPM, bar, inch)
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact arena indices for schematic graphs)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{HfError, HfResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
