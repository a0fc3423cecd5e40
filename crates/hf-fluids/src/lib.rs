//! hf-fluids: hydraulic fluid properties for hydraflow.
//!
//! Provides:
//! - Constant-property fluid profiles (density, dynamic viscosity)
//! - Reynolds number and flow regime classification
//! - A unit-aware parser for line sizes, flow rates and pressures
//!
//! # Example
//!
//! ```
//! use hf_core::units::{lpm, m};
//! use hf_fluids::{FlowRegime, FluidProfile, RegimeThresholds};
//!
//! let oil = FluidProfile::iso_vg46();
//! let d = m(0.0127);
//! let v = hf_fluids::velocity(lpm(180.0), d).unwrap();
//! let re = oil.reynolds(v, d);
//! assert_eq!(RegimeThresholds::default().classify(re), FlowRegime::Turbulent);
//! ```

pub mod error;
pub mod profile;
pub mod regime;
pub mod units;

pub use error::{FluidError, FluidResult};
pub use profile::{FluidProfile, flow_area, velocity};
pub use regime::{FlowRegime, RegimeThresholds};
pub use units::{Quantity, UnitError, parse_quantity};
