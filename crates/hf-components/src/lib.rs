//! hf-components: loss-element library for hydraulic circuits.
//!
//! Provides:
//! - A configurable K-factor table (per component type, valve sub-type, fitting)
//! - Flow elements: K-factor losses through components and bare line segments
//! - Computation warnings attached to results that fell back to defaults
//!
//! All elements implement the `FlowElement` trait and are deterministic
//! functions of fluid, geometry and flow rate.
//!
//! # Example
//!
//! ```
//! use hf_components::{FlowElement, KLoss};
//! use hf_core::units::{lpm, m};
//! use hf_fluids::{FluidProfile, RegimeThresholds};
//!
//! let valve = KLoss::new("V12", 3.0, m(0.0127));
//! let state = valve
//!     .evaluate(&FluidProfile::iso_vg46(), &RegimeThresholds::default(), lpm(180.0))
//!     .unwrap();
//! assert!(state.pressure_drop_pa > 0.0);
//! ```

pub mod common;
pub mod element;
pub mod error;
pub mod kfactor;
pub mod warning;

// Re-exports
pub use element::{ElementState, FlowElement, KLoss, LineSegment};
pub use error::{ComponentError, ComponentResult};
pub use kfactor::{FITTING_KEY, KFactorTable, KLookup, KSource, VALVE_TYPE_KEY};
pub use warning::ComputationWarning;
