//! Runtime analysis settings and operating points.

use hf_components::KFactorTable;
use hf_core::units::{Pressure, VolumeRate, bar, lpm, to_bar, to_lpm};
use hf_fluids::{FluidProfile, RegimeThresholds};
use hf_graph::TraceOptions;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

/// Restriction thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// m/s
    pub max_velocity_mps: f64,
    /// Share of the total drop one component may take (0..1).
    pub max_drop_fraction: f64,
    /// A measure beyond `severe_multiplier × threshold` is HIGH on its own.
    pub severe_multiplier: f64,
    /// Measures within this fraction below a threshold are LOW near-misses.
    pub near_miss_band: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_velocity_mps: 5.0,
            max_drop_fraction: 0.20,
            severe_multiplier: 2.0,
            near_miss_band: 0.10,
        }
    }
}

/// Everything an analysis needs besides the graph and the operating point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub fluid: FluidProfile,
    pub k_factors: KFactorTable,
    /// Reynolds cutoffs; `turbulent` is also the TURBULENT_FLOW threshold.
    pub regimes: RegimeThresholds,
    pub thresholds: Thresholds,
    /// Used when neither the line nor the component gives a size.
    pub default_line_diameter_m: f64,
    pub max_depth: usize,
    pub traverse_undirected: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            fluid: FluidProfile::iso_vg46(),
            k_factors: KFactorTable::default(),
            regimes: RegimeThresholds::default(),
            thresholds: Thresholds::default(),
            default_line_diameter_m: 0.0127,
            max_depth: 20,
            traverse_undirected: false,
        }
    }
}

impl AnalysisSettings {
    /// Check every numeric value; the first offending field is reported.
    pub fn validate(&self) -> AnalysisResult<()> {
        positive(self.fluid.density, "fluid density")?;
        positive(self.fluid.viscosity, "fluid viscosity")?;
        positive(self.default_line_diameter_m, "default line diameter")?;
        positive(self.thresholds.max_velocity_mps, "max velocity")?;
        positive(self.thresholds.max_drop_fraction, "max drop fraction")?;
        positive(self.thresholds.severe_multiplier, "severe multiplier")?;
        positive(self.regimes.laminar, "laminar Reynolds cutoff")?;
        positive(self.regimes.turbulent, "turbulent Reynolds cutoff")?;

        if self.thresholds.severe_multiplier < 1.0 {
            return Err(AnalysisError::config(format!(
                "severe multiplier must be >= 1, got {}",
                self.thresholds.severe_multiplier
            )));
        }
        let band = self.thresholds.near_miss_band;
        if !(band.is_finite() && (0.0..1.0).contains(&band)) {
            return Err(AnalysisError::config(format!(
                "near-miss band must be in [0, 1), got {band}"
            )));
        }
        if self.regimes.laminar > self.regimes.turbulent {
            return Err(AnalysisError::config(format!(
                "laminar cutoff {} exceeds turbulent cutoff {}",
                self.regimes.laminar, self.regimes.turbulent
            )));
        }
        if self.max_depth == 0 {
            return Err(AnalysisError::config("max traversal depth must be >= 1"));
        }
        if !self.k_factors.is_valid() {
            return Err(AnalysisError::config(
                "K-factors must be finite and not negative",
            ));
        }
        Ok(())
    }

    pub fn trace_options(&self) -> TraceOptions {
        TraceOptions {
            max_depth: self.max_depth,
            include_undirected: self.traverse_undirected,
        }
    }
}

fn positive(value: f64, what: &str) -> AnalysisResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::config(format!(
            "{what} must be positive, got {value}"
        )))
    }
}

/// Flow rate and supply pressure a path is analysed at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingPoint {
    pub flow: VolumeRate,
    pub system_pressure: Pressure,
}

impl OperatingPoint {
    /// From caller units: flow in LPM, pressure in bar. Both must be positive.
    pub fn new(flow_lpm: f64, pressure_bar: f64) -> AnalysisResult<Self> {
        let flow = flow_from_lpm(flow_lpm)?;
        positive(pressure_bar, "system pressure")?;
        Ok(Self {
            flow,
            system_pressure: bar(pressure_bar),
        })
    }

    pub fn flow_lpm(&self) -> f64 {
        to_lpm(self.flow)
    }

    pub fn pressure_bar(&self) -> f64 {
        to_bar(self.system_pressure)
    }
}

/// Validate a caller flow rate in LPM.
pub fn flow_from_lpm(flow_lpm: f64) -> AnalysisResult<VolumeRate> {
    positive(flow_lpm, "flow rate")?;
    Ok(lpm(flow_lpm))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let s = AnalysisSettings::default();
        s.validate().unwrap();
        assert_eq!(s.trace_options(), TraceOptions::default());
        assert_eq!(s.default_line_diameter_m, 0.0127);
    }

    #[test]
    fn operating_point_rejects_non_positive() {
        assert!(matches!(
            OperatingPoint::new(0.0, 180.0),
            Err(AnalysisError::Configuration { .. })
        ));
        assert!(OperatingPoint::new(180.0, -1.0).is_err());
        assert!(OperatingPoint::new(f64::NAN, 180.0).is_err());

        let op = OperatingPoint::new(180.0, 180.0).unwrap();
        assert!((op.flow.value - 0.003).abs() < 1e-15);
        assert_eq!(op.system_pressure.value, 180e5);
        assert!((op.flow_lpm() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_settings_rejected() {
        let mut s = AnalysisSettings::default();
        s.regimes.laminar = 5000.0;
        assert!(s.validate().is_err());

        let mut s = AnalysisSettings::default();
        s.thresholds.max_drop_fraction = 0.0;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("max drop fraction"));

        let mut s = AnalysisSettings::default();
        s.max_depth = 0;
        assert!(s.validate().is_err());
    }
}
