//! Flow elements: components and line segments evaluated at a flow rate.

use hf_core::units::{Length, VolumeRate};
use hf_fluids::{FlowRegime, FluidProfile, RegimeThresholds, flow_area, velocity};
use serde::{Deserialize, Serialize};

use crate::common::{check_finite, check_non_negative};
use crate::error::ComponentResult;

/// Hydraulic state of one element at an operating point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementState {
    pub diameter_m: f64,
    pub area_m2: f64,
    pub velocity_mps: f64,
    pub reynolds: f64,
    pub regime: FlowRegime,
    pub pressure_drop_pa: f64,
}

/// Trait for elements that fluid passes through in series.
///
/// Elements are deterministic functions of fluid, geometry and flow rate,
/// suitable for parallel evaluation.
pub trait FlowElement: Send + Sync {
    /// Element name for debugging and identification.
    fn name(&self) -> &str;

    /// Hydraulic diameter.
    fn diameter(&self) -> Length;

    /// Resistance coefficient applied to the dynamic pressure.
    fn k_factor(&self) -> f64;

    /// Evaluate velocity, Reynolds number, regime and pressure drop at `q`.
    ///
    /// `ΔP = K·ρ·v²/2` with `v = Q/A` and `A = π·D²/4`.
    fn evaluate(
        &self,
        fluid: &FluidProfile,
        regimes: &RegimeThresholds,
        q: VolumeRate,
    ) -> ComponentResult<ElementState> {
        let d = self.diameter();
        let k = check_non_negative(self.k_factor(), "K-factor")?;
        let area = flow_area(d)?;
        let v = velocity(q, d)?;

        let reynolds = check_finite(fluid.reynolds(v, d), "Reynolds number")?;
        let pressure_drop_pa = check_finite(k * fluid.dynamic_pressure(v), "pressure drop")?;

        Ok(ElementState {
            diameter_m: d.value,
            area_m2: area.value,
            velocity_mps: v.value,
            reynolds,
            regime: regimes.classify(reynolds),
            pressure_drop_pa,
        })
    }
}

/// A component modelled as a K-factor loss.
#[derive(Debug, Clone)]
pub struct KLoss {
    name: String,
    /// Resistance coefficient (dimensionless)
    pub k: f64,
    /// Inner diameter of the connecting port/line
    pub diameter: Length,
}

impl KLoss {
    pub fn new(name: impl Into<String>, k: f64, diameter: Length) -> Self {
        Self {
            name: name.into(),
            k,
            diameter,
        }
    }
}

impl FlowElement for KLoss {
    fn name(&self) -> &str {
        &self.name
    }

    fn diameter(&self) -> Length {
        self.diameter
    }

    fn k_factor(&self) -> f64 {
        self.k
    }
}

/// A bare line: carries velocity and regime, no lumped loss.
#[derive(Debug, Clone)]
pub struct LineSegment {
    name: String,
    pub diameter: Length,
}

impl LineSegment {
    pub fn new(name: impl Into<String>, diameter: Length) -> Self {
        Self {
            name: name.into(),
            diameter,
        }
    }
}

impl FlowElement for LineSegment {
    fn name(&self) -> &str {
        &self.name
    }

    fn diameter(&self) -> Length {
        self.diameter
    }

    fn k_factor(&self) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComponentError;
    use hf_core::units::{lpm, m};
    use hf_core::{Tolerances, nearly_equal};
    use std::f64::consts::PI;

    #[test]
    fn k_loss_matches_formula() {
        let fluid = FluidProfile::iso_vg46();
        let valve = KLoss::new("V12", 3.0, m(0.0127));
        let s = valve
            .evaluate(&fluid, &RegimeThresholds::default(), lpm(180.0))
            .unwrap();

        let area = PI * 0.0127_f64.powi(2) / 4.0;
        let v = 0.003 / area;
        let tol = Tolerances::default();
        assert!(nearly_equal(s.velocity_mps, v, tol));
        assert!(nearly_equal(s.pressure_drop_pa, 3.0 * 870.0 * v * v / 2.0, tol));
        assert!(nearly_equal(s.reynolds, 870.0 * v * 0.0127 / 0.046, tol));
        assert_eq!(s.regime, FlowRegime::Turbulent);
    }

    #[test]
    fn line_segment_has_no_drop() {
        let line = LineSegment::new("P1->V12", m(0.02));
        let s = line
            .evaluate(
                &FluidProfile::iso_vg46(),
                &RegimeThresholds::default(),
                lpm(10.0),
            )
            .unwrap();
        assert_eq!(s.pressure_drop_pa, 0.0);
        assert!(s.velocity_mps > 0.0);
        assert_eq!(s.regime, FlowRegime::Laminar);
    }

    #[test]
    fn invalid_geometry_is_error() {
        let bad = KLoss::new("X", 1.0, m(0.0));
        let err = bad
            .evaluate(
                &FluidProfile::iso_vg46(),
                &RegimeThresholds::default(),
                lpm(10.0),
            )
            .unwrap_err();
        assert!(matches!(err, ComponentError::Fluid(_)));

        let neg = KLoss::new("Y", -1.0, m(0.01));
        assert!(
            neg.evaluate(
                &FluidProfile::iso_vg46(),
                &RegimeThresholds::default(),
                lpm(10.0)
            )
            .is_err()
        );
    }
}
