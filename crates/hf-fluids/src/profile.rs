//! Constant-property fluid profiles and pipe kinematics.

use std::f64::consts::PI;

use hf_core::units::{Area, Density, DynVisc, Length, Velocity, VolumeRate, kg_m3, m2, mps, pa_s};
use serde::{Deserialize, Serialize};

use crate::error::{FluidError, FluidResult};

/// Fluid with density and viscosity fixed over the operating range.
///
/// Hydraulic oils are treated as incompressible at a reference temperature,
/// so one profile serves every calculation in an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluidProfile {
    pub name: String,
    /// kg/m³
    pub density: f64,
    /// Pa·s
    pub viscosity: f64,
}

impl FluidProfile {
    /// Validated constructor.
    pub fn new(name: impl Into<String>, density: f64, viscosity: f64) -> FluidResult<Self> {
        hf_core::ensure_positive(density, "fluid density")?;
        hf_core::ensure_positive(viscosity, "fluid viscosity")?;
        Ok(Self {
            name: name.into(),
            density,
            viscosity,
        })
    }

    /// ISO VG 46 mineral oil at 40 °C.
    pub fn iso_vg46() -> Self {
        Self {
            name: "ISO VG 46".to_string(),
            density: 870.0,
            viscosity: 0.046,
        }
    }

    pub fn rho(&self) -> Density {
        kg_m3(self.density)
    }

    pub fn mu(&self) -> DynVisc {
        pa_s(self.viscosity)
    }

    /// Reynolds number `ρ·v·D/μ`.
    pub fn reynolds(&self, v: Velocity, d: Length) -> f64 {
        self.density * v.value.abs() * d.value / self.viscosity
    }

    /// Dynamic pressure `ρ·v²/2` in Pa.
    pub fn dynamic_pressure(&self, v: Velocity) -> f64 {
        0.5 * self.density * v.value * v.value
    }
}

impl Default for FluidProfile {
    fn default() -> Self {
        Self::iso_vg46()
    }
}

/// Circular cross-section `π·D²/4`.
pub fn flow_area(d: Length) -> FluidResult<Area> {
    if !d.value.is_finite() || d.value <= 0.0 {
        return Err(FluidError::NonPhysical {
            what: "line diameter",
            value: d.value,
        });
    }
    Ok(m2(PI * d.value * d.value / 4.0))
}

/// Mean velocity `Q/A` through a circular line of diameter `d`.
pub fn velocity(q: VolumeRate, d: Length) -> FluidResult<Velocity> {
    let area = flow_area(d)?;
    Ok(mps(q.value / area.value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hf_core::units::{lpm, m};
    use hf_core::{Tolerances, nearly_equal};

    #[test]
    fn area_and_velocity() {
        let tol = Tolerances::default();
        let d = m(0.0127);
        let a = flow_area(d).unwrap();
        assert!(nearly_equal(a.value, PI * 0.0127 * 0.0127 / 4.0, tol));

        let v = velocity(lpm(60.0), d).unwrap();
        assert!(nearly_equal(v.value, 1e-3 / a.value, tol));
    }

    #[test]
    fn zero_diameter_rejected() {
        assert!(matches!(
            flow_area(m(0.0)),
            Err(FluidError::NonPhysical { .. })
        ));
    }

    #[test]
    fn reynolds_matches_definition() {
        let oil = FluidProfile::iso_vg46();
        let re = oil.reynolds(mps(2.0), m(0.02));
        assert!((re - 870.0 * 2.0 * 0.02 / 0.046).abs() < 1e-9);
        assert!((oil.dynamic_pressure(mps(2.0)) - 1740.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_profile_rejected() {
        assert!(FluidProfile::new("bad", 0.0, 0.04).is_err());
        assert!(FluidProfile::new("bad", 870.0, f64::NAN).is_err());
        assert!(FluidProfile::new("ok", 850.0, 0.03).is_ok());
    }
}
