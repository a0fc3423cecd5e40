// hf-core/src/units.rs

use uom::si::f64::{
    Area as UomArea, DynamicViscosity as UomDynamicViscosity, Length as UomLength,
    MassDensity as UomMassDensity, Pressure as UomPressure, Ratio as UomRatio,
    Velocity as UomVelocity, VolumeRate as UomVolumeRate,
};

// Public canonical unit types (SI, f64)
pub type Area = UomArea;
pub type DynVisc = UomDynamicViscosity;
pub type Length = UomLength;
pub type Density = UomMassDensity;
pub type Pressure = UomPressure;
pub type Ratio = UomRatio;
pub type Velocity = UomVelocity;
pub type VolumeRate = UomVolumeRate;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn bar(v: f64) -> Pressure {
    pa(v * constants::PA_PER_BAR)
}

#[inline]
pub fn m3ps(v: f64) -> VolumeRate {
    use uom::si::volume_rate::cubic_meter_per_second;
    VolumeRate::new::<cubic_meter_per_second>(v)
}

/// Liters per minute, the flow unit hydraulic callers use.
#[inline]
pub fn lpm(v: f64) -> VolumeRate {
    m3ps(v * constants::M3PS_PER_LPM)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn mm(v: f64) -> Length {
    m(v / 1000.0)
}

#[inline]
pub fn inch(v: f64) -> Length {
    m(v * constants::M_PER_INCH)
}

#[inline]
pub fn m2(v: f64) -> Area {
    use uom::si::area::square_meter;
    Area::new::<square_meter>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn kg_m3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

#[inline]
pub fn pa_s(v: f64) -> DynVisc {
    use uom::si::dynamic_viscosity::pascal_second;
    DynVisc::new::<pascal_second>(v)
}

#[inline]
pub fn unitless(v: f64) -> Ratio {
    use uom::si::ratio::ratio;
    Ratio::new::<ratio>(v)
}

/// Pressure in bar.
#[inline]
pub fn to_bar(p: Pressure) -> f64 {
    p.value / constants::PA_PER_BAR
}

/// Pressure in psi.
#[inline]
pub fn to_psi(p: Pressure) -> f64 {
    p.value / constants::PA_PER_PSI
}

/// Flow rate in liters per minute.
#[inline]
pub fn to_lpm(q: VolumeRate) -> f64 {
    q.value / constants::M3PS_PER_LPM
}

pub mod constants {
    pub const PA_PER_BAR: f64 = 1e5;
    pub const PA_PER_PSI: f64 = 6_894.76;
    pub const M3PS_PER_LPM: f64 = 1.0 / 60_000.0;
    pub const M_PER_INCH: f64 = 0.0254;
    pub const M3PS_PER_GPM: f64 = 6.309_02e-5;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{Tolerances, nearly_equal};

    #[test]
    fn constructors_smoke() {
        let _p = pa(101_325.0);
        let _q = lpm(180.0);
        let _l = inch(0.5);
        let _a = m2(1e-4);
        let _v = mps(4.0);
        let _rho = kg_m3(870.0);
        let _mu = pa_s(0.046);
        let _r = unitless(0.5);
    }

    #[test]
    fn hydraulic_conversions() {
        let tol = Tolerances::default();
        assert!(nearly_equal(lpm(60.0).value, 1e-3, tol));
        assert!(nearly_equal(to_lpm(lpm(180.0)), 180.0, tol));
        assert!(nearly_equal(bar(2.0).value, 200_000.0, tol));
        assert!(nearly_equal(to_bar(pa(150_000.0)), 1.5, tol));
        assert!(nearly_equal(inch(0.5).value, 0.0127, tol));
        assert!(nearly_equal(mm(25.0).value, 0.025, tol));
        assert!(nearly_equal(to_psi(pa(6_894.76)), 1.0, tol));
    }
}
