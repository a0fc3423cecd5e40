//! Unit-aware parsing of text quantities.
//!
//! Schematics and project files carry sizes and operating points as text
//! (`1/2"`, `20mm`, `180 lpm`, `2600 psi`). [`parse_quantity`] turns such text
//! into the canonical SI value for its quantity family.

use std::fmt;

use hf_core::units::constants::{M_PER_INCH, M3PS_PER_GPM, M3PS_PER_LPM, PA_PER_BAR, PA_PER_PSI};
use thiserror::Error;

/// Dimension/quantity family for a text value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// Line or port inner diameter (canonical: m)
    Diameter,
    /// Volumetric flow (canonical: m³/s)
    FlowRate,
    /// Pressure (canonical: Pa)
    Pressure,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diameter => write!(f, "Diameter"),
            Self::FlowRate => write!(f, "Flow Rate"),
            Self::Pressure => write!(f, "Pressure"),
        }
    }
}

/// Error in unit parsing or conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    /// Input text did not parse to a number + optional unit
    #[error("Parse error: {0}")]
    Parse(String),
    /// Unit not recognized for this quantity
    #[error("Unknown unit '{unit}' for {quantity}")]
    UnknownUnit { unit: String, quantity: Quantity },
    /// A bare number where a unit is required
    #[error("Missing unit in '{input}' for {quantity}")]
    MissingUnit { input: String, quantity: Quantity },
    /// Value out of physical range
    #[error("Value {value} out of range: {reason}")]
    OutOfRange { value: f64, reason: &'static str },
}

/// Parse a quantity value from text, returning canonical SI.
///
/// - Diameter: `1/2"`, `0.5"`, `0.5in`, `20mm`, `2cm`, `0.02m`, `DN25`
/// - Flow rate: `180 lpm`, `180 l/min`, `47 gpm`, `0.003 m3/s`
/// - Pressure: `180 bar`, `2600 psi`, `1.2 MPa`, `101325 Pa`
///
/// Diameters must be strictly positive; flows and pressures non-negative.
pub fn parse_quantity(raw_text: &str, quantity: Quantity) -> Result<f64, UnitError> {
    let trimmed = raw_text.trim();
    if trimmed.is_empty() {
        return Err(UnitError::Parse("empty input".to_string()));
    }

    match quantity {
        Quantity::Diameter => parse_diameter(trimmed),
        Quantity::FlowRate => parse_flow_rate(trimmed),
        Quantity::Pressure => parse_pressure(trimmed),
    }
}

/// Parse a line/port size, return metres.
fn parse_diameter(input: &str) -> Result<f64, UnitError> {
    let upper = input.to_ascii_uppercase();

    let meters = if let Some(rest) = upper.strip_prefix("DN") {
        let (value, unit) = split_value_and_unit(rest)?;
        if !unit.is_empty() {
            return Err(UnitError::UnknownUnit {
                unit,
                quantity: Quantity::Diameter,
            });
        }
        value / 1000.0
    } else if let Some(rest) = upper.strip_suffix('"') {
        parse_inches(rest.trim())? * M_PER_INCH
    } else if upper.contains('/') {
        // Fractional sizes without a unit mark are inches by convention
        let rest = upper
            .trim_end_matches("INCHES")
            .trim_end_matches("INCH")
            .trim_end_matches("IN");
        parse_inches(rest.trim())? * M_PER_INCH
    } else {
        let (value, unit) = split_value_and_unit(input)?;
        match unit.to_lowercase().as_str() {
            "mm" => value / 1000.0,
            "cm" => value / 100.0,
            "m" => value,
            "in" | "inch" | "inches" => value * M_PER_INCH,
            "" => {
                return Err(UnitError::MissingUnit {
                    input: input.to_string(),
                    quantity: Quantity::Diameter,
                });
            }
            _ => {
                return Err(UnitError::UnknownUnit {
                    unit,
                    quantity: Quantity::Diameter,
                });
            }
        }
    };

    if !(meters.is_finite() && meters > 0.0) {
        return Err(UnitError::OutOfRange {
            value: meters,
            reason: "diameter must be > 0",
        });
    }
    Ok(meters)
}

/// `1/2`, `1-1/4`, `1 1/4` or a plain decimal, in inches.
fn parse_inches(text: &str) -> Result<f64, UnitError> {
    let bad = || UnitError::Parse(format!("Could not parse inch size from '{text}'"));

    let Some((whole_and_num, den)) = text.split_once('/') else {
        return text.parse::<f64>().map_err(|_| bad());
    };

    let (whole, num) = match whole_and_num.rsplit_once(['-', ' ']) {
        Some((w, n)) => (w.trim().parse::<f64>().map_err(|_| bad())?, n),
        None => (0.0, whole_and_num),
    };
    let num: f64 = num.trim().parse().map_err(|_| bad())?;
    let den: f64 = den.trim().parse().map_err(|_| bad())?;
    if den == 0.0 {
        return Err(bad());
    }
    Ok(whole + num / den)
}

/// Parse a volumetric flow, return m³/s.
fn parse_flow_rate(input: &str) -> Result<f64, UnitError> {
    let (value, unit) = split_value_and_unit(input)?;

    let m3ps = match unit.to_lowercase().replace(' ', "").as_str() {
        "lpm" | "l/min" => value * M3PS_PER_LPM,
        "gpm" => value * M3PS_PER_GPM,
        "m3/s" | "m³/s" => value,
        "" => {
            return Err(UnitError::MissingUnit {
                input: input.to_string(),
                quantity: Quantity::FlowRate,
            });
        }
        _ => {
            return Err(UnitError::UnknownUnit {
                unit,
                quantity: Quantity::FlowRate,
            });
        }
    };

    if m3ps < 0.0 {
        return Err(UnitError::OutOfRange {
            value: m3ps,
            reason: "flow rate must be >= 0",
        });
    }
    Ok(m3ps)
}

/// Parse a pressure, return Pa.
fn parse_pressure(input: &str) -> Result<f64, UnitError> {
    let (value, unit) = split_value_and_unit(input)?;

    let pa = match unit.to_lowercase().as_str() {
        "bar" => value * PA_PER_BAR,
        "psi" => value * PA_PER_PSI,
        "mpa" => value * 1e6,
        "kpa" => value * 1e3,
        "pa" => value,
        "" => {
            return Err(UnitError::MissingUnit {
                input: input.to_string(),
                quantity: Quantity::Pressure,
            });
        }
        _ => {
            return Err(UnitError::UnknownUnit {
                unit,
                quantity: Quantity::Pressure,
            });
        }
    };

    if pa < 0.0 {
        return Err(UnitError::OutOfRange {
            value: pa,
            reason: "pressure must be >= 0",
        });
    }
    Ok(pa)
}

/// Split leading number from trailing unit text.
fn split_value_and_unit(input: &str) -> Result<(f64, String), UnitError> {
    let trimmed = input.trim();

    // Exponent letters only count when followed by a digit or sign
    let bytes = trimmed.as_bytes();
    let split_idx = trimmed
        .char_indices()
        .find(|&(i, c)| {
            let numeric = c.is_ascii_digit() || c == '.' || c == '-' || c == '+';
            let exponent = (c == 'e' || c == 'E')
                && i > 0
                && bytes
                    .get(i + 1)
                    .is_some_and(|b| b.is_ascii_digit() || *b == b'-' || *b == b'+');
            !(numeric || exponent)
        })
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());

    let (num_part, unit_part) = trimmed.split_at(split_idx);
    let value: f64 = num_part.trim().parse().map_err(|_| {
        UnitError::Parse(format!("Could not parse numeric value from '{input}'"))
    })?;

    Ok((value, unit_part.trim().to_string()))
}
