//! Glucose unit conversion.
//!
//! mg/dL is canonical; mmol/L is the alternate display unit.

use crate::GlucoseUnits;

/// mg/dL × EXCHANGE_RATE = mmol/L
pub const EXCHANGE_RATE: f64 = 0.0555;

/// Convert a value entered in `unit` to canonical mg/dL, rounded to the
/// nearest integer (half away from zero).
pub fn to_canonical(value: f64, unit: GlucoseUnits) -> f64 {
    match unit {
        GlucoseUnits::MgDl => value.round(),
        GlucoseUnits::MmolL => (value / EXCHANGE_RATE).round(),
    }
}

/// Convert a canonical mg/dL value for display in `unit`.
///
/// mmol/L values are rounded to one decimal; mg/dL to an integer.
pub fn to_display(mgdl: f64, unit: GlucoseUnits) -> f64 {
    match unit {
        GlucoseUnits::MgDl => mgdl.round(),
        GlucoseUnits::MmolL => (mgdl * EXCHANGE_RATE * 10.0).round() / 10.0,
    }
}
