//! SI unit helpers.
//!
//! Every electrical quantity in Ferrite is an `f64` in base SI units
//! (seconds, farads, ohms, meters). These helpers convert to and from the
//! placement grid and format values for reports.

use crate::geom::Dbu;

/// One femtofarad in farads.
pub const FEMTO: f64 = 1e-15;
/// One picosecond in seconds, or one picofarad in farads.
pub const PICO: f64 = 1e-12;
/// One nanosecond in seconds.
pub const NANO: f64 = 1e-9;
/// One micron in meters.
pub const MICRON: f64 = 1e-6;

/// Converts database units to meters.
pub fn dbu_to_meters(dist: Dbu, dbu_per_micron: i64) -> f64 {
    dist as f64 / dbu_per_micron as f64 * MICRON
}

/// Converts meters to database units, rounding to the nearest unit.
///
/// The caller is responsible for rejecting negative distances.
pub fn meters_to_dbu(dist: f64, dbu_per_micron: i64) -> Dbu {
    (dist / MICRON * dbu_per_micron as f64).round() as Dbu
}

/// Formats a capacitance in femtofarads, e.g. `5.000fF`.
pub fn format_cap(farads: f64) -> String {
    format!("{:.3}fF", farads / FEMTO)
}

/// Formats a time in picoseconds, e.g. `42.100ps`.
pub fn format_time(seconds: f64) -> String {
    format!("{:.3}ps", seconds / PICO)
}

/// Formats a distance in microns, e.g. `120.500um`.
pub fn format_distance(meters: f64) -> String {
    format!("{:.3}um", meters / MICRON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dbu_conversions() {
        assert_eq!(meters_to_dbu(1.5 * MICRON, 1000), 1500);
        assert!((dbu_to_meters(2000, 1000) - 2.0 * MICRON).abs() < 1e-18);
    }

    #[test]
    fn formatting() {
        assert_eq!(format_cap(5.0 * FEMTO), "5.000fF");
        assert_eq!(format_time(42.1 * PICO), "42.100ps");
        assert_eq!(format_distance(120.5 * MICRON), "120.500um");
    }
}
