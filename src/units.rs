//! Physical units used by real-valued parameters.
//!
//! Values are stored in internal units where `mm`, `ns`, `MeV`, `rad` and
//! `kelvin` are all 1. A unit symbol maps to a scale factor and to the
//! dimension label (e.g. `length`) that parameter models declare.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Result, VariantError};
use crate::registry::OtherHasher;

// ------------- Base and derived units -------------
pub const MILLIMETER: f64 = 1.0;
pub const CENTIMETER: f64 = 10.0 * MILLIMETER;
pub const METER: f64 = 1000.0 * MILLIMETER;
pub const KILOMETER: f64 = 1000.0 * METER;
pub const MICROMETER: f64 = 1.0e-3 * MILLIMETER;
pub const NANOMETER: f64 = 1.0e-6 * MILLIMETER;

pub const NANOSECOND: f64 = 1.0;
pub const SECOND: f64 = 1.0e9 * NANOSECOND;
pub const MILLISECOND: f64 = 1.0e-3 * SECOND;
pub const MICROSECOND: f64 = 1.0e-6 * SECOND;
pub const PICOSECOND: f64 = 1.0e-12 * SECOND;

pub const RADIAN: f64 = 1.0;
pub const DEGREE: f64 = std::f64::consts::PI / 180.0 * RADIAN;

pub const MEV: f64 = 1.0;
pub const EV: f64 = 1.0e-6 * MEV;
pub const KEV: f64 = 1.0e-3 * MEV;
pub const GEV: f64 = 1.0e3 * MEV;
pub const JOULE: f64 = EV / 1.602_176_634e-19;

pub const KILOGRAM: f64 = JOULE * SECOND * SECOND / (METER * METER);
pub const GRAM: f64 = 1.0e-3 * KILOGRAM;
pub const C_SQUARED: f64 = 299.792_458 * 299.792_458;

pub const PASCAL: f64 = JOULE / METER / (METER * METER);
pub const BAR: f64 = 1.0e5 * PASCAL;

pub const VOLT: f64 = 1.0e-6 * MEV;
pub const TESLA: f64 = VOLT * SECOND / (METER * METER);

pub const KELVIN: f64 = 1.0;

struct UnitEntry {
    dimension: &'static str,
    factor: f64,
}

lazy_static! {
    static ref UNITS: HashMap<&'static str, UnitEntry, OtherHasher> = {
        let table: &[(&'static str, &'static str, f64)] = &[
            ("angstrom", "length", 1.0e-7 * MILLIMETER),
            ("fm", "length", 1.0e-12 * MILLIMETER),
            ("fermi", "length", 1.0e-12 * MILLIMETER),
            ("nm", "length", NANOMETER),
            ("nanometer", "length", NANOMETER),
            ("um", "length", MICROMETER),
            ("micrometer", "length", MICROMETER),
            ("mm", "length", MILLIMETER),
            ("millimeter", "length", MILLIMETER),
            ("cm", "length", CENTIMETER),
            ("centimeter", "length", CENTIMETER),
            ("m", "length", METER),
            ("meter", "length", METER),
            ("km", "length", KILOMETER),
            ("kilometer", "length", KILOMETER),
            ("inch", "length", 2.54 * CENTIMETER),
            ("mm2", "surface", MILLIMETER * MILLIMETER),
            ("cm2", "surface", CENTIMETER * CENTIMETER),
            ("m2", "surface", METER * METER),
            ("km2", "surface", KILOMETER * KILOMETER),
            ("mm3", "volume", MILLIMETER * MILLIMETER * MILLIMETER),
            ("cm3", "volume", CENTIMETER * CENTIMETER * CENTIMETER),
            ("m3", "volume", METER * METER * METER),
            ("fs", "time", 1.0e-3 * PICOSECOND),
            ("ps", "time", PICOSECOND),
            ("ns", "time", NANOSECOND),
            ("us", "time", MICROSECOND),
            ("ms", "time", MILLISECOND),
            ("s", "time", SECOND),
            ("second", "time", SECOND),
            ("minute", "time", 60.0 * SECOND),
            ("h", "time", 3600.0 * SECOND),
            ("hour", "time", 3600.0 * SECOND),
            ("rad", "angle", RADIAN),
            ("radian", "angle", RADIAN),
            ("mrad", "angle", 1.0e-3 * RADIAN),
            ("deg", "angle", DEGREE),
            ("degree", "angle", DEGREE),
            ("eV", "energy", EV),
            ("keV", "energy", KEV),
            ("MeV", "energy", MEV),
            ("GeV", "energy", GEV),
            ("TeV", "energy", 1.0e6 * MEV),
            ("J", "energy", JOULE),
            ("joule", "energy", JOULE),
            ("eV/c2", "mass", EV / C_SQUARED),
            ("MeV/c2", "mass", MEV / C_SQUARED),
            ("GeV/c2", "mass", GEV / C_SQUARED),
            ("kg", "mass", KILOGRAM),
            ("g", "mass", GRAM),
            ("mg", "mass", 1.0e-3 * GRAM),
            ("t", "mass", 1000.0 * KILOGRAM),
            ("Pa", "pressure", PASCAL),
            ("mbar", "pressure", 1.0e-3 * BAR),
            ("bar", "pressure", BAR),
            ("atmosphere", "pressure", 101_325.0 * PASCAL),
            ("T", "magnetic_field", TESLA),
            ("tesla", "magnetic_field", TESLA),
            ("G", "magnetic_field", 1.0e-4 * TESLA),
            ("gauss", "magnetic_field", 1.0e-4 * TESLA),
            ("uV", "electric_tension", 1.0e-6 * VOLT),
            ("mV", "electric_tension", 1.0e-3 * VOLT),
            ("V", "electric_tension", VOLT),
            ("kV", "electric_tension", 1.0e3 * VOLT),
            ("kelvin", "temperature", KELVIN),
        ];
        let mut units = HashMap::default();
        for (symbol, dimension, factor) in table {
            units.insert(*symbol, UnitEntry { dimension, factor: *factor });
        }
        units
    };
    static ref VALUE_WITH_UNIT: Regex = Regex::new(
        r"^\s*([-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?)\s*([A-Za-z][A-Za-z0-9/]*)?\s*$"
    ).expect("unit literal pattern");
}

const DIMENSIONS: &[(&str, &str)] = &[
    ("length", "mm"),
    ("surface", "mm2"),
    ("volume", "mm3"),
    ("time", "ns"),
    ("angle", "rad"),
    ("energy", "MeV"),
    ("mass", "kg"),
    ("pressure", "Pa"),
    ("magnetic_field", "T"),
    ("electric_tension", "V"),
    ("temperature", "kelvin"),
];

/// Scale factor of a unit symbol, in internal units.
pub fn unit_factor(symbol: &str) -> Option<f64> {
    UNITS.get(symbol).map(|u| u.factor)
}

/// Dimension label of a unit symbol (e.g. `mm` -> `length`).
pub fn unit_dimension(symbol: &str) -> Option<&'static str> {
    UNITS.get(symbol).map(|u| u.dimension)
}

/// A unit of `dimension` whose factor is exactly 1, when the table has one.
pub fn internal_unit_symbol(dimension: &str) -> Option<&'static str> {
    let mut symbols: Vec<&'static str> = UNITS
        .iter()
        .filter(|(_, u)| u.dimension == dimension && u.factor == 1.0)
        .map(|(s, _)| *s)
        .collect();
    symbols.sort_by_key(|s| (s.len(), *s));
    symbols.first().copied()
}

pub fn is_unit_label(label: &str) -> bool {
    DIMENSIONS.iter().any(|(d, _)| *d == label)
}

pub fn default_unit_symbol(label: &str) -> Option<&'static str> {
    DIMENSIONS.iter().find(|(d, _)| *d == label).map(|(_, s)| *s)
}

/// A real literal decoded from text such as `12.5 mm`.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    /// The literal number as written.
    pub number: f64,
    /// Unit symbol, when one was written.
    pub unit: Option<String>,
    /// Dimension of the written unit.
    pub dimension: Option<&'static str>,
}

impl Quantity {
    /// Value in internal units, using `fallback_factor` when no unit was written.
    pub fn value(&self, fallback_factor: f64) -> f64 {
        match &self.unit {
            Some(symbol) => self.number * unit_factor(symbol).unwrap_or(1.0),
            None => self.number * fallback_factor,
        }
    }
}

/// Splits a real literal into its number and optional unit symbol.
pub fn parse_value_with_unit(text: &str) -> Result<Quantity> {
    let caps = VALUE_WITH_UNIT
        .captures(text)
        .ok_or_else(|| VariantError::parse(format!("Invalid real literal '{}'", text)))?;
    let number: f64 = caps[1]
        .parse()
        .map_err(|_| VariantError::parse(format!("Invalid real number in '{}'", text)))?;
    match caps.get(2) {
        None => Ok(Quantity { number, unit: None, dimension: None }),
        Some(symbol) => {
            let dimension = unit_dimension(symbol.as_str()).ok_or_else(|| {
                VariantError::parse(format!("Unknown unit symbol '{}' in '{}'", symbol.as_str(), text))
            })?;
            Ok(Quantity { number, unit: Some(symbol.as_str().to_owned()), dimension: Some(dimension) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millimeters_are_internal() {
        let q = parse_value_with_unit("12.5 mm").unwrap();
        assert_eq!(q.dimension, Some("length"));
        assert_eq!(q.value(1.0), 12.5);
        let q = parse_value_with_unit("2cm").unwrap();
        assert_eq!(q.value(1.0), 20.0);
    }

    #[test]
    fn bare_numbers_use_the_fallback() {
        let q = parse_value_with_unit(" 3 ").unwrap();
        assert!(q.unit.is_none());
        assert_eq!(q.value(CENTIMETER), 30.0);
    }

    #[test]
    fn energy_symbols_are_not_exponents() {
        let q = parse_value_with_unit("1.5eV").unwrap();
        assert_eq!(q.unit.as_deref(), Some("eV"));
        assert_eq!(q.dimension, Some("energy"));
    }

    #[test]
    fn unknown_units_fail() {
        assert!(parse_value_with_unit("12 parsecs").is_err());
        assert!(parse_value_with_unit("mm").is_err());
    }

    #[test]
    fn dimensions_have_default_units() {
        assert_eq!(default_unit_symbol("length"), Some("mm"));
        assert!(is_unit_label("time"));
        assert!(!is_unit_label("activity"));
    }

    #[test]
    fn internal_units_have_factor_one() {
        assert_eq!(internal_unit_symbol("length"), Some("mm"));
        assert_eq!(internal_unit_symbol("angle"), Some("rad"));
        assert_eq!(internal_unit_symbol("energy"), Some("MeV"));
        assert_eq!(internal_unit_symbol("mass"), None);
    }
}
