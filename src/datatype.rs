// used to print out readable forms of a value
use std::fmt;

use crate::units::{default_unit_symbol, internal_unit_symbol, unit_dimension, unit_factor};

/// Token written in profiles for a variable parameter without value.
pub const UNSET_LABEL: &str = "__unset__";

// ------------- Value Types --------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Boolean,
    Integer,
    Real,
    String,
}

impl ValueType {
    pub fn label(&self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Real => "real",
            ValueType::String => "string",
        }
    }
    pub fn from_label(label: &str) -> Option<ValueType> {
        match label {
            "boolean" | "bool" => Some(ValueType::Boolean),
            "integer" | "int" => Some(ValueType::Integer),
            "real" | "double" => Some(ValueType::Real),
            "string" => Some(ValueType::String),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The value held by a parameter record.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Boolean(bool),
    Integer(i32),
    Real(f64),
    String(String),
}

impl ParameterValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            ParameterValue::Boolean(_) => ValueType::Boolean,
            ParameterValue::Integer(_) => ValueType::Integer,
            ParameterValue::Real(_) => ValueType::Real,
            ParameterValue::String(_) => ValueType::String,
        }
    }
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            ParameterValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            ParameterValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
    pub fn as_real(&self) -> Option<f64> {
        match self {
            ParameterValue::Real(r) => Some(*r),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Boolean(b) => f.write_str(write_boolean(*b)),
            ParameterValue::Integer(i) => write!(f, "{}", i),
            ParameterValue::Real(r) => write!(f, "{}", r),
            ParameterValue::String(s) => f.write_str(&write_quoted_string(s)),
        }
    }
}

// ------------- Text Encodings --------------
pub fn read_boolean(text: &str) -> Option<bool> {
    match text.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

pub fn write_boolean(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

pub fn read_integer(text: &str) -> Option<i32> {
    text.trim().parse::<i32>().ok()
}

/// Reads a double-quoted string with `\"` and `\\` escapes. A bare word
/// without blanks or quotes is accepted as is.
pub fn read_quoted_string(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if !is_quoted(trimmed) {
        if trimmed.is_empty() || trimmed.contains(|c: char| c.is_whitespace() || c == '"') {
            return None;
        }
        return Some(trimmed.to_owned());
    }
    let inner = &trimmed[1..trimmed.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ ('"' | '\\')) => out.push(escaped),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => return None,
            },
            '"' => return None,
            _ => out.push(c),
        }
    }
    Some(out)
}

pub fn write_quoted_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

pub fn is_quoted(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('"') && text.ends_with('"')
}

pub fn add_quotes(text: &str) -> String {
    if is_quoted(text) { text.to_owned() } else { format!("\"{}\"", text) }
}

pub fn remove_quotes(text: &str) -> String {
    if is_quoted(text) { text[1..text.len() - 1].to_owned() } else { text.to_owned() }
}

/// Writes a real value expressed in `preferred_unit` (or in the default unit
/// of `unit_label`) followed by the unit symbol. Dimensionless reals are
/// written as plain numbers.
///
/// The written number is chosen so that reading it back in the same unit
/// gives `value` exactly. When the unit cannot express it, the value is
/// written in the internal unit of its dimension instead.
pub fn write_real(value: f64, preferred_unit: Option<&str>, unit_label: Option<&str>) -> String {
    let symbol = preferred_unit.or_else(|| unit_label.and_then(default_unit_symbol));
    let Some((symbol, factor)) = symbol.and_then(|s| unit_factor(s).map(|f| (s, f))) else {
        return format!("{}", value);
    };
    if let Some(number) = exact_number_in_unit(value, factor) {
        return format!("{} {}", number, symbol);
    }
    match unit_dimension(symbol).and_then(internal_unit_symbol) {
        Some(internal) => format!("{} {}", value, internal),
        None => format!("{} {}", value / factor, symbol),
    }
}

// shortest decimal n with n * factor == value, if any
fn exact_number_in_unit(value: f64, factor: f64) -> Option<f64> {
    let approx = value / factor;
    if !approx.is_finite() {
        return None;
    }
    for digits in 0..17 {
        let candidate: f64 = match format!("{:.*e}", digits, approx).parse() {
            Ok(c) => c,
            Err(_) => continue,
        };
        if candidate * factor == value {
            return Some(candidate);
        }
    }
    let bits = approx.to_bits();
    (1..=2u64)
        .flat_map(|k| [bits.wrapping_add(k), bits.wrapping_sub(k)])
        .map(f64::from_bits)
        .find(|c| c.is_finite() && c * factor == value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_accept_digits() {
        assert_eq!(read_boolean("1"), Some(true));
        assert_eq!(read_boolean(" false "), Some(false));
        assert_eq!(read_boolean("yes"), None);
    }

    #[test]
    fn quoted_strings_unescape() {
        let written = write_quoted_string(r#"a "b" \c"#);
        assert_eq!(written, r#""a \"b\" \\c""#);
        assert_eq!(read_quoted_string(&written).as_deref(), Some(r#"a "b" \c"#));
        assert_eq!(read_quoted_string("plain").as_deref(), Some("plain"));
        assert_eq!(read_quoted_string("two words"), None);
    }

    #[test]
    fn reals_carry_their_unit() {
        assert_eq!(write_real(12.5, Some("mm"), Some("length")), "12.5 mm");
        assert_eq!(write_real(20.0, Some("cm"), Some("length")), "2 cm");
        assert_eq!(write_real(3.0, None, Some("time")), "3 ns");
        assert_eq!(write_real(0.25, None, None), "0.25");
    }

    #[test]
    fn written_reals_read_back_exactly() {
        for symbol in ["cm", "deg", "inch", "keV"] {
            let factor = unit_factor(symbol).unwrap();
            for i in 1..2000 {
                let value = i as f64 * 0.37;
                let written = write_real(value, Some(symbol), unit_dimension(symbol));
                let quantity = crate::units::parse_value_with_unit(&written).unwrap();
                assert_eq!(quantity.value(factor), value, "{symbol}: {value} written as '{written}'");
            }
        }
    }

    #[test]
    fn quotes_are_added_once() {
        assert_eq!(add_quotes("x"), "\"x\"");
        assert_eq!(add_quotes("\"x\""), "\"x\"");
        assert_eq!(remove_quotes("\"x\""), "x");
    }
}
