//! Static description of a configuration parameter: its type, the values it
//! accepts and the variants each value triggers.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::datatype::{ParameterValue, ValueType};
use crate::error::{Result, VariantError};
use crate::units;
use crate::variant_model::VariantModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Fixed,
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableMode {
    Free,
    Enumeration,
    Interval,
}

/// One allowed value of an enumeration, with the group it belongs to and the
/// variants it activates.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumeratedValue {
    pub value: ParameterValue,
    pub group: Option<String>,
    pub variants: Vec<String>,
}

/// An inclusive interval of numeric values activating some variants.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRange<T> {
    pub min: T,
    pub max: T,
    pub variants: Vec<String>,
}

impl<T: PartialOrd> ValueRange<T> {
    pub fn contains(&self, value: &T) -> bool {
        *value >= self.min && *value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct VariantEntry {
    pub name: String,
    pub model: Arc<VariantModel>,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct ParameterModel {
    name: String,
    description: String,
    value_type: ValueType,
    mutability: Mutability,
    mode: VariableMode,
    fixed: Option<ParameterValue>,
    default: Option<ParameterValue>,
    unit_label: Option<String>,
    preferred_unit: Option<String>,
    precision: Option<f64>,
    integer_domain: Option<(i32, i32)>,
    real_domain: Option<(f64, f64)>,
    enumerated: Vec<EnumeratedValue>,
    integer_ranges: Vec<ValueRange<i32>>,
    real_ranges: Vec<ValueRange<f64>>,
    true_variants: Vec<String>,
    false_variants: Vec<String>,
    groups: Vec<GroupInfo>,
    variants: Vec<VariantEntry>,
}

impl ParameterModel {
    pub fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: name.to_owned(),
            description: String::new(),
            value_type,
            mutability: Mutability::Variable,
            mode: VariableMode::Free,
            fixed: None,
            default: None,
            unit_label: None,
            preferred_unit: None,
            precision: None,
            integer_domain: None,
            real_domain: None,
            enumerated: Vec::new(),
            integer_ranges: Vec::new(),
            real_ranges: Vec::new(),
            true_variants: Vec::new(),
            false_variants: Vec::new(),
            groups: Vec::new(),
            variants: Vec::new(),
        }
    }

    // ------------- Setup -------------
    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_owned();
    }
    pub fn set_fixed_value(&mut self, value: ParameterValue) -> Result<()> {
        self.check_type(&value)?;
        self.mutability = Mutability::Fixed;
        self.fixed = Some(value);
        Ok(())
    }
    pub fn set_variable_mode(&mut self, mode: VariableMode) {
        self.mutability = Mutability::Variable;
        self.mode = mode;
    }
    pub fn set_default_value(&mut self, value: ParameterValue) -> Result<()> {
        self.check_type(&value)?;
        self.default = Some(value);
        Ok(())
    }
    pub fn set_unit_label(&mut self, label: &str) -> Result<()> {
        if self.value_type != ValueType::Real {
            return Err(VariantError::Logic(format!("Parameter model '{}' is not real, it cannot have a unit", self.name)));
        }
        if !units::is_unit_label(label) {
            return Err(VariantError::Domain(format!("Invalid unit label '{}' for parameter model '{}'", label, self.name)));
        }
        self.unit_label = Some(label.to_owned());
        Ok(())
    }
    pub fn set_preferred_unit(&mut self, symbol: &str) -> Result<()> {
        let dimension = units::unit_dimension(symbol)
            .ok_or_else(|| VariantError::Domain(format!("Unknown unit symbol '{}' for parameter model '{}'", symbol, self.name)))?;
        match &self.unit_label {
            Some(label) if label != dimension => Err(VariantError::Domain(format!(
                "Preferred unit '{}' is not a {} unit in parameter model '{}'",
                symbol, label, self.name
            ))),
            _ => {
                if self.unit_label.is_none() {
                    self.set_unit_label(dimension)?;
                }
                self.preferred_unit = Some(symbol.to_owned());
                Ok(())
            }
        }
    }
    pub fn set_precision(&mut self, precision: f64) -> Result<()> {
        if !(precision > 0.0) {
            return Err(VariantError::Range(format!("Invalid precision {} for parameter model '{}'", precision, self.name)));
        }
        self.precision = Some(precision);
        Ok(())
    }
    pub fn set_integer_domain(&mut self, min: i32, max: i32) -> Result<()> {
        if min > max {
            return Err(VariantError::Range(format!("Invalid integer domain [{}, {}] in parameter model '{}'", min, max, self.name)));
        }
        self.integer_domain = Some((min, max));
        Ok(())
    }
    pub fn set_real_domain(&mut self, min: f64, max: f64) -> Result<()> {
        if !(min <= max) {
            return Err(VariantError::Range(format!("Invalid real domain [{}, {}] in parameter model '{}'", min, max, self.name)));
        }
        self.real_domain = Some((min, max));
        Ok(())
    }
    pub fn add_group(&mut self, name: &str, description: &str) -> Result<()> {
        if self.has_group(name) {
            return Err(VariantError::Logic(format!("Group '{}' already exists in parameter model '{}'", name, self.name)));
        }
        self.groups.push(GroupInfo { name: name.to_owned(), description: description.to_owned() });
        Ok(())
    }
    pub fn add_variant(&mut self, name: &str, model: Arc<VariantModel>, description: &str) -> Result<()> {
        if self.has_variant(name) {
            return Err(VariantError::Logic(format!("Variant '{}' already exists in parameter model '{}'", name, self.name)));
        }
        self.variants.push(VariantEntry { name: name.to_owned(), model, description: description.to_owned() });
        Ok(())
    }
    pub fn add_enumerated_value(&mut self, value: ParameterValue, group: Option<&str>, variants: Vec<String>) -> Result<()> {
        self.check_type(&value)?;
        if self.value_type == ValueType::Boolean {
            return Err(VariantError::Logic(format!("Boolean parameter model '{}' cannot be enumerated", self.name)));
        }
        if self.enumerated.iter().any(|e| self.same_value(&e.value, &value)) {
            return Err(VariantError::Logic(format!("Duplicated enumerated value {} in parameter model '{}'", value, self.name)));
        }
        self.enumerated.push(EnumeratedValue { value, group: group.map(str::to_owned), variants });
        Ok(())
    }
    pub fn add_integer_range(&mut self, min: i32, max: i32, variants: Vec<String>) -> Result<()> {
        if self.value_type != ValueType::Integer || min > max {
            return Err(VariantError::Logic(format!("Invalid integer range [{}, {}] in parameter model '{}'", min, max, self.name)));
        }
        self.integer_ranges.push(ValueRange { min, max, variants });
        Ok(())
    }
    pub fn add_real_range(&mut self, min: f64, max: f64, variants: Vec<String>) -> Result<()> {
        if self.value_type != ValueType::Real || !(min <= max) {
            return Err(VariantError::Logic(format!("Invalid real range [{}, {}] in parameter model '{}'", min, max, self.name)));
        }
        self.real_ranges.push(ValueRange { min, max, variants });
        Ok(())
    }
    pub fn set_boolean_variants(&mut self, true_variants: Vec<String>, false_variants: Vec<String>) -> Result<()> {
        if self.value_type != ValueType::Boolean {
            return Err(VariantError::Logic(format!("Parameter model '{}' is not boolean", self.name)));
        }
        self.true_variants = true_variants;
        self.false_variants = false_variants;
        Ok(())
    }

    /// Cross-checks the whole description once every piece is in place.
    pub fn validate(&self) -> Result<()> {
        if self.mode == VariableMode::Enumeration && self.mutability == Mutability::Variable && self.enumerated.is_empty() {
            return Err(VariantError::Logic(format!("Enumerated parameter model '{}' has no values", self.name)));
        }
        if self.mode == VariableMode::Interval
            && self.mutability == Mutability::Variable
            && self.integer_domain.is_none()
            && self.real_domain.is_none()
        {
            return Err(VariantError::Logic(format!("Interval parameter model '{}' has no domain", self.name)));
        }
        for e in &self.enumerated {
            if let Some(group) = &e.group {
                if !self.has_group(group) {
                    return Err(VariantError::Logic(format!(
                        "Enumerated value {} of parameter model '{}' refers to unknown group '{}'",
                        e.value, self.name, group
                    )));
                }
            }
        }
        let triggered = self
            .enumerated
            .iter()
            .flat_map(|e| e.variants.iter())
            .chain(self.integer_ranges.iter().flat_map(|r| r.variants.iter()))
            .chain(self.real_ranges.iter().flat_map(|r| r.variants.iter()))
            .chain(self.true_variants.iter())
            .chain(self.false_variants.iter());
        for name in triggered {
            if !self.has_variant(name) {
                return Err(VariantError::Logic(format!("Parameter model '{}' triggers unknown variant '{}'", self.name, name)));
            }
        }
        if let Some(default) = &self.default {
            if self.is_fixed() {
                return Err(VariantError::Logic(format!("Fixed parameter model '{}' cannot have a default value", self.name)));
            }
            if !self.is_value_valid(default) {
                return Err(VariantError::Domain(format!("Invalid default value {} for parameter model '{}'", default, self.name)));
            }
        }
        Ok(())
    }

    fn check_type(&self, value: &ParameterValue) -> Result<()> {
        if value.value_type() != self.value_type {
            return Err(VariantError::Logic(format!(
                "Parameter model '{}' expects a {} value, got {}",
                self.name,
                self.value_type,
                value.value_type()
            )));
        }
        Ok(())
    }

    fn same_value(&self, a: &ParameterValue, b: &ParameterValue) -> bool {
        match (a, b) {
            (ParameterValue::Real(x), ParameterValue::Real(y)) => match self.precision {
                Some(p) => (x - y).abs() <= p,
                None => x == y,
            },
            _ => a == b,
        }
    }

    // ------------- Accessors -------------
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }
    pub fn is_boolean(&self) -> bool {
        self.value_type == ValueType::Boolean
    }
    pub fn is_integer(&self) -> bool {
        self.value_type == ValueType::Integer
    }
    pub fn is_real(&self) -> bool {
        self.value_type == ValueType::Real
    }
    pub fn is_string(&self) -> bool {
        self.value_type == ValueType::String
    }
    pub fn mutability(&self) -> Mutability {
        self.mutability
    }
    pub fn is_fixed(&self) -> bool {
        self.mutability == Mutability::Fixed
    }
    pub fn is_variable(&self) -> bool {
        self.mutability == Mutability::Variable
    }
    pub fn mode(&self) -> VariableMode {
        self.mode
    }
    pub fn is_enumeration(&self) -> bool {
        self.is_variable() && self.mode == VariableMode::Enumeration
    }
    pub fn has_fixed_value(&self) -> bool {
        self.fixed.is_some()
    }
    pub fn fixed_value(&self) -> Option<&ParameterValue> {
        self.fixed.as_ref()
    }
    pub fn has_default_value(&self) -> bool {
        self.default.is_some()
    }
    pub fn default_value(&self) -> Option<&ParameterValue> {
        self.default.as_ref()
    }
    pub fn unit_label(&self) -> Option<&str> {
        self.unit_label.as_deref()
    }
    pub fn preferred_unit(&self) -> Option<&str> {
        self.preferred_unit.as_deref()
    }
    pub fn enumerated_values(&self) -> &[EnumeratedValue] {
        &self.enumerated
    }
    pub fn groups(&self) -> &[GroupInfo] {
        &self.groups
    }
    pub fn has_group(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g.name == name)
    }
    pub fn variants(&self) -> &[VariantEntry] {
        &self.variants
    }
    pub fn has_variant(&self, name: &str) -> bool {
        self.variants.iter().any(|v| v.name == name)
    }
    pub fn variant(&self, name: &str) -> Option<&VariantEntry> {
        self.variants.iter().find(|v| v.name == name)
    }

    // ------------- Validity -------------
    pub fn is_boolean_valid(&self, value: bool) -> bool {
        self.is_value_valid(&ParameterValue::Boolean(value))
    }
    pub fn is_integer_valid(&self, value: i32) -> bool {
        self.is_value_valid(&ParameterValue::Integer(value))
    }
    pub fn is_real_valid(&self, value: f64) -> bool {
        self.is_value_valid(&ParameterValue::Real(value))
    }
    pub fn is_string_valid(&self, value: &str) -> bool {
        self.is_value_valid(&ParameterValue::String(value.to_owned()))
    }

    /// Type, fixed value, domain and enumeration checks. Dependencies are not
    /// considered here.
    pub fn is_value_valid(&self, value: &ParameterValue) -> bool {
        if value.value_type() != self.value_type {
            return false;
        }
        if let Some(fixed) = &self.fixed {
            return self.same_value(fixed, value);
        }
        match (self.mode, value) {
            (_, ParameterValue::Boolean(_)) => true,
            (VariableMode::Enumeration, _) => self.enumerated.iter().any(|e| self.same_value(&e.value, value)),
            (_, ParameterValue::Integer(i)) => self.integer_domain.is_none_or(|(min, max)| *i >= min && *i <= max),
            (_, ParameterValue::Real(r)) => !r.is_nan() && self.real_domain.is_none_or(|(min, max)| *r >= min && *r <= max),
            (_, ParameterValue::String(_)) => true,
        }
    }

    // ------------- Groups -------------
    /// The group of the enumerated value equal to `value`, if any.
    pub fn value_group(&self, value: &ParameterValue) -> Option<&str> {
        if !self.is_enumeration() {
            return None;
        }
        self.enumerated
            .iter()
            .find(|e| self.same_value(&e.value, value))
            .and_then(|e| e.group.as_deref())
    }
    pub fn enumerated_integer_value_has_group(&self, value: i32) -> bool {
        self.value_group(&ParameterValue::Integer(value)).is_some()
    }
    pub fn get_enumerated_integer_value_group(&self, value: i32) -> Option<&str> {
        self.value_group(&ParameterValue::Integer(value))
    }
    pub fn enumerated_real_value_has_group(&self, value: f64) -> bool {
        self.value_group(&ParameterValue::Real(value)).is_some()
    }
    pub fn get_enumerated_real_value_group(&self, value: f64) -> Option<&str> {
        self.value_group(&ParameterValue::Real(value))
    }
    pub fn enumerated_string_value_has_group(&self, value: &str) -> bool {
        self.value_group(&ParameterValue::String(value.to_owned())).is_some()
    }
    pub fn get_enumerated_string_value_group(&self, value: &str) -> Option<&str> {
        self.value_group(&ParameterValue::String(value.to_owned()))
    }

    // ------------- Triggered variants -------------
    pub fn find_variants_associated_to_boolean(&self, value: bool) -> BTreeSet<String> {
        let names = if value { &self.true_variants } else { &self.false_variants };
        names.iter().cloned().collect()
    }
    pub fn find_variants_associated_to_integer(&self, value: i32) -> BTreeSet<String> {
        let mut found = self.enumerated_variants(&ParameterValue::Integer(value));
        for range in self.integer_ranges.iter().filter(|r| r.contains(&value)) {
            found.extend(range.variants.iter().cloned());
        }
        found
    }
    pub fn find_variants_associated_to_real(&self, value: f64) -> BTreeSet<String> {
        let mut found = self.enumerated_variants(&ParameterValue::Real(value));
        for range in self.real_ranges.iter().filter(|r| r.contains(&value)) {
            found.extend(range.variants.iter().cloned());
        }
        found
    }
    pub fn find_variants_associated_to_string(&self, value: &str) -> BTreeSet<String> {
        self.enumerated_variants(&ParameterValue::String(value.to_owned()))
    }
    pub fn find_variants_associated_to(&self, value: &ParameterValue) -> BTreeSet<String> {
        match value {
            ParameterValue::Boolean(b) => self.find_variants_associated_to_boolean(*b),
            ParameterValue::Integer(i) => self.find_variants_associated_to_integer(*i),
            ParameterValue::Real(r) => self.find_variants_associated_to_real(*r),
            ParameterValue::String(s) => self.find_variants_associated_to_string(s),
        }
    }

    fn enumerated_variants(&self, value: &ParameterValue) -> BTreeSet<String> {
        self.enumerated
            .iter()
            .filter(|e| self.same_value(&e.value, value))
            .flat_map(|e| e.variants.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> ParameterModel {
        let mut pm = ParameterModel::new("shape.PM", ValueType::String);
        pm.set_variable_mode(VariableMode::Enumeration);
        pm.add_group("round", "Round shapes").unwrap();
        pm.add_enumerated_value(ParameterValue::String("disk".into()), Some("round"), vec![]).unwrap();
        pm.add_enumerated_value(ParameterValue::String("box".into()), None, vec![]).unwrap();
        pm
    }

    #[test]
    fn enumerations_restrict_values() {
        let pm = shape();
        assert!(pm.validate().is_ok());
        assert!(pm.is_string_valid("disk"));
        assert!(!pm.is_string_valid("cone"));
        assert_eq!(pm.get_enumerated_string_value_group("disk"), Some("round"));
        assert!(!pm.enumerated_string_value_has_group("box"));
    }

    #[test]
    fn fixed_models_accept_only_their_value() {
        let mut pm = ParameterModel::new("n.PM", ValueType::Integer);
        pm.set_fixed_value(ParameterValue::Integer(3)).unwrap();
        assert!(pm.is_integer_valid(3));
        assert!(!pm.is_integer_valid(4));
        assert!(pm.set_fixed_value(ParameterValue::Boolean(true)).is_err());
    }

    #[test]
    fn domains_bound_numbers() {
        let mut pm = ParameterModel::new("t.PM", ValueType::Real);
        pm.set_preferred_unit("mm").unwrap();
        assert_eq!(pm.unit_label(), Some("length"));
        pm.set_variable_mode(VariableMode::Interval);
        pm.set_real_domain(0.0, 10.0).unwrap();
        assert!(pm.validate().is_ok());
        assert!(pm.is_real_valid(10.0));
        assert!(!pm.is_real_valid(10.5));
        assert!(pm.set_preferred_unit("s").is_err());
    }

    #[test]
    fn unknown_groups_fail_validation() {
        let mut pm = ParameterModel::new("c.PM", ValueType::Integer);
        pm.set_variable_mode(VariableMode::Enumeration);
        pm.add_enumerated_value(ParameterValue::Integer(1), Some("odd"), vec![]).unwrap();
        assert!(pm.validate().is_err());
    }
}
