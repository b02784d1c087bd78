//! The registry manager: parameter and variant models built from a setup
//! description, from which registries instantiate their record trees.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::datatype::{ParameterValue, ValueType};
use crate::error::{Result, VariantError};
use crate::object_info::{validate_instance_name, validate_model_name};
use crate::parameter_model::{ParameterModel, VariableMode};
use crate::registry::OtherHasher;
use crate::setup::{DependencyModelSetup, ManagerSetup, ParameterSetup, SetupValue, VariantSetup};
use crate::units;
use crate::variant_model::VariantModel;

#[derive(Debug)]
pub struct RegistryManager {
    name: String,
    display_name: String,
    description: String,
    top_variant_name: String,
    parameter_models: HashMap<String, Arc<ParameterModel>, OtherHasher>,
    variant_models: HashMap<String, Arc<VariantModel>, OtherHasher>,
    local_dependencies: Option<DependencyModelSetup>,
}

// models being resolved, used to build them in dependency order
struct ModelBuilder<'a> {
    parameter_setups: HashMap<&'a str, &'a ParameterSetup, OtherHasher>,
    variant_setups: HashMap<&'a str, &'a VariantSetup, OtherHasher>,
    parameters: HashMap<String, Arc<ParameterModel>, OtherHasher>,
    variants: HashMap<String, Arc<VariantModel>, OtherHasher>,
    in_progress: HashSet<String>,
}

impl RegistryManager {
    pub fn from_setup(setup: &ManagerSetup) -> Result<Self> {
        if !validate_instance_name(&setup.name) {
            return Err(VariantError::Config(format!("Invalid registry manager name '{}'", setup.name)));
        }
        let mut builder = ModelBuilder {
            parameter_setups: HashMap::default(),
            variant_setups: HashMap::default(),
            parameters: HashMap::default(),
            variants: HashMap::default(),
            in_progress: HashSet::new(),
        };
        for p in &setup.parameters {
            if !validate_model_name(&p.name) {
                return Err(VariantError::Config(format!("Invalid parameter model name '{}'", p.name)));
            }
            if builder.parameter_setups.insert(p.name.as_str(), p).is_some() {
                return Err(VariantError::Config(format!("Duplicated parameter model '{}'", p.name)));
            }
        }
        for v in &setup.variants {
            if !validate_model_name(&v.name) {
                return Err(VariantError::Config(format!("Invalid variant model name '{}'", v.name)));
            }
            if builder.variant_setups.insert(v.name.as_str(), v).is_some() {
                return Err(VariantError::Config(format!("Duplicated variant model '{}'", v.name)));
            }
        }
        for p in &setup.parameters {
            builder.parameter(&p.name)?;
        }
        for v in &setup.variants {
            builder.variant(&v.name)?;
        }
        if !builder.variants.contains_key(&setup.top_variant_name) {
            return Err(VariantError::Config(format!(
                "Top variant model '{}' is not defined in registry manager '{}'",
                setup.top_variant_name, setup.name
            )));
        }
        debug!(
            manager = %setup.name,
            parameters = builder.parameters.len(),
            variants = builder.variants.len(),
            "registry manager built"
        );
        Ok(Self {
            name: setup.name.clone(),
            display_name: setup.display_name.clone(),
            description: setup.description.clone(),
            top_variant_name: setup.top_variant_name.clone(),
            parameter_models: builder.parameters,
            variant_models: builder.variants,
            local_dependencies: setup.local_dependencies.clone(),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_setup(&ManagerSetup::from_file(path)?)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Self::from_setup(&ManagerSetup::from_toml_str(text)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn top_variant_name(&self) -> &str {
        &self.top_variant_name
    }
    pub fn has_parameter_model(&self, name: &str) -> bool {
        self.parameter_models.contains_key(name)
    }
    pub fn parameter_model(&self, name: &str) -> Option<&Arc<ParameterModel>> {
        self.parameter_models.get(name)
    }
    pub fn has_variant_model(&self, name: &str) -> bool {
        self.variant_models.contains_key(name)
    }
    pub fn variant_model(&self, name: &str) -> Option<&Arc<VariantModel>> {
        self.variant_models.get(name)
    }
    pub fn top_variant_model(&self) -> Option<&Arc<VariantModel>> {
        self.variant_models.get(&self.top_variant_name)
    }
    pub fn local_dependencies(&self) -> Option<&DependencyModelSetup> {
        self.local_dependencies.as_ref()
    }
}

impl ModelBuilder<'_> {
    fn parameter(&mut self, name: &str) -> Result<Arc<ParameterModel>> {
        if let Some(model) = self.parameters.get(name) {
            return Ok(model.clone());
        }
        let setup = *self
            .parameter_setups
            .get(name)
            .ok_or_else(|| VariantError::Config(format!("Unknown parameter model '{}'", name)))?;
        if !self.in_progress.insert(name.to_owned()) {
            return Err(VariantError::Config(format!("Cyclic reference through parameter model '{}'", name)));
        }
        let model = Arc::new(self.build_parameter(setup)?);
        self.in_progress.remove(name);
        self.parameters.insert(name.to_owned(), model.clone());
        Ok(model)
    }

    fn variant(&mut self, name: &str) -> Result<Arc<VariantModel>> {
        if let Some(model) = self.variants.get(name) {
            return Ok(model.clone());
        }
        let setup = *self
            .variant_setups
            .get(name)
            .ok_or_else(|| VariantError::Config(format!("Unknown variant model '{}'", name)))?;
        if !self.in_progress.insert(name.to_owned()) {
            return Err(VariantError::Config(format!("Cyclic reference through variant model '{}'", name)));
        }
        let mut model = VariantModel::new(&setup.name);
        model.set_description(&setup.description);
        for p in &setup.parameters {
            let pm = self.parameter(&p.model)?;
            model.add_parameter(&p.name, pm, &p.description, p.rank, p.occurrences.unwrap_or(1))?;
        }
        self.in_progress.remove(name);
        let model = Arc::new(model);
        self.variants.insert(name.to_owned(), model.clone());
        Ok(model)
    }

    fn build_parameter(&mut self, setup: &ParameterSetup) -> Result<ParameterModel> {
        let value_type = ValueType::from_label(&setup.value_type).ok_or_else(|| {
            VariantError::Config(format!("Invalid type '{}' for parameter model '{}'", setup.value_type, setup.name))
        })?;
        let mut pm = ParameterModel::new(&setup.name, value_type);
        pm.set_description(&setup.description);
        if let Some(label) = &setup.unit_label {
            pm.set_unit_label(label)?;
        }
        if let Some(symbol) = &setup.preferred_unit {
            pm.set_preferred_unit(symbol)?;
        }
        if let Some(precision) = setup.precision {
            pm.set_precision(precision)?;
        }
        for g in &setup.groups {
            pm.add_group(&g.name, &g.description)?;
        }
        for v in &setup.variants {
            if !validate_instance_name(&v.name) {
                return Err(VariantError::Config(format!("Invalid variant name '{}' in parameter model '{}'", v.name, setup.name)));
            }
            let vm = self.variant(&v.model)?;
            pm.add_variant(&v.name, vm, &v.description)?;
        }
        let fixed = match setup.mutability.as_deref() {
            None | Some("variable") => false,
            Some("fixed") => true,
            Some(other) => {
                return Err(VariantError::Config(format!("Invalid mutability '{}' for parameter model '{}'", other, setup.name)));
            }
        };
        if fixed {
            let value = setup
                .fixed_value
                .as_ref()
                .ok_or_else(|| VariantError::Config(format!("Fixed parameter model '{}' has no fixed value", setup.name)))?;
            pm.set_fixed_value(convert_value(value, &pm)?)?;
        } else {
            let mode = match setup.mode.as_deref() {
                None | Some("free") => VariableMode::Free,
                Some("enumeration") => VariableMode::Enumeration,
                Some("interval") => VariableMode::Interval,
                Some(other) => {
                    return Err(VariantError::Config(format!("Invalid mode '{}' for parameter model '{}'", other, setup.name)));
                }
            };
            pm.set_variable_mode(mode);
        }
        if let Some(domain) = &setup.domain {
            match value_type {
                ValueType::Integer => {
                    let (min, max) = (convert_integer(&domain.min, &setup.name)?, convert_integer(&domain.max, &setup.name)?);
                    pm.set_integer_domain(min, max)?;
                }
                ValueType::Real => {
                    let (min, max) = (convert_real(&domain.min, &pm)?, convert_real(&domain.max, &pm)?);
                    pm.set_real_domain(min, max)?;
                }
                _ => {
                    return Err(VariantError::Config(format!("Parameter model '{}' cannot have a domain", setup.name)));
                }
            }
        }
        for e in &setup.enumerated {
            let value = convert_value(&e.value, &pm)?;
            pm.add_enumerated_value(value, e.group.as_deref(), e.variants.clone())?;
        }
        for r in &setup.ranges {
            match value_type {
                ValueType::Integer => {
                    let (min, max) = (convert_integer(&r.min, &setup.name)?, convert_integer(&r.max, &setup.name)?);
                    pm.add_integer_range(min, max, r.variants.clone())?;
                }
                ValueType::Real => {
                    let (min, max) = (convert_real(&r.min, &pm)?, convert_real(&r.max, &pm)?);
                    pm.add_real_range(min, max, r.variants.clone())?;
                }
                _ => {
                    return Err(VariantError::Config(format!("Parameter model '{}' cannot have ranges", setup.name)));
                }
            }
        }
        if !setup.true_variants.is_empty() || !setup.false_variants.is_empty() {
            pm.set_boolean_variants(setup.true_variants.clone(), setup.false_variants.clone())?;
        }
        if let Some(value) = &setup.default_value {
            pm.set_default_value(convert_value(value, &pm)?)?;
        }
        pm.validate()?;
        Ok(pm)
    }
}

// ------------- Literal conversion -------------
fn convert_integer(value: &SetupValue, model_name: &str) -> Result<i32> {
    match value {
        SetupValue::Integer(i) => i32::try_from(*i)
            .map_err(|_| VariantError::Range(format!("Integer {} out of range in parameter model '{}'", i, model_name))),
        other => Err(VariantError::Config(format!("Expected an integer in parameter model '{}', got {:?}", model_name, other))),
    }
}

fn convert_real(value: &SetupValue, pm: &ParameterModel) -> Result<f64> {
    let fallback = pm
        .preferred_unit()
        .or_else(|| pm.unit_label().and_then(units::default_unit_symbol))
        .and_then(units::unit_factor)
        .unwrap_or(1.0);
    match value {
        SetupValue::Real(r) => Ok(r * fallback),
        SetupValue::Integer(i) => Ok(*i as f64 * fallback),
        SetupValue::Text(text) => {
            let quantity = units::parse_value_with_unit(text)?;
            if let (Some(dimension), Some(label)) = (quantity.dimension, pm.unit_label()) {
                if dimension != label {
                    return Err(VariantError::Domain(format!(
                        "Value '{}' is not a {} in parameter model '{}'",
                        text,
                        label,
                        pm.name()
                    )));
                }
            }
            Ok(quantity.value(fallback))
        }
        SetupValue::Boolean(_) => Err(VariantError::Config(format!("Expected a real in parameter model '{}'", pm.name()))),
    }
}

fn convert_value(value: &SetupValue, pm: &ParameterModel) -> Result<ParameterValue> {
    match pm.value_type() {
        ValueType::Boolean => match value {
            SetupValue::Boolean(b) => Ok(ParameterValue::Boolean(*b)),
            SetupValue::Text(t) if t == "true" || t == "false" => Ok(ParameterValue::Boolean(t == "true")),
            other => Err(VariantError::Config(format!("Expected a boolean in parameter model '{}', got {:?}", pm.name(), other))),
        },
        ValueType::Integer => Ok(ParameterValue::Integer(convert_integer(value, pm.name())?)),
        ValueType::Real => Ok(ParameterValue::Real(convert_real(value, pm)?)),
        ValueType::String => match value {
            SetupValue::Text(t) => Ok(ParameterValue::String(t.clone())),
            other => Err(VariantError::Config(format!("Expected a string in parameter model '{}', got {:?}", pm.name(), other))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_models_are_rejected() {
        let err = RegistryManager::from_toml_str(
            r#"
            name = "loop"
            top_variant_name = "a.VM"

            [[parameters]]
            name = "p.PM"
            type = "boolean"
            true_variants = ["again"]

            [[parameters.variants]]
            name = "again"
            model = "a.VM"

            [[variants]]
            name = "a.VM"

            [[variants.parameters]]
            name = "p"
            model = "p.PM"
            "#,
        )
        .unwrap_err();
        assert!(format!("{}", err).contains("Cyclic"));
    }

    #[test]
    fn reals_are_read_in_the_preferred_unit() {
        let manager = RegistryManager::from_toml_str(
            r#"
            name = "det"
            top_variant_name = "det.VM"

            [[parameters]]
            name = "thickness.PM"
            type = "real"
            preferred_unit = "cm"
            default = 2.5
            domain = { min = "1 mm", max = 10.0 }

            [[variants]]
            name = "det.VM"

            [[variants.parameters]]
            name = "thickness"
            model = "thickness.PM"
            "#,
        )
        .unwrap();
        let pm = manager.parameter_model("thickness.PM").unwrap();
        assert_eq!(pm.default_value(), Some(&ParameterValue::Real(25.0)));
        assert!(pm.is_real_valid(100.0));
        assert!(!pm.is_real_valid(0.5));
        assert_eq!(manager.top_variant_model().unwrap().name(), "det.VM");
    }
}
