use std::sync::Arc;

use crate::error::{Result, VariantError};
use crate::object_info::validate_instance_name;
use crate::parameter_model::ParameterModel;

/// A parameter declared inside a variant. `occurrences > 1` expands into the
/// records `name[0]`, `name[1]`, ...
#[derive(Debug, Clone)]
pub struct ParameterSlot {
    pub name: String,
    pub model: Arc<ParameterModel>,
    pub description: String,
    pub rank: Option<u32>,
    pub occurrences: u32,
}

impl ParameterSlot {
    /// Leaf names of the records instantiated from this slot.
    pub fn record_names(&self) -> Vec<String> {
        if self.occurrences <= 1 {
            vec![self.name.clone()]
        } else {
            (0..self.occurrences).map(|i| format!("{}[{}]", self.name, i)).collect()
        }
    }
}

/// A named group of parameters.
#[derive(Debug, Clone)]
pub struct VariantModel {
    name: String,
    description: String,
    parameters: Vec<ParameterSlot>,
}

impl VariantModel {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_owned(), description: String::new(), parameters: Vec::new() }
    }
    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_owned();
    }
    pub fn add_parameter(
        &mut self,
        name: &str,
        model: Arc<ParameterModel>,
        description: &str,
        rank: Option<u32>,
        occurrences: u32,
    ) -> Result<()> {
        if !validate_instance_name(name) {
            return Err(VariantError::Logic(format!("Invalid parameter name '{}' in variant model '{}'", name, self.name)));
        }
        if self.has_parameter(name) {
            return Err(VariantError::Logic(format!("Parameter '{}' already exists in variant model '{}'", name, self.name)));
        }
        if occurrences == 0 {
            return Err(VariantError::Range(format!("Parameter '{}' of variant model '{}' has no occurrence", name, self.name)));
        }
        if let Some(rank) = rank {
            if occurrences > 1 {
                return Err(VariantError::Logic(format!(
                    "Multi-occurrence parameter '{}' of variant model '{}' cannot be ranked",
                    name, self.name
                )));
            }
            if self.parameters.iter().any(|p| p.rank == Some(rank)) {
                return Err(VariantError::Logic(format!("Rank {} is already used in variant model '{}'", rank, self.name)));
            }
        }
        self.parameters.push(ParameterSlot {
            name: name.to_owned(),
            model,
            description: description.to_owned(),
            rank,
            occurrences,
        });
        Ok(())
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn parameters(&self) -> &[ParameterSlot] {
        &self.parameters
    }
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p.name == name)
    }
    pub fn parameter(&self, name: &str) -> Option<&ParameterSlot> {
        self.parameters.iter().find(|p| p.name == name)
    }
    pub fn parameter_description(&self, name: &str) -> Option<&str> {
        self.parameter(name).map(|p| p.description.as_str())
    }
    /// Parameter names, ranked ones by ascending rank first.
    pub fn ranked_parameter_names(&self) -> Vec<&str> {
        let mut ranked: Vec<&ParameterSlot> = self.parameters.iter().filter(|p| p.rank.is_some()).collect();
        ranked.sort_by_key(|p| p.rank);
        ranked
            .into_iter()
            .chain(self.parameters.iter().filter(|p| p.rank.is_none()))
            .map(|p| p.name.as_str())
            .collect()
    }
}
