//! The runtime node of a registry tree: either a parameter holding a value or
//! a variant grouping parameters. Records live in the flat table of their
//! registry and refer to each other by [`RecordId`]; the cascades that mutate
//! them are driven by [`crate::cascade::Editor`].

use std::fmt::Write;
use std::sync::Arc;

use crate::datatype::{
    ParameterValue, UNSET_LABEL, ValueType, read_boolean, read_integer, read_quoted_string, write_boolean,
    write_quoted_string, write_real,
};
use crate::error::{CommandError, CommandResult, ErrorCode, Result, VariantError};
use crate::parameter_model::ParameterModel;
use crate::units;
use crate::variant_model::VariantModel;

/// Index of a record in the table of its registry.
pub type RecordId = usize;

/// Organizational edge from a record to one of its daughters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Daughter {
    pub name: String,
    pub id: RecordId,
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct VariantRecord {
    path: String,
    description: String,
    parameter_model: Option<Arc<ParameterModel>>,
    variant_model: Option<Arc<VariantModel>>,
    parent: Option<RecordId>,
    daughters: Vec<Daughter>,
    // positions in `daughters`, ranked ones first
    ordered: Vec<usize>,
    active: bool,
    value: Option<ParameterValue>,
    with_update: bool,
}

impl VariantRecord {
    pub fn new(path: &str) -> Self {
        Self { path: path.to_owned(), ..Self::default() }
    }

    /// Back to the empty state, keeping nothing but the allocation.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_valid(&self) -> bool {
        !self.path.is_empty() && (self.is_parameter() || self.is_variant())
    }

    // ------------- Identity -------------
    pub fn path(&self) -> &str {
        &self.path
    }
    pub fn set_path(&mut self, path: &str) {
        self.path = path.to_owned();
    }
    pub fn leaf_name(&self) -> &str {
        match self.path.rfind('/') {
            Some(pos) if pos + 1 < self.path.len() => &self.path[pos + 1..],
            _ => &self.path,
        }
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_owned();
    }

    // ------------- Mode -------------
    /// Turns the record into a parameter; any variant model and value are
    /// dropped.
    pub fn set_parameter_model(&mut self, model: Arc<ParameterModel>) {
        self.variant_model = None;
        self.value = None;
        self.parameter_model = Some(model);
    }

    /// Turns the record into a variant; any parameter model and value are
    /// dropped.
    pub fn set_variant_model(&mut self, model: Arc<VariantModel>) {
        self.parameter_model = None;
        self.value = None;
        self.variant_model = Some(model);
    }

    pub fn parameter_model(&self) -> Option<&Arc<ParameterModel>> {
        self.parameter_model.as_ref()
    }
    pub fn variant_model(&self) -> Option<&Arc<VariantModel>> {
        self.variant_model.as_ref()
    }
    pub fn is_parameter(&self) -> bool {
        self.parameter_model.is_some()
    }
    pub fn is_variant(&self) -> bool {
        self.variant_model.is_some()
    }
    pub fn is_fixed_parameter(&self) -> bool {
        self.parameter_model.as_ref().is_some_and(|pm| pm.is_fixed())
    }

    // ------------- Tree -------------
    pub fn parent(&self) -> Option<RecordId> {
        self.parent
    }
    pub(crate) fn set_parent_id(&mut self, parent: RecordId) {
        self.parent = Some(parent);
    }

    /// Parameters and variants must alternate along the tree.
    pub fn check_parent(&self, parent: &VariantRecord) -> Result<()> {
        if (self.is_parameter() && parent.is_parameter()) || (self.is_variant() && parent.is_variant()) {
            return Err(VariantError::Logic(format!(
                "Record '{}' : incompatible parent/daughter relationship with '{}'",
                self.path, parent.path
            )));
        }
        if !parent.is_parameter() && !parent.is_variant() {
            return Err(VariantError::Logic(format!("Parent record '{}' has no model", parent.path)));
        }
        Ok(())
    }

    pub(crate) fn add_daughter(&mut self, name: &str, id: RecordId, rank: Option<u32>) -> Result<()> {
        if self.has_daughter(name) {
            return Err(VariantError::Logic(format!("Record '{}' already has a daughter named '{}'", self.path, name)));
        }
        if rank.is_some() && self.daughters.iter().any(|d| d.rank == rank) {
            return Err(VariantError::Logic(format!(
                "Record '{}' already has a daughter ranked {:?}",
                self.path, rank
            )));
        }
        self.daughters.push(Daughter { name: name.to_owned(), id, rank });
        self.compute_order();
        Ok(())
    }

    pub fn daughters(&self) -> &[Daughter] {
        &self.daughters
    }
    pub fn has_daughters(&self) -> bool {
        !self.daughters.is_empty()
    }
    pub fn has_daughter(&self, name: &str) -> bool {
        self.daughters.iter().any(|d| d.name == name)
    }
    pub fn daughter(&self, name: &str) -> Option<RecordId> {
        self.daughters.iter().find(|d| d.name == name).map(|d| d.id)
    }

    fn compute_order(&mut self) {
        let mut ranked: Vec<usize> = (0..self.daughters.len()).filter(|i| self.daughters[*i].rank.is_some()).collect();
        ranked.sort_by_key(|i| self.daughters[*i].rank);
        let unranked = (0..self.daughters.len()).filter(|i| self.daughters[*i].rank.is_none());
        self.ordered = ranked.into_iter().chain(unranked).collect();
    }

    /// Finalizes the record: daughter ordering is recomputed and mutations
    /// start cascading.
    pub fn build(&mut self) {
        self.compute_order();
        self.with_update = true;
    }

    /// Daughters, ranked ones by ascending rank first, then the others in
    /// insertion order.
    pub fn ordered_daughters(&self) -> impl Iterator<Item = &Daughter> {
        self.ordered.iter().map(|i| &self.daughters[*i])
    }
    pub fn ordered_daughter_names(&self) -> Vec<&str> {
        self.ordered_daughters().map(|d| d.name.as_str()).collect()
    }
    pub fn ranked_daughter_names(&self) -> Vec<&str> {
        self.ordered_daughters().filter(|d| d.rank.is_some()).map(|d| d.name.as_str()).collect()
    }
    pub fn unranked_daughter_names(&self) -> Vec<&str> {
        self.ordered_daughters().filter(|d| d.rank.is_none()).map(|d| d.name.as_str()).collect()
    }

    // ------------- State -------------
    pub fn is_active(&self) -> bool {
        self.active
    }
    pub(crate) fn set_active_flag(&mut self, active: bool) {
        self.active = active;
    }
    pub fn with_update(&self) -> bool {
        self.with_update
    }
    pub fn set_with_update(&mut self, with_update: bool) {
        self.with_update = with_update;
    }
    pub fn value(&self) -> Option<&ParameterValue> {
        self.value.as_ref()
    }
    pub(crate) fn store_value(&mut self, value: Option<ParameterValue>) {
        self.value = value;
    }
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    // ------------- Value queries -------------
    fn model_or_context_error(&self) -> CommandResult<&Arc<ParameterModel>> {
        self.parameter_model.as_ref().ok_or_else(|| {
            CommandError::new(ErrorCode::ParameterInvalidContext, format!("Record '{}' is not a parameter", self.path))
        })
    }

    fn typed_value(&self, value_type: ValueType) -> CommandResult<&ParameterValue> {
        let pm = self.model_or_context_error()?;
        if pm.value_type() != value_type {
            return Err(CommandError::new(
                ErrorCode::ParameterInvalidType,
                format!("Parameter record '{}' is not a {} parameter", self.path, value_type),
            ));
        }
        self.value.as_ref().ok_or_else(|| {
            CommandError::new(ErrorCode::ParameterUnsetValue, format!("Parameter record '{}' has no value set", self.path))
        })
    }

    pub fn value_is_set(&self) -> CommandResult<bool> {
        self.model_or_context_error()?;
        Ok(self.value.is_some())
    }

    /// Whether the current value is the model's default.
    pub fn default_value_is_set(&self) -> CommandResult<bool> {
        let pm = self.model_or_context_error()?;
        if pm.is_fixed() {
            return Err(CommandError::new(
                ErrorCode::ParameterInvalidContext,
                format!("Parameter record '{}' is fixed", self.path),
            ));
        }
        Ok(match (pm.default_value(), &self.value) {
            (Some(default), Some(value)) => default == value,
            _ => false,
        })
    }

    pub fn boolean_value(&self) -> CommandResult<bool> {
        match self.typed_value(ValueType::Boolean)? {
            ParameterValue::Boolean(b) => Ok(*b),
            _ => Err(self.corrupted()),
        }
    }
    pub fn integer_value(&self) -> CommandResult<i32> {
        match self.typed_value(ValueType::Integer)? {
            ParameterValue::Integer(i) => Ok(*i),
            _ => Err(self.corrupted()),
        }
    }
    pub fn real_value(&self) -> CommandResult<f64> {
        match self.typed_value(ValueType::Real)? {
            ParameterValue::Real(r) => Ok(*r),
            _ => Err(self.corrupted()),
        }
    }
    pub fn string_value(&self) -> CommandResult<String> {
        match self.typed_value(ValueType::String)? {
            ParameterValue::String(s) => Ok(s.clone()),
            _ => Err(self.corrupted()),
        }
    }

    fn corrupted(&self) -> CommandError {
        CommandError::new(ErrorCode::Failure, format!("Parameter record '{}' holds a value of the wrong type", self.path))
    }

    /// Textual encoding of the current value: `true`, `42`, `12.5 mm`,
    /// `"text"`.
    pub fn value_to_string(&self) -> CommandResult<String> {
        let pm = self.model_or_context_error()?;
        let value = self.value.as_ref().ok_or_else(|| {
            CommandError::new(ErrorCode::ParameterUnsetValue, format!("Parameter record '{}' has no value set", self.path))
        })?;
        Ok(match value {
            ParameterValue::Boolean(b) => write_boolean(*b).to_owned(),
            ParameterValue::Integer(i) => i.to_string(),
            ParameterValue::Real(r) => write_real(*r, pm.preferred_unit(), pm.unit_label()),
            ParameterValue::String(s) => write_quoted_string(s),
        })
    }

    /// Decodes `text` according to the type of the parameter. A real
    /// parameter with a unit label requires a unit of that dimension.
    pub fn parse_value(&self, text: &str) -> CommandResult<ParameterValue> {
        let pm = self.model_or_context_error()?;
        if pm.is_fixed() {
            return Err(CommandError::new(
                ErrorCode::ParameterInvalidContext,
                format!("Parameter record '{}' is fixed", self.path),
            ));
        }
        let parse_failure = || {
            CommandError::new(
                ErrorCode::ParsingFailure,
                format!("Invalid format '{}' for {} record '{}'", text, pm.value_type(), self.path),
            )
        };
        match pm.value_type() {
            ValueType::Boolean => read_boolean(text).map(ParameterValue::Boolean).ok_or_else(parse_failure),
            ValueType::Integer => read_integer(text).map(ParameterValue::Integer).ok_or_else(parse_failure),
            ValueType::String => read_quoted_string(text).map(ParameterValue::String).ok_or_else(parse_failure),
            ValueType::Real => {
                let quantity = units::parse_value_with_unit(text).map_err(|_| parse_failure())?;
                if let Some(label) = pm.unit_label() {
                    if quantity.dimension != Some(label) {
                        return Err(CommandError::new(
                            ErrorCode::ParameterInvalidUnit,
                            format!("Invalid unit in '{}' for real record '{}' expecting a {}", text, self.path, label),
                        ));
                    }
                }
                Ok(ParameterValue::Real(quantity.value(1.0)))
            }
        }
    }

    /// Value as written in profiles, the unset marker included.
    pub fn profile_token(&self) -> CommandResult<String> {
        match self.value_to_string() {
            Err(e) if e.code() == ErrorCode::ParameterUnsetValue => Ok(UNSET_LABEL.to_owned()),
            other => other,
        }
    }

    pub fn tree_dump(&self, indent: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}|-- Path: '{}'", indent, self.path);
        match self.parent {
            Some(id) => {
                let _ = writeln!(out, "{}|-- Parent: #{}", indent, id);
            }
            None => {
                let _ = writeln!(out, "{}|-- Parent: <none>", indent);
            }
        }
        let _ = writeln!(out, "{}|-- Daughters: {}", indent, self.daughters.len());
        for d in self.ordered_daughters() {
            let _ = writeln!(out, "{}|   |-- '{}' (#{})", indent, d.name, d.id);
        }
        let model = match (&self.parameter_model, &self.variant_model) {
            (Some(pm), _) => format!("'{}' (parameter)", pm.name()),
            (_, Some(vm)) => format!("'{}' (variant)", vm.name()),
            _ => "<none>".to_owned(),
        };
        let _ = writeln!(out, "{}|-- Model: {}", indent, model);
        if self.is_parameter() {
            let _ = writeln!(out, "{}|-- Value: {}", indent, self.profile_token().unwrap_or_default());
        }
        let _ = writeln!(out, "{}`-- Active: {}", indent, self.active);
        out
    }
}
