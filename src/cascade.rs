//! Mutation of a registry's records: value assignment, enablement checks
//! against the local and global dependency models, and the activation
//! cascades that keep the tree consistent.
//!
//! An [`Editor`] borrows a registry mutably. When the registry is mounted in
//! a repository, the editor also carries a [`GlobalScope`] giving read access
//! to the global dependency model and to the other registries. Values of
//! parameters living in other registries cannot be fixed while this registry
//! is borrowed; those fixes are queued in the scope and applied by the
//! repository once the edit is over.

use std::collections::BTreeSet;

use tracing::{debug, error};

use crate::datatype::{ParameterValue, is_quoted, read_quoted_string};
use crate::dependency::DependencyContext;
use crate::dependency_model::DependencyModel;
use crate::error::{CommandError, CommandResult, ErrorCode, Result, VariantError};
use crate::object_info::{PARSE_NO_GLOBAL, PARSE_NO_LOCAL, VariantObjectInfo};
use crate::record::RecordId;
use crate::registry::{Registry, TOP_RECORD_PATH};

/// Read access to the registries of a repository other than the one being
/// edited.
pub trait PeerRegistries {
    fn peer(&self, key: &str) -> Option<&Registry>;
}

/// Parameter of another registry whose value must be checked again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredFix {
    pub registry: String,
    pub path: String,
}

pub struct GlobalScope<'s> {
    key: String,
    model: Option<&'s DependencyModel>,
    peers: &'s dyn PeerRegistries,
    deferred: Vec<DeferredFix>,
}

impl<'s> GlobalScope<'s> {
    pub fn new(key: &str, model: Option<&'s DependencyModel>, peers: &'s dyn PeerRegistries) -> Self {
        Self { key: key.to_owned(), model, peers, deferred: Vec::new() }
    }
    pub fn key(&self) -> &str {
        &self.key
    }
    pub fn take_deferred(&mut self) -> Vec<DeferredFix> {
        std::mem::take(&mut self.deferred)
    }
}

/// The repository as seen by global dependencies while one of its
/// registries is lent to an editor.
pub struct GlobalView<'a> {
    key: &'a str,
    this: &'a Registry,
    peers: &'a dyn PeerRegistries,
}

impl<'a> GlobalView<'a> {
    pub fn new(key: &'a str, this: &'a Registry, peers: &'a dyn PeerRegistries) -> Self {
        Self { key, this, peers }
    }
    fn resolve(&self, name: &str) -> Option<&'a Registry> {
        if name == self.key { Some(self.this) } else { self.peers.peer(name) }
    }
}

impl DependencyContext for GlobalView<'_> {
    fn check_active_variant(&self, dependee: &VariantObjectInfo) -> Result<bool> {
        let registry = self.resolve(dependee.registry_name()).ok_or_else(|| {
            VariantError::Logic(format!("Variant repository has no registry named '{}'", dependee.registry_name()))
        })?;
        registry.is_active_variant(dependee.local_path())
    }
    fn has_registry(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }
    fn has_variant(&self, info: &VariantObjectInfo) -> bool {
        self.resolve(info.registry_name()).is_some_and(|r| r.has_variant_record(info.local_path()))
    }
    fn has_parameter(&self, info: &VariantObjectInfo) -> bool {
        self.resolve(info.registry_name()).is_some_and(|r| r.has_parameter_record(info.local_path()))
    }
    fn parameter_has_group(&self, info: &VariantObjectInfo) -> bool {
        self.resolve(info.registry_name()).is_some_and(|r| r.parameter_has_group(info))
    }
}

fn failure(e: VariantError) -> CommandError {
    error!(error = %e, "cascade failed");
    CommandError::new(ErrorCode::Failure, e.to_string())
}

pub struct Editor<'r, 's> {
    registry: &'r mut Registry,
    global: Option<&'r mut GlobalScope<'s>>,
}

impl<'r, 's> Editor<'r, 's> {
    pub fn new(registry: &'r mut Registry, global: Option<&'r mut GlobalScope<'s>>) -> Self {
        Self { registry, global }
    }

    pub fn registry(&self) -> &Registry {
        &*self.registry
    }

    fn id_of(&self, path: &str) -> CommandResult<RecordId> {
        self.registry.record_id(path).ok_or_else(|| {
            CommandError::new(ErrorCode::ParameterInvalidKey, format!("Record with path '{}' does not exist", path))
        })
    }

    fn global_model(&self) -> Option<(&GlobalScope<'s>, &'s DependencyModel)> {
        let scope = self.global.as_deref()?;
        scope.model.map(|m| (scope, m))
    }

    fn local_evaluate(&self, info: &VariantObjectInfo) -> Result<Option<bool>> {
        match self.registry.dependency_model().and_then(|m| m.dependency(&info.full_path())) {
            Some(dependency) => Ok(Some(dependency.evaluate(&*self.registry)?)),
            None => Ok(None),
        }
    }

    fn global_evaluate(&self, info: &VariantObjectInfo) -> Result<Option<bool>> {
        let Some((scope, model)) = self.global_model() else {
            return Ok(None);
        };
        match model.dependency(&info.full_path()) {
            Some(dependency) => {
                let view = GlobalView::new(&scope.key, &*self.registry, scope.peers);
                Ok(Some(dependency.evaluate(&view)?))
            }
            None => Ok(None),
        }
    }

    fn global_key(&self) -> Option<String> {
        self.global_model().map(|(scope, _)| scope.key.clone())
    }

    fn parameter_path(&self, id: RecordId) -> Result<String> {
        let record = &self.registry.records()[id];
        if !record.is_parameter() {
            return Err(VariantError::Logic(format!("Record '{}' is not a parameter", record.path())));
        }
        Ok(record.path().to_owned())
    }

    // ------------- Enablement -------------
    /// A parameter is enabled unless a dependency guarding it says
    /// otherwise, locally first, then globally.
    pub fn check_enabled_parameter(&self, id: RecordId) -> Result<bool> {
        let path = self.parameter_path(id)?;
        let mut enabled = true;
        if let Some(false) = self.local_evaluate(&VariantObjectInfo::make_local_parameter(&path))? {
            enabled = false;
        }
        if enabled {
            if let Some(key) = self.global_key() {
                if let Some(false) = self.global_evaluate(&VariantObjectInfo::make_parameter(&key, &path))? {
                    enabled = false;
                }
            }
        }
        Ok(enabled)
    }

    /// Whether the value group `group` of the parameter is enabled.
    pub fn check_enabled_group(&self, id: RecordId, group: &str) -> Result<bool> {
        let path = self.parameter_path(id)?;
        let has_group = self.registry.records()[id].parameter_model().is_some_and(|pm| pm.has_group(group));
        if !has_group {
            return Err(VariantError::Domain(format!("Parameter '{}' has no group named '{}'", path, group)));
        }
        let mut enabled = true;
        if let Some(false) = self.local_evaluate(&VariantObjectInfo::make_local_parameter_value_group(&path, group))? {
            enabled = false;
        }
        if enabled {
            if let Some(key) = self.global_key() {
                let info = VariantObjectInfo::make_parameter_value_group(&key, &path, group);
                if let Some(false) = self.global_evaluate(&info)? {
                    enabled = false;
                }
            }
        }
        Ok(enabled)
    }

    /// Whether `value` may be given to the parameter: the model accepts it,
    /// and the dependencies on its group and on the variants it triggers
    /// allow it. Each dependency found sets the outcome; the global scan of
    /// triggered variants stops at the first refusal while the local one
    /// goes on.
    pub fn check_enabled_value(&self, id: RecordId, value: &ParameterValue) -> Result<bool> {
        let path = self.parameter_path(id)?;
        let record = &self.registry.records()[id];
        let Some(pm) = record.parameter_model() else {
            return Ok(false);
        };
        if !pm.is_value_valid(value) {
            return Ok(false);
        }
        let group = pm.value_group(value).map(str::to_owned);
        // paths of the daughter variants this value would activate
        let triggered: Vec<String> = if record.has_daughters() {
            let names: BTreeSet<String> = pm.find_variants_associated_to(value);
            record
                .ordered_daughters()
                .filter(|d| names.contains(&d.name))
                .map(|d| self.registry.records()[d.id].path().to_owned())
                .collect()
        } else {
            Vec::new()
        };

        let mut enabled = true;
        if let Some(group) = &group {
            let info = VariantObjectInfo::make_local_parameter_value_group(&path, group);
            if let Some(outcome) = self.local_evaluate(&info)? {
                enabled = outcome;
            }
        }
        for variant_path in &triggered {
            if let Some(outcome) = self.local_evaluate(&VariantObjectInfo::make_local_variant(variant_path))? {
                enabled = outcome;
            }
        }

        if enabled {
            if let Some(key) = self.global_key() {
                if let Some(group) = &group {
                    let info = VariantObjectInfo::make_parameter_value_group(&key, &path, group);
                    if let Some(outcome) = self.global_evaluate(&info)? {
                        enabled = outcome;
                    }
                }
                for variant_path in &triggered {
                    match self.global_evaluate(&VariantObjectInfo::make_variant(&key, variant_path))? {
                        Some(false) => {
                            enabled = false;
                            break;
                        }
                        Some(true) => enabled = true,
                        None => {}
                    }
                }
            }
        }
        Ok(enabled)
    }

    pub fn is_value_valid(&self, path: &str, value: &ParameterValue) -> CommandResult<bool> {
        let id = self.id_of(path)?;
        self.check_enabled_value(id, value).map_err(failure)
    }
    pub fn is_boolean_valid(&self, path: &str, value: bool) -> CommandResult<bool> {
        self.is_value_valid(path, &ParameterValue::Boolean(value))
    }
    pub fn is_integer_valid(&self, path: &str, value: i32) -> CommandResult<bool> {
        self.is_value_valid(path, &ParameterValue::Integer(value))
    }
    pub fn is_real_valid(&self, path: &str, value: f64) -> CommandResult<bool> {
        self.is_value_valid(path, &ParameterValue::Real(value))
    }
    pub fn is_string_valid(&self, path: &str, value: &str) -> CommandResult<bool> {
        self.is_value_valid(path, &ParameterValue::String(value.to_owned()))
    }

    // ------------- Values -------------
    /// Assigns `value` after checking the record kind, the value type and
    /// the enablement of the value, then cascades. When the cascade fails the
    /// registry is left as it was before the assignment.
    pub fn set_value_of(&mut self, id: RecordId, value: ParameterValue) -> CommandResult {
        let record = &self.registry.records()[id];
        let pm = record.parameter_model().ok_or_else(|| {
            CommandError::new(ErrorCode::ParameterInvalidContext, format!("Record '{}' is not a parameter", record.path()))
        })?;
        if pm.value_type() != value.value_type() {
            return Err(CommandError::new(
                ErrorCode::ParameterInvalidType,
                format!("Parameter record '{}' is not a {} parameter", record.path(), value.value_type()),
            ));
        }
        if !self.check_enabled_value(id, &value).map_err(failure)? {
            let record = &self.registry.records()[id];
            return Err(CommandError::new(
                ErrorCode::ParameterInvalidValue,
                format!("Parameter record '{}' does not accept {} value '{}'", record.path(), value.value_type(), value),
            ));
        }
        self.assign(id, Some(value)).map_err(failure)
    }

    // a failed cascade leaves the records and the queued fixes as they were
    fn assign(&mut self, id: RecordId, value: Option<ParameterValue>) -> Result<()> {
        let record = self.registry.record_mut(id);
        record.store_value(value);
        if !record.with_update() {
            return Ok(());
        }
        let saved = self.registry.records().to_vec();
        let queued = self.global.as_deref().map_or(0, |scope| scope.deferred.len());
        if let Err(e) = self.update_record(id) {
            self.registry.restore_records(saved);
            if let Some(scope) = self.global.as_deref_mut() {
                scope.deferred.truncate(queued);
            }
            return Err(e);
        }
        Ok(())
    }

    pub fn set_value(&mut self, path: &str, value: ParameterValue) -> CommandResult {
        let id = self.id_of(path)?;
        self.set_value_of(id, value)
    }
    pub fn set_boolean_value(&mut self, path: &str, value: bool) -> CommandResult {
        self.set_value(path, ParameterValue::Boolean(value))
    }
    pub fn set_integer_value(&mut self, path: &str, value: i32) -> CommandResult {
        self.set_value(path, ParameterValue::Integer(value))
    }
    pub fn set_real_value(&mut self, path: &str, value: f64) -> CommandResult {
        self.set_value(path, ParameterValue::Real(value))
    }
    pub fn set_string_value(&mut self, path: &str, value: &str) -> CommandResult {
        self.set_value(path, ParameterValue::String(value.to_owned()))
    }

    pub fn unset_value(&mut self, path: &str) -> CommandResult {
        let id = self.id_of(path)?;
        let record = &self.registry.records()[id];
        if !record.is_parameter() {
            return Err(CommandError::new(
                ErrorCode::ParameterInvalidContext,
                format!("Record '{}' is not a parameter", record.path()),
            ));
        }
        self.assign(id, None).map_err(failure)
    }

    pub fn set_fixed_value(&mut self, path: &str) -> CommandResult {
        let id = self.id_of(path)?;
        let record = &self.registry.records()[id];
        let fixed = record
            .parameter_model()
            .filter(|pm| pm.is_fixed())
            .and_then(|pm| pm.fixed_value())
            .cloned()
            .ok_or_else(|| {
                CommandError::new(
                    ErrorCode::ParameterInvalidContext,
                    format!("Record '{}' is not a fixed parameter", record.path()),
                )
            })?;
        self.set_value_of(id, fixed)
    }

    pub fn set_default_value(&mut self, path: &str) -> CommandResult {
        let id = self.id_of(path)?;
        let record = &self.registry.records()[id];
        let default = record
            .parameter_model()
            .filter(|pm| !pm.is_fixed())
            .and_then(|pm| pm.default_value())
            .cloned()
            .ok_or_else(|| {
                CommandError::new(
                    ErrorCode::ParameterInvalidContext,
                    format!("Parameter record '{}' has no default value", record.path()),
                )
            })?;
        self.set_value_of(id, default)
    }

    /// Parses `text` with the parameter's encoding and assigns it.
    pub fn string_to_value(&mut self, path: &str, text: &str) -> CommandResult {
        let id = self.id_of(path)?;
        let value = self.registry.records()[id].parse_value(text)?;
        self.set_value_of(id, value)
    }

    pub fn value_to_string(&self, path: &str) -> CommandResult<String> {
        let id = self.id_of(path)?;
        self.registry.records()[id].value_to_string()
    }

    /// Sets a parameter from a command token. The parameter must exist, be
    /// active and not fixed. String tokens may be given without quotes; a
    /// quoted token is unescaped.
    pub fn cmd_set_parameter_value(&mut self, path: &str, token: &str) -> CommandResult {
        let record = self.registry.parameter_record(path).map_err(|e| {
            CommandError::new(ErrorCode::ParameterInvalidKey, e.to_string())
        })?;
        if !record.is_active() {
            return Err(CommandError::new(
                ErrorCode::ParameterInvalidContext,
                format!("Parameter record '{}' is not active", path),
            ));
        }
        if record.is_fixed_parameter() {
            return Err(CommandError::new(
                ErrorCode::ParameterInvalidContext,
                format!("Parameter record '{}' has a fixed value", path),
            ));
        }
        if record.parameter_model().is_some_and(|pm| pm.is_string()) {
            let token = token.trim();
            if !is_quoted(token) {
                return self.set_string_value(path, token);
            }
            let text = read_quoted_string(token).ok_or_else(|| {
                CommandError::new(ErrorCode::ParsingFailure, format!("Invalid string '{}' for record '{}'", token, path))
            })?;
            return self.set_string_value(path, &text);
        }
        self.string_to_value(path, token)
    }

    // ------------- Activation -------------
    /// Changes the activity of a record. Returns whether it changed; an
    /// unchanged activity triggers no cascade.
    pub fn set_active_of(&mut self, id: RecordId, active: bool) -> Result<bool> {
        let record = self.registry.record_mut(id);
        if record.is_active() == active {
            return Ok(false);
        }
        record.set_active_flag(active);
        if record.with_update() {
            self.update_record(id)?;
        }
        Ok(true)
    }

    pub fn set_active(&mut self, path: &str, active: bool) -> CommandResult<bool> {
        let id = self.id_of(path)?;
        self.set_active_of(id, active).map_err(failure)
    }

    pub fn update(&mut self, path: &str) -> CommandResult {
        let id = self.id_of(path)?;
        if self.registry.records()[id].with_update() {
            self.update_record(id).map_err(failure)?;
        }
        Ok(())
    }

    /// Runs the cascade of a record whatever its update flag.
    pub fn forced_update(&mut self, path: &str) -> CommandResult {
        let id = self.id_of(path)?;
        self.update_record(id).map_err(failure)
    }

    pub(crate) fn forced_update_record(&mut self, id: RecordId) -> Result<()> {
        self.update_record(id)
    }

    /// Cascades from the top record of the registry.
    pub fn update_registry(&mut self) -> Result<()> {
        match self.registry.top_record_id() {
            Some(top) => self.update_record(top),
            None => Ok(()),
        }
    }

    fn update_record(&mut self, id: RecordId) -> Result<()> {
        let record = &self.registry.records()[id];
        if record.is_parameter() {
            self.update_parameter(id)
        } else if record.is_variant() {
            self.update_variant(id)
        } else {
            Ok(())
        }
    }

    fn update_parameter(&mut self, id: RecordId) -> Result<()> {
        let record = &self.registry.records()[id];
        let daughters: Vec<RecordId> = record.ordered_daughters().map(|d| d.id).collect();
        for daughter in &daughters {
            if self.registry.records()[*daughter].is_active() {
                self.set_active_of(*daughter, false)?;
            }
        }
        let record = &self.registry.records()[id];
        let (Some(value), Some(pm)) = (record.value(), record.parameter_model()) else {
            return Ok(());
        };
        let names = pm.find_variants_associated_to(value);
        if !record.is_active() || names.is_empty() {
            return Ok(());
        }
        let mut to_activate = Vec::with_capacity(names.len());
        for name in &names {
            let daughter = record.daughter(name).ok_or_else(|| {
                VariantError::Invariant(format!("Parameter record '{}' has no activable variant named '{}'", record.path(), name))
            })?;
            to_activate.push(daughter);
        }
        // triggered variants are activated in daughter order
        let ordered: Vec<RecordId> = record.ordered_daughters().map(|d| d.id).filter(|d| to_activate.contains(d)).collect();
        debug!(registry = %self.registry.name(), path = %record.path(), variants = ordered.len(), "activating variants");
        for daughter in ordered {
            if !self.registry.records()[daughter].is_active() {
                self.set_active_of(daughter, true)?;
            }
        }
        Ok(())
    }

    fn update_variant(&mut self, id: RecordId) -> Result<()> {
        let record = &self.registry.records()[id];
        let active = record.is_active();
        let daughters: Vec<RecordId> = record.ordered_daughters().map(|d| d.id).collect();
        for daughter in daughters {
            if self.registry.records()[daughter].is_active() != active {
                self.set_active_of(daughter, active)?;
            }
        }
        self.fix_dependers_on_variant(id)
    }

    // ------------- Depender fix-up -------------
    fn fix_dependers_on_variant(&mut self, id: RecordId) -> Result<()> {
        let path = self.registry.records()[id].path().to_owned();
        if path == TOP_RECORD_PATH {
            return Ok(());
        }
        let mut to_fix: Vec<RecordId> = Vec::new();
        if let Some(model) = self.registry.dependency_model() {
            let dependee = VariantObjectInfo::make_local_variant(&path).full_path();
            for depender in model.dependers_of(&dependee).into_iter().flatten() {
                let mut info = VariantObjectInfo::new();
                if !info.parse_from_string(depender, PARSE_NO_GLOBAL) {
                    error!(registry = %self.registry.name(), depender = %depender, "unparsable local depender");
                    return Err(VariantError::Logic(format!("Cannot parse local depender '{}'", depender)));
                }
                if info.is_parameter_value_group() {
                    to_fix.push(self.owner_of(&info)?);
                }
            }
        }
        if let Some((scope, model)) = self.global_model() {
            let dependee = VariantObjectInfo::make_variant(&scope.key, &path).full_path();
            let mut deferred = Vec::new();
            for depender in model.dependers_of(&dependee).into_iter().flatten() {
                let mut info = VariantObjectInfo::new();
                if !info.parse_from_string(depender, PARSE_NO_LOCAL) {
                    error!(registry = %scope.key, depender = %depender, "unparsable global depender");
                    return Err(VariantError::Logic(format!("Cannot parse global depender '{}'", depender)));
                }
                if !info.is_valid() || !info.is_parameter_value_group() {
                    continue;
                }
                if info.registry_name() == scope.key {
                    to_fix.push(self.owner_of(&info)?);
                } else {
                    deferred.push(DeferredFix {
                        registry: info.registry_name().to_owned(),
                        path: info.local_path().to_owned(),
                    });
                }
            }
            if let Some(scope) = self.global.as_deref_mut() {
                scope.deferred.extend(deferred);
            }
        }
        for parameter in to_fix {
            self.fix_parameter_value_of(parameter)?;
        }
        Ok(())
    }

    fn owner_of(&self, info: &VariantObjectInfo) -> Result<RecordId> {
        self.registry
            .record_id(info.local_path())
            .filter(|id| self.registry.records()[*id].is_parameter())
            .ok_or_else(|| VariantError::Logic(format!("No parameter record for depender '{}'", info)))
    }

    /// Checks the value of an active parameter against the current state.
    /// A rejected value is unset and replaced by the default when the
    /// default is itself accepted.
    pub(crate) fn fix_parameter_value_of(&mut self, id: RecordId) -> Result<()> {
        let record = &self.registry.records()[id];
        if !record.is_active() {
            return Ok(());
        }
        let Some(value) = record.value().cloned() else {
            return Ok(());
        };
        if self.check_enabled_value(id, &value)? {
            return Ok(());
        }
        let default = record.parameter_model().and_then(|pm| pm.default_value()).cloned();
        debug!(registry = %self.registry.name(), path = %record.path(), value = %value, "value is no longer enabled");
        self.assign(id, None)?;
        if let Some(default) = default {
            if self.check_enabled_value(id, &default)? {
                self.assign(id, Some(default))?;
            }
        }
        Ok(())
    }

    pub fn fix_parameter_value(&mut self, path: &str) -> Result<()> {
        let id = self
            .registry
            .record_id(path)
            .ok_or_else(|| VariantError::Logic(format!("Parameter record with path '{}' does not exist", path)))?;
        self.fix_parameter_value_of(id)
    }

    /// Fixes the owners of every parameter value group guarded by a local
    /// dependency.
    pub(crate) fn fix_local_dependers(&mut self) -> Result<()> {
        let owners: Vec<RecordId> = match self.registry.dependency_model() {
            Some(model) => model
                .dependencies()
                .map(|d| d.depender())
                .filter(|info| info.is_parameter_value_group())
                .filter_map(|info| self.registry.record_id(info.local_path()))
                .collect(),
            None => Vec::new(),
        };
        for id in owners {
            self.fix_parameter_value_of(id)?;
        }
        Ok(())
    }

    /// Fixes the parameters of this registry owning a value group guarded
    /// by a global dependency.
    pub(crate) fn fix_global_dependers(&mut self) -> Result<()> {
        let Some((scope, model)) = self.global_model() else {
            return Ok(());
        };
        let owners: Vec<RecordId> = model
            .dependencies()
            .map(|d| d.depender())
            .filter(|info| info.is_parameter_value_group() && info.registry_name() == scope.key)
            .filter_map(|info| self.registry.record_id(info.local_path()))
            .collect();
        for id in owners {
            self.fix_parameter_value_of(id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::manager::RegistryManager;
    use crate::parameter_model::{ParameterModel, VariableMode};
    use crate::datatype::ValueType;
    use crate::variant_model::VariantModel;

    fn geometry() -> Registry {
        let manager = RegistryManager::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/geometry.toml"))
            .expect("geometry models load");
        Registry::from_manager(&manager).expect("registry builds")
    }

    // "advanced" triggers a variant the record has no daughter for
    fn broken_layout() -> Arc<ParameterModel> {
        let mut pm = ParameterModel::new("layout.PM", ValueType::String);
        pm.set_variable_mode(VariableMode::Enumeration);
        pm.add_variant("elsewhere", Arc::new(VariantModel::new("elsewhere.VM")), "").unwrap();
        pm.add_enumerated_value(ParameterValue::String("basic".into()), None, vec!["if_basic".into()]).unwrap();
        pm.add_enumerated_value(ParameterValue::String("advanced".into()), None, vec!["elsewhere".into()]).unwrap();
        Arc::new(pm)
    }

    #[test]
    fn failed_cascades_leave_the_registry_unchanged() {
        let mut registry = geometry();
        let layout = registry.record_id("layout").unwrap();
        registry.record_mut(layout).set_parameter_model(broken_layout());
        registry.record_mut(layout).store_value(Some(ParameterValue::String("basic".into())));
        let before = registry.tree_dump("");
        let err = registry.edit().set_string_value("layout", "advanced").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Failure);
        assert!(err.message().contains("no activable variant named 'elsewhere'"));
        assert_eq!(registry.tree_dump(""), before);
        assert!(registry.is_active_variant("layout/if_basic").unwrap());
        assert_eq!(registry.edit().value_to_string("layout").unwrap(), "\"basic\"");
    }
}
