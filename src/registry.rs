//! A registry owns the record tree instantiated from a [`RegistryManager`],
//! routes lookups by path and carries the optional local dependency model.
//!
//! Records are stored in a flat table and linked by [`RecordId`]; the path
//! index maps each record path to its slot. The top variant record lives at
//! path `/` and its parameters are addressed by their bare names.

use std::collections::HashMap;
use std::fmt::Write;
use std::hash::BuildHasherDefault;
use std::sync::Arc;

// used for fast string keyed lookups
use seahash::SeaHasher;
use tracing::{debug, info};

use crate::cascade::Editor;
use crate::dependency::{DependencyContext, DependencyScope};
use crate::dependency_model::DependencyModel;
use crate::error::{CommandError, CommandResult, ErrorCode, Result, VariantError};
use crate::manager::RegistryManager;
use crate::object_info::{VariantObjectInfo, validate_instance_name};
use crate::parameter_model::ParameterModel;
use crate::record::{RecordId, VariantRecord};
use crate::setup::DependencyModelSetup;
use crate::variant_model::VariantModel;

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

/// Path of the record built from the top variant model.
pub const TOP_RECORD_PATH: &str = "/";

#[derive(Debug, Clone, Default)]
pub struct Registry {
    name: String,
    display_name: String,
    description: String,
    top_variant_name: String,
    records: Vec<VariantRecord>,
    index: HashMap<String, RecordId, OtherHasher>,
    dependency_model: Option<DependencyModel>,
    mount: Option<String>,
    initialized: bool,
}

impl Registry {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_owned(), ..Self::default() }
    }

    /// Builds a registry named after its manager, with the manager's top
    /// variant and local dependencies.
    pub fn from_manager(manager: &RegistryManager) -> Result<Self> {
        let mut registry = Self::default();
        registry.initialize_from(manager, None, "", "", "")?;
        if let Some(setup) = manager.local_dependencies() {
            registry.load_local_dependency_model(setup)?;
        }
        Ok(registry)
    }

    /// Instantiates the record tree of `manager` starting from
    /// `top_variant_name` (the manager's own top variant when `None`). Empty
    /// names are taken from the manager.
    pub fn initialize_from(
        &mut self,
        manager: &RegistryManager,
        top_variant_name: Option<&str>,
        name: &str,
        display_name: &str,
        description: &str,
    ) -> Result<()> {
        if self.initialized {
            return Err(VariantError::Logic(format!("Registry '{}' is already initialized", self.name)));
        }
        let top_variant_name = top_variant_name.unwrap_or(manager.top_variant_name());
        let top_model = manager.variant_model(top_variant_name).cloned().ok_or_else(|| {
            VariantError::Logic(format!("Variant registry manager has no variant named '{}'", top_variant_name))
        })?;
        for (field, given, fallback) in [
            (&mut self.name, name, manager.name()),
            (&mut self.display_name, display_name, manager.display_name()),
            (&mut self.description, description, manager.description()),
        ] {
            if !given.is_empty() {
                *field = given.to_owned();
            } else if field.is_empty() {
                *field = fallback.to_owned();
            }
        }
        if !validate_instance_name(&self.name) {
            return Err(VariantError::Logic(format!("Invalid registry name '{}'", self.name)));
        }
        let top = self.add_record(TOP_RECORD_PATH)?;
        self.records[top].set_variant_model(top_model.clone());
        self.records[top].set_description(top_model.description());
        self.records[top].set_active_flag(true);
        self.build_parameter_records(&top_model, top)?;
        self.top_variant_name = top_variant_name.to_owned();
        for record in &mut self.records {
            record.build();
        }
        self.initialized = true;
        self.edit().forced_update_record(top)?;
        info!(registry = %self.name, records = self.records.len(), "registry initialized");
        Ok(())
    }

    fn build_parameter_records(&mut self, model: &VariantModel, parent: RecordId) -> Result<()> {
        let prefix = match self.records[parent].path() {
            TOP_RECORD_PATH => String::new(),
            path => format!("{}/", path),
        };
        for slot in model.parameters() {
            for name in slot.record_names() {
                let id = self.add_record(&format!("{}{}", prefix, name))?;
                self.records[id].set_description(&slot.description);
                self.records[id].set_parameter_model(slot.model.clone());
                self.set_parent(id, parent, &name, slot.rank)?;
                let pm = &slot.model;
                let initial = if pm.is_fixed() {
                    Some(pm.fixed_value().cloned().ok_or_else(|| {
                        VariantError::Logic(format!("Fixed parameter model '{}' has no fixed value", pm.name()))
                    })?)
                } else {
                    pm.default_value().cloned()
                };
                self.records[id].store_value(initial);
                self.build_variant_records(pm, id)?;
            }
        }
        Ok(())
    }

    fn build_variant_records(&mut self, model: &Arc<ParameterModel>, parent: RecordId) -> Result<()> {
        for entry in model.variants() {
            let path = format!("{}/{}", self.records[parent].path(), entry.name);
            let id = self.add_record(&path)?;
            self.records[id].set_description(&entry.description);
            self.records[id].set_variant_model(entry.model.clone());
            self.set_parent(id, parent, &entry.name, None)?;
            self.build_parameter_records(&entry.model, id)?;
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Drops every record and the dependency model. A mounted registry
    /// cannot be reset.
    pub fn reset(&mut self) -> Result<()> {
        if let Some(key) = &self.mount {
            return Err(VariantError::Logic(format!("Registry '{}' is mounted as '{}'", self.name, key)));
        }
        self.records.clear();
        self.index.clear();
        self.dependency_model = None;
        self.top_variant_name.clear();
        self.initialized = false;
        Ok(())
    }

    // ------------- Naming -------------
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        if !validate_instance_name(name) {
            return Err(VariantError::Logic(format!("Invalid registry name '{}'", name)));
        }
        self.name = name.to_owned();
        Ok(())
    }
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
    pub fn set_display_name(&mut self, display_name: &str) {
        self.display_name = display_name.to_owned();
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_owned();
    }
    pub fn top_variant_name(&self) -> &str {
        &self.top_variant_name
    }

    // ------------- Records -------------
    pub fn add_record(&mut self, path: &str) -> Result<RecordId> {
        if self.index.contains_key(path) {
            return Err(VariantError::Logic(format!("Record with path '{}' already exists", path)));
        }
        let id = self.records.len();
        self.records.push(VariantRecord::new(path));
        self.index.insert(path.to_owned(), id);
        Ok(id)
    }

    /// Links `child` under `parent` as the daughter `name`.
    pub fn set_parent(&mut self, child: RecordId, parent: RecordId, name: &str, rank: Option<u32>) -> Result<()> {
        if child == parent || child >= self.records.len() || parent >= self.records.len() {
            return Err(VariantError::Range(format!("Invalid parent/daughter records #{} and #{}", parent, child)));
        }
        self.records[child].check_parent(&self.records[parent])?;
        self.records[parent].add_daughter(name, child, rank)?;
        self.records[child].set_parent_id(parent);
        Ok(())
    }

    pub fn records(&self) -> &[VariantRecord] {
        &self.records
    }
    pub fn record(&self, id: RecordId) -> Option<&VariantRecord> {
        self.records.get(id)
    }
    pub(crate) fn record_mut(&mut self, id: RecordId) -> &mut VariantRecord {
        &mut self.records[id]
    }
    pub(crate) fn restore_records(&mut self, records: Vec<VariantRecord>) {
        self.records = records;
    }
    pub fn record_id(&self, path: &str) -> Option<RecordId> {
        self.index.get(path).copied()
    }
    pub fn record_by_path(&self, path: &str) -> Option<&VariantRecord> {
        self.record_id(path).map(|id| &self.records[id])
    }
    pub fn top_record_id(&self) -> Option<RecordId> {
        self.record_id(TOP_RECORD_PATH)
    }

    pub fn has_variant_record(&self, path: &str) -> bool {
        self.record_by_path(path).is_some_and(|r| r.is_variant())
    }
    pub fn has_parameter_record(&self, path: &str) -> bool {
        self.record_by_path(path).is_some_and(|r| r.is_parameter())
    }

    pub fn variant_record(&self, path: &str) -> Result<&VariantRecord> {
        self.record_by_path(path)
            .filter(|r| r.is_variant())
            .ok_or_else(|| VariantError::Logic(format!("Variant record with path '{}' does not exist", path)))
    }
    pub fn parameter_record(&self, path: &str) -> Result<&VariantRecord> {
        self.record_by_path(path)
            .filter(|r| r.is_parameter())
            .ok_or_else(|| VariantError::Logic(format!("Parameter record with path '{}' does not exist", path)))
    }

    pub fn is_active_variant(&self, path: &str) -> Result<bool> {
        Ok(self.variant_record(path)?.is_active())
    }
    pub fn is_active_parameter(&self, path: &str) -> Result<bool> {
        Ok(self.parameter_record(path)?.is_active())
    }

    /// Paths of the active parameters without value.
    pub fn list_of_unset_parameters(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.is_parameter() && r.is_active() && !r.has_value())
            .map(|r| r.path().to_owned())
            .collect()
    }

    pub fn is_accomplished(&self) -> bool {
        self.list_of_unset_parameters().is_empty()
    }

    // ------------- Dependencies -------------
    pub fn has_dependency_model(&self) -> bool {
        self.dependency_model.is_some()
    }
    pub fn dependency_model(&self) -> Option<&DependencyModel> {
        self.dependency_model.as_ref()
    }

    /// Builds the local dependency model against this registry's records,
    /// then fixes the values its dependencies now reject.
    pub fn load_local_dependency_model(&mut self, setup: &DependencyModelSetup) -> Result<()> {
        if self.dependency_model.is_some() {
            return Err(VariantError::Logic(format!("Registry '{}' already has a local dependency model", self.name)));
        }
        let mut model = DependencyModel::from_setup(DependencyScope::Local, setup)?;
        model.initialize(&*self)?;
        debug!(registry = %self.name, dependencies = model.dependencies().count(), "local dependency model loaded");
        self.dependency_model = Some(model);
        self.edit().fix_local_dependers()?;
        Ok(())
    }

    // ------------- Mounting -------------
    pub fn has_parent_repository(&self) -> bool {
        self.mount.is_some()
    }
    /// Key under which the registry is mounted in a repository.
    pub fn mount_key(&self) -> Option<&str> {
        self.mount.as_deref()
    }
    pub fn set_parent_repository(&mut self, key: &str) -> Result<()> {
        if let Some(existing) = &self.mount {
            return Err(VariantError::Logic(format!(
                "Registry '{}' is already mounted in a repository as '{}'",
                self.name, existing
            )));
        }
        self.mount = Some(key.to_owned());
        Ok(())
    }
    pub fn reset_parent_repository(&mut self) {
        self.mount = None;
    }

    // ------------- Editing -------------
    /// Mutating access with local cascades only.
    pub fn edit(&mut self) -> Editor<'_, '_> {
        Editor::new(self, None)
    }

    // ------------- Commands -------------
    pub fn cmd_has_variant(&self, path: &str) -> CommandResult<bool> {
        Ok(self.has_variant_record(path))
    }

    pub fn cmd_is_active_variant(&self, path: &str) -> CommandResult<bool> {
        self.variant_record(path)
            .map(|r| r.is_active())
            .map_err(|e| CommandError::new(ErrorCode::ParameterInvalidKey, e.to_string()))
    }

    pub fn cmd_get_parameter_value(&self, path: &str) -> CommandResult<String> {
        let record = self
            .parameter_record(path)
            .map_err(|e| CommandError::new(ErrorCode::ParameterInvalidKey, e.to_string()))?;
        if !record.is_active() {
            return Err(CommandError::new(
                ErrorCode::ParameterInvalidContext,
                format!("Parameter record '{}' is not active", path),
            ));
        }
        record.value_to_string()
    }

    /// Local shortcut for [`Editor::cmd_set_parameter_value`].
    pub fn cmd_set_parameter_value(&mut self, path: &str, token: &str) -> CommandResult {
        self.edit().cmd_set_parameter_value(path, token)
    }

    pub fn tree_dump(&self, indent: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}|-- Name: '{}'", indent, self.name);
        let _ = writeln!(out, "{}|-- Display name: '{}'", indent, self.display_name);
        let _ = writeln!(out, "{}|-- Top variant: '{}'", indent, self.top_variant_name);
        let _ = writeln!(out, "{}|-- Mounted: {}", indent, self.mount.as_deref().unwrap_or("<no>"));
        let _ = writeln!(out, "{}|-- Records: {}", indent, self.records.len());
        let mut paths: Vec<&String> = self.index.keys().collect();
        paths.sort();
        for path in paths {
            let record = &self.records[self.index[path]];
            let state = if record.is_active() { "active" } else { "inactive" };
            if record.is_parameter() {
                let token = record.profile_token().unwrap_or_default();
                let _ = writeln!(out, "{}|   |-- {} = {} ({})", indent, path, token, state);
            } else {
                let _ = writeln!(out, "{}|   |-- {} ({})", indent, path, state);
            }
        }
        match &self.dependency_model {
            Some(model) => {
                let _ = writeln!(out, "{}|-- Local dependency model:", indent);
                out.push_str(&model.tree_dump(&format!("{}|   ", indent)));
            }
            None => {
                let _ = writeln!(out, "{}|-- Local dependency model: <none>", indent);
            }
        }
        let _ = writeln!(out, "{}`-- Accomplished: {}", indent, self.is_accomplished());
        out
    }
}

impl DependencyContext for Registry {
    fn check_active_variant(&self, dependee: &VariantObjectInfo) -> Result<bool> {
        self.is_active_variant(dependee.local_path())
    }
    fn has_registry(&self, name: &str) -> bool {
        self.name == name
    }
    fn has_variant(&self, info: &VariantObjectInfo) -> bool {
        self.has_variant_record(info.local_path())
    }
    fn has_parameter(&self, info: &VariantObjectInfo) -> bool {
        self.has_parameter_record(info.local_path())
    }
    fn parameter_has_group(&self, info: &VariantObjectInfo) -> bool {
        self.record_by_path(info.local_path())
            .and_then(|r| r.parameter_model())
            .is_some_and(|pm| pm.has_group(info.group_name()))
    }
}
