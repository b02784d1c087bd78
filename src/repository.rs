//! A repository composes named registries, orders them by rank, carries the
//! global dependency model spanning them and is the unit profiles are
//! exported from and imported into.
//!
//! Registries are either *external* (built by the caller and moved in, given
//! back on unregistration) or *embedded* (built here from a registry manager
//! which the entry keeps). Mutations of a mounted registry go through
//! [`Repository::edit_registry`], which lends the registry to an
//! [`Editor`] together with a global view of the other registries.

use std::collections::HashMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

// used to keep rank <-> registry key unique in both directions
use bimap::BiMap;
use tracing::{debug, info, warn};

use crate::cascade::{DeferredFix, Editor, GlobalScope, PeerRegistries};
use crate::dependency::{DependencyContext, DependencyScope};
use crate::dependency_model::DependencyModel;
use crate::error::{CommandError, CommandResult, ErrorCode, Result, VariantError};
use crate::kernel::ConfigurationRegistry;
use crate::manager::RegistryManager;
use crate::object_info::{VariantObjectInfo, validate_instance_name};
use crate::registry::{OtherHasher, Registry};
use crate::setup::{DependencyModelSetup, RepositorySetup};

/// Upper bound on rounds of cross-registry value fixes triggered by one
/// edit.
const MAX_FIX_ROUNDS: usize = 64;

#[derive(Debug)]
pub enum RegistryHandle {
    External(Registry),
    Embedded { registry: Registry, manager: RegistryManager },
}

#[derive(Debug)]
pub struct RegistryEntry {
    name: String,
    rank: Option<u32>,
    handle: RegistryHandle,
    sealed: bool,
    previous_activity: Option<bool>,
}

impl RegistryEntry {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn rank(&self) -> Option<u32> {
        self.rank
    }
    pub fn is_external(&self) -> bool {
        matches!(self.handle, RegistryHandle::External(_))
    }
    pub fn is_embedded(&self) -> bool {
        matches!(self.handle, RegistryHandle::Embedded { .. })
    }
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
    pub fn registry(&self) -> &Registry {
        match &self.handle {
            RegistryHandle::External(registry) => registry,
            RegistryHandle::Embedded { registry, .. } => registry,
        }
    }
    fn registry_mut(&mut self) -> &mut Registry {
        match &mut self.handle {
            RegistryHandle::External(registry) => registry,
            RegistryHandle::Embedded { registry, .. } => registry,
        }
    }
    pub fn manager(&self) -> Option<&RegistryManager> {
        match &self.handle {
            RegistryHandle::External(_) => None,
            RegistryHandle::Embedded { manager, .. } => Some(manager),
        }
    }
}

type EntryMap = HashMap<String, RegistryEntry, OtherHasher>;

impl PeerRegistries for EntryMap {
    fn peer(&self, key: &str) -> Option<&Registry> {
        self.get(key).map(|e| e.registry())
    }
}

/// A repository path `[!]registry:path` split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVariantPath {
    pub registry: String,
    pub path: String,
    pub reversed: bool,
}

/// Splits `[!]registry:path`. Returns `None` when either part is empty or
/// the colon is missing.
pub fn parse_variant_path(text: &str) -> Option<ParsedVariantPath> {
    let (reversed, rest) = match text.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (registry, path) = rest.split_once(':')?;
    if registry.is_empty() || path.is_empty() {
        return None;
    }
    Some(ParsedVariantPath { registry: registry.to_owned(), path: path.to_owned(), reversed })
}

#[derive(Debug, Default)]
pub struct Repository {
    name: String,
    display_name: String,
    description: String,
    organization: String,
    application: String,
    registries: EntryMap,
    ranked: BiMap<u32, String>,
    unranked: Vec<String>,
    dependency_model: Option<DependencyModel>,
    locked: bool,
    initialized: bool,
}

impl Repository {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_owned(), ..Self::default() }
    }

    fn check_unlocked(&self) -> Result<()> {
        if self.locked {
            return Err(VariantError::Locked(format!("Repository '{}' is locked", self.name)));
        }
        Ok(())
    }

    // ------------- Identity -------------
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.check_unlocked()?;
        self.name = name.to_owned();
        Ok(())
    }
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn organization(&self) -> &str {
        &self.organization
    }
    pub fn set_organization(&mut self, organization: &str) -> Result<()> {
        self.check_unlocked()?;
        self.organization = organization.to_owned();
        Ok(())
    }
    pub fn application(&self) -> &str {
        &self.application
    }
    pub fn set_application(&mut self, application: &str) -> Result<()> {
        self.check_unlocked()?;
        self.application = application.to_owned();
        Ok(())
    }

    // ------------- Locking -------------
    pub fn is_locked(&self) -> bool {
        self.locked
    }
    pub fn lock(&mut self) {
        self.locked = true;
    }
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    // ------------- Setup -------------
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Registers the embedded registries of `setup`, loads the global
    /// dependency model and locks on request. Relative registry manager
    /// paths are resolved against `base_dir`.
    pub fn initialize(&mut self, setup: &RepositorySetup, base_dir: Option<&Path>) -> Result<()> {
        if self.initialized {
            return Err(VariantError::Logic(format!("Repository '{}' is already initialized", self.name)));
        }
        for (field, value) in [
            (&mut self.name, &setup.name),
            (&mut self.display_name, &setup.display_name),
            (&mut self.description, &setup.description),
            (&mut self.organization, &setup.organization),
            (&mut self.application, &setup.application),
        ] {
            let value = value.trim();
            if !value.is_empty() {
                *field = value.to_owned();
            }
        }
        for r in &setup.registries {
            let mut config = PathBuf::from(&r.config);
            if config.is_relative() {
                if let Some(dir) = base_dir {
                    config = dir.join(config);
                }
            }
            self.registration_embedded(&config, r.top_variant.as_deref(), &r.name, &r.display_name, &r.description, r.rank)?;
        }
        if let Some(dependencies) = &setup.global_dependencies {
            self.load_global_dependency_model(dependencies)?;
        }
        if setup.lock {
            self.lock();
        }
        self.initialized = true;
        if self.name.is_empty() {
            warn!("repository has no name");
        }
        if self.organization.is_empty() {
            warn!(repository = %self.name, "repository has no organization set");
        }
        if self.application.is_empty() {
            warn!(repository = %self.name, "repository has no application set");
        }
        if self.registries.is_empty() {
            warn!(repository = %self.name, "repository has no variant registry");
        }
        if !self.locked {
            warn!(repository = %self.name, "repository is not locked");
        }
        info!(repository = %self.name, registries = self.registries.len(), "repository initialized");
        Ok(())
    }

    pub fn initialize_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let setup = RepositorySetup::from_file(path)?;
        self.initialize(&setup, path.parent())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut repository = Self::default();
        repository.initialize_from_file(path)?;
        Ok(repository)
    }

    /// Unlocks, forgets every registry and the global dependency model.
    pub fn reset(&mut self) {
        self.locked = false;
        self.dependency_model = None;
        self.registries.clear();
        self.ranked.clear();
        self.unranked.clear();
        self.initialized = false;
    }

    // ------------- Registration -------------
    fn check_new_entry(&self, key: &str, rank: Option<u32>) -> Result<()> {
        self.check_unlocked()?;
        if !validate_instance_name(key) {
            return Err(VariantError::Logic(format!("Invalid registry name '{}'", key)));
        }
        if self.registries.contains_key(key) {
            return Err(VariantError::Logic(format!("Repository already has a registry named '{}'", key)));
        }
        if let Some(rank) = rank {
            if let Some(owner) = self.ranked.get_by_left(&rank) {
                return Err(VariantError::Logic(format!("Rank [{}] is already used by registry '{}'", rank, owner)));
            }
        }
        Ok(())
    }

    fn add_entry(&mut self, key: &str, rank: Option<u32>, handle: RegistryHandle) {
        match rank {
            Some(rank) => {
                self.ranked.insert(rank, key.to_owned());
            }
            None => self.unranked.push(key.to_owned()),
        }
        let entry = RegistryEntry { name: key.to_owned(), rank, handle, sealed: false, previous_activity: None };
        self.registries.insert(key.to_owned(), entry);
        debug!(repository = %self.name, registry = %key, rank = ?rank, "registry mounted");
    }

    /// Mounts a registry built by the caller under `key` (its own name when
    /// `key` is empty).
    pub fn registration_external(&mut self, mut registry: Registry, key: &str, rank: Option<u32>) -> Result<()> {
        let key = if key.is_empty() { registry.name().to_owned() } else { key.to_owned() };
        self.check_new_entry(&key, rank)?;
        if registry.has_parent_repository() {
            return Err(VariantError::Logic(format!("Registry named '{}' already has a parent repository", key)));
        }
        registry.set_parent_repository(&key)?;
        self.add_entry(&key, rank, RegistryHandle::External(registry));
        Ok(())
    }

    /// Builds a registry from a registry manager file and mounts it.
    pub fn registration_embedded(
        &mut self,
        config_file: &Path,
        top_variant_name: Option<&str>,
        key: &str,
        display_name: &str,
        description: &str,
        rank: Option<u32>,
    ) -> Result<()> {
        self.check_new_entry(key, rank)?;
        let manager = RegistryManager::from_file(config_file)?;
        self.registration_embedded_manager(manager, top_variant_name, key, display_name, description, rank)
    }

    /// Builds a registry from `manager`, which the entry then owns, and
    /// mounts it.
    pub fn registration_embedded_manager(
        &mut self,
        manager: RegistryManager,
        top_variant_name: Option<&str>,
        key: &str,
        display_name: &str,
        description: &str,
        rank: Option<u32>,
    ) -> Result<()> {
        self.check_new_entry(key, rank)?;
        let mut registry = Registry::new(key);
        registry.initialize_from(&manager, top_variant_name, key, display_name, description)?;
        if let Some(setup) = manager.local_dependencies() {
            registry.load_local_dependency_model(setup)?;
        }
        registry.set_parent_repository(key)?;
        self.add_entry(key, rank, RegistryHandle::Embedded { registry, manager });
        Ok(())
    }

    fn check_not_referenced(&self, key: &str) -> Result<()> {
        let Some(model) = &self.dependency_model else {
            return Ok(());
        };
        let referenced = model.dependencies().any(|d| {
            d.depender().registry_name() == key || d.dependees().values().any(|e| e.registry_name() == key)
        });
        if referenced {
            return Err(VariantError::Logic(format!(
                "Registry '{}' is referenced by the global dependency model of repository '{}'",
                key, self.name
            )));
        }
        Ok(())
    }

    fn remove_entry(&mut self, key: &str) -> Option<RegistryEntry> {
        let entry = self.registries.remove(key)?;
        self.ranked.remove_by_right(key);
        self.unranked.retain(|k| k != key);
        Some(entry)
    }

    /// Unmounts a registry. An external registry is given back to the
    /// caller; an embedded one is dropped.
    pub fn unregistration(&mut self, key: &str) -> Result<Option<Registry>> {
        self.check_unlocked()?;
        if !self.registries.contains_key(key) {
            return Err(VariantError::Logic(format!("Repository does not host a registry named '{}'", key)));
        }
        self.check_not_referenced(key)?;
        let entry = self.remove_entry(key).ok_or_else(|| VariantError::Invariant(format!("Lost registry '{}'", key)))?;
        debug!(repository = %self.name, registry = %key, "registry unmounted");
        match entry.handle {
            RegistryHandle::External(mut registry) => {
                registry.reset_parent_repository();
                Ok(Some(registry))
            }
            RegistryHandle::Embedded { .. } => Ok(None),
        }
    }

    /// Unmounts every external registry and gives them back.
    pub fn external_registries_unregistration(&mut self) -> Result<Vec<Registry>> {
        self.check_unlocked()?;
        let keys: Vec<String> = self
            .build_ordered_registry_keys()
            .into_iter()
            .filter(|k| self.registries.get(k).is_some_and(|e| e.is_external()))
            .collect();
        for key in &keys {
            self.check_not_referenced(key)?;
        }
        let mut registries = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(registry) = self.unregistration(&key)? {
                registries.push(registry);
            }
        }
        Ok(registries)
    }

    /// Drops every registry together with the global dependency model.
    pub fn clear_registries(&mut self) -> Result<()> {
        self.check_unlocked()?;
        self.dependency_model = None;
        self.registries.clear();
        self.ranked.clear();
        self.unranked.clear();
        Ok(())
    }

    // ------------- Registries -------------
    pub fn has_registry(&self, key: &str) -> bool {
        self.registries.contains_key(key)
    }
    pub fn registry_entry(&self, key: &str) -> Result<&RegistryEntry> {
        self.registries
            .get(key)
            .ok_or_else(|| VariantError::Logic(format!("Variant repository has no registry named '{}'", key)))
    }
    pub fn registry(&self, key: &str) -> Result<&Registry> {
        self.registry_entry(key).map(|e| e.registry())
    }
    pub fn is_external_registry(&self, key: &str) -> Result<bool> {
        self.registry_entry(key).map(|e| e.is_external())
    }
    pub fn is_embedded_registry(&self, key: &str) -> Result<bool> {
        self.registry_entry(key).map(|e| e.is_embedded())
    }
    pub fn rank_of(&self, key: &str) -> Option<u32> {
        self.ranked.get_by_right(key).copied()
    }

    /// Ranked registries by ascending rank, then the unranked ones in
    /// registration order.
    pub fn build_ordered_registry_keys(&self) -> Vec<String> {
        let mut ranked: Vec<(&u32, &String)> = self.ranked.iter().collect();
        ranked.sort_by_key(|(rank, _)| **rank);
        ranked.into_iter().map(|(_, k)| k.clone()).chain(self.unranked.iter().cloned()).collect()
    }

    // ------------- Sealing -------------
    /// Freezes an accomplished registry against value commands.
    pub fn seal_registry(&mut self, key: &str) -> Result<()> {
        let entry = self
            .registries
            .get_mut(key)
            .ok_or_else(|| VariantError::Logic(format!("Variant repository has no registry named '{}'", key)))?;
        if !entry.registry().is_accomplished() {
            return Err(VariantError::Logic(format!("Registry '{}' is not accomplished and cannot be sealed", key)));
        }
        entry.sealed = true;
        Ok(())
    }
    pub fn unseal_registry(&mut self, key: &str) -> Result<()> {
        let entry = self
            .registries
            .get_mut(key)
            .ok_or_else(|| VariantError::Logic(format!("Variant repository has no registry named '{}'", key)))?;
        entry.sealed = false;
        Ok(())
    }
    pub fn is_sealed_registry(&self, key: &str) -> Result<bool> {
        self.registry_entry(key).map(|e| e.is_sealed())
    }

    // ------------- Editing -------------
    fn edit_entry<T>(
        &mut self,
        key: &str,
        allow_sealed: bool,
        f: impl FnOnce(&mut Editor<'_, '_>) -> T,
    ) -> Result<(T, Vec<DeferredFix>)> {
        let mut entry = self
            .registries
            .remove(key)
            .ok_or_else(|| VariantError::Logic(format!("Variant repository has no registry named '{}'", key)))?;
        if entry.sealed && !allow_sealed {
            self.registries.insert(key.to_owned(), entry);
            return Err(VariantError::Locked(format!("Registry '{}' is sealed", key)));
        }
        let outcome = {
            let mut scope = GlobalScope::new(key, self.dependency_model.as_ref(), &self.registries);
            let out = {
                let mut editor = Editor::new(entry.registry_mut(), Some(&mut scope));
                f(&mut editor)
            };
            (out, scope.take_deferred())
        };
        self.registries.insert(key.to_owned(), entry);
        Ok(outcome)
    }

    fn apply_deferred(&mut self, mut pending: Vec<DeferredFix>) -> Result<()> {
        let mut rounds = 0;
        while !pending.is_empty() {
            rounds += 1;
            if rounds > MAX_FIX_ROUNDS {
                return Err(VariantError::Invariant(format!(
                    "Cross-registry value fixes in repository '{}' do not settle",
                    self.name
                )));
            }
            let mut next = Vec::new();
            for fix in pending {
                if !self.registries.contains_key(&fix.registry) {
                    warn!(repository = %self.name, registry = %fix.registry, "no registry to fix");
                    continue;
                }
                let (outcome, more) = self.edit_entry(&fix.registry, true, |editor| editor.fix_parameter_value(&fix.path))?;
                outcome?;
                next.extend(more);
            }
            pending = next;
        }
        Ok(())
    }

    /// Lends the registry `key` to `f` with the repository's global
    /// dependencies in scope, then fixes values of other registries the
    /// edit invalidated. Sealed registries are refused.
    pub fn edit_registry<T>(&mut self, key: &str, f: impl FnOnce(&mut Editor<'_, '_>) -> T) -> Result<T> {
        let (out, deferred) = self.edit_entry(key, false, f)?;
        self.apply_deferred(deferred)?;
        Ok(out)
    }

    fn forced_update_registry(&mut self, key: &str) -> Result<()> {
        let (outcome, deferred) = self.edit_entry(key, true, |editor| editor.update_registry())?;
        outcome?;
        self.apply_deferred(deferred)
    }

    // ------------- Dependencies -------------
    pub fn has_dependency_model(&self) -> bool {
        self.dependency_model.is_some()
    }
    pub fn dependency_model(&self) -> Option<&DependencyModel> {
        self.dependency_model.as_ref()
    }

    /// Builds the global dependency model against the mounted registries,
    /// then fixes values and registry activities it affects.
    pub fn load_global_dependency_model(&mut self, setup: &DependencyModelSetup) -> Result<()> {
        if self.dependency_model.is_some() {
            return Err(VariantError::Logic(format!("Repository '{}' already has a global dependency model", self.name)));
        }
        let mut model = DependencyModel::from_setup(DependencyScope::Global, setup)?;
        model.initialize(&*self)?;
        debug!(repository = %self.name, dependencies = model.dependencies().count(), "global dependency model loaded");
        self.dependency_model = Some(model);
        for key in self.build_ordered_registry_keys() {
            let (outcome, deferred) = self.edit_entry(&key, true, |editor| editor.fix_global_dependers())?;
            outcome?;
            self.apply_deferred(deferred)?;
        }
        self.update()
    }

    // ------------- Activity -------------
    /// Activity of a registry as decided by the global dependency keyed on
    /// its name; registries without such a dependency are active.
    pub fn check_active_registry(&self, key: &str) -> Result<bool> {
        if !self.registries.contains_key(key) {
            return Err(VariantError::Logic(format!("Variant repository has no registry named '{}'", key)));
        }
        match self.dependency_model.as_ref().and_then(|m| m.dependency(key)) {
            Some(dependency) => dependency.evaluate(self),
            None => Ok(true),
        }
    }

    /// Like [`Repository::check_active_registry`], force-updating the
    /// registry when its activity changed since the last call.
    pub fn is_active_registry(&mut self, key: &str) -> Result<bool> {
        let active = self.check_active_registry(key)?;
        let changed = self
            .registries
            .get_mut(key)
            .map(|e| e.previous_activity.replace(active) != Some(active))
            .unwrap_or(false);
        if changed {
            debug!(repository = %self.name, registry = %key, active, "registry activity changed");
            self.forced_update_registry(key)?;
        }
        Ok(active)
    }

    /// Updates every active registry in rank order.
    pub fn update(&mut self) -> Result<()> {
        for key in self.build_ordered_registry_keys() {
            if self.is_active_registry(&key)? {
                let (outcome, deferred) = self.edit_entry(&key, true, |editor| editor.update_registry())?;
                outcome?;
                self.apply_deferred(deferred)?;
            }
        }
        Ok(())
    }

    /// Every active registry is accomplished.
    pub fn is_accomplished(&self) -> Result<bool> {
        for key in self.build_ordered_registry_keys() {
            if self.check_active_registry(&key)? && !self.registry(&key)?.is_accomplished() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // ------------- Lookups -------------
    pub fn has_variant(&self, key: &str, path: &str) -> bool {
        self.registries.get(key).is_some_and(|e| e.registry().has_variant_record(path))
    }
    pub fn has_variant_parameter(&self, key: &str, path: &str) -> bool {
        self.registries.get(key).is_some_and(|e| e.registry().has_parameter_record(path))
    }
    pub fn is_active_variant(&self, key: &str, path: &str) -> Result<bool> {
        self.registry(key)?.is_active_variant(path)
    }

    fn scope_error(&self, key: &str) -> CommandError {
        CommandError::new(
            ErrorCode::CommandInvalidContext,
            format!("Variant repository has no registry named '{}'", key),
        )
    }

    pub fn cmd_is_active_variant(&self, key: &str, path: &str) -> CommandResult<bool> {
        let entry = self.registries.get(key).ok_or_else(|| self.scope_error(key))?;
        entry.registry().cmd_is_active_variant(path)
    }

    pub fn cmd_get_parameter_value(&self, key: &str, path: &str) -> CommandResult<String> {
        let entry = self.registries.get(key).ok_or_else(|| self.scope_error(key))?;
        entry.registry().cmd_get_parameter_value(path)
    }

    pub fn cmd_set_parameter_value(&mut self, key: &str, path: &str, token: &str) -> CommandResult {
        let entry = self.registries.get(key).ok_or_else(|| self.scope_error(key))?;
        if entry.is_sealed() {
            return Err(CommandError::new(ErrorCode::ParameterInvalidContext, format!("Registry '{}' is sealed", key)));
        }
        if !self.is_active_registry(key)? {
            return Err(CommandError::new(ErrorCode::CommandInvalidContext, format!("Registry '{}' is not active", key)));
        }
        self.edit_registry(key, |editor| editor.cmd_set_parameter_value(path, token))?
    }

    // ------------- Kernel -------------
    /// Publishes the registries of this repository to `kernel`.
    pub fn system_export(&self, kernel: &mut dyn ConfigurationRegistry) -> Result<()> {
        kernel.import_configuration_repository(self)
    }

    /// Withdraws from `kernel` the registries this repository published.
    pub fn system_discard(&self, kernel: &mut dyn ConfigurationRegistry) -> Result<()> {
        for key in self.build_ordered_registry_keys() {
            if kernel.has_external_configuration_registry(&key) {
                kernel.clear_configuration_registry(&key)?;
            }
        }
        Ok(())
    }

    pub fn tree_dump(&self, indent: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}|-- Name: '{}'", indent, self.name);
        let _ = writeln!(out, "{}|-- Organization: '{}'", indent, self.organization);
        let _ = writeln!(out, "{}|-- Application: '{}'", indent, self.application);
        let keys = self.build_ordered_registry_keys();
        let _ = writeln!(out, "{}|-- Registries: {}", indent, keys.len());
        for key in &keys {
            if let Some(entry) = self.registries.get(key) {
                let kind = if entry.is_external() { "external" } else { "embedded" };
                let rank = entry.rank.map(|r| r.to_string()).unwrap_or_else(|| "-".into());
                let active = self.check_active_registry(key).map(|a| a.to_string()).unwrap_or_else(|e| e.to_string());
                let _ = writeln!(
                    out,
                    "{}|   |-- '{}' [{}] rank={} active={} sealed={}",
                    indent, key, kind, rank, active, entry.sealed
                );
                out.push_str(&entry.registry().tree_dump(&format!("{}|   |   ", indent)));
            }
        }
        match &self.dependency_model {
            Some(model) => {
                let _ = writeln!(out, "{}|-- Global dependency model:", indent);
                out.push_str(&model.tree_dump(&format!("{}|   ", indent)));
            }
            None => {
                let _ = writeln!(out, "{}|-- Global dependency model: <none>", indent);
            }
        }
        let _ = writeln!(out, "{}`-- Locked: {}", indent, self.locked);
        out
    }
}

impl DependencyContext for Repository {
    fn check_active_variant(&self, dependee: &VariantObjectInfo) -> Result<bool> {
        self.is_active_variant(dependee.registry_name(), dependee.local_path())
    }
    fn has_registry(&self, name: &str) -> bool {
        self.registries.contains_key(name)
    }
    fn has_variant(&self, info: &VariantObjectInfo) -> bool {
        self.has_variant(info.registry_name(), info.local_path())
    }
    fn has_parameter(&self, info: &VariantObjectInfo) -> bool {
        self.has_variant_parameter(info.registry_name(), info.local_path())
    }
    fn parameter_has_group(&self, info: &VariantObjectInfo) -> bool {
        self.registries
            .get(info.registry_name())
            .is_some_and(|e| DependencyContext::parameter_has_group(e.registry(), info))
    }
}
