//! An explicit, process-wide configuration registry that repositories
//! publish snapshots of their registries to, and the lookup seam the
//! preprocessor resolves directives against.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use crate::error::{CommandError, CommandResult, ErrorCode, Result, VariantError};
use crate::registry::{OtherHasher, Registry};
use crate::repository::Repository;

/// Receives the registries of a repository. Implementations are passed
/// explicitly to [`Repository::system_export`] and
/// [`Repository::system_discard`].
pub trait ConfigurationRegistry {
    fn import_configuration_repository(&mut self, repository: &Repository) -> Result<()>;
    fn has_external_configuration_registry(&self, name: &str) -> bool;
    fn clear_configuration_registry(&mut self, name: &str) -> Result<()>;
}

/// Read access to variant activity and parameter values by
/// `registry:path`.
pub trait VariantLookup {
    /// Whether there is anything to look up at all.
    fn is_available(&self) -> bool;
    fn lookup_variant_activity(&self, registry: &str, path: &str) -> CommandResult<bool>;
    fn lookup_parameter_value(&self, registry: &str, path: &str) -> CommandResult<String>;
}

impl VariantLookup for Repository {
    fn is_available(&self) -> bool {
        !self.build_ordered_registry_keys().is_empty()
    }
    fn lookup_variant_activity(&self, registry: &str, path: &str) -> CommandResult<bool> {
        self.cmd_is_active_variant(registry, path)
    }
    fn lookup_parameter_value(&self, registry: &str, path: &str) -> CommandResult<String> {
        self.cmd_get_parameter_value(registry, path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSnapshot {
    pub active: bool,
    pub value: Option<String>,
}

/// Frozen copy of the observable state of one registry.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    name: String,
    active: bool,
    variants: BTreeMap<String, bool>,
    parameters: BTreeMap<String, ParameterSnapshot>,
}

impl RegistrySnapshot {
    pub fn capture(registry: &Registry, active: bool) -> Self {
        let mut snapshot = Self { name: registry.name().to_owned(), active, ..Self::default() };
        for record in registry.records() {
            if record.is_parameter() {
                let value = if record.has_value() { record.value_to_string().ok() } else { None };
                snapshot
                    .parameters
                    .insert(record.path().to_owned(), ParameterSnapshot { active: record.is_active(), value });
            } else if record.is_variant() {
                snapshot.variants.insert(record.path().to_owned(), record.is_active());
            }
        }
        snapshot
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn is_active(&self) -> bool {
        self.active
    }
    pub fn variant_activity(&self, path: &str) -> Option<bool> {
        self.variants.get(path).copied()
    }
    pub fn parameter(&self, path: &str) -> Option<&ParameterSnapshot> {
        self.parameters.get(path)
    }
}

/// In-process [`ConfigurationRegistry`] keeping one snapshot per published
/// registry.
#[derive(Debug, Default)]
pub struct Kernel {
    registries: HashMap<String, RegistrySnapshot, OtherHasher>,
}

impl Kernel {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn registry_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.registries.keys().map(String::as_str).collect();
        names.sort();
        names
    }
    pub fn snapshot(&self, name: &str) -> Option<&RegistrySnapshot> {
        self.registries.get(name)
    }
    fn scope_error(name: &str) -> CommandError {
        CommandError::new(ErrorCode::CommandInvalidContext, format!("Kernel has no registry named '{}'", name))
    }
}

impl ConfigurationRegistry for Kernel {
    fn import_configuration_repository(&mut self, repository: &Repository) -> Result<()> {
        let keys = repository.build_ordered_registry_keys();
        if let Some(taken) = keys.iter().find(|k| self.registries.contains_key(*k)) {
            return Err(VariantError::Logic(format!("Kernel already has a registry named '{}'", taken)));
        }
        for key in keys {
            let active = repository.check_active_registry(&key)?;
            let snapshot = RegistrySnapshot::capture(repository.registry(&key)?, active);
            debug!(registry = %key, active, "registry snapshot imported");
            self.registries.insert(key, snapshot);
        }
        info!(repository = %repository.name(), registries = self.registries.len(), "repository imported in kernel");
        Ok(())
    }

    fn has_external_configuration_registry(&self, name: &str) -> bool {
        self.registries.contains_key(name)
    }

    fn clear_configuration_registry(&mut self, name: &str) -> Result<()> {
        self.registries
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| VariantError::Logic(format!("Kernel has no registry named '{}'", name)))
    }
}

impl VariantLookup for Kernel {
    fn is_available(&self) -> bool {
        !self.registries.is_empty()
    }

    fn lookup_variant_activity(&self, registry: &str, path: &str) -> CommandResult<bool> {
        let snapshot = self.registries.get(registry).ok_or_else(|| Self::scope_error(registry))?;
        snapshot.variant_activity(path).ok_or_else(|| {
            CommandError::new(
                ErrorCode::ParameterInvalidKey,
                format!("Registry '{}' has no variant '{}'", registry, path),
            )
        })
    }

    fn lookup_parameter_value(&self, registry: &str, path: &str) -> CommandResult<String> {
        let snapshot = self.registries.get(registry).ok_or_else(|| Self::scope_error(registry))?;
        let parameter = snapshot.parameter(path).ok_or_else(|| {
            CommandError::new(
                ErrorCode::ParameterInvalidKey,
                format!("Registry '{}' has no parameter '{}'", registry, path),
            )
        })?;
        if !parameter.active {
            return Err(CommandError::new(
                ErrorCode::ParameterInvalidContext,
                format!("Parameter record '{}' is not active", path),
            ));
        }
        parameter.value.clone().ok_or_else(|| {
            CommandError::new(ErrorCode::ParameterUnsetValue, format!("Parameter record '{}' has no value", path))
        })
    }
}
