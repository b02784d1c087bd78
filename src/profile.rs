//! Profiles: the flat `registry:path=value` settings list capturing the
//! choices made in a repository, with the exporter and importer walking
//! registries in rank order and records depth-first.

use std::collections::VecDeque;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cascade::Editor;
use crate::datatype::{UNSET_LABEL, add_quotes, remove_quotes};
use crate::error::{Result, VariantError};
use crate::record::RecordId;
use crate::registry::Registry;
use crate::repository::Repository;
use crate::setup::{load_file, load_toml_str};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub application: String,
    #[serde(default)]
    pub settings: Vec<String>,
}

impl Profile {
    /// Loads a profile file, TOML or JSON by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        load_file(path.as_ref())
    }
    pub fn from_toml_str(text: &str) -> Result<Self> {
        load_toml_str(text)
    }
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
    /// Writes the profile as pretty JSON.
    pub fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_string()? + "\n")?;
        Ok(())
    }
}

/// Splits `registry:path=value`.
fn split_setting(setting: &str) -> Result<(&str, &str, &str)> {
    let invalid = || VariantError::Logic(format!("Invalid format for variant parameter setting '{}'", setting));
    let (full_path, value) = setting.split_once('=').ok_or_else(invalid)?;
    let (registry, path) = full_path.split_once(':').ok_or_else(invalid)?;
    let registry = registry.trim();
    if registry.is_empty() {
        return Err(invalid());
    }
    Ok((registry, path.trim(), value))
}

fn registry_prefix(setting: &str) -> Result<&str> {
    match setting.split_once(':') {
        Some((registry, _)) if !registry.trim().is_empty() => Ok(registry.trim()),
        _ => Err(VariantError::Logic(format!("Invalid format for variant parameter setting '{}'", setting))),
    }
}

fn top_record_ids(registry: &Registry) -> Vec<RecordId> {
    registry
        .records()
        .iter()
        .enumerate()
        .filter(|(_, r)| r.parent().is_none())
        .map(|(id, _)| id)
        .collect()
}

fn ordered_daughter_ids(registry: &Registry, id: RecordId) -> Vec<RecordId> {
    registry.records()[id].ordered_daughters().map(|d| d.id).collect()
}

// ------------- Export -------------
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportFlags {
    /// Report every exported setting at info level.
    pub debug: bool,
    /// Append to the settings already in the profile.
    pub no_clear: bool,
}

pub struct Exporter<'p> {
    profile: &'p mut Profile,
    flags: ExportFlags,
}

impl<'p> Exporter<'p> {
    pub fn new(profile: &'p mut Profile, flags: ExportFlags) -> Self {
        Self { profile, flags }
    }

    pub fn process(&mut self, repository: &Repository) -> Result<()> {
        if !self.flags.no_clear {
            *self.profile = Profile::default();
        }
        for key in repository.build_ordered_registry_keys() {
            if !repository.check_active_registry(&key)? {
                debug!(registry = %key, "inactive registry not exported");
                continue;
            }
            let registry = repository.registry(&key)?;
            for id in top_record_ids(registry) {
                self.process_record(&key, registry, id)?;
            }
        }
        if !repository.organization().is_empty() {
            self.profile.organization = repository.organization().to_owned();
        }
        if !repository.application().is_empty() {
            self.profile.application = repository.application().to_owned();
        }
        Ok(())
    }

    fn process_record(&mut self, key: &str, registry: &Registry, id: RecordId) -> Result<()> {
        let record = &registry.records()[id];
        if !record.is_active() {
            return Ok(());
        }
        if record.is_parameter() && !record.is_fixed_parameter() {
            let token = record
                .profile_token()
                .map_err(|e| VariantError::Logic(format!("Cannot export '{}:{}': {}", key, record.path(), e.message())))?;
            let token = match record.parameter_model() {
                Some(pm) if pm.is_string() && record.has_value() => remove_quotes(&token),
                _ => token,
            };
            let setting = format!("{}:{}={}", key, record.path(), token);
            if self.flags.debug {
                info!(setting = %setting, "exported");
            }
            self.profile.settings.push(setting);
            if !record.has_value() {
                return Ok(());
            }
        }
        for daughter in ordered_daughter_ids(registry, id) {
            self.process_record(key, registry, daughter)?;
        }
        Ok(())
    }
}

// ------------- Import -------------
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportFlags {
    /// Report every applied setting at info level.
    pub debug: bool,
    /// Do not unlock a locked repository.
    pub no_clear: bool,
    /// Fail on settings of a registry the repository does not host.
    pub dont_ignore_unknown_registry: bool,
    /// Fail when the organization or application of the profile differs.
    pub dont_ignore_unknown_orgapp: bool,
}

pub struct Importer<'p> {
    profile: &'p Profile,
    flags: ImportFlags,
    settings: VecDeque<String>,
}

impl<'p> Importer<'p> {
    pub fn new(profile: &'p Profile, flags: ImportFlags) -> Self {
        Self { profile, flags, settings: VecDeque::new() }
    }

    pub fn process(&mut self, repository: &mut Repository) -> Result<()> {
        let was_locked = repository.is_locked();
        if was_locked && !self.flags.no_clear {
            debug!(repository = %repository.name(), "unlocking repository for import");
            repository.unlock();
        }
        let outcome = self.apply(repository);
        if was_locked {
            repository.lock();
        }
        outcome
    }

    fn adopt(&self, kind: &str, imported: &str, current: &str) -> Result<Option<String>> {
        let imported = imported.trim();
        if imported.is_empty() {
            return Ok(None);
        }
        if current.is_empty() {
            return Ok(Some(imported.to_owned()));
        }
        if imported != current && self.flags.dont_ignore_unknown_orgapp {
            return Err(VariantError::Logic(format!(
                "Non matching {} (imported='{}' vs requested='{}')",
                kind, imported, current
            )));
        }
        Ok(None)
    }

    fn apply(&mut self, repository: &mut Repository) -> Result<()> {
        if let Some(organization) = self.adopt("organization", &self.profile.organization, repository.organization())? {
            repository.set_organization(&organization)?;
        }
        if let Some(application) = self.adopt("application", &self.profile.application, repository.application())? {
            repository.set_application(&application)?;
        }
        self.settings = self.profile.settings.iter().cloned().collect();
        while let Some(front) = self.settings.front() {
            let registry = registry_prefix(front)?.to_owned();
            if !repository.has_registry(&registry) {
                if self.flags.dont_ignore_unknown_registry {
                    return Err(VariantError::Logic(format!(
                        "Variant repository has no known registry named '{}'",
                        registry
                    )));
                }
                let skipped = self.drop_block(&registry)?;
                warn!(registry = %registry, skipped, "variant repository has no known registry with this name");
                continue;
            }
            debug!(registry = %registry, "importing registry settings");
            let settings = &mut self.settings;
            let flags = self.flags;
            repository.edit_registry(&registry, |editor| {
                let tops = top_record_ids(editor.registry());
                for id in tops {
                    import_record(editor, &registry, id, settings, flags)?;
                }
                Ok::<(), VariantError>(())
            })??;
            let dropped = self.drop_block(&registry)?;
            if dropped > 0 {
                warn!(registry = %registry, dropped, "settings left unconsumed");
            }
        }
        Ok(())
    }

    /// Pops the leading settings of `registry`.
    fn drop_block(&mut self, registry: &str) -> Result<usize> {
        let mut dropped = 0;
        while let Some(front) = self.settings.front() {
            if registry_prefix(front)? != registry {
                break;
            }
            self.settings.pop_front();
            dropped += 1;
        }
        Ok(dropped)
    }
}

fn import_record(
    editor: &mut Editor<'_, '_>,
    key: &str,
    id: RecordId,
    settings: &mut VecDeque<String>,
    flags: ImportFlags,
) -> Result<()> {
    let record = &editor.registry().records()[id];
    if !record.is_active() {
        return Ok(());
    }
    if record.is_parameter() && !record.is_fixed_parameter() {
        let Some(front) = settings.front() else {
            return Ok(());
        };
        let (registry, path, value) = split_setting(front)?;
        if registry != key {
            return Ok(());
        }
        if path != record.path() {
            return Err(VariantError::Logic(format!(
                "Unexpected setting for '{}:{}' where parameter '{}' was expected",
                registry,
                path,
                record.path()
            )));
        }
        let path = path.to_owned();
        let is_string = record.parameter_model().is_some_and(|pm| pm.is_string());
        let value = if is_string && value != UNSET_LABEL { add_quotes(value) } else { value.to_owned() };
        settings.pop_front();
        let outcome = if value == UNSET_LABEL {
            editor.unset_value(&path)
        } else {
            editor.string_to_value(&path, &value)
        };
        outcome.map_err(|e| {
            VariantError::Logic(format!(
                "Failed to convert variant parameter '{}' from '{}': {}",
                path,
                value,
                e.message()
            ))
        })?;
        if flags.debug {
            info!(registry = %key, path = %path, value = %value, "imported");
        }
    }
    for daughter in ordered_daughter_ids(editor.registry(), id) {
        import_record(editor, key, daughter, settings, flags)?;
    }
    Ok(())
}

/// Captures the active choices of `repository` as a profile.
pub fn export_profile(repository: &Repository) -> Result<Profile> {
    let mut profile = Profile::default();
    Exporter::new(&mut profile, ExportFlags::default()).process(repository)?;
    Ok(profile)
}

/// Applies `profile` to `repository`.
pub fn import_profile(repository: &mut Repository, profile: &Profile, flags: ImportFlags) -> Result<()> {
    Importer::new(profile, flags).process(repository)
}
