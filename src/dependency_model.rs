//! A collection of dependencies sharing one scope, indexed both by depender
//! ("what guards X") and by dependee ("who must be re-examined when X
//! changes").

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write;

use tracing::debug;

use crate::dependency::{DependencyContext, DependencyScope, VariantDependency};
use crate::error::{Result, VariantError};
use crate::registry::OtherHasher;
use crate::setup::DependencyModelSetup;

#[derive(Debug, Clone)]
pub struct DependencyRecord {
    pub name: String,
    pub depender: String,
    pub slots: Vec<u32>,
    pub logic: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DependencyModel {
    scope: DependencyScope,
    dependee_records: BTreeMap<u32, String>,
    dependency_records: Vec<DependencyRecord>,
    dependencies: HashMap<String, VariantDependency, OtherHasher>,
    dependers: HashMap<String, BTreeSet<String>, OtherHasher>,
    initialized: bool,
}

impl DependencyModel {
    pub fn new(scope: DependencyScope) -> Self {
        Self {
            scope,
            dependee_records: BTreeMap::new(),
            dependency_records: Vec::new(),
            dependencies: HashMap::default(),
            dependers: HashMap::default(),
            initialized: false,
        }
    }

    pub fn from_setup(scope: DependencyScope, setup: &DependencyModelSetup) -> Result<Self> {
        let mut model = Self::new(scope);
        for d in &setup.dependees {
            model.add_dependee_record(d.slot, &d.variant)?;
        }
        for d in &setup.dependencies {
            model.add_dependency_record(&d.name, &d.depender, d.slots.clone(), d.logic.as_deref())?;
        }
        Ok(model)
    }

    fn check_not_initialized(&self) -> Result<()> {
        if self.initialized {
            return Err(VariantError::Locked(format!("The {} dependency model is already initialized", self.scope)));
        }
        Ok(())
    }

    pub fn scope(&self) -> DependencyScope {
        self.scope
    }
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn add_dependee_record(&mut self, slot: u32, path: &str) -> Result<()> {
        self.check_not_initialized()?;
        if path.is_empty() {
            return Err(VariantError::Logic(format!("Empty dependee path at slot [{}]", slot)));
        }
        if self.dependee_records.contains_key(&slot) {
            return Err(VariantError::Logic(format!("Dependee slot [{}] is already used", slot)));
        }
        if self.dependee_records.values().any(|p| p == path) {
            return Err(VariantError::Logic(format!("Dependee '{}' is already recorded", path)));
        }
        self.dependee_records.insert(slot, path.to_owned());
        Ok(())
    }

    pub fn has_dependee_record(&self, slot: u32) -> bool {
        self.dependee_records.contains_key(&slot)
    }

    pub fn has_dependee_record_by_path(&self, path: &str) -> bool {
        self.dependee_records.values().any(|p| p == path)
    }

    pub fn add_dependency_record(&mut self, name: &str, depender: &str, slots: Vec<u32>, logic: Option<&str>) -> Result<()> {
        self.check_not_initialized()?;
        if name.is_empty() {
            return Err(VariantError::Logic("Empty dependency name".into()));
        }
        if depender.is_empty() {
            return Err(VariantError::Logic(format!("Empty depender path in dependency '{}'", name)));
        }
        if slots.is_empty() {
            return Err(VariantError::Logic(format!("No dependee slots in dependency '{}'", name)));
        }
        if self.dependency_records.iter().any(|r| r.name == name) {
            return Err(VariantError::Logic(format!("Dependency '{}' already exists", name)));
        }
        if self.dependency_records.iter().any(|r| r.depender == depender) {
            return Err(VariantError::Logic(format!("Depender '{}' already has a dependency", depender)));
        }
        for slot in &slots {
            if !self.dependee_records.contains_key(slot) {
                return Err(VariantError::Logic(format!("Dependency '{}' refers to unknown dependee slot [{}]", name, slot)));
            }
        }
        self.dependency_records.push(DependencyRecord {
            name: name.to_owned(),
            depender: depender.to_owned(),
            slots,
            logic: logic.map(str::to_owned),
        });
        Ok(())
    }

    /// Builds and locks every dependency against `ctx`, then the reverse
    /// dependee index.
    pub fn initialize(&mut self, ctx: &dyn DependencyContext) -> Result<()> {
        self.check_not_initialized()?;
        let mut dependencies: HashMap<String, VariantDependency, OtherHasher> = HashMap::default();
        let mut dependers: HashMap<String, BTreeSet<String>, OtherHasher> = HashMap::default();
        for record in &self.dependency_records {
            let mut dependency = VariantDependency::new(&record.name, self.scope);
            dependency.set_depender_by_path(&record.depender, ctx)?;
            for slot in &record.slots {
                let path = &self.dependee_records[slot];
                dependency.add_dependee_by_path(path, Some(*slot))?;
                let dependee = dependency.dependee(*slot)?;
                if !ctx.has_variant(dependee) {
                    return Err(VariantError::Logic(format!(
                        "Dependee '{}' of dependency '{}' does not exist",
                        dependee, record.name
                    )));
                }
            }
            if let Some(formula) = &record.logic {
                dependency.build_logic_from_formula(formula)?;
            }
            dependency.lock()?;
            let depender = dependency.depender().full_path();
            for dependee in dependency.dependees().values() {
                dependers.entry(dependee.full_path()).or_default().insert(depender.clone());
            }
            debug!(scope = %self.scope, dependency = %record.name, depender = %depender, "dependency locked");
            dependencies.insert(depender, dependency);
        }
        self.dependencies = dependencies;
        self.dependers = dependers;
        self.initialized = true;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.dependencies.clear();
        self.dependers.clear();
        self.initialized = false;
    }

    // ------------- Lookups -------------
    /// Whether a dependency guards the object with this full path.
    pub fn has_dependency(&self, depender_path: &str) -> bool {
        self.dependencies.contains_key(depender_path)
    }

    pub fn dependency(&self, depender_path: &str) -> Option<&VariantDependency> {
        self.dependencies.get(depender_path)
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &VariantDependency> {
        self.dependencies.values()
    }

    /// Dependers of the variant with this full path.
    pub fn dependers_of(&self, dependee_path: &str) -> Option<&BTreeSet<String>> {
        self.dependers.get(dependee_path)
    }

    pub fn dependers_per_dependee(&self) -> &HashMap<String, BTreeSet<String>, OtherHasher> {
        &self.dependers
    }

    pub fn tree_dump(&self, indent: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}|-- Scope: {}", indent, self.scope);
        let _ = writeln!(out, "{}|-- Dependee records: {}", indent, self.dependee_records.len());
        for (slot, path) in &self.dependee_records {
            let _ = writeln!(out, "{}|   |-- [{}] '{}'", indent, slot, path);
        }
        let mut names: Vec<&String> = self.dependencies.keys().collect();
        names.sort();
        let _ = writeln!(out, "{}|-- Dependencies: {}", indent, names.len());
        for name in names {
            if let Some(dependency) = self.dependencies.get(name) {
                out.push_str(&dependency.tree_dump(&format!("{}|   ", indent)));
            }
        }
        let _ = writeln!(out, "{}`-- Initialized: {}", indent, self.initialized);
        out
    }
}
