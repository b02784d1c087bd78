//! Serde descriptions of models, dependency models and repositories, read
//! from TOML or JSON files through the `config` crate.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub(crate) fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .build()?;
    Ok(settings.try_deserialize::<T>()?)
}

pub(crate) fn load_toml_str<T: DeserializeOwned>(text: &str) -> Result<T> {
    let settings = config::Config::builder()
        .add_source(config::File::from_str(text, config::FileFormat::Toml))
        .build()?;
    Ok(settings.try_deserialize::<T>()?)
}

/// A literal as written in a setup file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SetupValue {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSetup {
    pub min: SetupValue,
    pub max: SetupValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumeratedSetup {
    pub value: SetupValue,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeSetup {
    pub min: SetupValue,
    pub max: SetupValue,
    #[serde(default)]
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSetup {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantRefSetup {
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSetup {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(default)]
    pub description: String,
    /// `fixed` or `variable` (default).
    #[serde(default)]
    pub mutability: Option<String>,
    /// `free` (default), `enumeration` or `interval`.
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default, rename = "default")]
    pub default_value: Option<SetupValue>,
    #[serde(default, rename = "fixed")]
    pub fixed_value: Option<SetupValue>,
    #[serde(default)]
    pub unit_label: Option<String>,
    #[serde(default)]
    pub preferred_unit: Option<String>,
    #[serde(default)]
    pub precision: Option<f64>,
    #[serde(default)]
    pub domain: Option<DomainSetup>,
    #[serde(default)]
    pub enumerated: Vec<EnumeratedSetup>,
    #[serde(default)]
    pub ranges: Vec<RangeSetup>,
    #[serde(default)]
    pub true_variants: Vec<String>,
    #[serde(default)]
    pub false_variants: Vec<String>,
    #[serde(default)]
    pub groups: Vec<GroupSetup>,
    #[serde(default)]
    pub variants: Vec<VariantRefSetup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterRefSetup {
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub occurrences: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSetup {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterRefSetup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependeeSetup {
    pub slot: u32,
    pub variant: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencySetup {
    pub name: String,
    pub depender: String,
    pub slots: Vec<u32>,
    #[serde(default)]
    pub logic: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyModelSetup {
    #[serde(default)]
    pub dependees: Vec<DependeeSetup>,
    #[serde(default)]
    pub dependencies: Vec<DependencySetup>,
}

impl DependencyModelSetup {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        load_file(path.as_ref())
    }
    pub fn from_toml_str(text: &str) -> Result<Self> {
        load_toml_str(text)
    }
}

/// Everything a registry manager needs to build its models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerSetup {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub top_variant_name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSetup>,
    #[serde(default)]
    pub variants: Vec<VariantSetup>,
    #[serde(default)]
    pub local_dependencies: Option<DependencyModelSetup>,
}

impl ManagerSetup {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        load_file(path.as_ref())
    }
    pub fn from_toml_str(text: &str) -> Result<Self> {
        load_toml_str(text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySetup {
    pub name: String,
    /// Path of the manager file, relative to the repository file.
    pub config: String,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub top_variant: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositorySetup {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub application: String,
    #[serde(default)]
    pub lock: bool,
    #[serde(default)]
    pub registries: Vec<RegistrySetup>,
    #[serde(default)]
    pub global_dependencies: Option<DependencyModelSetup>,
}

impl RepositorySetup {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        load_file(path.as_ref())
    }
    pub fn from_toml_str(text: &str) -> Result<Self> {
        load_toml_str(text)
    }
}
