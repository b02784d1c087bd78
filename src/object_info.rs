//! Structured identifiers of configuration objects.
//!
//! A [`VariantObjectInfo`] classifies a path string as a registry, a variant,
//! a parameter, a parameter value group (`path@group`) or an enumerated string
//! value (`path=value`). Global forms carry the registry name (`geo:path`),
//! local forms do not. Malformed input yields the `Invalid` kind, never an
//! error.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use pest::Parser;
use pest_derive::Parser;
use regex::Regex;

use crate::error::VariantError;

#[derive(Parser)]
#[grammar = "path.pest"]
struct PathParser;

/// Do not try the registry-qualified forms.
pub const PARSE_NO_GLOBAL: u32 = 0x1;
/// Do not try the unqualified forms.
pub const PARSE_NO_LOCAL: u32 = 0x2;

lazy_static! {
    static ref INSTANCE_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("instance name pattern");
    static ref MODEL_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("model name pattern");
}

/// Names of registries, records and groups.
pub fn validate_instance_name(name: &str) -> bool {
    INSTANCE_NAME.is_match(name)
}

/// Names of parameter and variant models, which may be dotted.
pub fn validate_model_name(name: &str) -> bool {
    MODEL_NAME.is_match(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectKind {
    #[default]
    Invalid,
    Registry,
    Variant,
    Parameter,
    ParameterValueGroup,
    ParameterEnumStringValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VariantObjectInfo {
    kind: ObjectKind,
    registry_name: String,
    local_path: String,
    group_name: String,
    enum_string_value: String,
}

fn full_match(rule: Rule, text: &str) -> bool {
    PathParser::parse(rule, text).is_ok()
}

impl VariantObjectInfo {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------- Constructors -------------
    pub fn make_registry(registry_name: &str) -> Self {
        if !full_match(Rule::registry, registry_name) || registry_name.ends_with(':') {
            return Self::default();
        }
        Self { kind: ObjectKind::Registry, registry_name: registry_name.to_owned(), ..Self::default() }
    }
    pub fn make_variant(registry_name: &str, path: &str) -> Self {
        Self::build(ObjectKind::Variant, registry_name, path, "", "")
    }
    pub fn make_local_variant(path: &str) -> Self {
        Self::build(ObjectKind::Variant, "", path, "", "")
    }
    pub fn make_parameter(registry_name: &str, path: &str) -> Self {
        Self::build(ObjectKind::Parameter, registry_name, path, "", "")
    }
    pub fn make_local_parameter(path: &str) -> Self {
        Self::build(ObjectKind::Parameter, "", path, "", "")
    }
    pub fn make_parameter_value_group(registry_name: &str, path: &str, group: &str) -> Self {
        Self::build(ObjectKind::ParameterValueGroup, registry_name, path, group, "")
    }
    pub fn make_local_parameter_value_group(path: &str, group: &str) -> Self {
        Self::build(ObjectKind::ParameterValueGroup, "", path, group, "")
    }
    pub fn make_parameter_enum_string_value(registry_name: &str, path: &str, value: &str) -> Self {
        Self::build(ObjectKind::ParameterEnumStringValue, registry_name, path, "", value)
    }
    pub fn make_local_parameter_enum_string_value(path: &str, value: &str) -> Self {
        Self::build(ObjectKind::ParameterEnumStringValue, "", path, "", value)
    }

    fn build(kind: ObjectKind, registry_name: &str, path: &str, group: &str, value: &str) -> Self {
        let candidate = Self {
            kind,
            registry_name: registry_name.to_owned(),
            local_path: path.to_owned(),
            group_name: group.to_owned(),
            enum_string_value: value.to_owned(),
        };
        // the textual form must parse back to the same descriptor
        let flags = if registry_name.is_empty() { PARSE_NO_GLOBAL } else { PARSE_NO_LOCAL };
        let mut check = Self::default();
        if check.parse_from_string(&candidate.to_string(), flags) && check == candidate {
            candidate
        } else {
            Self::default()
        }
    }

    /// Same object, qualified by `registry_name`.
    pub fn to_global(&self, registry_name: &str) -> Self {
        match self.kind {
            ObjectKind::Invalid | ObjectKind::Registry => self.clone(),
            _ => Self { registry_name: registry_name.to_owned(), ..self.clone() },
        }
    }

    /// Same object without its registry qualification.
    pub fn to_local(&self) -> Self {
        match self.kind {
            ObjectKind::Invalid | ObjectKind::Registry => self.clone(),
            _ => Self { registry_name: String::new(), ..self.clone() },
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // ------------- Parsing -------------
    /// Parses `text`, trying the global forms before the local ones. On
    /// failure the descriptor is left invalid and `false` is returned.
    pub fn parse_from_string(&mut self, text: &str, flags: u32) -> bool {
        self.reset();
        let mut parsed = None;
        if flags & PARSE_NO_GLOBAL == 0 {
            parsed = [
                (Rule::registry, ObjectKind::Registry),
                (Rule::global_variant, ObjectKind::Variant),
                (Rule::global_parameter, ObjectKind::Parameter),
                (Rule::global_group, ObjectKind::ParameterValueGroup),
                (Rule::global_enum_value, ObjectKind::ParameterEnumStringValue),
            ]
            .into_iter()
            .find_map(|(rule, kind)| Self::try_rule(rule, kind, text));
        }
        if parsed.is_none() && flags & PARSE_NO_LOCAL == 0 {
            parsed = [
                (Rule::local_variant, ObjectKind::Variant),
                (Rule::local_parameter, ObjectKind::Parameter),
                (Rule::local_group, ObjectKind::ParameterValueGroup),
                (Rule::local_enum_value, ObjectKind::ParameterEnumStringValue),
            ]
            .into_iter()
            .find_map(|(rule, kind)| Self::try_rule(rule, kind, text));
        }
        match parsed {
            Some(info) => {
                *self = info;
                true
            }
            None => false,
        }
    }

    fn try_rule(rule: Rule, kind: ObjectKind, text: &str) -> Option<Self> {
        let top = PathParser::parse(rule, text).ok()?.next()?;
        let mut info = Self { kind, ..Self::default() };
        for pair in top.into_inner() {
            match pair.as_rule() {
                Rule::registry_name => info.registry_name = pair.as_str().to_owned(),
                Rule::variant_path | Rule::parameter_path => info.local_path = pair.as_str().to_owned(),
                Rule::group_name => info.group_name = pair.as_str().to_owned(),
                Rule::enum_value => info.enum_string_value = pair.as_str().to_owned(),
                _ => {}
            }
        }
        Some(info)
    }

    // ------------- Accessors -------------
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }
    pub fn is_valid(&self) -> bool {
        self.kind != ObjectKind::Invalid
    }
    pub fn is_registry(&self) -> bool {
        self.kind == ObjectKind::Registry
    }
    pub fn is_variant(&self) -> bool {
        self.kind == ObjectKind::Variant
    }
    pub fn is_parameter(&self) -> bool {
        self.kind == ObjectKind::Parameter
    }
    pub fn is_parameter_value_group(&self) -> bool {
        self.kind == ObjectKind::ParameterValueGroup
    }
    pub fn is_parameter_enum_string_value(&self) -> bool {
        self.kind == ObjectKind::ParameterEnumStringValue
    }
    pub fn is_global(&self) -> bool {
        self.is_valid() && (self.is_registry() || !self.registry_name.is_empty())
    }
    pub fn is_local(&self) -> bool {
        self.is_valid() && !self.is_registry() && self.registry_name.is_empty()
    }
    pub fn registry_name(&self) -> &str {
        &self.registry_name
    }
    /// Record path inside the registry; for groups and enumerated values this
    /// is the path of the owning parameter.
    pub fn local_path(&self) -> &str {
        &self.local_path
    }
    pub fn group_name(&self) -> &str {
        &self.group_name
    }
    pub fn enum_string_value(&self) -> &str {
        &self.enum_string_value
    }
    pub fn full_path(&self) -> String {
        self.to_string()
    }
    pub fn match_path(&self, path: &str) -> bool {
        self.full_path() == path
    }
}

impl fmt::Display for VariantObjectInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ObjectKind::Invalid => f.write_str("<invalid>"),
            ObjectKind::Registry => f.write_str(&self.registry_name),
            kind => {
                if !self.registry_name.is_empty() {
                    write!(f, "{}:", self.registry_name)?;
                }
                f.write_str(&self.local_path)?;
                match kind {
                    ObjectKind::ParameterValueGroup => write!(f, "@{}", self.group_name),
                    ObjectKind::ParameterEnumStringValue => write!(f, "={}", self.enum_string_value),
                    _ => Ok(()),
                }
            }
        }
    }
}

impl FromStr for VariantObjectInfo {
    type Err = VariantError;
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut info = VariantObjectInfo::new();
        if info.parse_from_string(text, 0) {
            Ok(info)
        } else {
            Err(VariantError::parse(format!("Invalid variant object path '{}'", text)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_parity_decides_the_kind() {
        let mut info = VariantObjectInfo::new();
        assert!(info.parse_from_string("has_source/source_params", PARSE_NO_GLOBAL));
        assert!(info.is_variant());
        assert!(info.parse_from_string("has_source/source_params/energy", PARSE_NO_GLOBAL));
        assert!(info.is_parameter());
        assert_eq!(info.local_path(), "has_source/source_params/energy");
    }

    #[test]
    fn global_forms_win_without_flags() {
        let info: VariantObjectInfo = "geo".parse().unwrap();
        assert!(info.is_registry());
        let info: VariantObjectInfo = "geo:layout/if_basic/shape@thin".parse().unwrap();
        assert!(info.is_parameter_value_group());
        assert_eq!(info.registry_name(), "geo");
        assert_eq!(info.local_path(), "layout/if_basic/shape");
        assert_eq!(info.group_name(), "thin");
        assert_eq!(info.to_string(), "geo:layout/if_basic/shape@thin");
    }

    #[test]
    fn local_forms_accept_a_leading_colon() {
        let mut info = VariantObjectInfo::new();
        assert!(info.parse_from_string(":mode@fast", PARSE_NO_GLOBAL));
        assert!(info.is_local());
        assert_eq!(info.to_string(), "mode@fast");
    }

    #[test]
    fn indexed_parameters() {
        let info = VariantObjectInfo::make_local_parameter("layer[3]/on/thickness");
        assert!(info.is_parameter());
        let info = VariantObjectInfo::make_local_variant("layer[3]/on[1]");
        assert!(!info.is_valid());
    }

    #[test]
    fn malformed_paths_are_invalid() {
        let mut info = VariantObjectInfo::new();
        assert!(info.parse_from_string("geo:", PARSE_NO_LOCAL));
        assert!(info.is_registry());
        assert!(!info.parse_from_string("a//b", 0));
        assert!(!info.is_valid());
        assert_eq!(info.to_string(), "<invalid>");
        assert!(!VariantObjectInfo::make_parameter("geo", "1abc").is_valid());
    }

    #[test]
    fn enumerated_values_keep_their_text() {
        let info = VariantObjectInfo::make_parameter_enum_string_value("geo", "material", "Al 6061");
        assert!(info.is_parameter_enum_string_value());
        assert_eq!(info.to_string(), "geo:material=Al 6061");
        assert!(info.to_local().is_local());
        assert!(info.to_local().to_global("geo").match_path("geo:material=Al 6061"));
    }

    #[test]
    fn name_validation() {
        assert!(validate_instance_name("has_source"));
        assert!(!validate_instance_name("has.source"));
        assert!(validate_model_name("has_source.PM"));
        assert!(!validate_model_name("9lives"));
    }
}
