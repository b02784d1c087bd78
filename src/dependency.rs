//! Dependencies: boolean predicates over the activity of other variants,
//! gating the enablement of a variant, a parameter value group or (in the
//! global scope) a whole registry.

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write;

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::error::{Result, VariantError};
use crate::object_info::{PARSE_NO_GLOBAL, PARSE_NO_LOCAL, VariantObjectInfo};

#[derive(Parser)]
#[grammar = "logic.pest"]
struct LogicParser;

/// Where the paths of a dependency live: inside one registry, or across the
/// registries of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyScope {
    Local,
    Global,
}

impl DependencyScope {
    fn parse_flags(&self) -> u32 {
        match self {
            DependencyScope::Local => PARSE_NO_GLOBAL,
            DependencyScope::Global => PARSE_NO_LOCAL,
        }
    }
}

impl fmt::Display for DependencyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyScope::Local => f.write_str("local"),
            DependencyScope::Global => f.write_str("global"),
        }
    }
}

/// The structure a dependency is evaluated against: a registry for local
/// dependencies, a repository for global ones.
pub trait DependencyContext {
    /// Whether the dependee variant is currently active.
    fn check_active_variant(&self, dependee: &VariantObjectInfo) -> Result<bool>;
    fn has_registry(&self, name: &str) -> bool;
    fn has_variant(&self, info: &VariantObjectInfo) -> bool;
    fn has_parameter(&self, info: &VariantObjectInfo) -> bool;
    /// Whether the model of the parameter named by `info` declares the group
    /// named by `info`.
    fn parameter_has_group(&self, info: &VariantObjectInfo) -> bool;
}

// ------------- Logic -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyLogic {
    Slot(u32),
    And(Vec<DependencyLogic>),
    Or(Vec<DependencyLogic>),
    Xor(Vec<DependencyLogic>),
    Not(Box<DependencyLogic>),
}

impl DependencyLogic {
    /// Parses a formula such as `and([0], or([1], not([2])))`.
    pub fn parse(formula: &str) -> Result<Self> {
        let mut pairs = LogicParser::parse(Rule::formula, formula)?;
        let top = pairs
            .next()
            .and_then(|f| f.into_inner().next())
            .ok_or_else(|| VariantError::parse(format!("Empty dependency logic formula '{}'", formula)))?;
        Self::from_pair(top)
    }

    fn from_pair(pair: Pair<'_, Rule>) -> Result<Self> {
        match pair.as_rule() {
            Rule::slot => {
                let text = pair.into_inner().next().map(|p| p.as_str()).unwrap_or_default();
                let slot = text
                    .parse::<u32>()
                    .map_err(|_| VariantError::parse(format!("Invalid slot index '{}'", text)))?;
                Ok(DependencyLogic::Slot(slot))
            }
            Rule::call => {
                let mut inner = pair.into_inner();
                let op = inner
                    .next()
                    .ok_or_else(|| VariantError::parse("Missing logic operator"))?
                    .as_rule();
                let args = inner.map(Self::from_pair).collect::<Result<Vec<_>>>()?;
                match op {
                    Rule::op_and => Ok(DependencyLogic::And(args)),
                    Rule::op_or => Ok(DependencyLogic::Or(args)),
                    Rule::op_xor => Ok(DependencyLogic::Xor(args)),
                    Rule::op_not => {
                        let mut args = args;
                        if args.len() != 1 {
                            return Err(VariantError::parse(format!("'not' takes exactly one input, {} given", args.len())));
                        }
                        Ok(DependencyLogic::Not(Box::new(args.remove(0))))
                    }
                    other => Err(VariantError::parse(format!("Unexpected logic operator {:?}", other))),
                }
            }
            other => Err(VariantError::parse(format!("Unexpected logic element {:?}", other))),
        }
    }

    /// Every input is connected and refers to a known slot.
    pub fn is_valid(&self, slots: &BTreeMap<u32, VariantObjectInfo>) -> bool {
        match self {
            DependencyLogic::Slot(s) => slots.contains_key(s),
            DependencyLogic::And(v) | DependencyLogic::Or(v) | DependencyLogic::Xor(v) => {
                !v.is_empty() && v.iter().all(|l| l.is_valid(slots))
            }
            DependencyLogic::Not(l) => l.is_valid(slots),
        }
    }

    pub fn evaluate(&self, slots: &BTreeMap<u32, VariantObjectInfo>, ctx: &dyn DependencyContext) -> Result<bool> {
        match self {
            DependencyLogic::Slot(s) => {
                let dependee = slots
                    .get(s)
                    .ok_or_else(|| VariantError::Domain(format!("Invalid dependee slot [{}]", s)))?;
                ctx.check_active_variant(dependee)
            }
            DependencyLogic::And(v) => {
                for l in v {
                    if !l.evaluate(slots, ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            DependencyLogic::Or(v) => {
                for l in v {
                    if l.evaluate(slots, ctx)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            DependencyLogic::Xor(v) => {
                let mut count = 0;
                for l in v {
                    if l.evaluate(slots, ctx)? {
                        count += 1;
                    }
                }
                Ok(count == 1)
            }
            DependencyLogic::Not(l) => Ok(!l.evaluate(slots, ctx)?),
        }
    }

    fn write_list(f: &mut fmt::Formatter<'_>, op: &str, v: &[DependencyLogic]) -> fmt::Result {
        write!(f, "{}(", op)?;
        for (i, l) in v.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", l)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for DependencyLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyLogic::Slot(s) => write!(f, "[{}]", s),
            DependencyLogic::And(v) => Self::write_list(f, "and", v),
            DependencyLogic::Or(v) => Self::write_list(f, "or", v),
            DependencyLogic::Xor(v) => Self::write_list(f, "xor", v),
            DependencyLogic::Not(l) => write!(f, "not({})", l),
        }
    }
}

// ------------- Dependency -------------
#[derive(Debug, Clone)]
pub struct VariantDependency {
    name: String,
    scope: DependencyScope,
    depender: VariantObjectInfo,
    dependees: BTreeMap<u32, VariantObjectInfo>,
    logic: Option<DependencyLogic>,
    locked: bool,
}

impl VariantDependency {
    pub fn new(name: &str, scope: DependencyScope) -> Self {
        Self {
            name: name.to_owned(),
            scope,
            depender: VariantObjectInfo::default(),
            dependees: BTreeMap::new(),
            logic: None,
            locked: false,
        }
    }

    fn check_unlocked(&self) -> Result<()> {
        if self.locked {
            return Err(VariantError::Locked(format!("Dependency '{}' is locked", self.name)));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn scope(&self) -> DependencyScope {
        self.scope
    }
    pub fn depender(&self) -> &VariantObjectInfo {
        &self.depender
    }
    pub fn dependees(&self) -> &BTreeMap<u32, VariantObjectInfo> {
        &self.dependees
    }
    pub fn logic(&self) -> Option<&DependencyLogic> {
        self.logic.as_ref()
    }
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Sets the object whose enablement this dependency decides. It must
    /// exist in `ctx`; parameters cannot be dependers.
    pub fn set_depender(&mut self, depender: VariantObjectInfo, ctx: &dyn DependencyContext) -> Result<()> {
        self.check_unlocked()?;
        if !depender.is_valid() {
            return Err(VariantError::Logic("Depender is not valid".into()));
        }
        if depender.is_parameter() {
            return Err(VariantError::Logic(format!("Variant parameter '{}' cannot depend on some variant", depender)));
        }
        match self.scope {
            DependencyScope::Local => {
                if !depender.is_local() {
                    return Err(VariantError::Logic(format!("Depender '{}' is not local", depender)));
                }
            }
            DependencyScope::Global => {
                if !depender.is_global() {
                    return Err(VariantError::Logic(format!("Depender '{}' is not global", depender)));
                }
                if depender.is_registry() && !ctx.has_registry(depender.registry_name()) {
                    return Err(VariantError::Logic(format!("No registry named '{}'", depender.registry_name())));
                }
            }
        }
        if depender.is_variant() && !ctx.has_variant(&depender) {
            return Err(VariantError::Logic(format!("No variant named '{}'", depender)));
        }
        if depender.is_parameter_value_group() || depender.is_parameter_enum_string_value() {
            let parameter = match depender.registry_name() {
                "" => VariantObjectInfo::make_local_parameter(depender.local_path()),
                registry => VariantObjectInfo::make_parameter(registry, depender.local_path()),
            };
            if !ctx.has_parameter(&parameter) {
                return Err(VariantError::Logic(format!("No variant parameter named '{}'", parameter)));
            }
            if depender.is_parameter_value_group() && !ctx.parameter_has_group(&depender) {
                return Err(VariantError::Logic(format!(
                    "Unknown group '{}' in model of parameter '{}'",
                    depender.group_name(),
                    parameter
                )));
            }
        }
        self.depender = depender;
        Ok(())
    }

    pub fn set_depender_by_path(&mut self, path: &str, ctx: &dyn DependencyContext) -> Result<()> {
        let mut info = VariantObjectInfo::new();
        if !info.parse_from_string(path, self.scope.parse_flags()) {
            return Err(VariantError::Logic(format!("Invalid depender identifier format '{}'", path)));
        }
        self.set_depender(info, ctx)
    }

    /// Connects a dependee variant at `slot`, or at the next free slot.
    pub fn add_dependee(&mut self, dependee: VariantObjectInfo, slot: Option<u32>) -> Result<u32> {
        self.check_unlocked()?;
        let slot = slot.unwrap_or(self.dependees.len() as u32);
        if !dependee.is_valid() {
            return Err(VariantError::Logic(format!("Dependee requested at slot [{}] is not valid", slot)));
        }
        let scoped = match self.scope {
            DependencyScope::Local => dependee.is_local(),
            DependencyScope::Global => dependee.is_global(),
        };
        if !scoped {
            return Err(VariantError::Logic(format!("Dependee '{}' is not {}", dependee, self.scope)));
        }
        if !dependee.is_variant() {
            return Err(VariantError::Logic(format!("Dependee '{}' requested at slot [{}] is not a variant", dependee, slot)));
        }
        self.dependees.insert(slot, dependee);
        Ok(slot)
    }

    pub fn add_dependee_by_path(&mut self, path: &str, slot: Option<u32>) -> Result<u32> {
        let mut info = VariantObjectInfo::new();
        if !info.parse_from_string(path, self.scope.parse_flags()) {
            return Err(VariantError::Logic(format!("Invalid dependee identifier format '{}'", path)));
        }
        self.add_dependee(info, slot)
    }

    pub fn has_dependee(&self, slot: u32) -> bool {
        self.dependees.contains_key(&slot)
    }

    pub fn has_dependee_by_path(&self, path: &str) -> bool {
        self.dependees.values().any(|d| d.match_path(path))
    }

    pub fn dependee(&self, slot: u32) -> Result<&VariantObjectInfo> {
        self.dependees
            .get(&slot)
            .ok_or_else(|| VariantError::Domain(format!("Invalid dependee slot [{}]", slot)))
    }

    pub fn build_logic_from_formula(&mut self, formula: &str) -> Result<()> {
        self.check_unlocked()?;
        let logic = DependencyLogic::parse(formula)
            .map_err(|e| VariantError::Logic(format!("Invalid dependency logic formula '{}': {}", formula, e)))?;
        self.logic = Some(logic);
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.depender.is_valid()
            && !self.dependees.is_empty()
            && self.logic.as_ref().is_some_and(|l| l.is_valid(&self.dependees))
    }

    /// Checks the dependency and installs the default logic when none was
    /// given: the single slot, or `and` over every slot.
    pub fn lock(&mut self) -> Result<()> {
        if self.locked {
            return Ok(());
        }
        if !self.depender.is_valid() {
            return Err(VariantError::Logic(format!("Invalid depender in dependency '{}'", self.name)));
        }
        if self.dependees.is_empty() {
            return Err(VariantError::Logic(format!("No dependees in dependency '{}'", self.name)));
        }
        if self.logic.is_none() {
            let mut slots: Vec<DependencyLogic> = self.dependees.keys().map(|s| DependencyLogic::Slot(*s)).collect();
            self.logic = Some(if slots.len() == 1 { slots.remove(0) } else { DependencyLogic::And(slots) });
        }
        if !self.is_valid() {
            return Err(VariantError::Logic(format!("Embedded logic of dependency '{}' is not valid", self.name)));
        }
        self.locked = true;
        Ok(())
    }

    pub fn evaluate(&self, ctx: &dyn DependencyContext) -> Result<bool> {
        if !self.locked {
            return Err(VariantError::Logic(format!("Dependency '{}' is not locked", self.name)));
        }
        match &self.logic {
            Some(logic) => logic.evaluate(&self.dependees, ctx),
            None => Err(VariantError::Invariant(format!("Locked dependency '{}' has no logic", self.name))),
        }
    }

    pub fn tree_dump(&self, indent: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}|-- Name: '{}' ({})", indent, self.name, self.scope);
        let _ = writeln!(out, "{}|-- Depender: '{}'", indent, self.depender);
        let _ = writeln!(out, "{}|-- Dependees: {}", indent, self.dependees.len());
        for (slot, dependee) in &self.dependees {
            let _ = writeln!(out, "{}|   |-- [{}] '{}'", indent, slot, dependee);
        }
        match &self.logic {
            Some(logic) => {
                let _ = writeln!(out, "{}|-- Logic: {}", indent, logic);
            }
            None => {
                let _ = writeln!(out, "{}|-- Logic: <none>", indent);
            }
        }
        let _ = writeln!(out, "{}`-- Locked: {}", indent, self.locked);
        out
    }
}
