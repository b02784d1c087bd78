//! Variantry – a variant configuration engine.
//!
//! An application declares, in configuration files, the *variant models* it
//! supports: trees of parameters whose values switch variants on and off,
//! variants that in turn carry further parameters, and dependencies that
//! enable a variant or a group of values only when other variants are
//! active. Variantry instantiates these models into live registries, keeps
//! their activation state consistent as values change, and exports or
//! imports the resulting choices as a *profile*.
//!
//! * A [`parameter_model::ParameterModel`] describes one typed parameter
//!   (boolean, integer, real with units, string): its mutability, default or
//!   fixed value, domain, enumerated values and groups, and the variants
//!   each value triggers.
//! * A [`variant_model::VariantModel`] lists the parameters a variant
//!   carries, in rank order.
//! * A [`manager::RegistryManager`] builds and owns every model described by
//!   one configuration file.
//! * A [`registry::Registry`] is an instantiated tree of
//!   [`record::VariantRecord`]s alternating parameter and variant records
//!   below a top variant record `/`.
//! * A [`repository::Repository`] mounts registries under names, orders
//!   them by rank and carries the dependencies spanning several registries.
//!
//! ## Activation
//! Setting a parameter value activates the daughter variants that value
//! triggers and deactivates the others; activation cascades recursively
//! through the tree. A [`dependency::VariantDependency`] is a boolean
//! formula over the activity of dependee variants deciding whether its
//! depender (a variant, a value group, or in a repository a whole registry)
//! is enabled. Whenever a dependee changes, the values of affected
//! parameters are re-validated and fall back to their defaults when no
//! longer allowed. The cascade engine lives in [`cascade`]; mutations go
//! through an [`cascade::Editor`], obtained from [`registry::Registry::edit`]
//! or [`repository::Repository::edit_registry`].
//!
//! ## Outcomes
//! Structural mistakes (unknown names, locked repositories, broken models)
//! are reported as [`error::VariantError`]. Value commands return an
//! [`error::CommandResult`] whose error carries an [`error::ErrorCode`], and
//! a failed command leaves the registry untouched.
//!
//! ## Quick Start
//! ```
//! use variantry::manager::RegistryManager;
//! use variantry::registry::Registry;
//!
//! let manager = RegistryManager::from_toml_str(r#"
//!     name = "demo"
//!     top_variant_name = "top"
//!
//!     [[parameters]]
//!     name = "debug.PM"
//!     type = "boolean"
//!     default = false
//!
//!     [[variants]]
//!     name = "top"
//!     parameters = [{ name = "debug", model = "debug.PM" }]
//! "#).unwrap();
//! let mut registry = Registry::from_manager(&manager).unwrap();
//! registry.cmd_set_parameter_value("debug", "true").unwrap();
//! assert_eq!(registry.cmd_get_parameter_value("debug").unwrap(), "true");
//! ```
//!
//! ## Modules
//! * [`object_info`] – parsing of `registry:path@group` object identifiers.
//! * [`dependency`], [`dependency_model`] – dependency formulas and their
//!   local or global collections.
//! * [`profile`] – the `registry:path=value` settings list and its exporter
//!   and importer.
//! * [`kernel`] – a configuration registry repositories publish to.
//! * [`preprocessor`] – `@variant(...)` directives in configuration text.

pub mod cascade;
pub mod datatype;
pub mod dependency;
pub mod dependency_model;
pub mod error;
pub mod kernel;
pub mod manager;
pub mod object_info;
pub mod parameter_model;
pub mod preprocessor;
pub mod profile;
pub mod record;
pub mod registry;
pub mod repository;
pub mod setup;
pub mod units;
pub mod variant_model;
