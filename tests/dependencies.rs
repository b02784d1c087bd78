use variantry::dependency::DependencyScope;
use variantry::dependency_model::DependencyModel;
use variantry::error::ErrorCode;
use variantry::manager::RegistryManager;
use variantry::registry::Registry;
use variantry::setup::DependencyModelSetup;

fn setup() -> Registry {
    let manager = RegistryManager::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/geometry.toml"))
        .expect("geometry models load");
    Registry::from_manager(&manager).expect("registry builds")
}

fn model(text: &str) -> DependencyModel {
    let setup = DependencyModelSetup::from_toml_str(text).expect("dependency setup parses");
    DependencyModel::from_setup(DependencyScope::Local, &setup).expect("dependency records are consistent")
}

#[test]
fn value_groups_follow_their_dependees() {
    let mut registry = setup();
    registry.cmd_set_parameter_value("layout", "advanced").unwrap();
    let err = registry.cmd_set_parameter_value("layout/if_advanced/material", "nylon").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParameterInvalidValue);
    registry.cmd_set_parameter_value("layout/if_advanced/material", "copper").unwrap();
    registry.cmd_set_parameter_value("debug", "true").unwrap();
    registry.cmd_set_parameter_value("layout/if_advanced/material", "nylon").unwrap();
    // switching debug off disables the plastic group: back to the default
    registry.cmd_set_parameter_value("debug", "false").unwrap();
    assert_eq!(registry.cmd_get_parameter_value("layout/if_advanced/material").unwrap(), "\"iron\"");
}

#[test]
fn metal_values_survive_dependee_changes() {
    let mut registry = setup();
    registry.cmd_set_parameter_value("layout", "advanced").unwrap();
    registry.cmd_set_parameter_value("debug", "true").unwrap();
    registry.cmd_set_parameter_value("layout/if_advanced/material", "copper").unwrap();
    registry.cmd_set_parameter_value("debug", "false").unwrap();
    assert_eq!(registry.cmd_get_parameter_value("layout/if_advanced/material").unwrap(), "\"copper\"");
}

#[test]
fn enabled_checks_through_the_editor() {
    let mut registry = setup();
    let material = registry.record_id("layout/if_advanced/material").unwrap();
    let editor = registry.edit();
    assert!(!editor.check_enabled_group(material, "plastic").unwrap());
    assert!(editor.check_enabled_group(material, "metal").unwrap());
    assert!(editor.check_enabled_group(material, "wood").is_err());
    assert!(!editor.is_string_valid("layout/if_advanced/material", "nylon").unwrap());
    assert!(editor.is_string_valid("layout/if_advanced/material", "iron").unwrap());
    let count = registry.record_id("count").unwrap();
    assert!(registry.edit().check_enabled_parameter(count).unwrap());
}

#[test]
fn variant_dependers_are_checked_on_assignment_only() {
    let mut registry = setup();
    registry.cmd_set_parameter_value("layout", "advanced").unwrap();
    registry.cmd_set_parameter_value("count", "5").unwrap();
    registry.cmd_set_parameter_value("layout", "basic").unwrap();
    assert_eq!(registry.cmd_get_parameter_value("count").unwrap(), "5");
    assert!(registry.is_active_variant("count/many").unwrap());
    let err = registry.cmd_set_parameter_value("count", "6").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParameterInvalidValue);
}

#[test]
fn reverse_index_maps_dependees_to_dependers() {
    let registry = setup();
    let model = registry.dependency_model().expect("local dependencies loaded");
    assert_eq!(model.scope(), DependencyScope::Local);
    let dependers = model.dependers_of("debug/is_on").unwrap();
    assert!(dependers.contains("layout/if_advanced/material@plastic"));
    assert!(model.dependers_of("layout/if_advanced").unwrap().contains("count/many"));
    assert!(model.dependers_of("layout/if_basic").is_none());
    assert!(model.has_dependency("count/many"));
    let dependency = model.dependency("layout/if_advanced/material@plastic").unwrap();
    assert_eq!(dependency.name(), "plastic_needs_debug");
    assert!(dependency.is_locked());
    assert_eq!(dependency.logic().unwrap().to_string(), "[0]");
    assert!(!dependency.evaluate(&registry).unwrap());
}

#[test]
fn dependency_records_are_checked_on_insertion() {
    let mut model = DependencyModel::new(DependencyScope::Local);
    model.add_dependee_record(0, "debug/is_on").unwrap();
    assert!(model.add_dependee_record(0, "count/many").is_err());
    assert!(model.add_dependee_record(1, "debug/is_on").is_err());
    assert!(model.add_dependee_record(2, "").is_err());
    model.add_dependency_record("a", "count/many", vec![0], None).unwrap();
    assert!(model.add_dependency_record("a", "layout/if_advanced", vec![0], None).is_err());
    assert!(model.add_dependency_record("b", "count/many", vec![0], None).is_err());
    assert!(model.add_dependency_record("c", "layout/if_advanced", vec![], None).is_err());
    assert!(model.add_dependency_record("d", "layout/if_advanced", vec![7], None).is_err());
    assert!(model.has_dependee_record_by_path("debug/is_on"));
}

#[test]
fn initialization_validates_against_the_registry() {
    let registry = setup();
    let cases = [
        // unknown dependee variant
        r#"
        dependees = [{ slot = 0, variant = "debug/is_off" }]
        dependencies = [{ name = "x", depender = "count/many", slots = [0] }]
        "#,
        // parameters cannot be dependers
        r#"
        dependees = [{ slot = 0, variant = "debug/is_on" }]
        dependencies = [{ name = "x", depender = "count", slots = [0] }]
        "#,
        // unknown group
        r#"
        dependees = [{ slot = 0, variant = "debug/is_on" }]
        dependencies = [{ name = "x", depender = "layout/if_advanced/material@wood", slots = [0] }]
        "#,
        // logic refers to a slot the dependency does not use
        r#"
        dependees = [{ slot = 0, variant = "debug/is_on" }, { slot = 1, variant = "count/many" }]
        dependencies = [{ name = "x", depender = "layout/if_advanced", slots = [0], logic = "and([0], [1])" }]
        "#,
    ];
    for text in cases {
        let mut model = model(text);
        assert!(model.initialize(&registry).is_err(), "{text}");
    }
}

#[test]
fn custom_logic_formulas() {
    let mut registry = setup();
    let mut model = model(
        r#"
        dependees = [{ slot = 0, variant = "debug/is_on" }, { slot = 1, variant = "layout/if_basic" }]
        dependencies = [{ name = "x", depender = "layout/if_advanced", slots = [0, 1], logic = "or([0], not([1]))" }]
        "#,
    );
    model.initialize(&registry).unwrap();
    assert!(model.initialize(&registry).is_err());
    let dependency = model.dependency("layout/if_advanced").unwrap();
    assert!(!dependency.evaluate(&registry).unwrap());
    registry.cmd_set_parameter_value("debug", "true").unwrap();
    assert!(dependency.evaluate(&registry).unwrap());
    let dump = model.tree_dump("");
    assert!(dump.contains("or([0], not([1]))"));
}

#[test]
fn local_model_loads_once() {
    let mut registry = setup();
    let setup = DependencyModelSetup::default();
    assert!(registry.load_local_dependency_model(&setup).is_err());
}
