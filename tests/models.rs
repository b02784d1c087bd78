use variantry::datatype::ParameterValue;
use variantry::error::VariantError;
use variantry::manager::RegistryManager;
use variantry::registry::Registry;

fn setup() -> RegistryManager {
    RegistryManager::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/geometry.toml"))
        .expect("geometry models load")
}

fn broken(parameter: &str) -> VariantError {
    let text = format!(
        r#"
        name = "broken"
        top_variant_name = "top.VM"

        {parameter}

        [[variants]]
        name = "top.VM"

        [[variants.parameters]]
        name = "p"
        model = "p.PM"
        "#
    );
    RegistryManager::from_toml_str(&text).unwrap_err()
}

#[test]
fn manager_exposes_its_models() {
    let manager = setup();
    assert_eq!(manager.name(), "geometry");
    assert_eq!(manager.display_name(), "Geometry");
    assert!(manager.has_parameter_model("width.PM"));
    assert!(manager.has_variant_model("advanced.VM"));
    assert!(!manager.has_variant_model("width.PM"));
    let material = manager.parameter_model("material.PM").unwrap();
    assert!(material.has_group("plastic"));
    assert_eq!(material.value_group(&ParameterValue::String("nylon".into())), Some("plastic"));
    let advanced = manager.variant_model("advanced.VM").unwrap();
    assert_eq!(advanced.ranked_parameter_names(), vec!["material", "width"]);
    assert_eq!(manager.local_dependencies().unwrap().dependencies.len(), 2);
}

#[test]
fn registries_can_start_below_the_top_model() {
    let manager = setup();
    let mut registry = Registry::new("adv");
    registry.initialize_from(&manager, Some("advanced.VM"), "", "", "").unwrap();
    assert_eq!(registry.name(), "adv");
    assert_eq!(registry.top_variant_name(), "advanced.VM");
    assert!(registry.has_parameter_record("material"));
    assert!(registry.has_parameter_record("width"));
    assert!(registry.initialize_from(&manager, None, "", "", "").is_err());
    let mut other = Registry::new("other");
    assert!(other.initialize_from(&manager, Some("missing.VM"), "", "", "").is_err());
}

#[test]
fn broken_parameter_models_are_reported() {
    let cases = [
        (r#"
        [[parameters]]
        name = "p.PM"
        type = "complex"
        "#, "Invalid type"),
        (r#"
        [[parameters]]
        name = "p.PM"
        type = "integer"
        mutability = "fixed"
        "#, "has no fixed value"),
        (r#"
        [[parameters]]
        name = "p.PM"
        type = "string"
        mode = "enumeration"
        "#, "has no values"),
        (r#"
        [[parameters]]
        name = "p.PM"
        type = "real"
        unit_label = "length"
        default = "3 s"
        "#, "is not a length"),
        (r#"
        [[parameters]]
        name = "q.PM"
        type = "boolean"
        "#, "Unknown parameter model 'p.PM'"),
    ];
    for (parameter, message) in cases {
        let err = broken(parameter);
        assert!(err.to_string().contains(message), "{err} should mention {message}");
    }
}

#[test]
fn top_variant_must_exist() {
    let err = RegistryManager::from_toml_str(
        r#"
        name = "empty"
        top_variant_name = "nothing.VM"
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, VariantError::Config(_)));
}
