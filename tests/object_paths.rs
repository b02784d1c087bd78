use variantry::manager::RegistryManager;
use variantry::object_info::{ObjectKind, PARSE_NO_GLOBAL, PARSE_NO_LOCAL, VariantObjectInfo};
use variantry::registry::Registry;
use variantry::repository::parse_variant_path;

fn setup() -> Registry {
    let manager = RegistryManager::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/geometry.toml"))
        .expect("geometry models load");
    Registry::from_manager(&manager).expect("registry builds")
}

#[test]
fn record_paths_parse_to_their_kind() {
    let registry = setup();
    for record in registry.records().iter().filter(|r| r.path() != "/") {
        let mut info = VariantObjectInfo::new();
        assert!(info.parse_from_string(record.path(), PARSE_NO_GLOBAL), "{}", record.path());
        assert_eq!(info.is_parameter(), record.is_parameter(), "{}", record.path());
        assert_eq!(info.is_variant(), record.is_variant(), "{}", record.path());
        let global = info.to_global("geo");
        assert_eq!(global.full_path(), format!("geo:{}", record.path()));
        assert_eq!(global.to_local(), info);
    }
}

#[test]
fn global_and_local_forms() {
    let info = VariantObjectInfo::make_parameter_value_group("geo", "layout/if_advanced/material", "plastic");
    assert_eq!(info.kind(), ObjectKind::ParameterValueGroup);
    assert_eq!(info.to_string(), "geo:layout/if_advanced/material@plastic");
    let mut parsed = VariantObjectInfo::new();
    assert!(!parsed.parse_from_string("geo:layout/if_advanced/material@plastic", PARSE_NO_GLOBAL));
    assert!(!parsed.is_valid());
    assert!(parsed.parse_from_string("geo:layout/if_advanced/material@plastic", PARSE_NO_LOCAL));
    assert_eq!(parsed, info);
    let value = VariantObjectInfo::make_local_parameter_enum_string_value("layout", "basic");
    assert!(value.is_parameter_enum_string_value());
    assert_eq!(value.enum_string_value(), "basic");
    assert!(value.match_path("layout=basic"));
    assert!(!VariantObjectInfo::make_variant("geo", "layout").is_valid());
    assert!(VariantObjectInfo::make_registry("geo").is_registry());
}

#[test]
fn repository_paths() {
    let parsed = parse_variant_path("geo:label[1]").unwrap();
    assert_eq!((parsed.registry.as_str(), parsed.path.as_str()), ("geo", "label[1]"));
    // only the first colon separates the registry
    let parsed = parse_variant_path("!geo:a:b").unwrap();
    assert_eq!(parsed.path, "a:b");
    assert!(parsed.reversed);
}
