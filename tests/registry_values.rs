use variantry::error::{ErrorCode, error_code};
use variantry::manager::RegistryManager;
use variantry::registry::Registry;

fn setup() -> Registry {
    let manager = RegistryManager::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/geometry.toml"))
        .expect("geometry models load");
    Registry::from_manager(&manager).expect("registry builds")
}

#[test]
fn enumerated_string_switches_variants() {
    let mut registry = setup();
    registry.cmd_set_parameter_value("layout", "advanced").expect("advanced is enumerated");
    assert!(!registry.is_active_variant("layout/if_basic").unwrap());
    assert!(registry.is_active_variant("layout/if_advanced").unwrap());
    assert!(registry.is_active_parameter("layout/if_advanced/material").unwrap());
    assert!(!registry.is_active_parameter("layout/if_basic/width").unwrap());
    assert_eq!(registry.cmd_get_parameter_value("layout").unwrap(), "\"advanced\"");
    // quoted tokens are accepted as well
    registry.cmd_set_parameter_value("layout", "\"basic\"").unwrap();
    assert!(registry.is_active_variant("layout/if_basic").unwrap());
    let err = registry.cmd_set_parameter_value("layout", "fancy").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParameterInvalidValue);
    assert!(registry.is_active_variant("layout/if_basic").unwrap());
}

#[test]
fn reals_need_a_unit_of_the_right_dimension() {
    let mut registry = setup();
    registry.cmd_set_parameter_value("layout/if_basic/width", "2.5 cm").unwrap();
    let width = registry.parameter_record("layout/if_basic/width").unwrap();
    assert_eq!(width.real_value().unwrap(), 25.0);
    assert_eq!(registry.cmd_get_parameter_value("layout/if_basic/width").unwrap(), "25 mm");
    let outcomes = [
        ("25", ErrorCode::ParameterInvalidUnit),
        ("2 s", ErrorCode::ParameterInvalidUnit),
        ("abc", ErrorCode::ParsingFailure),
        ("500 mm", ErrorCode::ParameterInvalidValue),
    ];
    for (token, code) in outcomes {
        let result = registry.cmd_set_parameter_value("layout/if_basic/width", token);
        assert_eq!(error_code(&result), code, "token {token}");
    }
    // failed commands leave the value untouched
    assert_eq!(registry.cmd_get_parameter_value("layout/if_basic/width").unwrap(), "25 mm");
}

#[test]
fn booleans_and_integers() {
    let mut registry = setup();
    registry.cmd_set_parameter_value("debug", "1").unwrap();
    assert!(registry.is_active_variant("debug/is_on").unwrap());
    assert_eq!(registry.cmd_get_parameter_value("debug/is_on/verbosity").unwrap(), "1");
    registry.cmd_set_parameter_value("debug/is_on/verbosity", "3").unwrap();
    let err = registry.cmd_set_parameter_value("debug/is_on/verbosity", "4").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParameterInvalidValue);
    let err = registry.cmd_set_parameter_value("debug/is_on/verbosity", "three").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParsingFailure);
    registry.cmd_set_parameter_value("debug", "false").unwrap();
    assert!(!registry.is_active_variant("debug/is_on").unwrap());
    let err = registry.cmd_get_parameter_value("debug/is_on/verbosity").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParameterInvalidContext);
    // the deactivated parameter keeps its value
    registry.cmd_set_parameter_value("debug", "true").unwrap();
    assert_eq!(registry.cmd_get_parameter_value("debug/is_on/verbosity").unwrap(), "3");
}

#[test]
fn command_error_codes() {
    let mut registry = setup();
    let cases = [
        ("nothing", "1", ErrorCode::ParameterInvalidKey),
        ("layout/if_basic", "1", ErrorCode::ParameterInvalidKey),
        ("level", "4", ErrorCode::ParameterInvalidContext),
        ("layout/if_advanced/material", "copper", ErrorCode::ParameterInvalidContext),
        ("count", "11", ErrorCode::ParameterInvalidValue),
        ("count", "1.5", ErrorCode::ParsingFailure),
    ];
    for (path, token, code) in cases {
        let result = registry.cmd_set_parameter_value(path, token);
        assert_eq!(error_code(&result), code, "{path}={token}");
    }
    assert_eq!(
        registry.cmd_get_parameter_value("label[0]").unwrap_err().code(),
        ErrorCode::ParameterUnsetValue
    );
    assert_eq!(registry.cmd_is_active_variant("count").unwrap_err().code(), ErrorCode::ParameterInvalidKey);
    // commands take string tokens verbatim, the textual encoding does not
    registry.cmd_set_parameter_value("label[0]", "two words").unwrap();
    let err = registry.edit().string_to_value("label[1]", "two words").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParsingFailure);
    assert_eq!(ErrorCode::ParameterInvalidUnit.label(), "CEC_PARAMETER_INVALID_UNIT");
}

#[test]
fn editor_typed_setters() {
    let mut registry = setup();
    let mut editor = registry.edit();
    let err = editor.set_integer_value("debug", 1).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParameterInvalidType);
    assert!(editor.is_integer_valid("count", 2).unwrap());
    assert!(!editor.is_integer_valid("count", 42).unwrap());
    editor.set_string_value("label[0]", "first words").unwrap();
    editor.set_string_value("label[1]", "second").unwrap();
    editor.set_boolean_value("debug", true).unwrap();
    editor.set_default_value("debug").unwrap();
    assert!(editor.set_fixed_value("debug").is_err());
    editor.set_fixed_value("level").unwrap();
    assert_eq!(editor.value_to_string("label[0]").unwrap(), "\"first words\"");
    editor.unset_value("label[1]").unwrap();
    assert_eq!(editor.value_to_string("label[1]").unwrap_err().code(), ErrorCode::ParameterUnsetValue);
    editor.string_to_value("label[1]", "\"done\"").unwrap();
    assert!(registry.is_accomplished());
    assert!(!registry.is_active_variant("debug/is_on").unwrap());
    let debug = registry.parameter_record("debug").unwrap();
    assert!(debug.default_value_is_set().unwrap());
}

#[test]
fn integer_ranges_trigger_variants_when_enabled() {
    let mut registry = setup();
    // count/many requires the advanced layout
    let err = registry.cmd_set_parameter_value("count", "5").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParameterInvalidValue);
    registry.cmd_set_parameter_value("layout", "advanced").unwrap();
    registry.cmd_set_parameter_value("count", "5").unwrap();
    assert!(registry.is_active_variant("count/many").unwrap());
    registry.cmd_set_parameter_value("count", "2").unwrap();
    assert!(!registry.is_active_variant("count/many").unwrap());
}

#[test]
fn unchanged_activity_triggers_no_cascade() {
    let mut registry = setup();
    assert!(!registry.edit().set_active("layout/if_basic", true).unwrap());
    registry.edit().set_real_value("layout/if_basic/width", 20.0).unwrap();
    assert!(!registry.edit().set_active("layout/if_basic", true).unwrap());
    assert!(!registry.edit().set_active("debug/is_on", false).unwrap());
    assert!(registry.is_active_parameter("layout/if_basic/width").unwrap());
    assert_eq!(registry.cmd_get_parameter_value("layout/if_basic/width").unwrap(), "20 mm");
    assert!(!registry.is_active_variant("debug/is_on").unwrap());
}

#[test]
fn quoted_string_tokens_are_unescaped() {
    let mut registry = setup();
    registry.cmd_set_parameter_value("label[0]", r#""say \"hi\"""#).unwrap();
    let label = registry.parameter_record("label[0]").unwrap();
    assert_eq!(label.string_value().unwrap(), r#"say "hi""#);
    assert_eq!(registry.cmd_get_parameter_value("label[0]").unwrap(), r#""say \"hi\"""#);
    // same value through the profile path
    registry.edit().string_to_value("label[1]", r#""say \"hi\"""#).unwrap();
    assert_eq!(registry.parameter_record("label[1]").unwrap().string_value().unwrap(), r#"say "hi""#);
    // bare tokens are taken as written
    registry.cmd_set_parameter_value("label[0]", r#"a\b"#).unwrap();
    assert_eq!(registry.parameter_record("label[0]").unwrap().string_value().unwrap(), r#"a\b"#);
    let err = registry.cmd_set_parameter_value("label[0]", r#""bad " quote""#).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParsingFailure);
}
