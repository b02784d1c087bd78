use variantry::error::ErrorCode;
use variantry::kernel::{ConfigurationRegistry, Kernel, VariantLookup};
use variantry::preprocessor::VariantPreprocessor;
use variantry::repository::Repository;

fn setup() -> Repository {
    let mut repository =
        Repository::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/repository.toml")).expect("repository loads");
    repository.cmd_set_parameter_value("geo", "layout", "advanced").unwrap();
    repository.cmd_set_parameter_value("geo", "layout/if_advanced/width", "3 cm").unwrap();
    repository
}

#[test]
fn directives_resolve_against_a_repository() {
    let repository = setup();
    let pp = VariantPreprocessor::new(&repository);
    assert!(pp.is_variant_enabled("geo:layout/if_advanced").unwrap());
    assert!(!pp.is_variant_enabled("!geo:layout/if_advanced").unwrap());
    assert_eq!(pp.resolve_variant("!geo:debug/is_on").unwrap(), (false, true));
    assert_eq!(pp.preprocess("width=@variant(geo:layout/if_advanced/width)").unwrap(), "width=30 mm");
    assert_eq!(pp.preprocess("@variant(geo:layout)/@variant(phys:mode)").unwrap(), "\"advanced\"/\"fast\"");
    assert_eq!(pp.preprocess_string("@variant(geo:layout)").unwrap(), "advanced");
    assert_eq!(pp.preprocess_integer("@variant(geo:count)").unwrap(), 1);
    assert!(!pp.preprocess_boolean("@variant(geo:debug)").unwrap());
    assert_eq!(pp.preprocess_real("@variant(geo:layout/if_advanced/width)").unwrap(), 30.0);
}

#[test]
fn defaults_cover_failed_lookups() {
    let repository = setup();
    let pp = VariantPreprocessor::new(&repository);
    // the basic branch is inactive: its width cannot be read
    assert_eq!(pp.preprocess("@variant(geo:layout/if_basic/width|7 mm)").unwrap(), "7 mm");
    let err = pp.preprocess("@variant(geo:layout/if_basic/width)").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParameterInvalidContext);
    assert_eq!(pp.resolve_variant("geo:no/such|true").unwrap(), (true, false));
    let err = pp.is_variant_enabled("nowhere:layout/if_basic").unwrap_err();
    assert_eq!(err.code(), ErrorCode::CommandInvalidContext);
    let err = pp.is_variant_enabled("geo:layout/if_basic|maybe").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParsingFailure);
    let err = pp.preprocess_integer("@variant(geo:layout)").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParsingFailure);
}

#[test]
fn quotes_can_be_removed() {
    let repository = setup();
    let pp = VariantPreprocessor::new(&repository).with_remove_quotes(true);
    assert!(pp.is_remove_quotes());
    assert_eq!(pp.preprocess_parameter("phys:mode").unwrap(), "fast");
    let args = pp.preprocess_args(&["--mode=@variant(phys:mode)", "\"plain\"", "@variant(geo:count)"]).unwrap();
    assert_eq!(args, vec!["--mode=fast", "plain", "1"]);
    assert!(pp.preprocess_parameter("!phys:mode").is_err());
}

#[test]
fn kernel_snapshots_answer_lookups() {
    let mut repository = setup();
    let mut kernel = Kernel::new();
    assert!(!kernel.is_available());
    repository.system_export(&mut kernel).unwrap();
    assert_eq!(kernel.registry_names(), vec!["geo", "phys", "vis"]);
    assert!(!kernel.snapshot("vis").unwrap().is_active());
    assert!(kernel.has_external_configuration_registry("geo"));
    // the kernel keeps the state it was given
    repository.cmd_set_parameter_value("geo", "layout", "basic").unwrap();
    let pp = VariantPreprocessor::new(&kernel);
    assert!(pp.is_variant_enabled("geo:layout/if_advanced").unwrap());
    assert_eq!(pp.preprocess("@variant(geo:layout/if_advanced/width)").unwrap(), "30 mm");
    let cases = [
        ("nowhere:x", ErrorCode::CommandInvalidContext),
        ("geo:missing", ErrorCode::ParameterInvalidKey),
        ("geo:layout/if_basic/width", ErrorCode::ParameterInvalidContext),
        ("geo:label[0]", ErrorCode::ParameterUnsetValue),
    ];
    for (token, code) in cases {
        assert_eq!(pp.preprocess_parameter(token).unwrap_err().code(), code, "{token}");
    }
}

#[test]
fn kernel_imports_are_all_or_nothing() {
    let repository = setup();
    let mut kernel = Kernel::new();
    repository.system_export(&mut kernel).unwrap();
    kernel.clear_configuration_registry("phys").unwrap();
    assert!(repository.system_export(&mut kernel).is_err());
    assert_eq!(kernel.registry_names(), vec!["geo", "vis"]);
    repository.system_discard(&mut kernel).unwrap();
    assert!(kernel.registry_names().is_empty());
    assert!(kernel.clear_configuration_registry("geo").is_err());
    repository.system_export(&mut kernel).unwrap();
    assert_eq!(kernel.registry_names().len(), 3);
}

#[test]
fn detached_preprocessors_use_defaults() {
    let pp = VariantPreprocessor::detached();
    assert!(pp.is_variant_enabled("geo:debug/is_on|1").unwrap());
    assert_eq!(pp.preprocess_real("@variant(geo:layout/if_basic/width|2 cm)").unwrap(), 20.0);
    let err = pp.is_variant_enabled("geo:debug/is_on").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParameterInvalidContext);
    let empty = Kernel::new();
    let pp = VariantPreprocessor::new(&empty);
    assert_eq!(pp.preprocess("@variant(geo:count|4)").unwrap(), "4");
}
