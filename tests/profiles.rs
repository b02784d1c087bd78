use variantry::error::VariantError;
use variantry::profile::{ExportFlags, Exporter, ImportFlags, Profile, export_profile, import_profile};
use variantry::repository::Repository;

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn setup() -> Repository {
    Repository::from_file(format!("{FIXTURES}/repository.toml")).expect("repository loads")
}

fn settings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn default_export() {
    let repository = setup();
    let profile = export_profile(&repository).unwrap();
    assert_eq!(profile.organization, "acme");
    assert_eq!(profile.application, "sim");
    // the display registry is inactive and not exported
    assert_eq!(
        profile.settings,
        settings(&[
            "geo:layout=basic",
            "geo:layout/if_basic/width=10 mm",
            "geo:debug=false",
            "geo:count=1",
            "geo:label[0]=__unset__",
            "geo:label[1]=__unset__",
            "phys:mode=fast",
        ])
    );
}

#[test]
fn export_follows_active_branches() {
    let mut repository = setup();
    repository.cmd_set_parameter_value("geo", "layout", "advanced").unwrap();
    repository.cmd_set_parameter_value("geo", "debug", "true").unwrap();
    repository.cmd_set_parameter_value("geo", "layout/if_advanced/width", "2.5 cm").unwrap();
    repository.cmd_set_parameter_value("vis", "color", "blue").unwrap();
    let profile = export_profile(&repository).unwrap();
    assert_eq!(
        profile.settings,
        settings(&[
            "geo:layout=advanced",
            "geo:layout/if_advanced/material=iron",
            "geo:layout/if_advanced/width=25 mm",
            "geo:debug=true",
            "geo:debug/is_on/verbosity=1",
            "geo:count=1",
            "geo:label[0]=__unset__",
            "geo:label[1]=__unset__",
            "phys:mode=fast",
            "vis:color=blue",
        ])
    );
}

#[test]
fn profiles_round_trip_between_repositories() {
    let mut source = setup();
    for (key, path, value) in [
        ("geo", "layout", "advanced"),
        ("geo", "layout/if_advanced/material", "copper"),
        ("geo", "layout/if_advanced/width", "40 mm"),
        ("geo", "count", "5"),
        ("geo", "label[0]", "front"),
        ("geo", "label[1]", "back side"),
        ("phys", "mode", "precise"),
        ("phys", "mode/with_tracking/step", "0.5 mm"),
    ] {
        source.cmd_set_parameter_value(key, path, value).unwrap();
    }
    let profile = export_profile(&source).unwrap();
    assert!(profile.settings.contains(&"geo:label[1]=back side".to_owned()));
    let mut target = setup();
    import_profile(&mut target, &profile, ImportFlags::default()).unwrap();
    assert_eq!(export_profile(&target).unwrap(), profile);
    assert_eq!(target.cmd_get_parameter_value("geo", "label[1]").unwrap(), "\"back side\"");
    assert!(target.is_active_variant("geo", "count/many").unwrap());
    assert!(target.is_accomplished().unwrap());
}

#[test]
fn unset_markers_unset_values() {
    let mut repository = setup();
    repository.cmd_set_parameter_value("geo", "label[0]", "front").unwrap();
    let profile = Profile {
        settings: settings(&[
            "geo:layout=basic",
            "geo:layout/if_basic/width=10 mm",
            "geo:debug=false",
            "geo:count=1",
            "geo:label[0]=__unset__",
            "geo:label[1]=kept",
        ]),
        ..Profile::default()
    };
    import_profile(&mut repository, &profile, ImportFlags::default()).unwrap();
    let label = repository.registry("geo").unwrap().parameter_record("label[0]").unwrap();
    assert!(!label.has_value());
    assert_eq!(repository.cmd_get_parameter_value("geo", "label[1]").unwrap(), "\"kept\"");
}

#[test]
fn unknown_registries_are_skipped_unless_requested() {
    let profile = Profile {
        settings: settings(&["zzz:a=1", "zzz:b=2", "phys:mode=fast"]),
        ..Profile::default()
    };
    let mut repository = setup();
    import_profile(&mut repository, &profile, ImportFlags::default()).unwrap();
    let strict = ImportFlags { dont_ignore_unknown_registry: true, ..ImportFlags::default() };
    let err = import_profile(&mut repository, &profile, strict).unwrap_err();
    assert!(err.to_string().contains("no known registry named 'zzz'"));
}

#[test]
fn organization_and_application() {
    let profile = Profile { organization: "other".into(), application: "sim".into(), settings: Vec::new() };
    let mut repository = setup();
    import_profile(&mut repository, &profile, ImportFlags::default()).unwrap();
    assert_eq!(repository.organization(), "acme");
    let strict = ImportFlags { dont_ignore_unknown_orgapp: true, ..ImportFlags::default() };
    let err = import_profile(&mut repository, &profile, strict).unwrap_err();
    assert!(err.to_string().contains("Non matching organization"));
    // an unnamed repository adopts them
    let mut blank = Repository::new("blank");
    import_profile(&mut blank, &profile, strict).unwrap();
    assert_eq!(blank.organization(), "other");
    assert_eq!(blank.application(), "sim");
}

#[test]
fn import_errors() {
    let mut repository = setup();
    // settings must come in traversal order
    let out_of_order = Profile { settings: settings(&["geo:debug=true"]), ..Profile::default() };
    let err = import_profile(&mut repository, &out_of_order, ImportFlags::default()).unwrap_err();
    assert!(err.to_string().contains("Unexpected setting for 'geo:debug'"));
    // plastic needs debug, which comes later in the profile
    let disabled = Profile {
        settings: settings(&["geo:layout=advanced", "geo:layout/if_advanced/material=nylon"]),
        ..Profile::default()
    };
    let err = import_profile(&mut repository, &disabled, ImportFlags::default()).unwrap_err();
    assert!(err.to_string().contains("Failed to convert variant parameter 'layout/if_advanced/material'"));
    let malformed = Profile { settings: settings(&["no registry here"]), ..Profile::default() };
    assert!(import_profile(&mut repository, &malformed, ImportFlags::default()).is_err());
}

#[test]
fn locked_and_sealed_repositories() {
    let mut repository = setup();
    repository.lock();
    let profile = Profile { settings: settings(&["geo:layout=advanced"]), ..Profile::default() };
    import_profile(&mut repository, &profile, ImportFlags::default()).unwrap();
    assert!(repository.is_locked());
    assert!(repository.is_active_variant("geo", "layout/if_advanced").unwrap());
    repository.cmd_set_parameter_value("phys", "mode", "precise").unwrap();
    repository.seal_registry("phys").unwrap();
    let profile = Profile { settings: settings(&["phys:mode=fast"]), ..Profile::default() };
    let err = import_profile(&mut repository, &profile, ImportFlags::default()).unwrap_err();
    assert!(matches!(err, VariantError::Locked(_)));
}

#[test]
fn exporter_flags() {
    let repository = setup();
    let mut profile = Profile::default();
    Exporter::new(&mut profile, ExportFlags::default()).process(&repository).unwrap();
    let first = profile.settings.len();
    Exporter::new(&mut profile, ExportFlags { debug: true, no_clear: true }).process(&repository).unwrap();
    assert_eq!(profile.settings.len(), 2 * first);
    Exporter::new(&mut profile, ExportFlags::default()).process(&repository).unwrap();
    assert_eq!(profile.settings.len(), first);
}

#[test]
fn profiles_are_stored_as_json() {
    let repository = setup();
    let profile = export_profile(&repository).unwrap();
    let path = std::env::temp_dir().join(format!("variantry_profile_{}.json", std::process::id()));
    profile.store(&path).unwrap();
    let loaded = Profile::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded, profile);
    let toml = Profile::from_toml_str(
        r#"
        organization = "acme"
        settings = ["geo:count=2"]
        "#,
    )
    .unwrap();
    assert_eq!(toml.settings, settings(&["geo:count=2"]));
    assert!(toml.application.is_empty());
}
