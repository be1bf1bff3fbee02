use ultrasonics_core::{
    default_global_settings, BuiltinDefaults, ConfigurableSetting, InitOutcome, InstallState,
    ProcessMetadata, SettingDescriptor, SettingsSchema, Store, StoreConfig, StoreError,
};

fn api_schema() -> SettingsSchema {
    SettingsSchema::new(vec![
        SettingDescriptor::paragraph("Configure the api proxy."),
        SettingDescriptor::Configurable(ConfigurableSetting::text(
            "API URL",
            "api_url",
            "https://example/api/",
        )),
    ])
}

#[test]
fn install_state_moves_from_unknown_to_new_to_established() {
    let store = Store::open_in_memory().unwrap();
    assert_eq!(store.is_new_install().unwrap(), InstallState::Unknown);

    let outcome = store
        .initialize_if_absent(&ProcessMetadata::new("1.0.0"), &api_schema())
        .unwrap();
    assert_eq!(outcome, InitOutcome::Seeded);
    assert_eq!(store.is_new_install().unwrap(), InstallState::New);

    store.mark_not_new().unwrap();
    assert_eq!(store.is_new_install().unwrap(), InstallState::Established);
}

#[test]
fn initialize_twice_produces_same_rows() {
    let store = Store::open_in_memory().unwrap();
    let metadata = ProcessMetadata::new("1.0.0").with_entry("build", "abc123");

    store.initialize_if_absent(&metadata, &api_schema()).unwrap();
    let first = store.load_settings_raw().unwrap();

    let outcome = store.initialize_if_absent(&metadata, &api_schema()).unwrap();
    let second = store.load_settings_raw().unwrap();

    assert_eq!(
        outcome,
        InitOutcome::Existing {
            stored_version: Some("1.0.0".to_string()),
            version_matches: true,
        }
    );
    assert_eq!(first, second);
    assert_eq!(first.get("version").map(String::as_str), Some("1.0.0"));
    assert_eq!(first.get("build").map(String::as_str), Some("abc123"));
    assert_eq!(first.get("new_install").map(String::as_str), Some("1"));
    assert_eq!(
        first.get("api_url").map(String::as_str),
        Some("https://example/api/")
    );
    assert_eq!(first.len(), 4);
}

#[test]
fn version_mismatch_is_reported_but_not_fatal() {
    let store = Store::open_in_memory().unwrap();
    store
        .initialize_if_absent(&ProcessMetadata::new("1.0.0"), &api_schema())
        .unwrap();

    let outcome = store
        .initialize_if_absent(&ProcessMetadata::new("2.0.0"), &api_schema())
        .unwrap();

    assert_eq!(
        outcome,
        InitOutcome::Existing {
            stored_version: Some("1.0.0".to_string()),
            version_matches: false,
        }
    );
    let raw = store.load_settings_raw().unwrap();
    assert_eq!(raw.get("version").map(String::as_str), Some("1.0.0"));
}

#[test]
fn initialize_without_version_is_rejected_before_seeding() {
    let store = Store::open_in_memory().unwrap();

    let err = store
        .initialize_if_absent(&ProcessMetadata::default(), &api_schema())
        .unwrap_err();

    assert!(matches!(err, StoreError::InvalidInput(_)));
    assert_eq!(store.is_new_install().unwrap(), InstallState::Unknown);
}

#[test]
fn mark_not_new_before_seeding_is_a_no_op() {
    let store = Store::open_in_memory().unwrap();

    store.mark_not_new().unwrap();
    assert_eq!(store.is_new_install().unwrap(), InstallState::Unknown);
}

#[test]
fn settings_save_then_load_merged_and_raw() {
    let store = Store::open_in_memory().unwrap();
    let schema = api_schema();
    store
        .initialize_if_absent(&ProcessMetadata::new("1.0.0"), &schema)
        .unwrap();

    let changed = store
        .save_settings(&[("api_url", "https://custom/")])
        .unwrap();
    assert_eq!(changed, 1);

    let merged = store.load_settings(&schema).unwrap();
    assert_eq!(merged.find("api_url").unwrap().value, "https://custom/");
    assert_eq!(merged.descriptors[0], schema.descriptors[0]);
    assert!(merged.find("version").is_none());

    let raw = store.load_settings_raw().unwrap();
    assert_eq!(
        raw.get("api_url").map(String::as_str),
        Some("https://custom/")
    );
}

#[test]
fn settings_save_ignores_unknown_keys() {
    let store = Store::open_in_memory().unwrap();
    store
        .initialize_if_absent(&ProcessMetadata::new("1.0.0"), &api_schema())
        .unwrap();

    let changed = store
        .save_settings(&[
            ("not_a_setting".to_string(), "x".to_string()),
            ("api_url".to_string(), "https://custom/".to_string()),
        ])
        .unwrap();

    assert_eq!(changed, 1);
    assert!(!store
        .load_settings_raw()
        .unwrap()
        .contains_key("not_a_setting"));
}

#[test]
fn merged_view_keeps_default_for_settings_added_after_install() {
    let store = Store::open_in_memory().unwrap();
    store
        .initialize_if_absent(&ProcessMetadata::new("1.0.0"), &api_schema())
        .unwrap();

    let mut newer = api_schema();
    newer
        .descriptors
        .push(SettingDescriptor::Configurable(ConfigurableSetting::text(
            "Cache dir",
            "cache_dir",
            "/tmp/cache",
        )));

    let merged = store.load_settings(&newer).unwrap();
    assert_eq!(merged.find("cache_dir").unwrap().value, "/tmp/cache");
}

#[test]
fn settings_before_seeding_report_not_initialized() {
    let store = Store::open_in_memory().unwrap();

    assert!(matches!(
        store.load_settings_raw().unwrap_err(),
        StoreError::NotInitialized
    ));
    assert!(matches!(
        store.save_settings(&[("api_url", "x")]).unwrap_err(),
        StoreError::NotInitialized
    ));
}

#[test]
fn bootstrap_with_builtin_defaults_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::with_path(dir.path().join("ultrasonics.db"));

    {
        let store = Store::open(&config).unwrap();
        assert_eq!(
            store.bootstrap(&BuiltinDefaults::new("0.1.0")).unwrap(),
            InitOutcome::Seeded
        );
        store.mark_not_new().unwrap();
    }

    let store = Store::open(&config).unwrap();
    assert_eq!(store.is_new_install().unwrap(), InstallState::Established);
    let merged = store.load_settings(&default_global_settings()).unwrap();
    assert_eq!(
        merged.find("api_url").unwrap().value,
        "https://ultrasonics-api.herokuapp.com/api/"
    );
}
