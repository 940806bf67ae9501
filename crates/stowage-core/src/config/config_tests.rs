#![allow(non_snake_case)]

use super::*;

#[test]
fn StowageConfig___default___has_expected_values() {
    let config = StowageConfig::default();

    assert_eq!(config.download_buffer_kb, 512);
    assert_eq!(config.max_parallel_downloads, 4);
    assert_eq!(config.max_parallel_opens, 4);
    assert_eq!(config.server_url, None);
    assert_eq!(config.directory_name, "AssetBundles");
    assert!(!config.simulate);
    assert_eq!(config.default_package, DEFAULT_PACKAGE);
}

#[test]
fn StowageConfig___from_json_empty___returns_default() {
    let config = StowageConfig::from_json(b"").unwrap();

    assert_eq!(config, StowageConfig::default());
}

#[test]
fn StowageConfig___from_json_partial___fills_defaults() {
    let json = br#"{"server_url": "https://cdn.example.com/bundles", "max_parallel_downloads": 2}"#;

    let config = StowageConfig::from_json(json).unwrap();

    assert_eq!(
        config.server_url.as_deref(),
        Some("https://cdn.example.com/bundles")
    );
    assert_eq!(config.max_parallel_downloads, 2);
    assert_eq!(config.max_parallel_opens, 4);
}

#[test]
fn StowageConfig___from_json_invalid___returns_serialization_error() {
    let result = StowageConfig::from_json(b"{oops");

    assert!(matches!(result, Err(StowageError::SerializationError(_))));
}

#[test]
fn StowageConfig___from_toml___parses_fields() {
    let text = r#"
        root_path = "/var/game"
        directory_name = "Bundles"
        platform = "Android"
        log_mode = "just_errors"
    "#;

    let config = StowageConfig::from_toml_str(text).unwrap();

    assert_eq!(config.root_path, PathBuf::from("/var/game"));
    assert_eq!(config.directory_name, "Bundles");
    assert_eq!(config.platform.as_deref(), Some("Android"));
    assert_eq!(config.log_mode, LogMode::JustErrors);
}

#[test]
fn StowageConfig___from_toml_zero_parallelism___rejected() {
    let result = StowageConfig::from_toml_str("max_parallel_opens = 0");

    assert!(matches!(result, Err(StowageError::ConfigError(_))));
}

#[test]
fn StowageConfig___uses_server___false_for_empty_url() {
    let config = StowageConfig::new().with_server_url("");

    assert!(!config.uses_server());
}

#[test]
fn StowageConfig___uses_server___true_for_url() {
    let config = StowageConfig::new().with_server_url("http://localhost:8080");

    assert!(config.uses_server());
}

#[test]
fn StowageConfig___download_buffer_bytes___multiplies_kib() {
    let config = StowageConfig {
        download_buffer_kb: 2,
        ..Default::default()
    };

    assert_eq!(config.download_buffer_bytes(), 2048);
}

#[test]
fn StowageConfig___builder_chain___combines_options() {
    let config = StowageConfig::new()
        .with_root_path("/tmp/root")
        .with_platform("Linux")
        .with_parallelism(1, 2)
        .with_simulate(true);

    assert_eq!(config.root_path, PathBuf::from("/tmp/root"));
    assert_eq!(config.platform.as_deref(), Some("Linux"));
    assert_eq!(config.max_parallel_downloads, 1);
    assert_eq!(config.max_parallel_opens, 2);
    assert!(config.simulate);
}
