#![allow(non_snake_case)]

use super::*;
use test_case::test_case;

// Config parsing tests

#[test]
fn ConfigFile___from_str___parses_both_sections() {
    let toml = r#"
[manager]
server_url = "http://cdn.example.com/bundles"
root_path = "game"
platform = "Linux"
max_parallel_downloads = 2

[cli]
package = "Levels"
group = "tools"
timeout_ms = 500
"#;

    let file = ConfigFile::from_str(toml).unwrap();

    assert_eq!(
        file.manager.server_url.as_deref(),
        Some("http://cdn.example.com/bundles")
    );
    assert_eq!(file.manager.root_path, PathBuf::from("game"));
    assert_eq!(file.manager.platform.as_deref(), Some("Linux"));
    assert_eq!(file.manager.max_parallel_downloads, 2);
    assert_eq!(file.manager.max_parallel_opens, 4);
    assert_eq!(file.cli.package.as_deref(), Some("Levels"));
    assert_eq!(file.cli.group, "tools");
    assert_eq!(file.cli.timeout_ms, 500);
}

#[test]
fn ConfigFile___from_str___empty_document_uses_defaults() {
    let file = ConfigFile::from_str("").unwrap();

    assert_eq!(file.manager, StowageConfig::default());
    assert_eq!(file.cli, CliSection::default());
}

#[test_case("[manager]\nmax_parallel_opens = 0"; "zero opens")]
#[test_case("[manager]\ndirectory_name = \"\""; "empty directory")]
#[test_case("[cli]\ngroup = \"\""; "empty group")]
#[test_case("[cli]\ntimeout_ms = 0"; "zero timeout")]
#[test_case("[cli]\npackage = \"\""; "empty package")]
#[test_case("[manager\nbroken"; "malformed toml")]
fn ConfigFile___from_str___rejects_invalid(toml: &str) {
    assert!(ConfigFile::from_str(toml).is_err());
}

#[test]
fn ConfigFile___with_overrides___replaces_file_values() {
    let file = ConfigFile::from_str("[manager]\nplatform = \"Linux\"").unwrap();
    let overrides = Overrides {
        root: Some(PathBuf::from("/data")),
        platform: Some("Windows".to_string()),
        server: Some("http://localhost:9000".to_string()),
    };

    let file = file.with_overrides(&overrides);

    assert_eq!(file.manager.root_path, PathBuf::from("/data"));
    assert_eq!(file.manager.platform.as_deref(), Some("Windows"));
    assert!(file.manager.uses_server());
}

#[test]
fn ConfigFile___package___prefers_argument_then_cli_then_manager_default() {
    let mut file = ConfigFile::default();
    assert_eq!(file.package(None), "Default");

    file.cli.package = Some("Levels".to_string());
    assert_eq!(file.package(None), "Levels");
    assert_eq!(file.package(Some("Ui")), "Ui");
}

#[test]
fn ConfigFile___from_file___reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stowage.toml");
    std::fs::write(&path, "[cli]\ngroup = \"disk\"").unwrap();

    let file = ConfigFile::from_file(&path).unwrap();

    assert_eq!(file.cli.group, "disk");
}

#[test]
fn resolve___explicit_missing_file___fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    let result = resolve(missing.to_str(), &Overrides::default());

    assert!(result.is_err());
}
