#![allow(non_snake_case)]

use super::*;
use std::fs;
use tempfile::TempDir;
use test_case::test_case;

fn config_in(dir: &Path) -> ConfigFile {
    let mut config = ConfigFile::default();
    config.manager = config.manager.with_root_path(dir).with_platform("Linux");
    config
}

fn write_asset(dir: &TempDir, file: &str, contents: &[u8]) -> String {
    let path = dir.path().join(file);
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().to_string()
}

fn spec(name: &str) -> AssetSpec {
    AssetSpec {
        name: name.to_string(),
        type_tag: "prefab".to_string(),
        path: PathBuf::from(format!("{name}.bin")),
    }
}

// ============================================================================
// AssetSpec
// ============================================================================

#[test]
fn AssetSpec___parse___keeps_colons_in_path() {
    let spec = AssetSpec::parse("hero:prefab:C:/art/hero.bin").unwrap();

    assert_eq!(spec.name, "hero");
    assert_eq!(spec.type_tag, "prefab");
    assert_eq!(spec.path, PathBuf::from("C:/art/hero.bin"));
}

#[test_case("hero"; "name only")]
#[test_case("hero:prefab"; "missing path")]
#[test_case(":prefab:hero.bin"; "empty name")]
#[test_case("hero::hero.bin"; "empty type")]
fn AssetSpec___parse___rejects_malformed(text: &str) {
    assert!(AssetSpec::parse(text).is_err());
}

// ============================================================================
// run
// ============================================================================

#[test]
fn run___default_output___lands_in_bundle_directory() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(temp_dir.path());
    let hero = write_asset(&temp_dir, "hero.bin", b"hero bytes");

    run(
        &config,
        "characters",
        &[format!("hero:prefab:{hero}")],
        PackOptions::default(),
    )
    .unwrap();

    let path = StoragePaths::from_config(&config.manager)
        .unwrap()
        .bundle_path("characters");
    let mut bundle = ArchiveBundle::open(&path).unwrap();
    assert_eq!(bundle.read_asset("hero", Some("prefab")).unwrap(), b"hero bytes");
}

#[test]
fn run___with_package___records_bundle_and_hash_in_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(temp_dir.path());
    let stone = write_asset(&temp_dir, "stone.png", b"pixels");
    let hero = write_asset(&temp_dir, "hero.bin", b"hero");

    run(
        &config,
        "textures",
        &[format!("stone:texture:{stone}")],
        PackOptions {
            package: Some("Default".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    run(
        &config,
        "characters",
        &[format!("hero:prefab:{hero}")],
        PackOptions {
            package: Some("Default".to_string()),
            depends: vec!["textures".to_string()],
            ..Default::default()
        },
    )
    .unwrap();

    let paths = StoragePaths::from_config(&config.manager).unwrap();
    let manifest = BundleManifest::load(paths.manifest_path("Default")).unwrap();
    let characters = manifest.entry("characters").unwrap();
    assert_eq!(characters.dependencies, vec!["textures"]);
    assert!(characters.hash.as_deref().unwrap().starts_with("sha256:"));
    assert!(manifest.entry("textures").is_some());
}

#[test]
fn run___unknown_dependency___fails_and_keeps_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(temp_dir.path());
    let hero = write_asset(&temp_dir, "hero.bin", b"hero");

    let result = run(
        &config,
        "characters",
        &[format!("hero:prefab:{hero}")],
        PackOptions {
            depends: vec!["textures".to_string()],
            ..Default::default()
        },
    );

    assert!(result.is_err());
    let paths = StoragePaths::from_config(&config.manager).unwrap();
    assert!(!paths.manifest_path("Default").exists());
}

#[test]
fn run___missing_asset_file___fails() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(temp_dir.path());
    let missing = temp_dir.path().join("absent.bin");

    let result = run(
        &config,
        "characters",
        &[format!("hero:prefab:{}", missing.display())],
        PackOptions::default(),
    );

    assert!(result.is_err());
}

#[test]
fn run___no_assets___fails() {
    let temp_dir = TempDir::new().unwrap();

    let result = run(&config_in(temp_dir.path()), "empty", &[], PackOptions::default());

    assert!(result.is_err());
}

// ============================================================================
// Catalog and listing
// ============================================================================

#[test]
fn record_in_catalog___second_pack___keeps_existing_ids() {
    let temp_dir = TempDir::new().unwrap();

    let first = record_in_catalog(temp_dir.path(), "Default", "characters", &[spec("hero")])
        .unwrap();
    let second = record_in_catalog(
        temp_dir.path(),
        "Default",
        "characters",
        &[spec("hero"), spec("villain")],
    )
    .unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].1, "villain");

    let mut catalog = Catalog::new();
    catalog.load_package(temp_dir.path(), "Default").unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.resolve(&first[0].0).unwrap().asset, "hero");
}

#[test]
fn list___shows_archive_contents() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("characters");
    ArchiveBuilder::new("characters")
        .add_asset("hero", "prefab", b"hero".to_vec())
        .write(&output)
        .unwrap();

    list(&output.to_string_lossy()).unwrap();
}

#[test]
fn list___not_an_archive___fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_asset(&temp_dir, "plain.txt", b"not a zip");

    assert!(list(&path).is_err());
}
