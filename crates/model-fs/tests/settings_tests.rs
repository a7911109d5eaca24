use model_fs::{DEFAULT_SETTINGS_FILES, ModulePath, find_settings_file};
use std::fs;
use tempfile::TempDir;

fn write(temp: &TempDir, relative: &str) {
    let path = temp.path().join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

#[test]
fn test_finds_settings_in_project_dir() {
    let temp = TempDir::new().unwrap();
    write(&temp, "settings.gradle");

    let dir = ModulePath::new(temp.path());
    let found = find_settings_file(&dir, DEFAULT_SETTINGS_FILES).unwrap();
    assert_eq!(found, dir.join("settings.gradle"));
}

#[test]
fn test_finds_settings_in_ancestor() {
    let temp = TempDir::new().unwrap();
    write(&temp, "settings.gradle.kts");
    write(&temp, "libs/core/build.gradle.kts");

    let root = ModulePath::new(temp.path());
    let module = root.join("libs/core");
    let found = find_settings_file(&module, DEFAULT_SETTINGS_FILES).unwrap();
    assert_eq!(found, root.join("settings.gradle.kts"));
}

#[test]
fn test_innermost_settings_wins() {
    let temp = TempDir::new().unwrap();
    write(&temp, "settings.gradle");
    write(&temp, "nested/settings.gradle");
    fs::create_dir_all(temp.path().join("nested/app")).unwrap();

    let root = ModulePath::new(temp.path());
    let found = find_settings_file(&root.join("nested/app"), DEFAULT_SETTINGS_FILES).unwrap();
    assert_eq!(found, root.join("nested/settings.gradle"));
}

#[test]
fn test_name_order_is_respected() {
    let temp = TempDir::new().unwrap();
    write(&temp, "settings.gradle");
    write(&temp, "settings.gradle.kts");

    let dir = ModulePath::new(temp.path());
    let found = find_settings_file(&dir, &["settings.gradle.kts", "settings.gradle"]).unwrap();
    assert_eq!(found.file_name(), Some("settings.gradle.kts"));
}

#[test]
fn test_directory_named_like_settings_is_ignored() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("app/settings.gradle")).unwrap();

    let dir = ModulePath::new(temp.path().join("app"));
    let found = find_settings_file(&dir, &["settings.gradle"]);
    assert!(
        found.is_none() || found.as_ref().is_some_and(|f| f.is_file()),
        "a directory must never be reported as settings file, got: {found:?}"
    );
}
