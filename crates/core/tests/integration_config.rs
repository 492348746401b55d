//! Integration tests for the tool configuration file
//!
//! These go through `ConfigManager` the way the CLI does: create on first
//! run, register profiles, migrate on version change.

use semver::Version;
use tempfile::TempDir;
use xman_core::config::{ConfigManager, ToolProfile};
use xman_core::errors::{ConfigError, XmanError};
use xman_core::script::{ScriptBuilder, ScriptType};

fn manager(dir: &TempDir) -> ConfigManager {
    let manager = ConfigManager::new(dir.path().join("xman.json"));
    manager
        .ensure_config_file(&Version::new(4, 0, 0), dir.path())
        .expect("Should create config file");
    manager
}

#[test]
fn test_first_run_writes_defaults() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);

    let config = manager.get_config().unwrap();
    assert_eq!(config.version, Some(Version::new(4, 0, 0)));
    assert!(config.profiles.is_empty());
    assert!(config.cd_root_path.ends_with("ContinuousDeployment"));

    let database = manager.default_install_database_options().unwrap();
    assert_eq!(database.database_name, "xperience");

    // The generated admin password is never persisted
    let raw = std::fs::read_to_string(manager.path()).unwrap();
    assert!(!raw.contains("AdminPassword"));
}

#[test]
fn test_newer_tool_version_is_recorded() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);
    manager.add_profile(&ToolProfile::new("site", "/srv/site")).unwrap();

    manager
        .ensure_config_file(&Version::new(4, 1, 0), dir.path())
        .unwrap();

    let config = manager.get_config().unwrap();
    assert_eq!(config.version, Some(Version::new(4, 1, 0)));
    assert_eq!(config.profiles.len(), 1);
}

#[test]
fn test_profile_lifecycle() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);
    let one = ToolProfile::new("One", "/srv/one");
    let two = ToolProfile::new("two", "/srv/two");

    manager.add_profile(&one).unwrap();
    assert_eq!(manager.get_current_profile().unwrap(), Some(one.clone()));

    manager.add_profile(&two).unwrap();
    let duplicate = manager.add_profile(&ToolProfile::new("ONE", "/elsewhere"));
    assert!(matches!(
        duplicate,
        Err(XmanError::Config(ConfigError::DuplicateProfile { .. }))
    ));

    manager.set_current_profile(&two).unwrap();
    assert_eq!(manager.get_current_profile().unwrap(), Some(two.clone()));

    manager.remove_profile(&two).unwrap();
    // The remaining profile is selected again
    assert_eq!(manager.get_current_profile().unwrap(), Some(one));
}

#[test]
fn test_unreadable_config_is_a_parsing_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("xman.json");
    std::fs::write(&path, "{\"Profiles\": 3}").unwrap();

    let result = ConfigManager::new(&path).ensure_config_file(&Version::new(4, 0, 0), dir.path());
    assert!(matches!(
        result,
        Err(XmanError::Config(ConfigError::Parsing { .. }))
    ));
}

#[test]
fn test_stored_profile_drives_delete_script() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);
    manager
        .add_profile(&ToolProfile::new("site", "/srv/sites/site"))
        .unwrap();

    let profile = manager.get_current_profile().unwrap().unwrap();
    let script = ScriptBuilder::new(ScriptType::DeleteDirectory)
        .unwrap()
        .with_placeholders(&profile)
        .build()
        .unwrap();
    assert_eq!(script, "rm \"/srv/sites/site\" -r -Force");
}
