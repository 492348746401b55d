use super::*;
use crate::constants::{TEMPLATE_ADMIN, TEMPLATE_BLANK};
use crate::options::{CodeGenerateOptions, InstallProjectOptions};
use crate::prompt::mock::{Scripted, ScriptedPrompter};
use crate::versions::mock::StaticVersionSource;
use crate::wizard::Wizard;
use semver::Version;
use std::sync::Arc;

fn templates_source() -> Arc<StaticVersionSource> {
    Arc::new(StaticVersionSource::new().with_package(
        "kentico.xperience.templates",
        &["24.0.0", "27.0.2", "28.0.0", "29.1.0", "29.2.0-preview", "13.0.0.5"],
    ))
}

#[tokio::test]
async fn test_install_project_wizard_collects_answers() {
    let mut wizard = InstallProjectWizard::new(templates_source());
    let prompter = ScriptedPrompter::new([
        Scripted::Choice("27.0.2".into()),
        Scripted::Choice(TEMPLATE_BLANK.into()),
        Scripted::Text("demo".into()),
        Scripted::Text("/srv/www".into()),
        Scripted::Confirm(true),
    ]);

    let options = wizard.run(&prompter, &[]).await.unwrap();
    assert_eq!(options.version, Some(Version::new(27, 0, 2)));
    assert_eq!(options.template, TEMPLATE_BLANK);
    assert_eq!(options.project_name, "demo");
    assert_eq!(options.install_root_path, "/srv/www");
    assert!(options.use_cloud);
    assert_eq!(prompter.remaining(), 0);
}

#[tokio::test]
async fn test_install_project_wizard_lists_only_installable_versions() {
    let mut wizard = InstallProjectWizard::new(templates_source());
    let steps = wizard.init_steps(&[]).await.unwrap();
    let Some(crate::prompt::Prompt::Select(select)) = steps.current().unwrap().prompt() else {
        panic!("first step should select a version");
    };
    assert_eq!(select.choices, vec!["29.1.0", "28.0.0", "27.0.2"]);
}

#[tokio::test]
async fn test_admin_template_skips_cloud_step_and_keeps_default() {
    let mut wizard = InstallProjectWizard::new(templates_source());
    wizard.set_options(InstallProjectOptions {
        use_cloud: true,
        ..Default::default()
    });
    let prompter = ScriptedPrompter::new([
        Scripted::Default,
        Scripted::Choice(TEMPLATE_ADMIN.into()),
        Scripted::Default,
        Scripted::Text("/srv".into()),
    ]);

    let options = wizard.run(&prompter, &[]).await.unwrap();
    assert!(options.is_admin_template());
    assert!(options.use_cloud);
    assert_eq!(options.project_name, "xbk");
    assert_eq!(options.version, Some(Version::new(29, 1, 0)));
    assert!(!prompter
        .asked()
        .iter()
        .any(|m| m.contains("cloud deployment")));
}

#[tokio::test]
async fn test_install_project_wizard_without_versions() {
    let mut wizard = InstallProjectWizard::new(Arc::new(StaticVersionSource::new()));
    let steps = wizard.init_steps(&[]).await.unwrap();
    assert_eq!(steps.len(), 4);
}

#[tokio::test]
async fn test_database_wizard_uses_seeded_defaults() {
    let mut wizard = InstallDatabaseWizard::new();
    let mut seeded = wizard.options().clone();
    seeded.server_name = Some("sql01".to_string());
    seeded.database_name = "seeded".to_string();
    seeded.admin_password = "Secret1!".to_string();
    wizard.set_options(seeded);

    let prompter = ScriptedPrompter::new([
        Scripted::Default,
        Scripted::Default,
        Scripted::Confirm(true),
        Scripted::Default,
    ]);
    let options = wizard.run(&prompter, &[]).await.unwrap();
    assert_eq!(options.server_name.as_deref(), Some("sql01"));
    assert_eq!(options.database_name, "seeded");
    assert!(options.use_existing_database);
    assert_eq!(options.admin_password, "Secret1!");
}

#[tokio::test]
async fn test_database_wizard_skip_argument_hides_existing_step() {
    let mut wizard = InstallDatabaseWizard::new();
    let prompter = ScriptedPrompter::new([
        Scripted::Text("localhost".into()),
        Scripted::Text("db".into()),
        Scripted::Text("Pa55word!".into()),
    ]);

    let options = wizard
        .run(&prompter, &[SKIP_EXISTINGDB_STEP])
        .await
        .unwrap();
    assert!(!options.use_existing_database);
    assert_eq!(options.admin_password, "Pa55word!");
    assert_eq!(prompter.asked().len(), 3);
}

#[tokio::test]
async fn test_update_wizard_lists_minimum_major() {
    let mut wizard = UpdateWizard::new(templates_source());
    let prompter = ScriptedPrompter::new([Scripted::Choice("28.0.0".into())]);
    let options = wizard.run(&prompter, &[]).await.unwrap();
    assert_eq!(options.version, Some(Version::new(28, 0, 0)));

    let steps = wizard.init_steps(&[]).await.unwrap();
    let Some(crate::prompt::Prompt::Select(select)) = steps.current().unwrap().prompt() else {
        panic!("update wizard should select a version");
    };
    assert_eq!(select.choices, vec!["29.1.0", "28.0.0"]);
}

#[tokio::test]
async fn test_macro_wizard_sign_all_branch() {
    let mut wizard = MacroWizard::new();
    let prompter = ScriptedPrompter::new([
        Scripted::Default,
        Scripted::Text("administrator".into()),
        Scripted::Text(String::new()),
    ]);
    let options = wizard.run(&prompter, &[]).await.unwrap();
    assert!(options.sign_all);
    assert_eq!(options.user_name.as_deref(), Some("administrator"));
    assert_eq!(options.old_salt, None);
    assert_eq!(prompter.asked().len(), 3);
}

#[tokio::test]
async fn test_macro_wizard_salt_branch() {
    let mut wizard = MacroWizard::new();
    let prompter = ScriptedPrompter::new([
        Scripted::Confirm(false),
        Scripted::Text("oldsalt".into()),
        Scripted::Text("newsalt".into()),
    ]);
    let options = wizard.run(&prompter, &[]).await.unwrap();
    assert!(!options.sign_all);
    assert_eq!(options.user_name, None);
    assert_eq!(options.old_salt.as_deref(), Some("oldsalt"));
    assert_eq!(options.new_salt.as_deref(), Some("newsalt"));
}

#[tokio::test]
async fn test_new_profile_wizard() {
    let mut wizard = NewProfileWizard::new();
    let prompter = ScriptedPrompter::new([
        Scripted::Text("site".into()),
        Scripted::Text("/srv/site".into()),
    ]);
    let options = wizard.run(&prompter, &[]).await.unwrap();
    assert_eq!(options.name.as_deref(), Some("site"));
    assert_eq!(options.working_directory.as_deref(), Some("/srv/site"));
}

#[tokio::test]
async fn test_repository_wizard_changes_only_confirmed_lists() {
    let mut wizard = RepositoryConfigurationWizard::new();
    let mut seeded = wizard.options().clone();
    seeded.restore_mode = Some("Full".to_string());
    seeded.included_object_types = vec!["cms.user".to_string()];
    seeded.excluded_object_types = vec!["cms.role".to_string()];
    wizard.set_options(seeded);

    let prompter = ScriptedPrompter::new([
        Scripted::Choice("Create".into()),
        Scripted::Confirm(true),
        Scripted::Text("cms.class; ;cms.settingskey;".into()),
        Scripted::Confirm(false),
    ]);
    let options = wizard.run(&prompter, &[]).await.unwrap();
    assert_eq!(options.restore_mode.as_deref(), Some("Create"));
    assert_eq!(
        options.included_object_types,
        vec!["cms.class", "cms.settingskey"]
    );
    assert_eq!(options.excluded_object_types, vec!["cms.role"]);
    assert!(prompter.asked()[1].contains("cms.user"));
}

#[tokio::test]
async fn test_settings_wizard_file_step_only_for_multiple_files() {
    let mut wizard = SettingsWizard::new();
    let steps = wizard.init_steps(&["appsettings.json"]).await.unwrap();
    assert_eq!(steps.len(), 1);

    let prompter = ScriptedPrompter::new([
        Scripted::Select(0),
        Scripted::Choice("Azure storage".into()),
    ]);
    let options = wizard
        .run(&prompter, &["appsettings.Development.json", "appsettings.json"])
        .await
        .unwrap();
    assert_eq!(options.app_settings_file_name.as_deref(), Some("appsettings.json"));
    assert_eq!(options.setting_to_change.as_deref(), Some("Azure storage"));
}

#[tokio::test]
async fn test_codegen_wizard_provider_step_only_for_classes() {
    let mut wizard = CodeGenerateWizard::new();
    let prompter = ScriptedPrompter::new([
        Scripted::Choice(CodeGenerateOptions::TYPE_PAGE_CONTENT_TYPES.into()),
        Scripted::Text(String::new()),
        Scripted::Default,
        Scripted::Text("cms.*".into()),
        Scripted::Default,
    ]);
    let options = wizard.run(&prompter, &[]).await.unwrap();
    assert_eq!(
        options.object_type.as_deref(),
        Some(CodeGenerateOptions::TYPE_PAGE_CONTENT_TYPES)
    );
    assert!(options.with_provider_class);
    assert_eq!(options.namespace.as_deref(), Some(""));
    assert_eq!(options.location, "/{type}/{dataClassNamespace}/{name}");
    assert_eq!(options.include, "cms.*");
    assert_eq!(options.exclude, "test");

    let mut wizard = CodeGenerateWizard::new();
    let prompter = ScriptedPrompter::new([
        Scripted::Choice(CodeGenerateOptions::TYPE_CLASSES.into()),
        Scripted::Confirm(false),
        Scripted::Text("Acme".into()),
        Scripted::Text("models".into()),
    ]);
    let err = wizard.run(&prompter, &[]).await.unwrap_err();
    assert!(err.to_string().contains("Location must start with '/'"));
}
