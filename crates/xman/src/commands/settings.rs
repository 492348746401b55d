//! `xman settings`
//!
//! Interactive editor for the `appsettings*.json` files of a project: the
//! CMS connection string, documented configuration keys, Azure storage keys
//! and the `CMSHeadless` section.

use super::{profile_dir, CommandContext};
use crate::ui;
use async_trait::async_trait;
use console::style;
use xman_core::appsettings::{
    headless_description, AppSettingsManager, CmsHeadlessConfiguration, ConfigurationKey,
    AZURE_STORAGE_KEYS, UNGROUPED_KEYS,
};
use xman_core::command::{ActionPolicy, Command, CommandDescriptor, CommandState};
use xman_core::config::ToolProfile;
use xman_core::constants::CONNECTION_STRING_NAME;
use xman_core::errors::Result;
use xman_core::fields::{FieldKind, FieldTable};
use xman_core::options::SettingsOptions;
use xman_core::prompt::{ConfirmPrompt, SelectPrompt, TextPrompt};
use xman_core::wizard::Wizard;
use xman_core::wizards::SettingsWizard;

const MAX_HINT_LENGTH: usize = 16;

pub static DESCRIPTOR: CommandDescriptor = CommandDescriptor {
    keywords: &["s", "settings"],
    parameters: &[],
    description: "Configures the application settings of a project",
    requires_profile: true,
    action: ActionPolicy::None,
};

pub fn create(ctx: &CommandContext) -> Box<dyn Command + '_> {
    Box::new(SettingsCommand {
        ctx,
        state: CommandState::new(),
        wizard: SettingsWizard::new(),
    })
}

struct SettingsCommand<'a> {
    ctx: &'a CommandContext,
    state: CommandState,
    wizard: SettingsWizard,
}

/// Selection label: the name and a shortened current value.
fn key_label(name: &str, value: Option<&str>) -> String {
    match value.filter(|v| !v.is_empty()) {
        Some(value) => format!("{} ({})", name, ui::truncate(value, MAX_HINT_LENGTH)),
        None => name.to_string(),
    }
}

fn print_key_header(name: &str, value: Option<&str>, default: Option<&str>, description: Option<&str>) {
    println!();
    println!("{}", style(name).cyan().underlined());
    if let Some(value) = value {
        println!("Value: {}", value);
    }
    if let Some(default) = default {
        println!("Default: {}", default);
    }
    if let Some(description) = description {
        println!("{}", description);
    }
    println!();
}

fn value_prompt(kind: FieldKind) -> TextPrompt {
    let prompt = TextPrompt::new(format!("New value ({}):", kind.to_string().to_lowercase()));
    if kind == FieldKind::Text {
        prompt.allow_empty()
    } else {
        prompt
    }
}

impl SettingsCommand<'_> {
    fn configure_connection_string(&self, manager: &AppSettingsManager) -> Result<()> {
        let current = match manager.connection_string(CONNECTION_STRING_NAME) {
            Ok(Some(current)) => current,
            Ok(None) | Err(_) => {
                self.state.log_error("Unable to load connection string.");
                return Ok(());
            }
        };

        print_key_header(CONNECTION_STRING_NAME, Some(&current), None, None);
        let updated = self
            .ctx
            .prompter
            .text(&TextPrompt::new("Enter new connection string:"))?;
        manager.set_connection_string(CONNECTION_STRING_NAME, &updated)?;
        ui::emphasis("Connection string updated!");
        Ok(())
    }

    fn configure_keys(&self, manager: &AppSettingsManager, keys: &[ConfigurationKey]) -> Result<()> {
        loop {
            if self.state.is_stopped() {
                return Ok(());
            }

            let values = manager.configuration_keys(keys)?;
            let labels = values
                .iter()
                .map(|kv| key_label(kv.key.name, kv.display_value().as_deref()))
                .collect();
            let index = self
                .ctx
                .prompter
                .select(&SelectPrompt::new("Set which key?", labels))?;
            let Some(selected) = values.get(index) else {
                self.state.log_error("Invalid selection.");
                return Ok(());
            };

            let key = selected.key;
            let actual = selected.actual.as_ref().and_then(|v| match v {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            });
            print_key_header(key.name, actual.as_deref(), key.default, Some(key.description));

            let raw = self.ctx.prompter.text(&value_prompt(key.kind))?;
            let value = match key.kind.convert(&raw) {
                Ok(value) => value,
                Err(e) => {
                    self.state.log_error(e.to_string());
                    return Ok(());
                }
            };
            manager.set_key_value(key.name, value)?;
            ui::emphasis(format!("Updated the {} key!", key.name));
            println!();

            let again = self
                .ctx
                .prompter
                .confirm(&ConfirmPrompt::new("Update another configuration key?", true))?;
            if !again {
                return Ok(());
            }
        }
    }

    fn configure_headless(&self, manager: &AppSettingsManager) -> Result<()> {
        loop {
            if self.state.is_stopped() {
                return Ok(());
            }

            let mut headless = manager.cms_headless()?;
            let fields = CmsHeadlessConfiguration::fields();
            let labels = fields
                .iter()
                .map(|f| key_label(f.name, (f.get)(&headless).as_deref()))
                .collect();
            let index = self
                .ctx
                .prompter
                .select(&SelectPrompt::new("Set which key?", labels))?;
            let Some(field) = fields.get(index) else {
                self.state.log_error("Invalid selection.");
                return Ok(());
            };

            print_key_header(
                field.name,
                (field.get)(&headless).as_deref(),
                None,
                headless_description(field.name),
            );
            let raw = self.ctx.prompter.text(&value_prompt(field.kind))?;
            if let Err(e) = (field.set)(&mut headless, raw.trim()) {
                self.state.log_error(e.to_string());
                return Ok(());
            }
            manager.set_cms_headless(&headless)?;
            ui::emphasis(format!("Updated the {} key!", field.name));
            println!();

            let again = self
                .ctx
                .prompter
                .confirm(&ConfirmPrompt::new("Update another headless key?", true))?;
            if !again {
                return Ok(());
            }
        }
    }
}

#[async_trait(?Send)]
impl Command for SettingsCommand<'_> {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &DESCRIPTOR
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    async fn execute(&mut self, profile: Option<&ToolProfile>, _action: Option<&str>) -> Result<()> {
        let Some(working_dir) = profile_dir(profile) else {
            self.state.log_error("Working directory not set.");
            return Ok(());
        };

        let files = AppSettingsManager::list_files(working_dir)?;
        if let [only] = files.as_slice() {
            self.wizard.set_options(SettingsOptions {
                app_settings_file_name: Some(only.clone()),
                ..Default::default()
            });
        }
        let args: Vec<&str> = files.iter().map(String::as_str).collect();
        let options = self.wizard.run(self.ctx.prompter.as_ref(), &args).await?;
        let manager = AppSettingsManager::new(working_dir, options.app_settings_file_name.as_deref());

        match options.setting_to_change.as_deref() {
            Some(SettingsOptions::CONNECTION_STRING_SETTING) => self.configure_connection_string(&manager),
            Some(SettingsOptions::UNGROUPED_KEY_SETTING) => self.configure_keys(&manager, &UNGROUPED_KEYS),
            Some(SettingsOptions::CMS_HEADLESS_SETTING) => self.configure_headless(&manager),
            Some(SettingsOptions::AZURE_STORAGE_SETTING) => self.configure_keys(&manager, &AZURE_STORAGE_KEYS),
            _ => {
                self.state.log_error("Invalid selection.");
                Ok(())
            }
        }
    }

    async fn post_execute(&mut self, _profile: Option<&ToolProfile>, _action: Option<&str>) -> Result<()> {
        println!();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::key_label;
    use crate::commands::test_support::Harness;
    use serde_json::{json, Value};
    use std::path::{Path, PathBuf};
    use xman_core::config::ToolProfile;
    use xman_core::options::SettingsOptions;
    use xman_core::prompt::mock::Scripted;
    use xman_core::shell::mock::MockShellRunner;

    fn settings_file(harness: &Harness, name: &str, content: Value) -> PathBuf {
        let profile = harness.profile("site");
        let path = Path::new(profile.working_directory.as_deref().unwrap()).join(name);
        std::fs::write(&path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
        path
    }

    fn read(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_key_label_truncates_values() {
        assert_eq!(key_label("CMSHashStringSalt", None), "CMSHashStringSalt");
        assert_eq!(key_label("Enable", Some("true")), "Enable (true)");
        assert_eq!(
            key_label("CMSImageExtensions", Some("bmp;gif;ico;png;wmf;jpg")),
            "CMSImageExtensions (bmp;gif;ico;png;...)"
        );
    }

    #[tokio::test]
    async fn test_update_connection_string() {
        let harness = Harness::new(
            MockShellRunner::new(),
            [
                Scripted::Choice(SettingsOptions::CONNECTION_STRING_SETTING.into()),
                Scripted::Text("Data Source=new;Initial Catalog=db".into()),
            ],
        );
        let path = settings_file(
            &harness,
            "appsettings.json",
            json!({ "ConnectionStrings": { "CMSConnectionString": "Data Source=old" } }),
        );

        let errors = harness.run("settings", None).await;
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(!harness
            .prompter
            .asked()
            .iter()
            .any(|m| m == "Which file do you want to modify?"));
        assert_eq!(
            read(&path)["ConnectionStrings"]["CMSConnectionString"],
            "Data Source=new;Initial Catalog=db"
        );
    }

    #[tokio::test]
    async fn test_missing_connection_string() {
        let harness = Harness::new(
            MockShellRunner::new(),
            [Scripted::Choice(SettingsOptions::CONNECTION_STRING_SETTING.into())],
        );
        settings_file(&harness, "appsettings.json", json!({}));

        let errors = harness.run("s", None).await;
        assert_eq!(errors, vec!["Unable to load connection string."]);
    }

    #[tokio::test]
    async fn test_update_integer_key_in_selected_file() {
        let harness = Harness::new(
            MockShellRunner::new(),
            [
                Scripted::Choice("appsettings.Development.json".into()),
                Scripted::Choice(SettingsOptions::UNGROUPED_KEY_SETTING.into()),
                Scripted::Select(3),
                Scripted::Text("25".into()),
                Scripted::Confirm(false),
            ],
        );
        let main = settings_file(&harness, "appsettings.json", json!({}));
        let dev = main.with_file_name("appsettings.Development.json");
        std::fs::write(&dev, "{ \"cmslogkeeppercent\": 10 }").unwrap();

        let errors = harness.run("settings", None).await;
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(read(&dev)["cmslogkeeppercent"], 25);
        assert_eq!(read(&main), json!({}));
        assert!(harness.prompter.asked().contains(&"New value (integer):".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_key_value_is_reported() {
        let harness = Harness::new(
            MockShellRunner::new(),
            [
                Scripted::Choice(SettingsOptions::AZURE_STORAGE_SETTING.into()),
                Scripted::Select(5),
                Scripted::Text("maybe".into()),
            ],
        );
        settings_file(&harness, "appsettings.json", json!({}));

        let errors = harness.run("settings", None).await;
        assert_eq!(errors, vec!["The key value cannot be cast into type Boolean"]);
    }

    #[tokio::test]
    async fn test_update_headless_keys() {
        let harness = Harness::new(
            MockShellRunner::new(),
            [
                Scripted::Choice(SettingsOptions::CMS_HEADLESS_SETTING.into()),
                Scripted::Choice("Enable (true)".into()),
                Scripted::Text("False".into()),
                Scripted::Confirm(true),
                Scripted::Choice("Caching::AbsoluteExpiration (720)".into()),
                Scripted::Text("60".into()),
                Scripted::Confirm(false),
            ],
        );
        let path = settings_file(&harness, "appsettings.json", json!({ "Other": 1 }));

        let errors = harness.run("settings", None).await;
        assert!(errors.is_empty(), "{:?}", errors);

        let saved = read(&path);
        assert_eq!(saved["Other"], 1);
        assert_eq!(saved["CMSHeadless"]["Enable"], false);
        assert_eq!(saved["CMSHeadless"]["Caching"]["AbsoluteExpiration"], 60);
    }

    #[tokio::test]
    async fn test_missing_working_directory() {
        let harness = Harness::new(MockShellRunner::new(), []);
        let profile = ToolProfile {
            project_name: Some("site".to_string()),
            working_directory: None,
        };
        harness.ctx.config.add_profile(&profile).unwrap();

        let errors = harness.run("settings", None).await;
        assert_eq!(errors, vec!["Working directory not set."]);
    }
}
