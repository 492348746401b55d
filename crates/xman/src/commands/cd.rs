//! `xman cd`
//!
//! CD data of every profile lives under the configured CD root, in a folder
//! named after the project: `repository.config` plus the `CDRepository`
//! files folder. The folder and a default configuration are created on
//! first use.

use super::{profile_dir, run_script, CommandContext};
use crate::ui;
use crate::ui::spinner::ScriptProgress;
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;
use xman_core::cd_xml;
use xman_core::command::{ActionPolicy, Command, CommandDescriptor, CommandState};
use xman_core::config::{ToolConfiguration, ToolProfile};
use xman_core::constants::{CD_CONFIG_NAME, CD_FILES_DIR};
use xman_core::errors::{ConfigError, Result};
use xman_core::options::ContinuousDeploymentConfig;
use xman_core::output::{
    contains_ignore_case, interpret_object_type_line, object_type_label, ProgressUpdate,
    IO_EXCEPTION_MARKER,
};
use xman_core::prompt::SelectPrompt;
use xman_core::script::{ScriptBuilder, ScriptType};
use xman_core::shell::{ProcessControl, ShellOptions};
use xman_core::wizard::Wizard;
use xman_core::wizards::RepositoryConfigurationWizard;

const STORE: &str = "store";
const RESTORE: &str = "restore";
const CONFIG: &str = "config";

pub static DESCRIPTOR: CommandDescriptor = CommandDescriptor {
    keywords: &["cd"],
    parameters: &[STORE, RESTORE, CONFIG],
    description: "Stores or restores CD data, or edits the config file",
    requires_profile: true,
    action: ActionPolicy::Required,
};

pub fn create(ctx: &CommandContext) -> Box<dyn Command + '_> {
    Box::new(ContinuousDeploymentCommand {
        ctx,
        state: CommandState::new(),
        wizard: RepositoryConfigurationWizard::new(),
    })
}

struct ContinuousDeploymentCommand<'a> {
    ctx: &'a CommandContext,
    state: CommandState,
    wizard: RepositoryConfigurationWizard,
}

/// Paths of the CD data of `project_name`.
fn cd_paths(config: &ToolConfiguration, project_name: &str) -> ContinuousDeploymentConfig {
    let root = Path::new(&config.cd_root_path).join(project_name);
    ContinuousDeploymentConfig {
        config_path: Some(root.join(CD_CONFIG_NAME).display().to_string()),
        repository_path: Some(root.join(CD_FILES_DIR).display().to_string()),
    }
}

fn project_name(profile: Option<&ToolProfile>) -> Option<&str> {
    profile
        .and_then(|p| p.project_name.as_deref())
        .filter(|n| !n.is_empty())
}

impl ContinuousDeploymentCommand<'_> {
    async fn ensure_structure(&self, profile: Option<&ToolProfile>, config: &ToolConfiguration) -> Result<()> {
        if self.state.is_stopped() {
            return Ok(());
        }
        let Some(name) = project_name(profile) else {
            self.state.log_error("Unable to load profile name.");
            return Ok(());
        };

        let paths = cd_paths(config, name);
        if let Some(repository) = &paths.repository_path {
            std::fs::create_dir_all(repository).map_err(ConfigError::Io)?;
        }
        if paths.config_path.as_deref().is_some_and(|p| Path::new(p).exists()) {
            return Ok(());
        }

        debug!("Creating CD configuration {:?}", paths.config_path);
        let script = ScriptBuilder::new(ScriptType::ContinuousDeploymentNewConfiguration)?
            .with_placeholders(&paths)
            .build()?;
        run_script(
            self.ctx,
            &self.state,
            ShellOptions::new(script).working_dir(profile_dir(profile)),
        )
        .await?;
        Ok(())
    }

    async fn configure(&mut self, profile: Option<&ToolProfile>, config: &ToolConfiguration) -> Result<()> {
        if self.state.is_stopped() {
            return Ok(());
        }
        let Some(name) = project_name(profile) else {
            self.state.log_error("Unable to load profile name.");
            return Ok(());
        };

        let paths = cd_paths(config, name);
        let Some(config_path) = paths.config_path else {
            return Ok(());
        };
        let current = match cd_xml::read_config(Path::new(&config_path)) {
            Ok(current) => current,
            Err(e) => {
                debug!("{}", e);
                self.state.log_error("Unable to read repository configuration.");
                return Ok(());
            }
        };

        self.wizard.set_options(current);
        let updated = self.wizard.run(self.ctx.prompter.as_ref(), &[]).await?;
        cd_xml::write_config(&updated, Path::new(&config_path))?;
        Ok(())
    }

    async fn store(&self, profile: Option<&ToolProfile>, config: &ToolConfiguration) -> Result<()> {
        if self.state.is_stopped() {
            return Ok(());
        }
        let Some(name) = project_name(profile) else {
            self.state.log_error("Unable to load profile name.");
            return Ok(());
        };

        let script = ScriptBuilder::new(ScriptType::ContinuousDeploymentStore)?
            .with_placeholders(&cd_paths(config, name))
            .build()?;
        let progress = ScriptProgress::bar("Running the CD store script");
        let reporter = progress.clone();
        let state = self.state.clone();
        let shell = ShellOptions::new(script)
            .working_dir(profile_dir(profile))
            .on_output(move |line: &str, process: &ProcessControl| {
                // Locked files are reported on stdout
                if contains_ignore_case(line, IO_EXCEPTION_MARKER) {
                    state.log_process_error(line, process);
                } else if let Some(update @ ProgressUpdate::Counter { .. }) = interpret_object_type_line(line) {
                    reporter.apply(update);
                }
            });
        let result = run_script(self.ctx, &self.state, shell).await;
        progress.finish();
        result.map(|_| ())
    }

    /// Ask which other profile's CD data to restore.
    fn source_profile(&self, profile: Option<&ToolProfile>, config: &ToolConfiguration) -> Result<Option<ToolProfile>> {
        if self.state.is_stopped() {
            return Ok(None);
        }

        let current = project_name(profile).unwrap_or_default();
        let candidates: Vec<&ToolProfile> = config
            .profiles
            .iter()
            .filter(|p| !p.is_named(current))
            .collect();
        if candidates.is_empty() {
            self.state.log_error(
                "There are no profiles to restore CD data from. Use the 'install' or 'profile add' commands to register a new profile.",
            );
            return Ok(None);
        }

        let labels = candidates.iter().map(|p| p.name().to_string()).collect();
        let index = self
            .ctx
            .prompter
            .select(&SelectPrompt::new("Restore data from which profile?", labels))?;
        Ok(candidates.get(index).map(|p| (*p).clone()))
    }

    async fn restore(&self, profile: Option<&ToolProfile>, source: &ToolProfile, config: &ToolConfiguration) -> Result<()> {
        if self.state.is_stopped() {
            return Ok(());
        }
        let Some(source_name) = project_name(Some(source)) else {
            self.state.log_error("Unable to load profile name.");
            return Ok(());
        };

        let script = ScriptBuilder::new(ScriptType::ContinuousDeploymentRestore)?
            .with_placeholders(&cd_paths(config, source_name))
            .build()?;
        let progress = ScriptProgress::spinner("Running the CD restore script");
        let reporter = progress.clone();
        let shell = ShellOptions::new(script)
            .working_dir(profile_dir(profile))
            .on_output(move |line: &str, _: &ProcessControl| {
                // e.g. "Object type Module: updating Activities"
                if let Some(label) = object_type_label(line) {
                    reporter.set_label(&label);
                }
            });
        let result = run_script(self.ctx, &self.state, shell).await;
        progress.finish();
        result.map(|_| ())
    }
}

#[async_trait(?Send)]
impl Command for ContinuousDeploymentCommand<'_> {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &DESCRIPTOR
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    async fn execute(&mut self, profile: Option<&ToolProfile>, action: Option<&str>) -> Result<()> {
        let config = self.ctx.config.get_config()?;
        self.ensure_structure(profile, &config).await?;

        match action {
            Some(CONFIG) => self.configure(profile, &config).await,
            Some(STORE) => self.store(profile, &config).await,
            Some(RESTORE) => match self.source_profile(profile, &config)? {
                Some(source) => self.restore(profile, &source, &config).await,
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    async fn post_execute(&mut self, _profile: Option<&ToolProfile>, action: Option<&str>) -> Result<()> {
        if !self.state.has_errors() {
            ui::success(format!("CD {} complete!", action.unwrap_or("process")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::test_support::Harness;
    use std::path::{Path, PathBuf};
    use xman_core::cd_xml::{self, RepositoryConfiguration};
    use xman_core::prompt::mock::Scripted;
    use xman_core::shell::mock::{MockResponse, MockShellRunner};

    fn cd_root(harness: &Harness) -> PathBuf {
        PathBuf::from(harness.ctx.config.get_config().unwrap().cd_root_path)
    }

    #[tokio::test]
    async fn test_store_creates_structure_and_config() {
        let shell = MockShellRunner::new().with_response(
            "--kxp-cd-store",
            MockResponse::ok().stdout(&["Object type 3/10: Module"]),
        );
        let harness = Harness::new(shell, []);
        harness.profile("site");

        let errors = harness.run("cd", Some("store")).await;
        assert!(errors.is_empty(), "{:?}", errors);

        let root = cd_root(&harness).join("site");
        assert!(root.join("CDRepository").is_dir());
        let config = root.join("repository.config");
        let repository = root.join("CDRepository");
        assert_eq!(
            harness.shell.scripts(),
            vec![
                format!("dotnet run --no-build -- --kxp-cd-config --path \"{}\"", config.display()),
                format!(
                    "dotnet run --no-build -- --kxp-cd-store --repository-path \"{}\" --config-path \"{}\"",
                    repository.display(),
                    config.display()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_existing_config_is_not_recreated() {
        let harness = Harness::new(MockShellRunner::new(), []);
        harness.profile("site");
        let root = cd_root(&harness).join("site");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("repository.config"), "<RepositoryConfiguration />").unwrap();

        let errors = harness.run("cd", Some("store")).await;
        assert!(errors.is_empty());
        let scripts = harness.shell.scripts();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("--kxp-cd-store"));
    }

    #[tokio::test]
    async fn test_store_io_exception_stops() {
        let shell = MockShellRunner::new().with_response(
            "--kxp-cd-store",
            MockResponse::ok().stdout(&[
                "System.IO.IOException: The process cannot access the file",
                "Object type 1/2: Module",
            ]),
        );
        let harness = Harness::new(shell, []);
        harness.profile("site");

        let errors = harness.run("cd", Some("store")).await;
        assert_eq!(
            errors,
            vec!["System.IO.IOException: The process cannot access the file"]
        );
        assert!(harness.shell.calls().last().unwrap().killed);
    }

    #[tokio::test]
    async fn test_restore_from_other_profile() {
        let harness = Harness::new(MockShellRunner::new(), [Scripted::Choice("prod".into())]);
        harness.profile("prod");
        let target = harness.profile("dev");

        let errors = harness.run("cd", Some("restore")).await;
        assert!(errors.is_empty(), "{:?}", errors);

        let calls = harness.shell.calls();
        let restore = calls.last().unwrap();
        let repository = cd_root(&harness).join("prod").join("CDRepository");
        assert_eq!(
            restore.script,
            format!("dotnet run -- --kxp-cd-restore --repository-path \"{}\"", repository.display())
        );
        assert_eq!(
            restore.working_dir.as_deref(),
            target.working_directory.as_deref().map(Path::new)
        );
    }

    #[tokio::test]
    async fn test_restore_without_other_profiles() {
        let harness = Harness::new(MockShellRunner::new(), []);
        harness.profile("dev");

        let errors = harness.run("cd", Some("restore")).await;
        assert_eq!(
            errors,
            vec!["There are no profiles to restore CD data from. Use the 'install' or 'profile add' commands to register a new profile."]
        );
    }

    #[tokio::test]
    async fn test_config_edits_restore_mode() {
        let harness = Harness::new(
            MockShellRunner::new(),
            [
                Scripted::Choice("Full".into()),
                Scripted::Confirm(true),
                Scripted::Text("cms.user;cms.role".into()),
                Scripted::Confirm(false),
            ],
        );
        harness.profile("site");
        let config_path = cd_root(&harness).join("site").join("repository.config");
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        let initial = RepositoryConfiguration {
            restore_mode: Some("Create".to_string()),
            included_object_types: vec![],
            excluded_object_types: vec!["cms.settingskey".to_string()],
        };
        cd_xml::write_config(&initial, &config_path).unwrap();

        let errors = harness.run("cd", Some("config")).await;
        assert!(errors.is_empty(), "{:?}", errors);

        let saved = cd_xml::read_config(&config_path).unwrap();
        assert_eq!(saved.restore_mode.as_deref(), Some("Full"));
        assert_eq!(saved.included_object_types, vec!["cms.user", "cms.role"]);
        assert_eq!(saved.excluded_object_types, vec!["cms.settingskey"]);
    }

    #[tokio::test]
    async fn test_unreadable_config_is_reported() {
        let harness = Harness::new(MockShellRunner::new(), []);
        harness.profile("site");
        // A folder in place of the file cannot be read
        let root = cd_root(&harness).join("site");
        std::fs::create_dir_all(root.join("repository.config")).unwrap();

        let errors = harness.run("cd", Some("config")).await;
        assert_eq!(errors, vec!["Unable to read repository configuration."]);
    }
}
