//! `xman install`
//!
//! Creates project files from the Xperience templates and a database for
//! them, then registers the new installation as the current profile. With
//! the `db` action only the database manager tool is installed and run.

use super::{run_script, run_uninstall, CommandContext};
use crate::ui;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};
use xman_core::command::{ActionPolicy, Command, CommandDescriptor, CommandState};
use xman_core::config::ToolProfile;
use xman_core::constants::{DATABASE_TOOL, MIN_INSTALL_VERSION};
use xman_core::errors::{ConfigError, Result, XmanError};
use xman_core::options::{DatabaseToolOptions, InstallDatabaseOptions, InstallProjectOptions};
use xman_core::output::{contains_ignore_case, RESTORE_ACTION_PROMPT};
use xman_core::prompt::SelectPrompt;
use xman_core::script::{ScriptBuilder, ScriptType};
use xman_core::shell::{ProcessControl, ShellOptions};
use xman_core::versions::selectable_versions;
use xman_core::wizard::Wizard;
use xman_core::wizards::{InstallDatabaseWizard, InstallProjectWizard, SKIP_EXISTINGDB_STEP};

const DATABASE: &str = "db";
const DOTNET_HOST: &str = "dotnet ";

pub static DESCRIPTOR: CommandDescriptor = CommandDescriptor {
    keywords: &["i", "install"],
    parameters: &[DATABASE],
    description: "Installs a new XbK instance. The 'db' parameter installs only a database",
    requires_profile: false,
    action: ActionPolicy::Optional,
};

pub fn create(ctx: &CommandContext) -> Box<dyn Command + '_> {
    Box::new(InstallCommand {
        ctx,
        state: CommandState::new(),
        project_wizard: InstallProjectWizard::new(ctx.versions.clone()),
        database_wizard: InstallDatabaseWizard::new(),
    })
}

struct InstallCommand<'a> {
    ctx: &'a CommandContext,
    state: CommandState,
    project_wizard: InstallProjectWizard,
    database_wizard: InstallDatabaseWizard,
}

impl InstallCommand<'_> {
    /// Seed both wizards with the defaults stored in the tool configuration.
    fn load_defaults(&mut self) -> Result<()> {
        let mut project = self.ctx.config.default_install_project_options()?;
        if project.install_root_path.trim().is_empty() {
            project.install_root_path = self.ctx.current_dir.display().to_string();
        }
        self.project_wizard.set_options(project);
        self.database_wizard
            .set_options(self.ctx.config.default_install_database_options()?);
        Ok(())
    }

    async fn install_database_only(&mut self) -> Result<()> {
        let options = self
            .database_wizard
            .run(self.ctx.prompter.as_ref(), &[SKIP_EXISTINGDB_STEP])
            .await?;
        self.install_database_tool().await?;
        self.create_database(&options, None, true).await
    }

    async fn install_database_tool(&self) -> Result<()> {
        if self.state.is_stopped() {
            return Ok(());
        }

        let published = self.ctx.versions.package_versions(DATABASE_TOOL).await?;
        let versions = selectable_versions(&published, MIN_INSTALL_VERSION);
        if versions.is_empty() {
            self.state
                .log_error(format!("No installable versions of {} were found.", DATABASE_TOOL));
            return Ok(());
        }
        let labels = versions.iter().map(|v| v.to_string()).collect();
        let index = self
            .ctx
            .prompter
            .select(&SelectPrompt::new("Which version?", labels))?;
        let options = DatabaseToolOptions {
            version: versions.get(index).cloned(),
        };
        println!();

        ui::emphasis("Uninstalling previous database tool...");
        let uninstall = ScriptBuilder::new(ScriptType::DatabaseToolUninstall)?.build()?;
        run_uninstall(self.ctx, &self.state, uninstall).await?;

        if let Some(version) = &options.version {
            ui::emphasis(format!("Installing database tool version {}...", version));
        }
        let install = ScriptBuilder::new(ScriptType::DatabaseToolInstall)?
            .with_placeholders(&options)
            .build()?;
        run_script(self.ctx, &self.state, ShellOptions::new(install)).await?;
        Ok(())
    }

    async fn create_working_directory(&self, working_dir: &str) -> Result<()> {
        if self.state.is_stopped() {
            return Ok(());
        }

        let script = ScriptBuilder::new(ScriptType::CreateDirectory)?
            .append_directory(working_dir)
            .build()?;
        run_script(self.ctx, &self.state, ShellOptions::new(script)).await?;
        Ok(())
    }

    async fn install_template(&self, options: &InstallProjectOptions) -> Result<()> {
        if self.state.is_stopped() {
            return Ok(());
        }

        ui::emphasis("Uninstalling previous template version...");
        let uninstall = ScriptBuilder::new(ScriptType::TemplateUninstall)?.build()?;
        run_uninstall(self.ctx, &self.state, uninstall).await?;

        let version = options
            .version
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "latest".to_string());
        ui::emphasis(format!("Installing template version {}...", version));
        let install = ScriptBuilder::new(ScriptType::TemplateInstall)?
            .with_placeholders(options)
            .append_version(options.version.as_ref())
            .build()?;
        run_script(self.ctx, &self.state, ShellOptions::new(install)).await?;
        Ok(())
    }

    async fn create_project_files(&self, options: &InstallProjectOptions, working_dir: &str) -> Result<()> {
        if self.state.is_stopped() {
            return Ok(());
        }

        ui::emphasis("Running project creation script...");
        let script = ScriptBuilder::new(ScriptType::ProjectInstall)?
            .with_placeholders(options)
            .append_cloud(options.use_cloud)
            .build()?;

        // The admin template never asks to restore packages
        let shell = ShellOptions::new(script)
            .working_dir(Some(working_dir))
            .keep_open(!options.is_admin_template())
            .on_output(|line: &str, process: &ProcessControl| {
                if contains_ignore_case(line, RESTORE_ACTION_PROMPT) {
                    process.send_line("Y");
                    process.close_input();
                }
            });
        run_script(self.ctx, &self.state, shell).await?;
        Ok(())
    }

    async fn create_database(
        &self,
        options: &InstallDatabaseOptions,
        working_dir: Option<&str>,
        database_only: bool,
    ) -> Result<()> {
        if self.state.is_stopped() {
            return Ok(());
        }

        ui::emphasis("Running database creation script...");
        let script = ScriptBuilder::new(ScriptType::DatabaseInstall)?
            .with_placeholders(options)
            .build()?;
        // The global tool is invoked directly, without the dotnet host
        let script = if database_only && script.starts_with(DOTNET_HOST) {
            script[DOTNET_HOST.len()..].to_string()
        } else {
            script
        };
        run_script(
            self.ctx,
            &self.state,
            ShellOptions::new(script).working_dir(working_dir),
        )
        .await?;
        Ok(())
    }

    fn register_profile(&self, profile: &ToolProfile) -> Result<()> {
        if self.state.is_stopped() {
            return Ok(());
        }

        match self.ctx.config.add_profile(profile) {
            Err(XmanError::Config(err @ ConfigError::DuplicateProfile { .. })) => {
                self.state.log_error(err.to_string());
                return Ok(());
            }
            other => other?,
        }
        ui::emphasis(format!("Setting profile to '{}'...", profile.name()));
        self.ctx.config.set_current_profile(profile)
    }
}

#[async_trait(?Send)]
impl Command for InstallCommand<'_> {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &DESCRIPTOR
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    async fn execute(&mut self, _profile: Option<&ToolProfile>, action: Option<&str>) -> Result<()> {
        self.load_defaults()?;

        if action.is_some_and(|a| a.eq_ignore_ascii_case(DATABASE)) {
            return self.install_database_only().await;
        }

        let prompter = self.ctx.prompter.clone();
        let project = self.project_wizard.run(prompter.as_ref(), &[]).await?;
        let database = if project.is_admin_template() {
            None
        } else {
            Some(self.database_wizard.run(prompter.as_ref(), &[]).await?)
        };
        println!();

        let working_dir = Path::new(&project.install_root_path)
            .join(&project.project_name)
            .display()
            .to_string();
        info!("Installing {} into {}", project.project_name, working_dir);

        self.create_working_directory(&working_dir).await?;
        self.install_template(&project).await?;
        self.create_project_files(&project, &working_dir).await?;

        // The admin boilerplate has no database and is not registered
        if let Some(database) = database {
            self.create_database(&database, Some(&working_dir), false).await?;
            self.register_profile(&ToolProfile::new(&project.project_name, working_dir))?;
        } else {
            debug!("Skipping database and profile for the admin template");
        }
        Ok(())
    }

    async fn post_execute(&mut self, _profile: Option<&ToolProfile>, _action: Option<&str>) -> Result<()> {
        if !self.state.has_errors() {
            ui::success("Install complete!");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::test_support::Harness;
    use std::path::PathBuf;
    use xman_core::constants::{DATABASE_TOOL, TEMPLATES_PACKAGE, TEMPLATE_ADMIN, TEMPLATE_BLANK};
    use xman_core::prompt::mock::Scripted;
    use xman_core::shell::mock::{MockResponse, MockShellRunner};
    use xman_core::versions::mock::StaticVersionSource;

    fn versions() -> StaticVersionSource {
        StaticVersionSource::new()
            .with_package(TEMPLATES_PACKAGE, &["29.0.0", "29.1.0"])
            .with_package(DATABASE_TOOL, &["24.0.0", "29.1.0"])
    }

    fn project_answers(template: &str, root: &str) -> Vec<Scripted> {
        vec![
            Scripted::Choice("29.1.0".into()),
            Scripted::Choice(template.into()),
            Scripted::Text("demo".into()),
            Scripted::Text(root.into()),
        ]
    }

    fn database_answers() -> Vec<Scripted> {
        vec![
            Scripted::Text("sql.local".into()),
            Scripted::Text("demo_db".into()),
            Scripted::Confirm(false),
            Scripted::Text("Secret123!".into()),
        ]
    }

    #[tokio::test]
    async fn test_full_install_registers_profile() {
        let root = tempfile::TempDir::new().unwrap();
        let root_path = root.path().display().to_string();
        let mut answers = project_answers(TEMPLATE_BLANK, &root_path);
        answers.push(Scripted::Confirm(true));
        answers.extend(database_answers());

        let shell = MockShellRunner::new().with_response(
            "dotnet new kentico-xperience-mvc",
            MockResponse::ok().stdout(&[
                "The template was created successfully.",
                "Do you want to run this action [Y(yes)|N(no)]?",
                "Restore succeeded.",
            ]),
        );
        let harness = Harness::with_versions(shell, answers, versions());

        let errors = harness.run("install", None).await;
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(harness.prompter.remaining(), 0);

        let working_dir = root.path().join("demo");
        let calls = harness.shell.calls();
        let scripts: Vec<&str> = calls.iter().map(|c| c.script.as_str()).collect();
        assert_eq!(
            scripts,
            vec![
                format!("mkdir \"{}\"", working_dir.display()).as_str(),
                "dotnet new uninstall kentico.xperience.templates",
                "dotnet new install kentico.xperience.templates::29.1.0",
                "dotnet new kentico-xperience-mvc -n demo --cloud",
                "dotnet kentico-xperience-dbmanager -- -s \"sql.local\" -d \"demo_db\" -a \"Secret123!\" --use-existing-database false",
            ]
        );

        let project = &calls[3];
        assert!(project.keep_open);
        assert_eq!(project.input, vec!["Y"]);
        assert!(project.input_closed);
        assert_eq!(project.working_dir, Some(working_dir.clone()));
        assert_eq!(calls[4].working_dir, Some(working_dir.clone()));

        let current = harness.ctx.config.get_current_profile().unwrap().unwrap();
        assert_eq!(current.name(), "demo");
        assert_eq!(
            current.working_directory.map(PathBuf::from),
            Some(working_dir)
        );
    }

    #[tokio::test]
    async fn test_admin_template_skips_database_and_profile() {
        let answers = project_answers(TEMPLATE_ADMIN, "/srv/www");
        let harness = Harness::with_versions(MockShellRunner::new(), answers, versions());

        let errors = harness.run("i", None).await;
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(harness.prompter.remaining(), 0);

        let calls = harness.shell.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[3].script, format!("dotnet new {} -n demo", TEMPLATE_ADMIN));
        assert!(!calls[3].keep_open);
        assert!(harness.ctx.config.get_config().unwrap().profiles.is_empty());
    }

    #[tokio::test]
    async fn test_database_only_install() {
        let answers = vec![
            Scripted::Text("sql.local".into()),
            Scripted::Text("demo_db".into()),
            Scripted::Text("Secret123!".into()),
            Scripted::Choice("29.1.0".into()),
        ];
        let shell = MockShellRunner::new().with_response(
            "tool uninstall",
            MockResponse::ok()
                .stderr(&["A tool with the package Id 'kentico.xperience.dbmanager' could not be found."])
                .exit_code(1),
        );
        let harness = Harness::with_versions(shell, answers, versions());

        let errors = harness.run("install", Some("DB")).await;
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(!harness
            .prompter
            .asked()
            .iter()
            .any(|m| m == "Use existing database?"));

        let scripts = harness.shell.scripts();
        assert_eq!(
            scripts,
            vec![
                "dotnet tool uninstall Kentico.Xperience.DbManager -g",
                "dotnet tool install Kentico.Xperience.DbManager -g --version 29.1.0",
                "kentico-xperience-dbmanager -- -s \"sql.local\" -d \"demo_db\" -a \"Secret123!\" --use-existing-database false",
            ]
        );
        assert!(harness.ctx.config.get_config().unwrap().profiles.is_empty());
    }

    #[tokio::test]
    async fn test_template_failure_stops_install() {
        let mut answers = project_answers(TEMPLATE_BLANK, "/srv/www");
        answers.push(Scripted::Confirm(false));
        answers.extend(database_answers());
        let shell = MockShellRunner::new().with_response(
            "dotnet new install",
            MockResponse::ok().stderr(&["error NU1101: Unable to find package"]),
        );
        let harness = Harness::with_versions(shell, answers, versions());

        let errors = harness.run("install", None).await;
        assert_eq!(errors, vec!["error NU1101: Unable to find package"]);
        assert_eq!(harness.shell.scripts().len(), 3);
        assert!(harness.ctx.config.get_config().unwrap().profiles.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_profile_is_reported() {
        let mut answers = project_answers(TEMPLATE_BLANK, "/srv/www");
        answers.push(Scripted::Confirm(false));
        answers.extend(database_answers());
        let harness = Harness::with_versions(MockShellRunner::new(), answers, versions());
        harness.profile("Demo");

        let errors = harness.run("install", None).await;
        assert_eq!(errors, vec!["There is already a profile named 'demo.'"]);
        assert_eq!(harness.ctx.config.get_config().unwrap().profiles.len(), 1);
    }
}
