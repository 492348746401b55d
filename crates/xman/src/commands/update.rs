//! `xman update`

use super::build::build_project;
use super::{profile_dir, run_script, CommandContext};
use crate::ui;
use async_trait::async_trait;
use tracing::info;
use xman_core::command::{ActionPolicy, Command, CommandDescriptor, CommandState};
use xman_core::config::ToolProfile;
use xman_core::constants::UPDATE_PACKAGES;
use xman_core::errors::Result;
use xman_core::options::UpdateOptions;
use xman_core::script::{ScriptBuilder, ScriptType};
use xman_core::shell::ShellOptions;
use xman_core::wizard::Wizard;
use xman_core::wizards::UpdateWizard;

pub static DESCRIPTOR: CommandDescriptor = CommandDescriptor {
    keywords: &["u", "update"],
    parameters: &[],
    description: "Updates a project's NuGet packages and database version",
    requires_profile: true,
    action: ActionPolicy::None,
};

pub fn create(ctx: &CommandContext) -> Box<dyn Command + '_> {
    Box::new(UpdateCommand {
        ctx,
        state: CommandState::new(),
        wizard: UpdateWizard::new(ctx.versions.clone()),
    })
}

struct UpdateCommand<'a> {
    ctx: &'a CommandContext,
    state: CommandState,
    wizard: UpdateWizard,
}

impl UpdateCommand<'_> {
    async fn update_packages(&self, options: &UpdateOptions, profile: Option<&ToolProfile>) -> Result<()> {
        let target = options
            .version
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "latest".to_string());

        for package in UPDATE_PACKAGES {
            if self.state.is_stopped() {
                return Ok(());
            }

            ui::emphasis(format!("Updating {} to version {}...", package, target));
            let package_options = UpdateOptions {
                package_name: Some(package.to_string()),
                ..options.clone()
            };
            let script = ScriptBuilder::new(ScriptType::PackageUpdate)?
                .with_placeholders(&package_options)
                .append_version(package_options.version.as_ref())
                .build()?;
            run_script(
                self.ctx,
                &self.state,
                ShellOptions::new(script).working_dir(profile_dir(profile)),
            )
            .await?;
        }
        Ok(())
    }

    async fn update_database(&self, profile: Option<&ToolProfile>) -> Result<()> {
        if self.state.is_stopped() {
            return Ok(());
        }

        ui::emphasis("Updating database...");
        let script = ScriptBuilder::new(ScriptType::DatabaseUpdate)?.build()?;
        run_script(
            self.ctx,
            &self.state,
            ShellOptions::new(script).working_dir(profile_dir(profile)),
        )
        .await?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl Command for UpdateCommand<'_> {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &DESCRIPTOR
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    async fn execute(&mut self, profile: Option<&ToolProfile>, _action: Option<&str>) -> Result<()> {
        let options = self.wizard.run(self.ctx.prompter.as_ref(), &[]).await?;
        info!("Updating {} to {:?}", profile.map(|p| p.name()).unwrap_or_default(), options.version);

        self.update_packages(&options, profile).await?;
        build_project(self.ctx, &self.state, profile).await?;
        self.update_database(profile).await
    }

    async fn post_execute(&mut self, _profile: Option<&ToolProfile>, _action: Option<&str>) -> Result<()> {
        if !self.state.has_errors() {
            ui::success("Update complete!");
        }
        Ok(())
    }
}
