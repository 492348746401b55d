//! `xman build`

use super::{profile_dir, run_script, CommandContext};
use crate::ui;
use async_trait::async_trait;
use xman_core::command::{ActionPolicy, Command, CommandDescriptor, CommandState};
use xman_core::config::ToolProfile;
use xman_core::errors::Result;
use xman_core::script::{ScriptBuilder, ScriptType};
use xman_core::shell::ShellOptions;

pub static DESCRIPTOR: CommandDescriptor = CommandDescriptor {
    keywords: &["b", "build"],
    parameters: &[],
    description: "Builds a project",
    requires_profile: true,
    action: ActionPolicy::None,
};

pub fn create(ctx: &CommandContext) -> Box<dyn Command + '_> {
    Box::new(BuildCommand {
        ctx,
        state: CommandState::new(),
    })
}

struct BuildCommand<'a> {
    ctx: &'a CommandContext,
    state: CommandState,
}

#[async_trait(?Send)]
impl Command for BuildCommand<'_> {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &DESCRIPTOR
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    async fn execute(&mut self, profile: Option<&ToolProfile>, _action: Option<&str>) -> Result<()> {
        build_project(self.ctx, &self.state, profile).await
    }

    async fn post_execute(&mut self, _profile: Option<&ToolProfile>, _action: Option<&str>) -> Result<()> {
        if !self.state.has_errors() {
            ui::success("Build complete!");
        }
        Ok(())
    }
}

/// `dotnet build` in the profile folder; shared with `update`.
pub(crate) async fn build_project(
    ctx: &CommandContext,
    state: &CommandState,
    profile: Option<&ToolProfile>,
) -> Result<()> {
    if state.is_stopped() {
        return Ok(());
    }

    ui::emphasis("Attempting to build the project...");
    let script = ScriptBuilder::new(ScriptType::BuildProject)?.build()?;
    run_script(
        ctx,
        state,
        ShellOptions::new(script).working_dir(profile_dir(profile)),
    )
    .await?;
    Ok(())
}
