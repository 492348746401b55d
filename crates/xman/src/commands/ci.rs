//! `xman ci`

use super::{profile_dir, run_script, CommandContext};
use crate::ui;
use crate::ui::spinner::ScriptProgress;
use async_trait::async_trait;
use xman_core::command::{ActionPolicy, Command, CommandDescriptor, CommandState};
use xman_core::config::ToolProfile;
use xman_core::errors::Result;
use xman_core::output::{
    contains_ignore_case, interpret_object_type_line, object_type_label, ProgressUpdate,
    CI_REPOSITORY_NOT_FOUND,
};
use xman_core::script::{ScriptBuilder, ScriptType};
use xman_core::shell::{ProcessControl, ShellOptions};

const STORE: &str = "store";
const RESTORE: &str = "restore";

pub static DESCRIPTOR: CommandDescriptor = CommandDescriptor {
    keywords: &["ci"],
    parameters: &[STORE, RESTORE],
    description: "Stores or restores CI data",
    requires_profile: true,
    action: ActionPolicy::Required,
};

pub fn create(ctx: &CommandContext) -> Box<dyn Command + '_> {
    Box::new(ContinuousIntegrationCommand {
        ctx,
        state: CommandState::new(),
    })
}

struct ContinuousIntegrationCommand<'a> {
    ctx: &'a CommandContext,
    state: CommandState,
}

impl ContinuousIntegrationCommand<'_> {
    async fn store(&self, profile: Option<&ToolProfile>) -> Result<()> {
        let script = ScriptBuilder::new(ScriptType::StoreContinuousIntegration)?.build()?;
        let progress = ScriptProgress::bar("Running the CI store script");
        let reporter = progress.clone();
        let shell = ShellOptions::new(script)
            .working_dir(profile_dir(profile))
            .on_output(move |line: &str, _: &ProcessControl| {
                // e.g. "Object type 1/84: Module"
                if let Some(update @ ProgressUpdate::Counter { .. }) = interpret_object_type_line(line) {
                    reporter.apply(update);
                }
            });
        let result = run_script(self.ctx, &self.state, shell).await;
        progress.finish();
        result.map(|_| ())
    }

    async fn restore(&self, profile: Option<&ToolProfile>) -> Result<()> {
        let script = ScriptBuilder::new(ScriptType::RestoreContinuousIntegration)?.build()?;
        let progress = ScriptProgress::spinner("Running the CI restore script");
        let reporter = progress.clone();
        let state = self.state.clone();
        let shell = ShellOptions::new(script)
            .working_dir(profile_dir(profile))
            .on_output(move |line: &str, process: &ProcessControl| {
                if contains_ignore_case(line, CI_REPOSITORY_NOT_FOUND) {
                    state.log_process_error(
                        "The restore process wasn't started because the Continuous Integration repository wasn't found.",
                        process,
                    );
                } else if let Some(label) = object_type_label(line) {
                    // e.g. "Object type Module: updating Activities"
                    reporter.set_label(&label);
                }
            });
        let result = run_script(self.ctx, &self.state, shell).await;
        progress.finish();
        result.map(|_| ())
    }
}

#[async_trait(?Send)]
impl Command for ContinuousIntegrationCommand<'_> {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &DESCRIPTOR
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    async fn execute(&mut self, profile: Option<&ToolProfile>, action: Option<&str>) -> Result<()> {
        match action {
            Some(STORE) => self.store(profile).await,
            Some(RESTORE) => self.restore(profile).await,
            _ => Ok(()),
        }
    }

    async fn post_execute(&mut self, _profile: Option<&ToolProfile>, action: Option<&str>) -> Result<()> {
        if !self.state.has_errors() {
            ui::success(format!("CI {} complete!", action.unwrap_or("process")));
        }
        Ok(())
    }
}
