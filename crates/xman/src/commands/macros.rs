//! `xman macros`

use super::{profile_dir, run_script, CommandContext};
use crate::ui;
use crate::ui::spinner::ScriptProgress;
use async_trait::async_trait;
use xman_core::command::{ActionPolicy, Command, CommandDescriptor, CommandState};
use xman_core::config::ToolProfile;
use xman_core::errors::Result;
use xman_core::output::{contains_ignore_case, MACRO_PROGRESS_MARKER};
use xman_core::script::{ScriptBuilder, ScriptType};
use xman_core::shell::{ProcessControl, ShellOptions};
use xman_core::wizard::Wizard;
use xman_core::wizards::MacroWizard;

pub static DESCRIPTOR: CommandDescriptor = CommandDescriptor {
    keywords: &["m", "macros"],
    parameters: &[],
    description: "Re-signs macro signatures",
    requires_profile: true,
    action: ActionPolicy::None,
};

pub fn create(ctx: &CommandContext) -> Box<dyn Command + '_> {
    Box::new(MacroCommand {
        ctx,
        state: CommandState::new(),
        wizard: MacroWizard::new(),
    })
}

struct MacroCommand<'a> {
    ctx: &'a CommandContext,
    state: CommandState,
    wizard: MacroWizard,
}

#[async_trait(?Send)]
impl Command for MacroCommand<'_> {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &DESCRIPTOR
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    async fn execute(&mut self, profile: Option<&ToolProfile>, _action: Option<&str>) -> Result<()> {
        let options = self.wizard.run(self.ctx.prompter.as_ref(), &[]).await?;
        println!();

        let script = ScriptBuilder::new(ScriptType::ResignMacros)?
            .append_sign_all(options.sign_all, options.user_name.as_deref())
            .append_salt(options.old_salt.as_deref(), true)
            .append_salt(options.new_salt.as_deref(), false)
            .build()?;

        let progress = ScriptProgress::spinner("Re-signing macros...");
        let reporter = progress.clone();
        let shell = ShellOptions::new(script)
            .working_dir(profile_dir(profile))
            .on_output(move |line: &str, _: &ProcessControl| {
                // e.g. "Processing 'Class' objects"
                if contains_ignore_case(line, MACRO_PROGRESS_MARKER) {
                    reporter.set_label(line.trim());
                }
            });
        let result = run_script(self.ctx, &self.state, shell).await;
        progress.finish();
        result?;
        Ok(())
    }

    async fn post_execute(&mut self, _profile: Option<&ToolProfile>, _action: Option<&str>) -> Result<()> {
        if !self.state.has_errors() {
            ui::success("Macros re-signed!");
        }
        Ok(())
    }
}
