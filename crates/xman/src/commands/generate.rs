//! `xman generate`

use super::{profile_dir, run_script, CommandContext};
use crate::ui;
use async_trait::async_trait;
use xman_core::command::{ActionPolicy, Command, CommandDescriptor, CommandState};
use xman_core::config::ToolProfile;
use xman_core::errors::Result;
use xman_core::output::{contains_ignore_case, CODEGEN_PROGRESS_MARKER};
use xman_core::script::{ScriptBuilder, ScriptType};
use xman_core::shell::{ProcessControl, ShellOptions};
use xman_core::wizard::Wizard;
use xman_core::wizards::CodeGenerateWizard;

pub static DESCRIPTOR: CommandDescriptor = CommandDescriptor {
    keywords: &["g", "generate"],
    parameters: &[],
    description: "Generates code files for Xperience objects",
    requires_profile: true,
    action: ActionPolicy::None,
};

pub fn create(ctx: &CommandContext) -> Box<dyn Command + '_> {
    Box::new(CodeGenerateCommand {
        ctx,
        state: CommandState::new(),
        wizard: CodeGenerateWizard::new(),
    })
}

struct CodeGenerateCommand<'a> {
    ctx: &'a CommandContext,
    state: CommandState,
    wizard: CodeGenerateWizard,
}

#[async_trait(?Send)]
impl Command for CodeGenerateCommand<'_> {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &DESCRIPTOR
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    async fn execute(&mut self, profile: Option<&ToolProfile>, _action: Option<&str>) -> Result<()> {
        let mut options = self.wizard.run(self.ctx.prompter.as_ref(), &[]).await?;
        println!();
        if self.state.is_stopped() {
            return Ok(());
        }

        // The wizard asks for a location relative to the project folder
        let working_dir = profile_dir(profile);
        options.location = format!("{}{}", working_dir.unwrap_or_default(), options.location);

        let script = ScriptBuilder::new(ScriptType::GenerateCode)?
            .with_placeholders(&options)
            .append_namespace(options.namespace.as_deref())
            .build()?;
        let shell = ShellOptions::new(script)
            .working_dir(working_dir)
            .on_output(|line: &str, _: &ProcessControl| {
                if contains_ignore_case(line, CODEGEN_PROGRESS_MARKER) {
                    ui::emphasis(line);
                }
            });
        run_script(self.ctx, &self.state, shell).await?;
        Ok(())
    }

    async fn post_execute(&mut self, _profile: Option<&ToolProfile>, _action: Option<&str>) -> Result<()> {
        if !self.state.has_errors() {
            ui::success("Code generation complete!");
        }
        Ok(())
    }
}
