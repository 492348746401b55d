//! `xman profile`

use super::CommandContext;
use crate::ui;
use async_trait::async_trait;
use std::path::Path;
use xman_core::command::{ActionPolicy, Command, CommandDescriptor, CommandState};
use xman_core::config::ToolProfile;
use xman_core::errors::{ConfigError, Result, XmanError};
use xman_core::prompt::SelectPrompt;
use xman_core::wizard::Wizard;
use xman_core::wizards::NewProfileWizard;

const ADD: &str = "add";
const DELETE: &str = "delete";
const SWITCH: &str = "switch";

pub static DESCRIPTOR: CommandDescriptor = CommandDescriptor {
    keywords: &["p", "profile"],
    parameters: &[ADD, DELETE, SWITCH],
    description: "Manage and switch installation profiles",
    requires_profile: false,
    action: ActionPolicy::Defaulted(SWITCH),
};

pub fn create(ctx: &CommandContext) -> Box<dyn Command + '_> {
    Box::new(ProfileCommand {
        ctx,
        state: CommandState::new(),
        wizard: NewProfileWizard::new(),
    })
}

struct ProfileCommand<'a> {
    ctx: &'a CommandContext,
    state: CommandState,
    wizard: NewProfileWizard,
}

impl ProfileCommand<'_> {
    fn choose(&self, message: &str, profiles: &[ToolProfile]) -> Result<Option<ToolProfile>> {
        let labels = profiles.iter().map(|p| p.name().to_string()).collect();
        let index = self.ctx.prompter.select(&SelectPrompt::new(message, labels))?;
        Ok(profiles.get(index).cloned())
    }

    async fn add(&mut self) -> Result<()> {
        let options = self.wizard.run(self.ctx.prompter.as_ref(), &[]).await?;
        let name = options.name.unwrap_or_default();
        let directory = options.working_directory.unwrap_or_default();
        if !Path::new(&directory).is_dir() {
            self.state
                .log_error(format!("The directory {} couldn't be found.", directory));
            return Ok(());
        }

        match self.ctx.config.add_profile(&ToolProfile::new(&name, directory)) {
            Err(XmanError::Config(err @ ConfigError::DuplicateProfile { .. })) => {
                self.state.log_error(err.to_string());
                Ok(())
            }
            Err(err) => Err(err),
            Ok(()) => {
                ui::success(format!("Profile '{}' added", name));
                Ok(())
            }
        }
    }

    fn delete(&self, profiles: &[ToolProfile]) -> Result<()> {
        let Some(selected) = self.choose("Delete which profile?", profiles)? else {
            return Ok(());
        };
        self.ctx.config.remove_profile(&selected)?;
        ui::success(format!("Profile '{}' deleted", selected.name()));
        Ok(())
    }

    fn switch(&self, profiles: &[ToolProfile], current: Option<&ToolProfile>) -> Result<()> {
        ui::print_profile(current);
        let Some(selected) = self.choose("Switch to profile:", profiles)? else {
            return Ok(());
        };
        self.ctx.config.set_current_profile(&selected)?;
        ui::success(format!("Switched to '{}'", selected.name()));
        Ok(())
    }
}

#[async_trait(?Send)]
impl Command for ProfileCommand<'_> {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &DESCRIPTOR
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    async fn execute(&mut self, profile: Option<&ToolProfile>, action: Option<&str>) -> Result<()> {
        let action = action.unwrap_or(SWITCH);
        let profiles = self.ctx.config.get_config()?.profiles;

        if profiles.is_empty() && (action == SWITCH || action == DELETE) {
            ui::plain("There are no registered profiles. Install a new instance with xman i to add a profile.\n");
            return Ok(());
        }
        if profiles.len() == 1 && action == SWITCH {
            ui::plain("You're currently using the only registered profile.\n");
            return Ok(());
        }

        match action {
            ADD => self.add().await,
            DELETE => self.delete(&profiles),
            _ => self.switch(&profiles, profile),
        }
    }

    async fn post_execute(&mut self, _profile: Option<&ToolProfile>, _action: Option<&str>) -> Result<()> {
        println!();
        Ok(())
    }
}
