//! `xman delete`

use super::{profile_dir, run_script, CommandContext};
use crate::ui;
use async_trait::async_trait;
use tracing::debug;
use xman_core::appsettings::{split_initial_catalog, AppSettingsManager};
use xman_core::command::{ActionPolicy, Command, CommandDescriptor, CommandState};
use xman_core::config::ToolProfile;
use xman_core::constants::CONNECTION_STRING_NAME;
use xman_core::errors::Result;
use xman_core::options::RunSqlOptions;
use xman_core::prompt::ConfirmPrompt;
use xman_core::script::{ScriptBuilder, ScriptType};
use xman_core::shell::ShellOptions;

pub static DESCRIPTOR: CommandDescriptor = CommandDescriptor {
    keywords: &["d", "delete"],
    parameters: &[],
    description: "Deletes a project and its database",
    requires_profile: true,
    action: ActionPolicy::None,
};

pub fn create(ctx: &CommandContext) -> Box<dyn Command + '_> {
    Box::new(DeleteCommand {
        ctx,
        state: CommandState::new(),
        confirmed: false,
    })
}

struct DeleteCommand<'a> {
    ctx: &'a CommandContext,
    state: CommandState,
    confirmed: bool,
}

impl DeleteCommand<'_> {
    async fn drop_database(&self, profile: Option<&ToolProfile>) -> Result<()> {
        if self.state.is_stopped() {
            return Ok(());
        }

        ui::emphasis("Deleting database...");
        let connection_string = profile_dir(profile).and_then(|dir| {
            AppSettingsManager::new(dir, None)
                .connection_string(CONNECTION_STRING_NAME)
                .map_err(|e| debug!("{}", e))
                .ok()
                .flatten()
        });
        let Some(connection_string) = connection_string else {
            self.state.log_error("Couldn't load connection string.");
            return Ok(());
        };
        // The server refuses to drop a database the connection is using
        let Some((database, server_connection)) = split_initial_catalog(&connection_string) else {
            self.state.log_error("Couldn't find database name.");
            return Ok(());
        };

        let options = RunSqlOptions {
            conn_string: Some(server_connection),
            sql_query: Some(format!("DROP DATABASE {}", database)),
        };
        let script = ScriptBuilder::new(ScriptType::ExecuteSql)?
            .with_placeholders(&options)
            .build()?;
        run_script(self.ctx, &self.state, ShellOptions::new(script)).await?;
        Ok(())
    }

    async fn delete_files(&self, profile: Option<&ToolProfile>) -> Result<()> {
        if self.state.is_stopped() {
            return Ok(());
        }
        let Some(profile) = profile else {
            return Ok(());
        };

        ui::emphasis("Deleting local files...");
        let script = ScriptBuilder::new(ScriptType::DeleteDirectory)?
            .with_placeholders(profile)
            .build()?;
        run_script(self.ctx, &self.state, ShellOptions::new(script)).await?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl Command for DeleteCommand<'_> {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &DESCRIPTOR
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    async fn execute(&mut self, profile: Option<&ToolProfile>, _action: Option<&str>) -> Result<()> {
        self.confirmed = self.ctx.prompter.confirm(&ConfirmPrompt::new(
            "This will delete the current profile's physical folder and database!\nDo you want to continue?",
            false,
        ))?;
        if !self.confirmed {
            return Ok(());
        }
        println!();

        self.drop_database(profile).await?;
        self.delete_files(profile).await?;
        if let (false, Some(profile)) = (self.state.is_stopped(), profile) {
            self.ctx.config.remove_profile(profile)?;
        }
        Ok(())
    }

    async fn post_execute(&mut self, _profile: Option<&ToolProfile>, _action: Option<&str>) -> Result<()> {
        if !self.confirmed {
            ui::emphasis("Delete cancelled");
            println!();
        } else if !self.state.has_errors() {
            ui::success("Delete complete!");
        }
        Ok(())
    }
}
