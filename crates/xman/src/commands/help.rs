//! `xman help`

use super::{descriptors, CommandContext};
use async_trait::async_trait;
use console::style;
use tracing::debug;
use xman_core::command::{ActionPolicy, Command, CommandDescriptor, CommandState};
use xman_core::config::ToolProfile;
use xman_core::constants::TOOL_PACKAGE;
use xman_core::errors::Result;
use xman_core::versions::newer_version;

const REPOSITORY_URL: &str = "https://github.com/Kentico/xperience-by-kentico-manager";

const BANNER: &str = r"
 __  ___ __ ___   __ _ _ __
 \ \/ / '_ ` _ \ / _` | '_ \
  >  <| | | | | | (_| | | | |
 /_/\_\_| |_| |_|\__,_|_| |_|
";

pub static DESCRIPTOR: CommandDescriptor = CommandDescriptor {
    keywords: &["?", "help"],
    parameters: &[],
    description: "Displays the help menu (this screen)",
    requires_profile: false,
    action: ActionPolicy::None,
};

pub fn create(ctx: &CommandContext) -> Box<dyn Command + '_> {
    Box::new(HelpCommand {
        ctx,
        state: CommandState::new(),
    })
}

struct HelpCommand<'a> {
    ctx: &'a CommandContext,
    state: CommandState,
}

/// Table of every registered command.
pub(crate) fn help_table() -> String {
    let rows: Vec<Vec<String>> = descriptors()
        .map(|d| {
            vec![
                d.keywords.join(", "),
                d.parameters.join(", "),
                d.description.to_string(),
            ]
        })
        .collect();
    crate::ui::table(&["Command", "Parameters", "Description"], &rows)
}

#[async_trait(?Send)]
impl Command for HelpCommand<'_> {
    fn descriptor(&self) -> &'static CommandDescriptor {
        &DESCRIPTOR
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    async fn execute(&mut self, _profile: Option<&ToolProfile>, _action: Option<&str>) -> Result<()> {
        println!("{}", style(BANNER.trim_start_matches('\n')).yellow().bold());
        println!(" v{}", self.ctx.tool_version);
        println!(" {}\n", style(REPOSITORY_URL).yellow());
        println!("{}\n", help_table());

        match self.ctx.versions.package_versions(TOOL_PACKAGE).await {
            Ok(versions) => {
                if let Some(latest) = newer_version(&versions, &self.ctx.tool_version) {
                    println!(" New version {} available!\n", style(latest).green());
                }
            }
            Err(e) => debug!("Skipping the update check: {}", e),
        }
        Ok(())
    }
}
