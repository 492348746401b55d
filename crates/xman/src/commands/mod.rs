//! Command implementations
//!
//! Each submodule exposes a static [`CommandDescriptor`] and a constructor.
//! [`dispatch`] resolves a keyword against the registry, prints the profile
//! banner and drives the command through its phases, reporting collected
//! errors at the end.

pub mod build;
pub mod cd;
pub mod ci;
pub mod delete;
pub mod generate;
pub mod help;
pub mod install;
pub mod macros;
pub mod profile;
pub mod settings;
pub mod update;

#[cfg(test)]
pub(crate) mod test_support;

use crate::ui;
use anyhow::Result;
use semver::Version;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, instrument};
use xman_core::command::{run_phases, Command, CommandDescriptor, CommandState};
use xman_core::config::{ConfigManager, ToolProfile};
use xman_core::errors::{ConfigError, XmanError};
use xman_core::output::is_benign_uninstall_noise;
use xman_core::prompt::Prompter;
use xman_core::shell::{ShellExit, ShellOptions, ShellRunner};
use xman_core::versions::VersionSource;

const CONFIG_READ_ERROR: &str = "There was an error reading the tool config file xman.json. Please delete or rename the file and migrate your configuration into the new file created on first run.";

/// Services shared by every command of one invocation
pub struct CommandContext {
    pub current_dir: PathBuf,
    pub tool_version: Version,
    pub config: ConfigManager,
    pub shell: Arc<dyn ShellRunner>,
    pub versions: Arc<dyn VersionSource>,
    pub prompter: Rc<dyn Prompter>,
}

type Constructor = for<'a> fn(&'a CommandContext) -> Box<dyn Command + 'a>;

struct Entry {
    descriptor: &'static CommandDescriptor,
    create: Constructor,
}

/// Registered commands in help order.
static COMMANDS: [Entry; 11] = [
    Entry { descriptor: &profile::DESCRIPTOR, create: profile::create },
    Entry { descriptor: &install::DESCRIPTOR, create: install::create },
    Entry { descriptor: &delete::DESCRIPTOR, create: delete::create },
    Entry { descriptor: &update::DESCRIPTOR, create: update::create },
    Entry { descriptor: &ci::DESCRIPTOR, create: ci::create },
    Entry { descriptor: &cd::DESCRIPTOR, create: cd::create },
    Entry { descriptor: &macros::DESCRIPTOR, create: macros::create },
    Entry { descriptor: &build::DESCRIPTOR, create: build::create },
    Entry { descriptor: &settings::DESCRIPTOR, create: settings::create },
    Entry { descriptor: &generate::DESCRIPTOR, create: generate::create },
    Entry { descriptor: &help::DESCRIPTOR, create: help::create },
];

fn find(keyword: &str) -> Option<&'static Entry> {
    COMMANDS.iter().find(|e| e.descriptor.matches(keyword))
}

/// Descriptors of every registered command in help order.
pub fn descriptors() -> impl Iterator<Item = &'static CommandDescriptor> {
    COMMANDS.iter().map(|e| e.descriptor)
}

/// Marker error for a command whose failure was already reported
#[derive(Debug)]
pub struct CommandFailed;

impl fmt::Display for CommandFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command failed")
    }
}

impl std::error::Error for CommandFailed {}

/// Run `keyword` with the raw `action` argument.
#[instrument(skip(ctx))]
pub async fn dispatch(ctx: &CommandContext, keyword: &str, action: Option<&str>) -> Result<()> {
    if let Err(err) = ctx
        .config
        .ensure_config_file(&ctx.tool_version, &ctx.current_dir)
    {
        if let XmanError::Config(ConfigError::Parsing { .. }) = err {
            debug!("{}", err);
            ui::error(CONFIG_READ_ERROR);
            return Err(CommandFailed.into());
        }
        return Err(err.into());
    }

    let Some(entry) = find(keyword) else {
        ui::error(format!("Invalid command '{}'", keyword));
        return Err(CommandFailed.into());
    };

    let profile = ctx.config.get_current_profile()?;
    let descriptor = entry.descriptor;
    let action = descriptor.resolve_action(action);
    if descriptor.requires_profile
        && profile.is_some()
        && descriptor.validate_action(action.as_deref()).is_ok()
    {
        ui::print_profile(profile.as_ref());
    }

    let mut command = (entry.create)(ctx);
    match run_phases(command.as_mut(), profile.as_ref(), action.as_deref()).await {
        Ok(errors) if errors.is_empty() => Ok(()),
        Ok(errors) => {
            ui::error(format!("Process failed with errors:\n{}", errors.join("\n")));
            Err(CommandFailed.into())
        }
        Err(err) => {
            ui::error(format!("Process failed with error:\n{}", err));
            Err(CommandFailed.into())
        }
    }
}

/// Project folder of the active profile.
pub(crate) fn profile_dir(profile: Option<&ToolProfile>) -> Option<&str> {
    profile
        .and_then(|p| p.working_directory.as_deref())
        .filter(|d| !d.is_empty())
}

/// Run a script whose stderr lines and failed exit stop the command.
pub(crate) async fn run_script(
    ctx: &CommandContext,
    state: &CommandState,
    options: ShellOptions,
) -> xman_core::errors::Result<ShellExit> {
    let script = options.script.clone();
    let options = if options.on_error.is_none() {
        options.on_error_handler(Some(state.error_handler()))
    } else {
        options
    };
    let exit = ctx.shell.run(options).await?;
    state.check_exit(&script, &exit);
    Ok(exit)
}

/// Run an uninstall script; "nothing installed" noise and the exit code are
/// ignored.
pub(crate) async fn run_uninstall(
    ctx: &CommandContext,
    state: &CommandState,
    script: String,
) -> xman_core::errors::Result<()> {
    let options = ShellOptions::new(script)
        .on_error_handler(Some(state.filtered_error_handler(is_benign_uninstall_noise)));
    let exit = ctx.shell.run(options).await?;
    debug!("Uninstall finished: {:?}", exit);
    Ok(())
}
