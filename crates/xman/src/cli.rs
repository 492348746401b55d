use crate::commands::{self, CommandContext};
use crate::ui::prompt::DialoguerPrompter;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use semver::Version;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use xman_core::config::ConfigManager;
use xman_core::constants::{CONFIG_FILENAME, NUGET_BASE_URL};
use xman_core::shell::{default_shell, ProcessRunner};
use xman_core::versions::NuGetClient;

/// Log format options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON structured format
    Json,
}

/// Log level options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// xman subcommands
///
/// The optional action is validated by each command, not by clap.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Installs a new XbK instance. The 'db' parameter installs only a database
    #[command(visible_alias = "i")]
    Install { action: Option<String> },

    /// Updates a project's NuGet packages and database version
    #[command(visible_alias = "u")]
    Update { action: Option<String> },

    /// Deletes a project and its database
    #[command(visible_alias = "d")]
    Delete { action: Option<String> },

    /// Re-signs macro signatures
    #[command(visible_alias = "m")]
    Macros { action: Option<String> },

    /// Stores or restores CI data (store, restore)
    Ci { action: Option<String> },

    /// Stores or restores CD data, or edits the config file (store, restore, config)
    Cd { action: Option<String> },

    /// Builds a project
    #[command(visible_alias = "b")]
    Build { action: Option<String> },

    /// Manage and switch installation profiles (add, delete, switch)
    #[command(visible_alias = "p")]
    Profile { action: Option<String> },

    /// Configures the application settings of a project
    #[command(visible_alias = "s")]
    Settings { action: Option<String> },

    /// Generates code files for Xperience objects
    #[command(visible_alias = "g")]
    Generate { action: Option<String> },

    /// Displays the help menu
    #[command(visible_alias = "?")]
    Help { action: Option<String> },
}

impl Commands {
    /// Keyword registered for the command and the raw action argument.
    pub fn keyword_and_action(&self) -> (&'static str, Option<&str>) {
        let (keyword, action) = match self {
            Commands::Install { action } => ("install", action),
            Commands::Update { action } => ("update", action),
            Commands::Delete { action } => ("delete", action),
            Commands::Macros { action } => ("macros", action),
            Commands::Ci { action } => ("ci", action),
            Commands::Cd { action } => ("cd", action),
            Commands::Build { action } => ("build", action),
            Commands::Profile { action } => ("profile", action),
            Commands::Settings { action } => ("settings", action),
            Commands::Generate { action } => ("generate", action),
            Commands::Help { action } => ("help", action),
        };
        (keyword, action.as_deref())
    }
}

/// Command-line interface for managing Xperience by Kentico installations
#[derive(Debug, Parser)]
#[command(name = "xman", version, about, disable_help_subcommand = true)]
pub struct Cli {
    /// Log format (text or json, defaults to text, can be set via XMAN_LOG_FORMAT env var)
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log level
    #[arg(long, global = true, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Tool configuration file (defaults to xman.json in the current directory)
    #[arg(long, global = true, value_name = "PATH", env = "XMAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Shell program used to run scripts
    #[arg(long, global = true, value_name = "PROGRAM", env = "XMAN_SHELL")]
    pub shell: Option<String>,

    /// Base URL of the NuGet registry used for version lookups
    #[arg(long, global = true, value_name = "URL", env = "XMAN_NUGET_URL", default_value = NUGET_BASE_URL, hide = true)]
    pub nuget_url: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub async fn dispatch(self) -> Result<()> {
        let log_format = match self.log_format {
            Some(LogFormat::Text) => Some("text"),
            Some(LogFormat::Json) => Some("json"),
            None => None,
        };
        let log_level = self.log_level.as_str();
        if std::env::var_os("XMAN_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
            std::env::set_var("RUST_LOG", format!("xman={},xman_core={}", log_level, log_level));
        }
        xman_core::logging::init(log_format)?;
        tracing::debug!("CLI initialized with log level: {}", log_level);

        let current_dir = std::env::current_dir().context("Failed to read the current directory")?;
        let tool_version = Version::parse(env!("CARGO_PKG_VERSION"))?;
        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| current_dir.join(CONFIG_FILENAME));
        let shell = self.shell.as_deref().unwrap_or(default_shell());
        tracing::debug!("Using shell '{}' and configuration {}", shell, config_path.display());

        let ctx = CommandContext {
            current_dir,
            tool_version,
            config: ConfigManager::new(config_path),
            shell: Arc::new(ProcessRunner::for_shell(shell)),
            versions: Arc::new(NuGetClient::with_base_url(self.nuget_url.as_str())),
            prompter: Rc::new(DialoguerPrompter::new()),
        };

        let (keyword, action) = match &self.command {
            Some(command) => command.keyword_and_action(),
            None => ("help", None),
        };
        commands::dispatch(&ctx, keyword, action).await
    }
}
