//! Error types and handling
//!
//! Each domain (tool configuration, script templates, subprocesses, settings
//! files, version lookup, prompts) has its own error enum. They are wrapped by
//! [`XmanError`] for callers that only need a single error type.
//!
//! Operator-facing command failures are not represented here: commands record
//! those as plain strings in their [`crate::command::CommandState`].

use thiserror::Error;

/// Tool configuration (`xman.json`) errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file parsing error
    #[error("Failed to parse configuration file {path}: {message}")]
    Parsing { path: String, message: String },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: String },

    /// Configuration file I/O error
    #[error("Failed to access configuration file")]
    Io(#[from] std::io::Error),

    /// A profile with the same project name already exists
    #[error("There is already a profile named '{name}.'")]
    DuplicateProfile { name: String },
}

/// Script template usage errors
///
/// These are contract violations by the caller, never operator-facing errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScriptError {
    /// The selected script type has no template
    #[error("Invalid script type.")]
    InvalidScriptType,

    /// The built script is empty or still contains a declared placeholder
    #[error("The script is empty or contains placeholder values.")]
    UnresolvedPlaceholders,
}

/// Subprocess errors
#[derive(Error, Debug)]
pub enum ShellError {
    /// The shell program could not be started
    #[error("Failed to start shell '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O with a running shell failed
    #[error("Shell I/O error")]
    Io(#[from] std::io::Error),
}

/// Field-descriptor errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FieldError {
    /// No field with the given name exists on the target type
    #[error("Unknown field '{name}'")]
    UnknownField { name: String },

    /// The value cannot be converted to the field's type
    #[error("The key value cannot be cast into type {kind}")]
    InvalidValue { kind: String },
}

/// Application settings (`appsettings*.json`) errors
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Settings file not found
    #[error("Settings file not found: {path}")]
    NotFound { path: String },

    /// Settings file is not valid JSON
    #[error("Failed to parse settings file {path}: {message}")]
    Parsing { path: String, message: String },

    /// Settings file I/O error
    #[error("Failed to access settings file")]
    Io(#[from] std::io::Error),

    /// A section could not be converted to its typed form
    #[error("Invalid settings section '{section}': {message}")]
    InvalidSection { section: String, message: String },
}

/// CD repository configuration (XML) errors
#[derive(Error, Debug)]
pub enum CdConfigError {
    /// Configuration file I/O error
    #[error("Failed to access CD configuration file")]
    Io(#[from] std::io::Error),

    /// XML could not be read
    #[error("Failed to read CD configuration: {0}")]
    Deserialize(String),

    /// XML could not be written
    #[error("Failed to write CD configuration: {0}")]
    Serialize(String),
}

/// Package registry errors
#[derive(Error, Debug)]
pub enum VersionError {
    /// HTTP request failed
    #[error("Package registry request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Registry replied with a non-success status
    #[error("Package registry returned status {status} for {package}")]
    Status { package: String, status: u16 },
}

/// Interactive prompt errors
#[derive(Error, Debug)]
pub enum PromptError {
    /// The terminal interaction failed
    #[error("Prompt failed: {0}")]
    Interaction(String),

    /// A scripted prompter ran out of answers
    #[error("No scripted answer left for prompt '{message}'")]
    Exhausted { message: String },
}

/// Top-level error type for xman
#[derive(Error, Debug)]
pub enum XmanError {
    /// Tool configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Script template errors
    #[error("{0}")]
    Script(#[from] ScriptError),

    /// Subprocess errors
    #[error("Shell error: {0}")]
    Shell(#[from] ShellError),

    /// Field-descriptor errors
    #[error("{0}")]
    Field(#[from] FieldError),

    /// Application settings errors
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// CD configuration errors
    #[error("CD configuration error: {0}")]
    CdConfig(#[from] CdConfigError),

    /// Package registry errors
    #[error("Version lookup error: {0}")]
    Version(#[from] VersionError),

    /// Prompt errors
    #[error("{0}")]
    Prompt(#[from] PromptError),
}

/// Convenience type alias for Results with XmanError
pub type Result<T> = std::result::Result<T, XmanError>;
