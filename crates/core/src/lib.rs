//! Core library for the xman CLI
//!
//! This crate contains the shared logic behind the commands: tool profiles and
//! configuration, option types and script templates, interactive wizards,
//! shell execution, settings and CD configuration files, logging, and error
//! handling.

pub mod appsettings;
pub mod cd_xml;
pub mod command;
pub mod config;
pub mod constants;
pub mod errors;
pub mod fields;
pub mod logging;
pub mod options;
pub mod output;
pub mod prompt;
pub mod script;
pub mod shell;
pub mod steps;
pub mod versions;
pub mod wizard;
pub mod wizards;

/// Get the version of the core library
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
