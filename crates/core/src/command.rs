//! Command lifecycle
//!
//! Every CLI command runs through three phases: `pre_execute` validates the
//! action argument and the active profile, `execute` does the work and
//! `post_execute` reports success. Operator-facing errors are collected in a
//! shared [`CommandState`]; logging one stops all further work of the
//! invocation.
//!
//! Command metadata (keywords, parameters, description) is a static
//! [`CommandDescriptor`], so help output and keyword lookup never need a
//! constructed command.

use crate::config::ToolProfile;
use crate::errors::Result;
use crate::shell::{LineHandler, ProcessControl, ShellExit};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// How a command treats its action argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPolicy {
    /// No action is accepted
    None,
    /// An action from the parameters may be given
    Optional,
    /// An action from the parameters must be given
    Required,
    /// A missing action means the given parameter
    Defaulted(&'static str),
}

/// Static metadata of a command
#[derive(Debug, Clone, Copy)]
pub struct CommandDescriptor {
    pub keywords: &'static [&'static str],
    pub parameters: &'static [&'static str],
    pub description: &'static str,
    pub requires_profile: bool,
    pub action: ActionPolicy,
}

impl CommandDescriptor {
    /// Whether `keyword` invokes this command, ignoring case.
    pub fn matches(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k.eq_ignore_ascii_case(keyword))
    }

    /// Lower-case the raw action and apply the default, if any.
    pub fn resolve_action(&self, raw: Option<&str>) -> Option<String> {
        match (raw.filter(|a| !a.trim().is_empty()), self.action) {
            (Some(action), _) => Some(action.trim().to_lowercase()),
            (None, ActionPolicy::Defaulted(default)) => Some(default.to_string()),
            (None, _) => None,
        }
    }

    /// Check a resolved action against the declared parameters.
    pub fn validate_action(&self, action: Option<&str>) -> std::result::Result<(), String> {
        let valid = match (action, self.action) {
            (None, ActionPolicy::Required) => false,
            (None, _) => true,
            (Some(_), ActionPolicy::None) => self.parameters.is_empty(),
            (Some(action), _) => self
                .parameters
                .iter()
                .any(|p| p.eq_ignore_ascii_case(action)),
        };
        if valid {
            Ok(())
        } else {
            Err(self.parameter_error())
        }
    }

    pub fn parameter_error(&self) -> String {
        format!(
            "Must provide one parameter from '{}'",
            self.parameters.join(", ")
        )
    }
}

/// Lifecycle position of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Fresh,
    PreExecuted,
    Executed,
    PostExecuted,
}

/// Error list and stop flag shared by a command and its output handlers
#[derive(Debug, Clone, Default)]
pub struct CommandState {
    errors: Arc<Mutex<Vec<String>>>,
    stopped: Arc<AtomicBool>,
    phase: Arc<Mutex<Phase>>,
}

impl CommandState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an operator-facing error and stop processing.
    pub fn log_error(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("Command error: {}", message);
        self.errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message);
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Record an error raised by a running script and terminate it.
    pub fn log_process_error(&self, message: impl Into<String>, process: &ProcessControl) {
        self.log_error(message);
        process.kill();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn has_errors(&self) -> bool {
        !self
            .errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn advance(&self, phase: Phase) {
        debug!("Command phase: {:?}", phase);
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = phase;
    }

    /// Stderr handler logging every non-empty line and killing the script.
    pub fn error_handler(&self) -> LineHandler {
        self.filtered_error_handler(|_| false)
    }

    /// Like [`Self::error_handler`], but lines for which `ignore` holds are
    /// dropped.
    pub fn filtered_error_handler(&self, ignore: fn(&str) -> bool) -> LineHandler {
        let state = self.clone();
        Arc::new(move |line: &str, process: &ProcessControl| {
            if line.trim().is_empty() {
                return;
            }
            if ignore(line) {
                debug!("Ignoring script output: {}", line);
                return;
            }
            state.log_process_error(line, process);
        })
    }

    /// Log a failed exit when the script did not report an error itself.
    pub fn check_exit(&self, script: &str, exit: &ShellExit) {
        if exit.success() || exit.killed || self.has_errors() {
            return;
        }
        let summary = script_summary(script);
        match exit.code {
            Some(code) => self.log_error(format!(
                "The script '{}' exited with code {}.",
                summary, code
            )),
            None => self.log_error(format!("The script '{}' was terminated.", summary)),
        }
    }
}

/// First three words of a script, followed by "..." when there are more.
fn script_summary(script: &str) -> String {
    let words: Vec<&str> = script.split_whitespace().collect();
    if words.len() > 3 {
        format!("{}...", words[..3].join(" "))
    } else {
        words.join(" ")
    }
}

/// A CLI command
#[async_trait(?Send)]
pub trait Command {
    fn descriptor(&self) -> &'static CommandDescriptor;

    fn state(&self) -> &CommandState;

    /// Validate the action and the active profile.
    async fn pre_execute(&mut self, profile: Option<&ToolProfile>, action: Option<&str>) -> Result<()> {
        check_preconditions(self.descriptor(), self.state(), profile, action);
        Ok(())
    }

    async fn execute(&mut self, profile: Option<&ToolProfile>, action: Option<&str>) -> Result<()>;

    async fn post_execute(&mut self, _profile: Option<&ToolProfile>, _action: Option<&str>) -> Result<()> {
        Ok(())
    }
}

/// Checks shared by every `pre_execute`.
pub fn check_preconditions(
    descriptor: &CommandDescriptor,
    state: &CommandState,
    profile: Option<&ToolProfile>,
    action: Option<&str>,
) {
    if let Err(message) = descriptor.validate_action(action) {
        state.log_error(message);
    }
    if descriptor.requires_profile && profile.is_none() {
        state.log_error("This command requires a profile.");
    }
}

/// Drive a command through its phases.
///
/// Later phases are skipped once the command has stopped. Returns the
/// accumulated operator-facing errors; unexpected failures propagate as `Err`.
pub async fn run_phases(
    command: &mut dyn Command,
    profile: Option<&ToolProfile>,
    action: Option<&str>,
) -> Result<Vec<String>> {
    let state = command.state().clone();

    command.pre_execute(profile, action).await?;
    state.advance(Phase::PreExecuted);

    if !state.is_stopped() {
        command.execute(profile, action).await?;
        state.advance(Phase::Executed);
    }

    if !state.is_stopped() {
        command.post_execute(profile, action).await?;
        state.advance(Phase::PostExecuted);
    }

    Ok(state.errors())
}
