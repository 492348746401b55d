//! Terminal prompter backed by `dialoguer`

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};
use xman_core::errors::PromptError;
use xman_core::prompt::{ConfirmPrompt, Prompter, SelectPrompt, TextPrompt};

fn interaction(err: dialoguer::Error) -> PromptError {
    PromptError::Interaction(err.to_string())
}

/// Asks questions on the controlling terminal
#[derive(Default)]
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
}

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prompter for DialoguerPrompter {
    fn text(&self, prompt: &TextPrompt) -> Result<String, PromptError> {
        if prompt.secret {
            return Password::with_theme(&self.theme)
                .with_prompt(&prompt.message)
                .allow_empty_password(prompt.allow_empty)
                .interact()
                .map_err(interaction);
        }

        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(&prompt.message)
            .allow_empty(prompt.allow_empty || prompt.default.is_some())
            .validate_with(|answer: &String| -> Result<(), String> { prompt.accepts(answer) });
        if let Some(default) = &prompt.default {
            input = input.default(default.clone());
        }
        input.interact_text().map_err(interaction)
    }

    fn confirm(&self, prompt: &ConfirmPrompt) -> Result<bool, PromptError> {
        Confirm::with_theme(&self.theme)
            .with_prompt(&prompt.message)
            .default(prompt.default)
            .interact()
            .map_err(interaction)
    }

    fn select(&self, prompt: &SelectPrompt) -> Result<usize, PromptError> {
        if prompt.choices.is_empty() {
            return Err(PromptError::Interaction(format!(
                "No choices available for '{}'",
                prompt.message
            )));
        }
        Select::with_theme(&self.theme)
            .with_prompt(&prompt.message)
            .items(&prompt.choices)
            .default(prompt.default)
            .interact()
            .map_err(interaction)
    }
}
