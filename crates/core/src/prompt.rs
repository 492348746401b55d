//! Prompt descriptors and the prompter seam
//!
//! Wizards describe what to ask with [`Prompt`] values; a [`Prompter`]
//! implementation decides how to ask. The terminal implementation lives in
//! the binary, [`mock::ScriptedPrompter`] answers from a queue in tests.

use crate::errors::PromptError;

/// Input check applied to text answers
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    pub check: fn(&str) -> bool,
    /// Shown when `check` rejects the input
    pub message: &'static str,
}

/// Free-text question
#[derive(Debug, Clone)]
pub struct TextPrompt {
    pub message: String,
    pub default: Option<String>,
    pub allow_empty: bool,
    /// Hide the typed characters
    pub secret: bool,
    pub validator: Option<Validator>,
}

impl TextPrompt {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            default: None,
            allow_empty: false,
            secret: false,
            validator: None,
        }
    }

    /// Default shown to the operator; empty values are ignored.
    pub fn with_default(mut self, default: Option<impl Into<String>>) -> Self {
        self.default = default.map(Into::into).filter(|d: &String| !d.is_empty());
        self
    }

    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn validate(mut self, check: fn(&str) -> bool, message: &'static str) -> Self {
        self.validator = Some(Validator { check, message });
        self
    }

    /// Check an answer the way an interactive prompt would.
    pub fn accepts(&self, answer: &str) -> Result<(), String> {
        if answer.is_empty() && !self.allow_empty {
            return Err("A value is required".to_string());
        }
        match self.validator {
            Some(validator) if !answer.is_empty() && !(validator.check)(answer) => {
                Err(validator.message.to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Yes/no question
#[derive(Debug, Clone)]
pub struct ConfirmPrompt {
    pub message: String,
    pub default: bool,
}

impl ConfirmPrompt {
    pub fn new(message: impl Into<String>, default: bool) -> Self {
        Self {
            message: message.into(),
            default,
        }
    }
}

/// Single choice from a list
#[derive(Debug, Clone)]
pub struct SelectPrompt {
    pub message: String,
    pub choices: Vec<String>,
    /// Index highlighted initially
    pub default: usize,
}

impl SelectPrompt {
    pub fn new(message: impl Into<String>, choices: Vec<String>) -> Self {
        Self {
            message: message.into(),
            choices,
            default: 0,
        }
    }

    /// Highlight the first choice equal to `value`, ignoring case.
    pub fn with_default(mut self, value: Option<&str>) -> Self {
        if let Some(value) = value {
            if let Some(index) = self
                .choices
                .iter()
                .position(|c| c.eq_ignore_ascii_case(value))
            {
                self.default = index;
            }
        }
        self
    }
}

/// Any prompt a step can show
#[derive(Debug, Clone)]
pub enum Prompt {
    Text(TextPrompt),
    Confirm(ConfirmPrompt),
    Select(SelectPrompt),
}

impl Prompt {
    pub fn message(&self) -> &str {
        match self {
            Prompt::Text(p) => &p.message,
            Prompt::Confirm(p) => &p.message,
            Prompt::Select(p) => &p.message,
        }
    }
}

/// Answer matching the prompt kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Confirm(bool),
    /// Index into the prompt's choices
    Select(usize),
}

/// Asks the operator
pub trait Prompter {
    fn text(&self, prompt: &TextPrompt) -> Result<String, PromptError>;

    fn confirm(&self, prompt: &ConfirmPrompt) -> Result<bool, PromptError>;

    /// Index of the selected choice.
    fn select(&self, prompt: &SelectPrompt) -> Result<usize, PromptError>;

    fn ask(&self, prompt: &Prompt) -> Result<Answer, PromptError> {
        match prompt {
            Prompt::Text(p) => self.text(p).map(Answer::Text),
            Prompt::Confirm(p) => self.confirm(p).map(Answer::Confirm),
            Prompt::Select(p) => self.select(p).map(Answer::Select),
        }
    }
}

pub mod mock {
    //! Queue-driven prompter for tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A queued answer
    #[derive(Debug, Clone)]
    pub enum Scripted {
        Text(String),
        Confirm(bool),
        Select(usize),
        /// Select the choice with this label
        Choice(String),
        /// Accept whatever the prompt offers as default
        Default,
    }

    /// Answers prompts in order from a queue and records every message asked
    #[derive(Debug, Default)]
    pub struct ScriptedPrompter {
        answers: Mutex<VecDeque<Scripted>>,
        asked: Mutex<Vec<String>>,
    }

    impl ScriptedPrompter {
        pub fn new(answers: impl IntoIterator<Item = Scripted>) -> Self {
            Self {
                answers: Mutex::new(answers.into_iter().collect()),
                asked: Mutex::new(Vec::new()),
            }
        }

        /// Messages of every prompt shown so far.
        pub fn asked(&self) -> Vec<String> {
            self.asked
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone()
        }

        /// Answers not consumed yet.
        pub fn remaining(&self) -> usize {
            self.answers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .len()
        }

        fn next(&self, message: &str) -> Result<Scripted, PromptError> {
            self.asked
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(message.to_string());
            self.answers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front()
                .ok_or_else(|| PromptError::Exhausted {
                    message: message.to_string(),
                })
        }

        fn mismatch(message: &str, answer: &Scripted) -> PromptError {
            PromptError::Interaction(format!(
                "Scripted answer {:?} does not fit prompt '{}'",
                answer, message
            ))
        }
    }

    impl Prompter for ScriptedPrompter {
        fn text(&self, prompt: &TextPrompt) -> Result<String, PromptError> {
            let answer = match self.next(&prompt.message)? {
                Scripted::Text(text) if text.is_empty() => {
                    prompt.default.clone().unwrap_or_default()
                }
                Scripted::Text(text) => text,
                Scripted::Default => prompt.default.clone().unwrap_or_default(),
                other => return Err(Self::mismatch(&prompt.message, &other)),
            };
            prompt.accepts(&answer).map_err(PromptError::Interaction)?;
            Ok(answer)
        }

        fn confirm(&self, prompt: &ConfirmPrompt) -> Result<bool, PromptError> {
            match self.next(&prompt.message)? {
                Scripted::Confirm(value) => Ok(value),
                Scripted::Default => Ok(prompt.default),
                other => Err(Self::mismatch(&prompt.message, &other)),
            }
        }

        fn select(&self, prompt: &SelectPrompt) -> Result<usize, PromptError> {
            let index = match self.next(&prompt.message)? {
                Scripted::Select(index) => index,
                Scripted::Choice(label) => prompt
                    .choices
                    .iter()
                    .position(|c| c == &label)
                    .ok_or_else(|| {
                        PromptError::Interaction(format!("No choice named '{}'", label))
                    })?,
                Scripted::Default => prompt.default,
                other => return Err(Self::mismatch(&prompt.message, &other)),
            };
            if index >= prompt.choices.len() {
                return Err(PromptError::Interaction(format!(
                    "Choice {} out of range for '{}'",
                    index, prompt.message
                )));
            }
            Ok(index)
        }
    }
}
