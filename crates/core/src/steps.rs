//! Wizard steps
//!
//! A [`Step`] shows one prompt and hands the answer to a receiver that
//! writes into the options being built. An optional skip predicate is
//! evaluated when the step runs, so it can depend on earlier answers.
//! [`StepList`] is the cursor-addressable sequence a wizard walks.

use crate::errors::Result;
use crate::prompt::{Answer, ConfirmPrompt, Prompt, Prompter, SelectPrompt, TextPrompt};
use std::fmt::Display;
use tracing::trace;

type Receiver<O> = Box<dyn Fn(&mut O, Answer) -> Result<()>>;
type SkipCheck<O> = Box<dyn Fn(&O) -> bool>;

/// One prompt-and-capture unit
pub struct Step<O> {
    prompt: Option<Prompt>,
    receiver: Receiver<O>,
    skip: Option<SkipCheck<O>>,
}

impl<O: 'static> Step<O> {
    /// Step with a raw receiver for any answer kind.
    pub fn new(
        prompt: Option<Prompt>,
        receiver: impl Fn(&mut O, Answer) -> Result<()> + 'static,
    ) -> Self {
        Self {
            prompt,
            receiver: Box::new(receiver),
            skip: None,
        }
    }

    pub fn text(prompt: TextPrompt, receiver: impl Fn(&mut O, String) + 'static) -> Self {
        Self::new(Some(Prompt::Text(prompt)), move |options, answer| {
            if let Answer::Text(value) = answer {
                receiver(options, value);
            }
            Ok(())
        })
    }

    pub fn confirm(prompt: ConfirmPrompt, receiver: impl Fn(&mut O, bool) + 'static) -> Self {
        Self::new(Some(Prompt::Confirm(prompt)), move |options, answer| {
            if let Answer::Confirm(value) = answer {
                receiver(options, value);
            }
            Ok(())
        })
    }

    /// Selection over `choices`; the receiver gets the chosen value.
    ///
    /// `default` highlights the choice whose label equals it.
    pub fn select<T>(
        message: impl Into<String>,
        choices: Vec<T>,
        default: Option<&str>,
        receiver: impl Fn(&mut O, T) + 'static,
    ) -> Self
    where
        T: Display + Clone + 'static,
    {
        let labels = choices.iter().map(ToString::to_string).collect();
        let prompt = SelectPrompt::new(message, labels).with_default(default);
        Self::new(Some(Prompt::Select(prompt)), move |options, answer| {
            if let Answer::Select(index) = answer {
                if let Some(choice) = choices.get(index) {
                    receiver(options, choice.clone());
                }
            }
            Ok(())
        })
    }

    /// Skip this step whenever `check` returns true at run time.
    pub fn skip_if(mut self, check: impl Fn(&O) -> bool + 'static) -> Self {
        self.skip = Some(Box::new(check));
        self
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    /// Show the prompt and pass the answer to the receiver.
    ///
    /// Does nothing when there is no prompt or the skip predicate holds.
    pub fn execute(&self, options: &mut O, prompter: &dyn Prompter) -> Result<()> {
        let Some(prompt) = &self.prompt else {
            return Ok(());
        };
        if self.skip.as_ref().is_some_and(|skip| skip(options)) {
            trace!("Skipping step '{}'", prompt.message());
            return Ok(());
        }

        let answer = prompter.ask(prompt)?;
        (self.receiver)(options, answer)
    }
}

/// Ordered steps with a single cursor
///
/// Moving past either end fails and leaves the cursor in place.
pub struct StepList<O> {
    steps: Vec<Step<O>>,
    current: usize,
}

impl<O> Default for StepList<O> {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            current: 0,
        }
    }
}

impl<O> StepList<O> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Step<O>) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn position(&self) -> usize {
        self.current
    }

    /// The step under the cursor; `Some` whenever a step was added.
    pub fn current(&self) -> Option<&Step<O>> {
        self.steps.get(self.current)
    }

    /// Advance; false at the last step.
    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.steps.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Go back; false at the first step.
    pub fn previous(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::mock::{Scripted, ScriptedPrompter};

    #[derive(Default)]
    struct Sample {
        name: String,
        confirmed: bool,
        color: Option<String>,
    }

    fn three_steps() -> StepList<Sample> {
        let mut steps = StepList::new();
        steps.push(Step::text(TextPrompt::new("Name?"), |o: &mut Sample, v| o.name = v));
        steps.push(Step::confirm(ConfirmPrompt::new("Confirm?", false), |o: &mut Sample, v| {
            o.confirmed = v
        }));
        steps.push(
            Step::select("Color?", vec!["red", "blue"], None, |o: &mut Sample, v: &str| {
                o.color = Some(v.to_string())
            })
            .skip_if(|o| !o.confirmed),
        );
        steps
    }

    #[test]
    fn test_navigation_clamps_at_bounds() {
        let mut steps = three_steps();
        assert_eq!(steps.len(), 3);
        assert!(!steps.previous());
        assert_eq!(steps.position(), 0);

        assert!(steps.next());
        assert!(steps.next());
        assert!(!steps.next());
        assert_eq!(steps.position(), 2);
        assert!(steps.current().is_some());

        assert!(steps.previous());
        assert_eq!(steps.position(), 1);
    }

    #[test]
    fn test_empty_list_has_no_current() {
        let mut steps: StepList<Sample> = StepList::new();
        assert!(steps.current().is_none());
        assert!(!steps.next());
        assert!(!steps.previous());
    }

    #[test]
    fn test_skip_predicate_sees_earlier_answers() {
        let steps = three_steps();
        let prompter = ScriptedPrompter::new([
            Scripted::Text("demo".into()),
            Scripted::Confirm(false),
        ]);
        let mut options = Sample {
            color: Some("green".to_string()),
            ..Default::default()
        };

        let mut cursor = steps;
        loop {
            cursor.current().unwrap().execute(&mut options, &prompter).unwrap();
            if !cursor.next() {
                break;
            }
        }

        assert_eq!(options.name, "demo");
        assert_eq!(options.color.as_deref(), Some("green"));
        assert_eq!(prompter.asked(), vec!["Name?", "Confirm?"]);
    }

    #[test]
    fn test_step_without_prompt_does_nothing() {
        let step: Step<Sample> = Step::new(None, |o: &mut Sample, _| {
            o.name = "changed".to_string();
            Ok(())
        });
        let prompter = ScriptedPrompter::new([]);
        let mut options = Sample::default();
        step.execute(&mut options, &prompter).unwrap();
        assert!(options.name.is_empty());
    }
}
