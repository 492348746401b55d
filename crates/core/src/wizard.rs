//! Wizard driver
//!
//! A wizard owns an options value and knows how to build the steps that
//! populate it. [`Wizard::run`] builds a fresh [`StepList`] and executes the
//! steps front to back.

use crate::errors::Result;
use crate::prompt::Prompter;
use crate::steps::StepList;
use async_trait::async_trait;
use tracing::debug;

/// Sequence of prompts populating one options value
#[async_trait(?Send)]
pub trait Wizard {
    type Options: Clone + 'static;

    fn options(&self) -> &Self::Options;

    fn options_mut(&mut self) -> &mut Self::Options;

    /// Seed the wizard, e.g. with defaults stored in the configuration file.
    fn set_options(&mut self, options: Self::Options) {
        *self.options_mut() = options;
    }

    /// Build the steps for one run. Prompts show the current options as
    /// their defaults.
    async fn init_steps(&mut self, args: &[&str]) -> Result<StepList<Self::Options>>;

    /// Execute every step in order and return the populated options.
    async fn run(&mut self, prompter: &dyn Prompter, args: &[&str]) -> Result<Self::Options> {
        let mut steps = self.init_steps(args).await?;
        debug!("Running wizard with {} steps", steps.len());

        while let Some(step) = steps.current() {
            step.execute(self.options_mut(), prompter)?;
            if !steps.next() {
                break;
            }
        }

        Ok(self.options().clone())
    }
}
