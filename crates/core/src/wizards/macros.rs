use crate::errors::Result;
use crate::options::MacroOptions;
use crate::prompt::{ConfirmPrompt, TextPrompt};
use crate::steps::{Step, StepList};
use crate::wizard::Wizard;
use async_trait::async_trait;

/// Asks how macros should be re-signed
#[derive(Default)]
pub struct MacroWizard {
    options: MacroOptions,
}

impl MacroWizard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl Wizard for MacroWizard {
    type Options = MacroOptions;

    fn options(&self) -> &MacroOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut MacroOptions {
        &mut self.options
    }

    async fn init_steps(&mut self, _args: &[&str]) -> Result<StepList<MacroOptions>> {
        let mut steps = StepList::new();
        steps.push(Step::confirm(
            ConfirmPrompt::new("Sign all macros?", true),
            |o: &mut MacroOptions, v| o.sign_all = v,
        ));
        steps.push(
            Step::text(TextPrompt::new("Username:"), |o: &mut MacroOptions, v| {
                o.user_name = Some(v)
            })
            .skip_if(|o| !o.sign_all),
        );
        steps.push(
            Step::text(TextPrompt::new("Old salt:"), |o: &mut MacroOptions, v| {
                o.old_salt = Some(v)
            })
            .skip_if(|o| o.sign_all),
        );
        steps.push(Step::text(
            TextPrompt::new("New salt? Leave empty to use the salt in appsettings:").allow_empty(),
            |o: &mut MacroOptions, v| o.new_salt = Some(v),
        ));
        Ok(steps)
    }
}
