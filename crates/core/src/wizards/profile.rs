use crate::errors::Result;
use crate::options::NewProfileOptions;
use crate::prompt::TextPrompt;
use crate::steps::{Step, StepList};
use crate::wizard::Wizard;
use async_trait::async_trait;

/// Asks for the name and folder of an existing installation
#[derive(Default)]
pub struct NewProfileWizard {
    options: NewProfileOptions,
}

impl NewProfileWizard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl Wizard for NewProfileWizard {
    type Options = NewProfileOptions;

    fn options(&self) -> &NewProfileOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut NewProfileOptions {
        &mut self.options
    }

    async fn init_steps(&mut self, _args: &[&str]) -> Result<StepList<NewProfileOptions>> {
        let mut steps = StepList::new();
        steps.push(Step::text(
            TextPrompt::new("Give your profile a name:"),
            |o: &mut NewProfileOptions, v| o.name = Some(v),
        ));
        steps.push(Step::text(
            TextPrompt::new("Enter the full path of the folder containing your Xperience project:"),
            |o: &mut NewProfileOptions, v| o.working_directory = Some(v),
        ));
        Ok(steps)
    }
}
