use crate::cd_xml::RepositoryConfiguration;
use crate::errors::Result;
use crate::prompt::{ConfirmPrompt, TextPrompt};
use crate::steps::{Step, StepList};
use crate::wizard::Wizard;
use async_trait::async_trait;
use std::cell::Cell;
use std::rc::Rc;

/// Restore modes accepted by CD restore.
pub const RESTORE_MODES: [&str; 3] = ["Create", "CreateUpdate", "Full"];

/// Edits an existing CD repository configuration
#[derive(Default)]
pub struct RepositoryConfigurationWizard {
    options: RepositoryConfiguration,
}

impl RepositoryConfigurationWizard {
    pub fn new() -> Self {
        Self::default()
    }
}

fn split_object_types(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait(?Send)]
impl Wizard for RepositoryConfigurationWizard {
    type Options = RepositoryConfiguration;

    fn options(&self) -> &RepositoryConfiguration {
        &self.options
    }

    fn options_mut(&mut self) -> &mut RepositoryConfiguration {
        &mut self.options
    }

    async fn init_steps(&mut self, _args: &[&str]) -> Result<StepList<RepositoryConfiguration>> {
        let change_included = Rc::new(Cell::new(false));
        let change_excluded = Rc::new(Cell::new(false));
        let mut steps = StepList::new();

        steps.push(Step::select(
            format!(
                "Which RestoreMode? ({})",
                self.options.restore_mode.as_deref().unwrap_or_default()
            ),
            RESTORE_MODES.to_vec(),
            self.options.restore_mode.as_deref(),
            |o: &mut RepositoryConfiguration, v: &str| o.restore_mode = Some(v.to_string()),
        ));

        let flag = Rc::clone(&change_included);
        steps.push(Step::confirm(
            ConfirmPrompt::new(
                format!(
                    "Included object types: {}\nWould you like to change them?",
                    self.options.included_object_types.join(";")
                ),
                false,
            ),
            move |_: &mut RepositoryConfiguration, v| flag.set(v),
        ));
        let flag = Rc::clone(&change_included);
        steps.push(
            Step::text(
                TextPrompt::new("Enter new included object types separated by semi-colon:")
                    .allow_empty(),
                |o: &mut RepositoryConfiguration, v| {
                    o.included_object_types = split_object_types(&v)
                },
            )
            .skip_if(move |_| !flag.get()),
        );

        let flag = Rc::clone(&change_excluded);
        steps.push(Step::confirm(
            ConfirmPrompt::new(
                format!(
                    "Excluded object types: {}\nWould you like to change them?",
                    self.options.excluded_object_types.join(";")
                ),
                false,
            ),
            move |_: &mut RepositoryConfiguration, v| flag.set(v),
        ));
        let flag = change_excluded;
        steps.push(
            Step::text(
                TextPrompt::new("Enter new excluded object types separated by semi-colon:")
                    .allow_empty(),
                |o: &mut RepositoryConfiguration, v| {
                    o.excluded_object_types = split_object_types(&v)
                },
            )
            .skip_if(move |_| !flag.get()),
        );

        Ok(steps)
    }
}
