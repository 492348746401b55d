use crate::errors::Result;
use crate::options::SettingsOptions;
use crate::steps::{Step, StepList};
use crate::wizard::Wizard;
use async_trait::async_trait;

const SETTINGS: [&str; 4] = [
    SettingsOptions::CONNECTION_STRING_SETTING,
    SettingsOptions::UNGROUPED_KEY_SETTING,
    SettingsOptions::CMS_HEADLESS_SETTING,
    SettingsOptions::AZURE_STORAGE_SETTING,
];

/// Asks which settings file and which group of settings to edit
///
/// The arguments are the available settings file names. The file question
/// is only asked when there is more than one, shortest names first.
#[derive(Default)]
pub struct SettingsWizard {
    options: SettingsOptions,
}

impl SettingsWizard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl Wizard for SettingsWizard {
    type Options = SettingsOptions;

    fn options(&self) -> &SettingsOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut SettingsOptions {
        &mut self.options
    }

    async fn init_steps(&mut self, args: &[&str]) -> Result<StepList<SettingsOptions>> {
        let mut steps = StepList::new();

        if args.len() > 1 {
            let mut files: Vec<String> = args.iter().map(|a| a.to_string()).collect();
            files.sort_by_key(|f| f.len());
            steps.push(Step::select(
                "Which file do you want to modify?",
                files,
                None,
                |o: &mut SettingsOptions, v| o.app_settings_file_name = Some(v),
            ));
        }

        steps.push(Step::select(
            "What settings do you want to change?",
            SETTINGS.to_vec(),
            None,
            |o: &mut SettingsOptions, v: &str| o.setting_to_change = Some(v.to_string()),
        ));

        Ok(steps)
    }
}
