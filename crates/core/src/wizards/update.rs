use crate::constants::{MIN_LISTED_VERSION, TEMPLATES_PACKAGE};
use crate::errors::Result;
use crate::options::UpdateOptions;
use crate::steps::{Step, StepList};
use crate::versions::{selectable_versions, VersionSource};
use crate::wizard::Wizard;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Asks which version to update packages and database to
pub struct UpdateWizard {
    options: UpdateOptions,
    versions: Arc<dyn VersionSource>,
}

impl UpdateWizard {
    pub fn new(versions: Arc<dyn VersionSource>) -> Self {
        Self {
            options: UpdateOptions::default(),
            versions,
        }
    }
}

#[async_trait(?Send)]
impl Wizard for UpdateWizard {
    type Options = UpdateOptions;

    fn options(&self) -> &UpdateOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut UpdateOptions {
        &mut self.options
    }

    async fn init_steps(&mut self, _args: &[&str]) -> Result<StepList<UpdateOptions>> {
        let published = self.versions.package_versions(TEMPLATES_PACKAGE).await?;
        let versions = selectable_versions(&published, MIN_LISTED_VERSION);

        let mut steps = StepList::new();
        if versions.is_empty() {
            warn!("No versions >= {} of {} were found", MIN_LISTED_VERSION, TEMPLATES_PACKAGE);
            return Ok(steps);
        }

        steps.push(Step::select(
            "Which version?",
            versions,
            None,
            |o: &mut UpdateOptions, v| o.version = Some(v),
        ));
        Ok(steps)
    }
}
