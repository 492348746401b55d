use crate::constants::{MIN_INSTALL_VERSION, TEMPLATES_PACKAGE, TEMPLATE_ADMIN, TEMPLATE_BLANK, TEMPLATE_SAMPLE};
use crate::errors::Result;
use crate::options::{InstallDatabaseOptions, InstallProjectOptions};
use crate::prompt::{ConfirmPrompt, TextPrompt};
use crate::steps::{Step, StepList};
use crate::versions::{selectable_versions, VersionSource};
use crate::wizard::Wizard;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Argument that hides the "use existing database" question.
pub const SKIP_EXISTINGDB_STEP: &str = "skipexistingdbstep";

const TEMPLATES: [&str; 3] = [TEMPLATE_SAMPLE, TEMPLATE_BLANK, TEMPLATE_ADMIN];

/// Collects version, template, name and location of a new project
pub struct InstallProjectWizard {
    options: InstallProjectOptions,
    versions: Arc<dyn VersionSource>,
}

impl InstallProjectWizard {
    pub fn new(versions: Arc<dyn VersionSource>) -> Self {
        Self {
            options: InstallProjectOptions::default(),
            versions,
        }
    }
}

#[async_trait(?Send)]
impl Wizard for InstallProjectWizard {
    type Options = InstallProjectOptions;

    fn options(&self) -> &InstallProjectOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut InstallProjectOptions {
        &mut self.options
    }

    async fn init_steps(&mut self, _args: &[&str]) -> Result<StepList<InstallProjectOptions>> {
        let published = self.versions.package_versions(TEMPLATES_PACKAGE).await?;
        let versions = selectable_versions(&published, MIN_INSTALL_VERSION);

        let mut steps = StepList::new();
        if versions.is_empty() {
            warn!("No installable versions of {} were found", TEMPLATES_PACKAGE);
        } else {
            let current = self.options.version.as_ref().map(|v| v.to_string());
            steps.push(Step::select(
                "Which version?",
                versions,
                current.as_deref(),
                |o: &mut InstallProjectOptions, v| o.version = Some(v),
            ));
        }

        steps.push(Step::select(
            "Which template?",
            TEMPLATES.to_vec(),
            Some(self.options.template.as_str()),
            |o: &mut InstallProjectOptions, v: &str| o.template = v.to_string(),
        ));
        steps.push(Step::text(
            TextPrompt::new("Give your project a name:")
                .with_default(Some(self.options.project_name.as_str())),
            |o: &mut InstallProjectOptions, v| o.project_name = v,
        ));
        steps.push(Step::text(
            TextPrompt::new("Install where?")
                .with_default(Some(self.options.install_root_path.as_str())),
            |o: &mut InstallProjectOptions, v| o.install_root_path = v,
        ));
        steps.push(
            Step::confirm(
                ConfirmPrompt::new("Prepare for cloud deployment?", self.options.use_cloud),
                |o: &mut InstallProjectOptions, v| o.use_cloud = v,
            )
            .skip_if(|o| o.is_admin_template()),
        );

        Ok(steps)
    }
}

/// Collects SQL server, database name and administrator password
#[derive(Default)]
pub struct InstallDatabaseWizard {
    options: InstallDatabaseOptions,
}

impl InstallDatabaseWizard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl Wizard for InstallDatabaseWizard {
    type Options = InstallDatabaseOptions;

    fn options(&self) -> &InstallDatabaseOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut InstallDatabaseOptions {
        &mut self.options
    }

    async fn init_steps(&mut self, args: &[&str]) -> Result<StepList<InstallDatabaseOptions>> {
        let skip_existing = args.contains(&SKIP_EXISTINGDB_STEP);
        let mut steps = StepList::new();

        steps.push(Step::text(
            TextPrompt::new("Enter the SQL server name:")
                .with_default(self.options.server_name.as_deref()),
            |o: &mut InstallDatabaseOptions, v| o.server_name = Some(v),
        ));
        steps.push(Step::text(
            TextPrompt::new("Enter the database name:")
                .allow_empty()
                .with_default(Some(self.options.database_name.as_str())),
            |o: &mut InstallDatabaseOptions, v| o.database_name = v,
        ));
        steps.push(
            Step::confirm(
                ConfirmPrompt::new("Use existing database?", self.options.use_existing_database),
                |o: &mut InstallDatabaseOptions, v| o.use_existing_database = v,
            )
            .skip_if(move |_| skip_existing),
        );
        steps.push(Step::text(
            TextPrompt::new("Enter the admin password:")
                .allow_empty()
                .with_default(Some(self.options.admin_password.as_str())),
            |o: &mut InstallDatabaseOptions, v| o.admin_password = v,
        ));

        Ok(steps)
    }
}
