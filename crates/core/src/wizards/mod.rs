//! Concrete wizards, one per options type.

mod codegen;
mod install;
mod macros;
mod profile;
mod repository;
mod settings;
mod update;

pub use codegen::CodeGenerateWizard;
pub use install::{InstallDatabaseWizard, InstallProjectWizard, SKIP_EXISTINGDB_STEP};
pub use macros::MacroWizard;
pub use profile::NewProfileWizard;
pub use repository::{RepositoryConfigurationWizard, RESTORE_MODES};
pub use settings::SettingsWizard;
pub use update::UpdateWizard;

#[cfg(test)]
mod tests;
