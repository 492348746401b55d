//! Tool configuration (`xman.json`)
//!
//! The configuration holds the registered profiles, the selected profile,
//! default install options and the root folder for CD data. Every operation
//! reads the whole file, applies its change and writes the whole file back.

use crate::constants::CD_CONFIG_DIR;
use crate::errors::{ConfigError, Result, XmanError};
use crate::fields::{field_table, FieldTable};
use crate::options::{InstallDatabaseOptions, InstallProjectOptions};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// One managed installation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ToolProfile {
    pub project_name: Option<String>,
    /// Absolute path of the project folder
    pub working_directory: Option<String>,
}

impl ToolProfile {
    pub fn new(project_name: impl Into<String>, working_directory: impl Into<String>) -> Self {
        Self {
            project_name: Some(project_name.into()),
            working_directory: Some(working_directory.into()),
        }
    }

    /// Case-insensitive project name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.project_name
            .as_deref()
            .is_some_and(|p| p.eq_ignore_ascii_case(name))
    }

    pub fn name(&self) -> &str {
        self.project_name.as_deref().unwrap_or_default()
    }
}

impl std::fmt::Display for ToolProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({})",
            self.name(),
            self.working_directory.as_deref().unwrap_or_default()
        )
    }
}

field_table!(ToolProfile, TOOL_PROFILE_FIELDS, [
    ("ProjectName", Text, |o| o.project_name.clone().filter(|v| !v.is_empty()), |o, v| {
        o.project_name = Some(v.to_string());
        Ok(())
    }),
    ("WorkingDirectory", Text, |o| o.working_directory.clone().filter(|v| !v.is_empty()), |o, v| {
        o.working_directory = Some(v.to_string());
        Ok(())
    }),
]);

/// Contents of `xman.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ToolConfiguration {
    /// Version of the tool that last wrote the file
    pub version: Option<Version>,
    pub profiles: Vec<ToolProfile>,
    pub current_profile: Option<String>,
    pub default_install_project_options: Option<InstallProjectOptions>,
    pub default_install_database_options: Option<InstallDatabaseOptions>,
    /// Root folder holding CD data for every profile
    #[serde(rename = "CDRootPath")]
    pub cd_root_path: String,
}

impl ToolConfiguration {
    /// Fresh configuration for a first run in `current_dir`.
    pub fn new(tool_version: &Version, current_dir: &Path) -> Self {
        Self {
            version: Some(tool_version.clone()),
            default_install_project_options: Some(InstallProjectOptions::default()),
            default_install_database_options: Some(InstallDatabaseOptions::default()),
            cd_root_path: current_dir.join(CD_CONFIG_DIR).display().to_string(),
            ..Default::default()
        }
    }

    fn find_profile(&self, name: &str) -> Option<&ToolProfile> {
        self.profiles.iter().find(|p| p.is_named(name))
    }
}

/// Reads and writes the tool configuration file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file on first run, otherwise record the running tool version.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn ensure_config_file(&self, tool_version: &Version, current_dir: &Path) -> Result<()> {
        if self.path.exists() {
            let mut config = self.get_config()?;
            if config.version.as_ref() == Some(tool_version) {
                return Ok(());
            }
            debug!(
                "Migrating configuration from {:?} to {}",
                config.version, tool_version
            );
            config.version = Some(tool_version.clone());
            return self.write_config(&config);
        }

        info!("Creating configuration file {}", self.path.display());
        self.write_config(&ToolConfiguration::new(tool_version, current_dir))
    }

    /// Read and parse the whole file.
    pub fn get_config(&self) -> Result<ToolConfiguration> {
        if !self.path.exists() {
            return Err(XmanError::Config(ConfigError::NotFound {
                path: self.path.display().to_string(),
            }));
        }

        let content = std::fs::read_to_string(&self.path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(|e| {
            debug!("Failed to parse configuration file: {}", e);
            XmanError::Config(ConfigError::Parsing {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })
        })
    }

    /// Replace the whole file with `config`.
    pub fn write_config(&self, config: &ToolConfiguration) -> Result<()> {
        let content = serde_json::to_string_pretty(config).map_err(|e| ConfigError::Parsing {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(&self.path, content).map_err(ConfigError::Io)?;
        Ok(())
    }

    /// Register a profile; project names are unique ignoring case.
    #[instrument(skip_all, fields(profile = %profile.name()))]
    pub fn add_profile(&self, profile: &ToolProfile) -> Result<()> {
        let mut config = self.get_config()?;
        if config.find_profile(profile.name()).is_some() {
            return Err(XmanError::Config(ConfigError::DuplicateProfile {
                name: profile.name().to_string(),
            }));
        }
        config.profiles.push(profile.clone());
        self.write_config(&config)
    }

    /// Remove every profile with the same project name.
    #[instrument(skip_all, fields(profile = %profile.name()))]
    pub fn remove_profile(&self, profile: &ToolProfile) -> Result<()> {
        let mut config = self.get_config()?;
        config.profiles.retain(|p| !p.is_named(profile.name()));
        self.write_config(&config)
    }

    pub fn set_current_profile(&self, profile: &ToolProfile) -> Result<()> {
        let mut config = self.get_config()?;
        config.current_profile = profile.project_name.clone();
        self.write_config(&config)
    }

    /// The selected profile
    ///
    /// When exactly one profile exists and no valid selection is stored, that
    /// profile is selected and saved.
    pub fn get_current_profile(&self) -> Result<Option<ToolProfile>> {
        let config = self.get_config()?;
        let selected = config
            .current_profile
            .as_deref()
            .and_then(|name| config.find_profile(name))
            .cloned();

        if config.profiles.len() == 1 && selected.is_none() {
            let only = config.profiles[0].clone();
            debug!("Selecting the only profile '{}'", only.name());
            self.set_current_profile(&only)?;
            return Ok(Some(only));
        }

        Ok(selected)
    }

    pub fn default_install_project_options(&self) -> Result<InstallProjectOptions> {
        Ok(self
            .get_config()?
            .default_install_project_options
            .unwrap_or_default())
    }

    pub fn default_install_database_options(&self) -> Result<InstallDatabaseOptions> {
        Ok(self
            .get_config()?
            .default_install_database_options
            .unwrap_or_default())
    }
}
