//! Script templates
//!
//! Each [`ScriptType`] has a fixed command line containing placeholder
//! tokens named after option fields. [`ScriptBuilder`] substitutes tokens from
//! any [`FieldTable`] type, appends optional fragments that only apply to a
//! specific script type, and refuses to build while any of the template's
//! own placeholders is unresolved.
//!
//! ## Example
//!
//! ```rust
//! use xman_core::options::InstallProjectOptions;
//! use xman_core::script::{ScriptBuilder, ScriptType};
//!
//! let options = InstallProjectOptions {
//!     template: "sample-mvc".to_string(),
//!     project_name: "demo".to_string(),
//!     ..Default::default()
//! };
//! let script = ScriptBuilder::new(ScriptType::ProjectInstall)?
//!     .with_placeholders(&options)
//!     .build()?;
//! assert_eq!(script, "dotnet new sample-mvc -n demo");
//! # Ok::<(), xman_core::errors::ScriptError>(())
//! ```

use crate::errors::ScriptError;
use crate::fields::FieldTable;
use semver::Version;
use tracing::trace;

/// Script archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    /// Not a script; selecting it is a usage error
    None,
    /// Creates project files from a template
    ProjectInstall,
    /// Creates the database through the database manager tool
    DatabaseInstall,
    TemplateUninstall,
    TemplateInstall,
    DatabaseToolUninstall,
    DatabaseToolInstall,
    /// Updates one package of the project
    PackageUpdate,
    DatabaseUpdate,
    BuildProject,
    StoreContinuousIntegration,
    RestoreContinuousIntegration,
    CreateDirectory,
    ContinuousDeploymentNewConfiguration,
    ContinuousDeploymentStore,
    ContinuousDeploymentRestore,
    ResignMacros,
    GenerateCode,
    /// Deletes a folder and its contents
    DeleteDirectory,
    /// Runs one SQL statement against a connection string
    ExecuteSql,
}

impl ScriptType {
    /// Raw command line, `None` for [`ScriptType::None`].
    pub fn template(&self) -> Option<&'static str> {
        let template = match self {
            ScriptType::None => return None,
            ScriptType::ProjectInstall => "dotnet new Template -n ProjectName",
            ScriptType::DatabaseInstall => {
                "dotnet kentico-xperience-dbmanager -- -s \"ServerName\" -d \"DatabaseName\" -a \"AdminPassword\" --use-existing-database UseExistingDatabase"
            }
            ScriptType::TemplateUninstall => "dotnet new uninstall kentico.xperience.templates",
            ScriptType::TemplateInstall => "dotnet new install kentico.xperience.templates",
            ScriptType::DatabaseToolUninstall => {
                "dotnet tool uninstall Kentico.Xperience.DbManager -g"
            }
            ScriptType::DatabaseToolInstall => {
                "dotnet tool install Kentico.Xperience.DbManager -g --version Version"
            }
            ScriptType::PackageUpdate => "dotnet add package PackageName",
            ScriptType::DatabaseUpdate => "dotnet run --no-build --kxp-update -- --skip-confirmation",
            ScriptType::BuildProject => "dotnet build",
            ScriptType::StoreContinuousIntegration => "dotnet run --no-build --kxp-ci-store",
            ScriptType::RestoreContinuousIntegration => "dotnet run --no-build --kxp-ci-restore",
            ScriptType::CreateDirectory => "mkdir",
            ScriptType::ContinuousDeploymentNewConfiguration => {
                "dotnet run --no-build -- --kxp-cd-config --path \"ConfigPath\""
            }
            ScriptType::ContinuousDeploymentStore => {
                "dotnet run --no-build -- --kxp-cd-store --repository-path \"RepositoryPath\" --config-path \"ConfigPath\""
            }
            ScriptType::ContinuousDeploymentRestore => {
                "dotnet run -- --kxp-cd-restore --repository-path \"RepositoryPath\""
            }
            ScriptType::ResignMacros => "dotnet run --no-build -- --kxp-resign-macros",
            ScriptType::GenerateCode => {
                "dotnet run -- --kxp-codegen --skip-confirmation --type \"Type\" --location \"Location\" --include \"Include\" --exclude \"Exclude\" --with-provider-class WithProviderClass"
            }
            ScriptType::DeleteDirectory => "rm \"WorkingDirectory\" -r -Force",
            ScriptType::ExecuteSql => {
                "Invoke-Sqlcmd -ConnectionString \"ConnString\" -Query \"SqlQuery\""
            }
        };
        Some(template)
    }

    /// Placeholder tokens the template requires.
    pub fn placeholders(&self) -> &'static [&'static str] {
        match self {
            ScriptType::ProjectInstall => &["Template", "ProjectName"],
            ScriptType::DatabaseInstall => &[
                "ServerName",
                "DatabaseName",
                "AdminPassword",
                "UseExistingDatabase",
            ],
            ScriptType::DatabaseToolInstall => &["Version"],
            ScriptType::PackageUpdate => &["PackageName"],
            ScriptType::ContinuousDeploymentNewConfiguration => &["ConfigPath"],
            ScriptType::ContinuousDeploymentStore => &["RepositoryPath", "ConfigPath"],
            ScriptType::ContinuousDeploymentRestore => &["RepositoryPath"],
            ScriptType::GenerateCode => &[
                "Type",
                "Location",
                "Include",
                "Exclude",
                "WithProviderClass",
            ],
            ScriptType::DeleteDirectory => &["WorkingDirectory"],
            ScriptType::ExecuteSql => &["ConnString", "SqlQuery"],
            _ => &[],
        }
    }
}

/// Assembles one command line from a template
#[derive(Debug, Clone)]
pub struct ScriptBuilder {
    kind: ScriptType,
    script: String,
    resolved: Vec<&'static str>,
}

impl ScriptBuilder {
    /// Start from the template of `kind`.
    pub fn new(kind: ScriptType) -> Result<Self, ScriptError> {
        let template = kind.template().ok_or(ScriptError::InvalidScriptType)?;
        Ok(Self {
            kind,
            script: template.to_string(),
            resolved: Vec::new(),
        })
    }

    pub fn kind(&self) -> ScriptType {
        self.kind
    }

    /// Replace every standalone occurrence of each field name with its value.
    ///
    /// Fields without a value are skipped and their token stays in place.
    pub fn with_placeholders<T: FieldTable>(mut self, options: &T) -> Self {
        for descriptor in T::fields() {
            let Some(value) = (descriptor.get)(options).filter(|v| !v.is_empty()) else {
                continue;
            };
            if contains_token(&self.script, descriptor.name) {
                trace!("Substituting placeholder {}", descriptor.name);
                self.script = replace_token(&self.script, descriptor.name, &value);
                self.resolved.push(descriptor.name);
            }
        }
        self
    }

    /// ` --cloud` for [`ScriptType::ProjectInstall`].
    pub fn append_cloud(mut self, use_cloud: bool) -> Self {
        if self.kind == ScriptType::ProjectInstall && use_cloud {
            self.script.push_str(" --cloud");
        }
        self
    }

    /// Quoted target path for [`ScriptType::CreateDirectory`].
    pub fn append_directory(mut self, path: &str) -> Self {
        if self.kind == ScriptType::CreateDirectory {
            self.script.push_str(&format!(" \"{}\"", path));
        }
        self
    }

    /// ` --namespace` for [`ScriptType::GenerateCode`].
    pub fn append_namespace(mut self, namespace: Option<&str>) -> Self {
        if let Some(namespace) = namespace.filter(|n| !n.is_empty()) {
            if self.kind == ScriptType::GenerateCode {
                self.script.push_str(&format!(" --namespace \"{}\"", namespace));
            }
        }
        self
    }

    /// ` --old-salt` or ` --new-salt` for [`ScriptType::ResignMacros`].
    pub fn append_salt(mut self, salt: Option<&str>, is_old: bool) -> Self {
        if let Some(salt) = salt.filter(|s| !s.is_empty()) {
            if self.kind == ScriptType::ResignMacros {
                let flag = if is_old { "--old-salt" } else { "--new-salt" };
                self.script.push_str(&format!(" {} \"{}\"", flag, salt));
            }
        }
        self
    }

    /// ` --sign-all --username` for [`ScriptType::ResignMacros`].
    pub fn append_sign_all(mut self, sign_all: bool, user_name: Option<&str>) -> Self {
        if let Some(user_name) = user_name.filter(|u| !u.is_empty()) {
            if sign_all && self.kind == ScriptType::ResignMacros {
                self.script
                    .push_str(&format!(" --sign-all --username \"{}\"", user_name));
            }
        }
        self
    }

    /// `::<version>` for template installs, ` --version <version>` for package updates.
    pub fn append_version(mut self, version: Option<&Version>) -> Self {
        let Some(version) = version else {
            return self;
        };
        match self.kind {
            ScriptType::TemplateInstall => self.script.push_str(&format!("::{}", version)),
            ScriptType::PackageUpdate => self.script.push_str(&format!(" --version {}", version)),
            _ => {}
        }
        self
    }

    /// Finish the script.
    ///
    /// Fails when the script is empty or one of the template's placeholders
    /// was never substituted.
    pub fn build(self) -> Result<String, ScriptError> {
        let unresolved = self
            .kind
            .placeholders()
            .iter()
            .any(|token| !self.resolved.contains(token) && contains_token(&self.script, token));

        if self.script.trim().is_empty() || unresolved {
            return Err(ScriptError::UnresolvedPlaceholders);
        }
        Ok(self.script)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn token_positions<'a>(text: &'a str, token: &'a str) -> impl Iterator<Item = usize> + 'a {
    text.match_indices(token).filter_map(move |(start, _)| {
        let end = start + token.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        let standalone = !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char);
        standalone.then_some(start)
    })
}

fn contains_token(text: &str, token: &str) -> bool {
    token_positions(text, token).next().is_some()
}

fn replace_token(text: &str, token: &str, value: &str) -> String {
    let mut result = String::with_capacity(text.len() + value.len());
    let mut last = 0;
    for start in token_positions(text, token) {
        result.push_str(&text[last..start]);
        result.push_str(value);
        last = start + token.len();
    }
    result.push_str(&text[last..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolProfile;
    use crate::options::{
        CodeGenerateOptions, InstallDatabaseOptions, InstallProjectOptions, UpdateOptions,
    };

    fn project_options() -> InstallProjectOptions {
        InstallProjectOptions {
            project_name: "TEST".to_string(),
            template: "kentico-xperience-sample-mvc".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_project_install_script() {
        let script = ScriptBuilder::new(ScriptType::ProjectInstall)
            .unwrap()
            .with_placeholders(&project_options())
            .build()
            .unwrap();
        assert_eq!(script, "dotnet new kentico-xperience-sample-mvc -n TEST");
    }

    #[test]
    fn test_project_install_with_cloud() {
        let script = ScriptBuilder::new(ScriptType::ProjectInstall)
            .unwrap()
            .with_placeholders(&project_options())
            .append_cloud(true)
            .build()
            .unwrap();
        assert_eq!(script, "dotnet new kentico-xperience-sample-mvc -n TEST --cloud");
    }

    #[test]
    fn test_empty_template_fails_build() {
        let options = InstallProjectOptions {
            template: String::new(),
            ..project_options()
        };
        let result = ScriptBuilder::new(ScriptType::ProjectInstall)
            .unwrap()
            .with_placeholders(&options)
            .build();
        assert_eq!(result, Err(ScriptError::UnresolvedPlaceholders));
    }

    #[test]
    fn test_none_is_invalid() {
        assert_eq!(
            ScriptBuilder::new(ScriptType::None).unwrap_err(),
            ScriptError::InvalidScriptType
        );
    }

    #[test]
    fn test_append_version_per_kind() {
        let version = Version::new(1, 0, 0);
        let template = ScriptBuilder::new(ScriptType::TemplateInstall)
            .unwrap()
            .with_placeholders(&project_options())
            .append_version(Some(&version))
            .build()
            .unwrap();
        assert_eq!(template, "dotnet new install kentico.xperience.templates::1.0.0");

        let update = UpdateOptions {
            package_name: Some("kentico.xperience.webapp".to_string()),
            ..Default::default()
        };
        let package = ScriptBuilder::new(ScriptType::PackageUpdate)
            .unwrap()
            .with_placeholders(&update)
            .append_version(Some(&version))
            .build()
            .unwrap();
        assert_eq!(package, "dotnet add package kentico.xperience.webapp --version 1.0.0");

        let build = ScriptBuilder::new(ScriptType::BuildProject)
            .unwrap()
            .append_version(Some(&version))
            .build()
            .unwrap();
        assert_eq!(build, "dotnet build");
    }

    #[test]
    fn test_database_install_script() {
        let options = InstallDatabaseOptions {
            admin_password: "PW".to_string(),
            database_name: "DB".to_string(),
            server_name: Some("SERVER".to_string()),
            use_existing_database: false,
        };
        let script = ScriptBuilder::new(ScriptType::DatabaseInstall)
            .unwrap()
            .with_placeholders(&options)
            .build()
            .unwrap();
        assert_eq!(
            script,
            "dotnet kentico-xperience-dbmanager -- -s \"SERVER\" -d \"DB\" -a \"PW\" --use-existing-database false"
        );
    }

    #[test]
    fn test_database_install_requires_server() {
        let options = InstallDatabaseOptions {
            server_name: None,
            ..Default::default()
        };
        let result = ScriptBuilder::new(ScriptType::DatabaseInstall)
            .unwrap()
            .with_placeholders(&options)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_generate_code_values_containing_tokens() {
        let options = CodeGenerateOptions {
            object_type: Some("PageContentTypes".to_string()),
            ..Default::default()
        };
        let script = ScriptBuilder::new(ScriptType::GenerateCode)
            .unwrap()
            .with_placeholders(&options)
            .append_namespace(Some("Acme.Models"))
            .build()
            .unwrap();
        assert_eq!(
            script,
            "dotnet run -- --kxp-codegen --skip-confirmation --type \"PageContentTypes\" --location \"/{type}/{dataClassNamespace}/{name}\" --include \"*\" --exclude \"test\" --with-provider-class true --namespace \"Acme.Models\""
        );
    }

    #[test]
    fn test_macro_appends_only_apply_to_resign() {
        let script = ScriptBuilder::new(ScriptType::ResignMacros)
            .unwrap()
            .append_sign_all(true, Some("administrator"))
            .append_salt(Some("old"), true)
            .append_salt(None, false)
            .build()
            .unwrap();
        assert_eq!(
            script,
            "dotnet run --no-build -- --kxp-resign-macros --sign-all --username \"administrator\" --old-salt \"old\""
        );

        let build = ScriptBuilder::new(ScriptType::BuildProject)
            .unwrap()
            .append_sign_all(true, Some("administrator"))
            .append_salt(Some("new"), false)
            .append_cloud(true)
            .append_directory("/tmp")
            .build()
            .unwrap();
        assert_eq!(build, "dotnet build");
    }

    #[test]
    fn test_delete_directory_from_profile() {
        let profile = ToolProfile::new("site", "/srv/site");
        let script = ScriptBuilder::new(ScriptType::DeleteDirectory)
            .unwrap()
            .with_placeholders(&profile)
            .build()
            .unwrap();
        assert_eq!(script, "rm \"/srv/site\" -r -Force");
    }

    #[test]
    fn test_replace_token_respects_word_boundaries() {
        assert_eq!(
            replace_token("Type TypeName \"Type\"", "Type", "X"),
            "X TypeName \"X\""
        );
        assert!(!contains_token("PageContentTypes", "Type"));
    }
}
