//! Options collected by wizards and consumed by script templates
//!
//! Every options type carries a [`FieldTable`](crate::fields::FieldTable)
//! whose field names double as the placeholder tokens used in script
//! templates. Optional text fields read as missing when empty so that their
//! token survives substitution and is caught when the script is built.

use crate::constants::{TEMPLATE_ADMIN, TEMPLATE_SAMPLE};
use crate::fields::{field_table, non_empty, set_bool, set_optional_text, set_version};
use semver::Version;
use serde::{Deserialize, Serialize};

fn version_text(version: &Option<Version>) -> Option<String> {
    version.as_ref().map(|v| v.to_string())
}

fn optional_text(value: &Option<String>) -> Option<String> {
    value.as_deref().and_then(non_empty)
}

/// Options for creating project files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InstallProjectOptions {
    /// Template and database version to install
    pub version: Option<Version>,
    pub template: String,
    pub project_name: String,
    /// Parent directory of the new project; empty means the current directory
    pub install_root_path: String,
    /// Pass `--cloud` to the project template
    pub use_cloud: bool,
}

impl Default for InstallProjectOptions {
    fn default() -> Self {
        Self {
            version: None,
            template: TEMPLATE_SAMPLE.to_string(),
            project_name: "xbk".to_string(),
            install_root_path: String::new(),
            use_cloud: false,
        }
    }
}

impl InstallProjectOptions {
    /// The admin boilerplate needs no database and registers no profile.
    pub fn is_admin_template(&self) -> bool {
        self.template.eq_ignore_ascii_case(TEMPLATE_ADMIN)
    }
}

field_table!(InstallProjectOptions, INSTALL_PROJECT_FIELDS, [
    ("Version", Version, |o| version_text(&o.version), |o, v| set_version(&mut o.version, v)),
    ("Template", Text, |o| non_empty(&o.template), |o, v| {
        o.template = v.to_string();
        Ok(())
    }),
    ("ProjectName", Text, |o| non_empty(&o.project_name), |o, v| {
        o.project_name = v.to_string();
        Ok(())
    }),
    ("InstallRootPath", Text, |o| non_empty(&o.install_root_path), |o, v| {
        o.install_root_path = v.to_string();
        Ok(())
    }),
    ("UseCloud", Bool, |o| Some(o.use_cloud.to_string()), |o, v| set_bool(&mut o.use_cloud, v)),
]);

/// Options for creating a database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InstallDatabaseOptions {
    pub database_name: String,
    /// Reuse `database_name` instead of creating a new database
    pub use_existing_database: bool,
    pub server_name: Option<String>,
    /// Administrator password; never written to the configuration file
    #[serde(skip, default = "generate_password")]
    pub admin_password: String,
}

impl Default for InstallDatabaseOptions {
    fn default() -> Self {
        Self {
            database_name: "xperience".to_string(),
            use_existing_database: false,
            server_name: None,
            admin_password: generate_password(),
        }
    }
}

field_table!(InstallDatabaseOptions, INSTALL_DATABASE_FIELDS, [
    ("DatabaseName", Text, |o| non_empty(&o.database_name), |o, v| {
        o.database_name = v.to_string();
        Ok(())
    }),
    ("UseExistingDatabase", Bool, |o| Some(o.use_existing_database.to_string()), |o, v| {
        set_bool(&mut o.use_existing_database, v)
    }),
    ("ServerName", Text, |o| optional_text(&o.server_name), |o, v| {
        set_optional_text(&mut o.server_name, v);
        Ok(())
    }),
    ("AdminPassword", Text, |o| non_empty(&o.admin_password), |o, v| {
        o.admin_password = v.to_string();
        Ok(())
    }),
]);

const PASSWORD_CHARS: [&str; 4] = [
    "ABCDEFGHJKLMNOPQRSTUVWXYZ",
    "abcdefghijkmnopqrstuvwxyz",
    "0123456789",
    "!@$?",
];
const PASSWORD_LENGTH: usize = 10;
const PASSWORD_UNIQUE_CHARS: usize = 4;

/// Random administrator password
///
/// At least ten characters with at least four distinct ones, containing an
/// upper-case letter, a lower-case letter, a digit and one of `!@$?`.
pub fn generate_password() -> String {
    fn pick(set: &str) -> char {
        let bytes = set.as_bytes();
        char::from(bytes[fastrand::usize(..bytes.len())])
    }

    let mut chars: Vec<char> = Vec::with_capacity(PASSWORD_LENGTH);
    for set in PASSWORD_CHARS {
        let at = fastrand::usize(..=chars.len());
        chars.insert(at, pick(set));
    }

    loop {
        let mut distinct = chars.clone();
        distinct.sort_unstable();
        distinct.dedup();
        if chars.len() >= PASSWORD_LENGTH && distinct.len() >= PASSWORD_UNIQUE_CHARS {
            break;
        }
        let set = PASSWORD_CHARS[fastrand::usize(..PASSWORD_CHARS.len())];
        let at = fastrand::usize(..=chars.len());
        chars.insert(at, pick(set));
    }

    chars.into_iter().collect()
}

/// Version of the database tool to install
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseToolOptions {
    pub version: Option<Version>,
}

field_table!(DatabaseToolOptions, DATABASE_TOOL_FIELDS, [
    ("Version", Version, |o| version_text(&o.version), |o, v| set_version(&mut o.version, v)),
]);

/// Options for updating project packages and the database
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOptions {
    pub version: Option<Version>,
    pub package_name: Option<String>,
}

field_table!(UpdateOptions, UPDATE_FIELDS, [
    ("Version", Version, |o| version_text(&o.version), |o, v| set_version(&mut o.version, v)),
    ("PackageName", Text, |o| optional_text(&o.package_name), |o, v| {
        set_optional_text(&mut o.package_name, v);
        Ok(())
    }),
]);

/// Options for re-signing macros
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacroOptions {
    /// Sign every macro as `user_name` instead of re-signing with the old salt
    pub sign_all: bool,
    pub user_name: Option<String>,
    pub old_salt: Option<String>,
    /// When empty the salt from the application settings is used
    pub new_salt: Option<String>,
}

field_table!(MacroOptions, MACRO_FIELDS, [
    ("SignAll", Bool, |o| Some(o.sign_all.to_string()), |o, v| set_bool(&mut o.sign_all, v)),
    ("UserName", Text, |o| optional_text(&o.user_name), |o, v| {
        set_optional_text(&mut o.user_name, v);
        Ok(())
    }),
    ("OldSalt", Text, |o| optional_text(&o.old_salt), |o, v| {
        set_optional_text(&mut o.old_salt, v);
        Ok(())
    }),
    ("NewSalt", Text, |o| optional_text(&o.new_salt), |o, v| {
        set_optional_text(&mut o.new_salt, v);
        Ok(())
    }),
]);

/// Options for registering an existing installation as a profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProfileOptions {
    pub name: Option<String>,
    /// Absolute path of the project folder
    pub working_directory: Option<String>,
}

field_table!(NewProfileOptions, NEW_PROFILE_FIELDS, [
    ("Name", Text, |o| optional_text(&o.name), |o, v| {
        set_optional_text(&mut o.name, v);
        Ok(())
    }),
    ("WorkingDirectory", Text, |o| optional_text(&o.working_directory), |o, v| {
        set_optional_text(&mut o.working_directory, v);
        Ok(())
    }),
]);

/// Options for generating code files for system objects
#[derive(Debug, Clone, PartialEq)]
pub struct CodeGenerateOptions {
    /// Object type to generate, one of the `TYPE_*` constants
    pub object_type: Option<String>,
    /// Location relative to the project folder
    pub location: String,
    /// Included objects, separated by semicolons
    pub include: String,
    /// Excluded objects, separated by semicolons
    pub exclude: String,
    /// Also generate `*Provider` classes and `I*Provider` interfaces
    pub with_provider_class: bool,
    pub namespace: Option<String>,
}

impl CodeGenerateOptions {
    pub const TYPE_FORMS: &'static str = "Forms";
    pub const TYPE_REUSABLE_CONTENT_TYPES: &'static str = "ReusableContentTypes";
    pub const TYPE_PAGE_CONTENT_TYPES: &'static str = "PageContentTypes";
    pub const TYPE_REUSABLE_FIELD_SCHEMAS: &'static str = "ReusableFieldSchemas";
    pub const TYPE_CLASSES: &'static str = "Classes";
}

impl Default for CodeGenerateOptions {
    fn default() -> Self {
        Self {
            object_type: None,
            location: "/{type}/{dataClassNamespace}/{name}".to_string(),
            include: "*".to_string(),
            exclude: "test".to_string(),
            with_provider_class: true,
            namespace: None,
        }
    }
}

field_table!(CodeGenerateOptions, CODE_GENERATE_FIELDS, [
    ("Type", Text, |o| optional_text(&o.object_type), |o, v| {
        set_optional_text(&mut o.object_type, v);
        Ok(())
    }),
    ("Location", Text, |o| non_empty(&o.location), |o, v| {
        o.location = v.to_string();
        Ok(())
    }),
    ("Include", Text, |o| non_empty(&o.include), |o, v| {
        o.include = v.to_string();
        Ok(())
    }),
    ("Exclude", Text, |o| non_empty(&o.exclude), |o, v| {
        o.exclude = v.to_string();
        Ok(())
    }),
    ("WithProviderClass", Bool, |o| Some(o.with_provider_class.to_string()), |o, v| {
        set_bool(&mut o.with_provider_class, v)
    }),
    ("Namespace", Text, |o| optional_text(&o.namespace), |o, v| {
        set_optional_text(&mut o.namespace, v);
        Ok(())
    }),
]);

/// Options for running a SQL statement through the shell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSqlOptions {
    pub conn_string: Option<String>,
    pub sql_query: Option<String>,
}

field_table!(RunSqlOptions, RUN_SQL_FIELDS, [
    ("ConnString", Text, |o| optional_text(&o.conn_string), |o, v| {
        set_optional_text(&mut o.conn_string, v);
        Ok(())
    }),
    ("SqlQuery", Text, |o| optional_text(&o.sql_query), |o, v| {
        set_optional_text(&mut o.sql_query, v);
        Ok(())
    }),
]);

/// Options for editing an application settings file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsOptions {
    /// One of the `*_SETTING` constants
    pub setting_to_change: Option<String>,
    pub app_settings_file_name: Option<String>,
}

impl SettingsOptions {
    pub const CMS_HEADLESS_SETTING: &'static str = "CMSHeadless options";
    pub const CONNECTION_STRING_SETTING: &'static str = "Connection string";
    pub const UNGROUPED_KEY_SETTING: &'static str = "Configuration keys";
    pub const AZURE_STORAGE_SETTING: &'static str = "Azure storage";
}

field_table!(SettingsOptions, SETTINGS_FIELDS, [
    ("SettingToChange", Text, |o| optional_text(&o.setting_to_change), |o, v| {
        set_optional_text(&mut o.setting_to_change, v);
        Ok(())
    }),
    ("AppSettingsFileName", Text, |o| optional_text(&o.app_settings_file_name), |o, v| {
        set_optional_text(&mut o.app_settings_file_name, v);
        Ok(())
    }),
]);

/// Paths used by continuous deployment scripts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContinuousDeploymentConfig {
    /// Absolute path of `repository.config`
    pub config_path: Option<String>,
    /// Absolute path of the CD repository folder
    pub repository_path: Option<String>,
}

field_table!(ContinuousDeploymentConfig, CD_CONFIG_FIELDS, [
    ("ConfigPath", Text, |o| optional_text(&o.config_path), |o, v| {
        set_optional_text(&mut o.config_path, v);
        Ok(())
    }),
    ("RepositoryPath", Text, |o| optional_text(&o.repository_path), |o, v| {
        set_optional_text(&mut o.repository_path, v);
        Ok(())
    }),
]);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldTable;

    #[test]
    fn test_generated_password_rules() {
        for _ in 0..200 {
            let password = generate_password();
            assert!(password.len() >= PASSWORD_LENGTH);
            assert!(password.chars().any(|c| c.is_ascii_uppercase()));
            assert!(password.chars().any(|c| c.is_ascii_lowercase()));
            assert!(password.chars().any(|c| c.is_ascii_digit()));
            assert!(password.chars().any(|c| "!@$?".contains(c)));

            let mut distinct: Vec<char> = password.chars().collect();
            distinct.sort_unstable();
            distinct.dedup();
            assert!(distinct.len() >= PASSWORD_UNIQUE_CHARS);
        }
    }

    #[test]
    fn test_database_options_never_serialize_password() {
        let options = InstallDatabaseOptions {
            server_name: Some("localhost".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["DatabaseName"], "xperience");
        assert_eq!(json["ServerName"], "localhost");
        assert!(json.get("AdminPassword").is_none());

        let restored: InstallDatabaseOptions = serde_json::from_value(json).unwrap();
        assert!(!restored.admin_password.is_empty());
    }

    #[test]
    fn test_project_options_defaults_and_fields() {
        let mut options = InstallProjectOptions::default();
        assert_eq!(options.get_field("Template").as_deref(), Some(TEMPLATE_SAMPLE));
        assert_eq!(options.get_field("Version"), None);
        assert_eq!(options.get_field("InstallRootPath"), None);

        options.set_field("version", "29.1").unwrap();
        assert_eq!(options.version, Some(Version::new(29, 1, 0)));
        assert!(!options.is_admin_template());

        options.template = "Kentico-Xperience-Admin-Sample".to_string();
        assert!(options.is_admin_template());
    }

    #[test]
    fn test_project_options_read_pascal_case() {
        let options: InstallProjectOptions = serde_json::from_str(
            r#"{"Version":"29.0.0","Template":"kentico-xperience-mvc","ProjectName":"site","UseCloud":true}"#,
        )
        .unwrap();
        assert_eq!(options.version, Some(Version::new(29, 0, 0)));
        assert_eq!(options.project_name, "site");
        assert!(options.use_cloud);
        assert!(options.install_root_path.is_empty());
    }

    #[test]
    fn test_empty_optional_text_reads_as_missing() {
        let options = MacroOptions {
            user_name: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(options.get_field("UserName"), None);
        assert_eq!(options.get_field("SignAll").as_deref(), Some("false"));
    }
}
