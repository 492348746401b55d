//! Fixed names and thresholds shared by commands and wizards.

/// Lowest major version offered when updating an existing project.
pub const MIN_LISTED_VERSION: u64 = 28;

/// Lowest major version offered for new installations.
pub const MIN_INSTALL_VERSION: u64 = 25;

/// Tool configuration file, resolved against the current directory.
pub const CONFIG_FILENAME: &str = "xman.json";

/// Directory holding a profile's CD repository.
pub const CD_FILES_DIR: &str = "CDRepository";

/// CD repository configuration file name.
pub const CD_CONFIG_NAME: &str = "repository.config";

/// Default root directory for CD data, relative to the current directory.
pub const CD_CONFIG_DIR: &str = "ContinuousDeployment";

/// Default application settings file of an installation.
pub const APPSETTINGS_FILENAME: &str = "appsettings.json";

/// Connection string read and written by the settings and delete commands.
pub const CONNECTION_STRING_NAME: &str = "CMSConnectionString";

pub const DATABASE_TOOL: &str = "Kentico.Xperience.DbManager";
pub const TEMPLATES_PACKAGE: &str = "kentico.xperience.templates";
pub const TEMPLATE_SAMPLE: &str = "kentico-xperience-sample-mvc";
pub const TEMPLATE_BLANK: &str = "kentico-xperience-mvc";
pub const TEMPLATE_ADMIN: &str = "kentico-xperience-admin-sample";

/// Registry id of this tool, used to detect newer releases.
pub const TOOL_PACKAGE: &str = "Kentico.Xperience.Manager";

/// Packages updated by the `update` command, in order.
pub const UPDATE_PACKAGES: &[&str] = &[
    "kentico.xperience.admin",
    "kentico.xperience.azurestorage",
    "kentico.xperience.cloud",
    "kentico.xperience.graphql",
    "kentico.xperience.imageprocessing",
    "kentico.xperience.webapp",
];

/// Public package registry.
pub const NUGET_BASE_URL: &str = "https://api.nuget.org";
