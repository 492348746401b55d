//! Application settings of a managed installation
//!
//! `appsettings*.json` files are read and written as whole JSON documents.
//! Top-level keys and connection string names are matched ignoring case.

use crate::constants::APPSETTINGS_FILENAME;
use crate::errors::SettingsError;
use crate::fields::{non_empty, set_bool, set_integer, set_optional_text, FieldKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

const CONNECTION_STRINGS_SECTION: &str = "ConnectionStrings";
const CMS_HEADLESS_SECTION: &str = "CMSHeadless";

/// A documented top-level configuration key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationKey {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    pub default: Option<&'static str>,
}

impl ConfigurationKey {
    const fn new(
        name: &'static str,
        description: &'static str,
        kind: FieldKind,
        default: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            description,
            kind,
            default,
        }
    }
}

/// A configuration key with the value found in a settings file
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: ConfigurationKey,
    pub actual: Option<Value>,
}

impl KeyValue {
    /// Value to show: the stored one, else the documented default.
    pub fn display_value(&self) -> Option<String> {
        match &self.actual {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => self.key.default.map(str::to_string),
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Keys configuring Azure Blob storage.
pub static AZURE_STORAGE_KEYS: [ConfigurationKey; 7] = [
    ConfigurationKey::new(
        "CMSAzureAccountName",
        "The Azure storage account name",
        FieldKind::Text,
        None,
    ),
    ConfigurationKey::new(
        "CMSAzureSharedKey",
        "The Azure storage account shared key",
        FieldKind::Text,
        None,
    ),
    ConfigurationKey::new(
        "CMSAzureTempPath",
        "The system uses the specified folder to store temporary files on a local disk, for example when transferring large files to or from the storage account. If not set, the system creates and uses an ~/AzureTemp directory in the project's root",
        FieldKind::Text,
        None,
    ),
    ConfigurationKey::new(
        "CMSAzureCachePath",
        "Specifies a folder on a local disk where files requested from the storage account are cached. This helps minimize the amount of blob storage operations, which saves time and resources. If not set, the system creates and uses an ~/AzureCache directory in the project's root",
        FieldKind::Text,
        None,
    ),
    ConfigurationKey::new(
        "CMSAzureBlobEndPoint",
        "Sets the endpoint used for the connection to the blob service of the specified storage account. If you wish to use the default endpoint, remove the setting completely from the appropriate files",
        FieldKind::Text,
        None,
    ),
    ConfigurationKey::new(
        "CMSAzurePublicContainer",
        "Indicates if the blob container used to store the application's files is public. If true, it will be possible to access files directly through the URL of the appropriate blob service, for example: https://<StorageAccountName>.blob.core.windows.net/media/imagelibrary/logo.png",
        FieldKind::Bool,
        None,
    ),
    ConfigurationKey::new(
        "CMSDownloadBlobTimeout",
        "Specifies the timeout interval in minutes for importing files from Azure Blob storage into Xperience. The default is 1.5 minutes. Increase the interval if you encounter problems when importing large files (2GB+).",
        FieldKind::Integer,
        None,
    ),
];

/// Root-level keys not tied to a common feature.
pub static UNGROUPED_KEYS: [ConfigurationKey; 13] = [
    ConfigurationKey::new(
        "CMSForbiddenURLValues",
        "Specifies characters that are forbidden in page URLs",
        FieldKind::Text,
        Some("\\/:*?\"<>|&%.'#[]+ \t=„“"),
    ),
    ConfigurationKey::new(
        "CMSHashStringSalt",
        "Sets the salt value the system uses in hash functions, for example when creating macro signatures",
        FieldKind::Text,
        None,
    ),
    ConfigurationKey::new(
        "CMSImageExtensions",
        "Specifies the file extensions that the system recognizes as image files",
        FieldKind::Text,
        Some("bmp;gif;ico;png;wmf;jpg;jpeg;tiff;tif;webp"),
    ),
    ConfigurationKey::new(
        "CMSLogKeepPercent",
        "This key determines the extra percentage of events that is retained in the log over the specified limit. This percentage of the oldest events is deleted by batch when the percentage is exceeded",
        FieldKind::Integer,
        Some("10"),
    ),
    ConfigurationKey::new(
        "CMSBuilderScriptsIncludeJQuery",
        "Determines whether the system links the jQuery 3.5.1 library to live site pages containing Page Builder content or forms",
        FieldKind::Bool,
        Some("false"),
    ),
    ConfigurationKey::new(
        "CMSCIEncoding",
        "Sets the character encoding used when the CI/CD features generate non-binary files in the repository folder",
        FieldKind::Text,
        Some("utf-8"),
    ),
    ConfigurationKey::new(
        "CMSCIRepositoryPath",
        "Sets the location of the Continuous Integration file repository root folder",
        FieldKind::Text,
        Some("App_Data\\CIRepository"),
    ),
    ConfigurationKey::new(
        "CMSProcessContactActionsInterval",
        "Sets the interval (in seconds) in which contact data and activities are batch processed by the system",
        FieldKind::Integer,
        Some("10"),
    ),
    ConfigurationKey::new(
        "CMSCreateContactActionsLogWorker",
        "If enabled, all web farm servers recalculate contact scores, contact groups, personas, and marketing automation triggers",
        FieldKind::Bool,
        Some("true"),
    ),
    ConfigurationKey::new(
        "CMSEmailUrlDefaultScheme",
        "Sets the scheme (protocol) used when resolving relative URLs within email content",
        FieldKind::Text,
        Some("https"),
    ),
    ConfigurationKey::new(
        "CMSDeleteTemporaryUploadFilesOlderThan",
        "Sets the interval (in hours) at which the system deletes the contents of the temporary folder that stores files uploaded through the Upload file component in Form Builder.",
        FieldKind::Integer,
        Some("2"),
    ),
    ConfigurationKey::new(
        "CMSPhysicalFilesCacheMinutes",
        "Sets client cache expiration time (in minutes) for physical files served by Xperience through the GetResource handler.",
        FieldKind::Integer,
        Some("10080"),
    ),
    ConfigurationKey::new(
        "CMSStorageProviderAssembly",
        "Configures the assembly name of a custom file system provider.",
        FieldKind::Text,
        None,
    ),
];

/// Caching behaviour of the headless API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HeadlessCaching {
    pub enable: bool,
    pub use_request_cache_control_headers: bool,
    pub add_response_cache_control_headers: bool,
    pub use_cache_dependencies: bool,
    pub absolute_expiration: i32,
    pub sliding_expiration: i32,
    pub size_limit: i64,
}

impl Default for HeadlessCaching {
    fn default() -> Self {
        Self {
            enable: true,
            use_request_cache_control_headers: true,
            add_response_cache_control_headers: true,
            use_cache_dependencies: true,
            absolute_expiration: 720,
            sliding_expiration: 60,
            size_limit: 100_000_000,
        }
    }
}

/// The `CMSHeadless` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CmsHeadlessConfiguration {
    pub enable: bool,
    pub allow_introspection: bool,
    pub graph_ql_endpoint_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors_allowed_origins: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors_allowed_headers: Option<String>,
    pub caching: HeadlessCaching,
}

impl Default for CmsHeadlessConfiguration {
    fn default() -> Self {
        Self {
            enable: true,
            allow_introspection: false,
            graph_ql_endpoint_path: "/graphql".to_string(),
            cors_allowed_origins: None,
            cors_allowed_headers: None,
            caching: HeadlessCaching::default(),
        }
    }
}

crate::fields::field_table!(CmsHeadlessConfiguration, HEADLESS_FIELDS, [
    ("Enable", Bool, |c| Some(c.enable.to_string()), |c, v| set_bool(&mut c.enable, v)),
    ("AllowIntrospection", Bool, |c| Some(c.allow_introspection.to_string()), |c, v| {
        set_bool(&mut c.allow_introspection, v)
    }),
    ("GraphQlEndpointPath", Text, |c| non_empty(&c.graph_ql_endpoint_path), |c, v| {
        c.graph_ql_endpoint_path = v.to_string();
        Ok(())
    }),
    ("CorsAllowedOrigins", Text, |c| c.cors_allowed_origins.clone(), |c, v| {
        set_optional_text(&mut c.cors_allowed_origins, v);
        Ok(())
    }),
    ("CorsAllowedHeaders", Text, |c| c.cors_allowed_headers.clone(), |c, v| {
        set_optional_text(&mut c.cors_allowed_headers, v);
        Ok(())
    }),
    ("Caching::Enable", Bool, |c| Some(c.caching.enable.to_string()), |c, v| {
        set_bool(&mut c.caching.enable, v)
    }),
    ("Caching::UseRequestCacheControlHeaders", Bool,
        |c| Some(c.caching.use_request_cache_control_headers.to_string()),
        |c, v| set_bool(&mut c.caching.use_request_cache_control_headers, v)),
    ("Caching::AddResponseCacheControlHeaders", Bool,
        |c| Some(c.caching.add_response_cache_control_headers.to_string()),
        |c, v| set_bool(&mut c.caching.add_response_cache_control_headers, v)),
    ("Caching::UseCacheDependencies", Bool,
        |c| Some(c.caching.use_cache_dependencies.to_string()),
        |c, v| set_bool(&mut c.caching.use_cache_dependencies, v)),
    ("Caching::AbsoluteExpiration", Integer,
        |c| Some(c.caching.absolute_expiration.to_string()),
        |c, v| set_integer(&mut c.caching.absolute_expiration, v)),
    ("Caching::SlidingExpiration", Integer,
        |c| Some(c.caching.sliding_expiration.to_string()),
        |c, v| set_integer(&mut c.caching.sliding_expiration, v)),
    ("Caching::SizeLimit", Integer,
        |c| Some(c.caching.size_limit.to_string()),
        |c, v| set_integer(&mut c.caching.size_limit, v)),
]);

/// Help text for a `CMSHeadless` field name.
pub fn headless_description(field: &str) -> Option<&'static str> {
    let description = match field {
        "Enable" => "Specifies whether GraphQL API endpoints are enabled.",
        "AllowIntrospection" => "Specifies whether GraphQL introspection is enabled (__schema queries and GUI tools for exploring the schema).",
        "GraphQlEndpointPath" => "The slug used in channel endpoint URLs. You need to include the leading slash ('/').",
        "CorsAllowedOrigins" => "The domains that are allowed origins for CORS (Cross-Origin Resource Sharing).",
        "CorsAllowedHeaders" => "The HTTP headers that are allowed for content retrieval requests. If not set, all headers are allowed by default.",
        "Caching::Enable" => "Specifies whether caching is enabled.",
        "Caching::UseRequestCacheControlHeaders" => "Specifies whether caching respects the Cache-Control header of individual requests.",
        "Caching::AddResponseCacheControlHeaders" => "Specifies whether caching sets the Cache-Control response header.",
        "Caching::UseCacheDependencies" => "Specifies whether caching uses cache dependencies to flush the cache when data in a cached response changes.",
        "Caching::AbsoluteExpiration" => "The maximum expiration time for a cache entry in minutes.",
        "Caching::SlidingExpiration" => "The sliding expiration date for cache entries in minutes. Cannot exceed the value of AbsoluteExpiration.",
        "Caching::SizeLimit" => "The maximum size for in-memory cache in bytes.",
        _ => return None,
    };
    Some(description)
}

/// Split the `Initial Catalog` part off a SQL Server connection string.
///
/// Returns the database name and the connection string without that part.
pub fn split_initial_catalog(connection_string: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = connection_string.split(';').collect();
    let catalog = parts
        .iter()
        .find(|p| p.trim_start().to_lowercase().starts_with("initial catalog"))?;
    let name = catalog.split_once('=')?.1.trim();
    if name.is_empty() {
        return None;
    }

    let remaining: Vec<&str> = parts
        .iter()
        .filter(|p| !p.eq_ignore_ascii_case(catalog))
        .copied()
        .collect();
    Some((name.to_string(), remaining.join(";")))
}

fn find_key<'a>(map: &'a Map<String, Value>, name: &str) -> Option<&'a String> {
    map.keys().find(|k| k.eq_ignore_ascii_case(name))
}

fn get_ignore_case<'a>(map: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    find_key(map, name).and_then(|k| map.get(k))
}

fn insert_ignore_case(map: &mut Map<String, Value>, name: &str, value: Value) {
    let key = find_key(map, name)
        .cloned()
        .unwrap_or_else(|| name.to_string());
    map.insert(key, value);
}

/// Reads and writes one settings file of a project
#[derive(Debug, Clone)]
pub struct AppSettingsManager {
    path: PathBuf,
}

impl AppSettingsManager {
    /// Manager for `file_name` (default `appsettings.json`) in `working_dir`.
    pub fn new(working_dir: impl AsRef<Path>, file_name: Option<&str>) -> Self {
        let file_name = file_name
            .filter(|f| !f.is_empty())
            .unwrap_or(APPSETTINGS_FILENAME);
        Self {
            path: working_dir.as_ref().join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the `appsettings*.json` files in `working_dir`.
    pub fn list_files(working_dir: impl AsRef<Path>) -> Result<Vec<String>, SettingsError> {
        let mut files: Vec<String> = std::fs::read_dir(working_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| {
                let lower = name.to_lowercase();
                lower.starts_with("appsettings") && lower.ends_with(".json")
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<Map<String, Value>, SettingsError> {
        if !self.path.exists() {
            return Err(SettingsError::NotFound {
                path: self.display_path(),
            });
        }
        let text = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(SettingsError::Parsing {
                path: self.display_path(),
                message: "expected a JSON object".to_string(),
            }),
            Err(e) => Err(SettingsError::Parsing {
                path: self.display_path(),
                message: e.to_string(),
            }),
        }
    }

    fn write(&self, settings: Map<String, Value>) -> Result<(), SettingsError> {
        debug!("Writing {}", self.path.display());
        let text = serde_json::to_string_pretty(&Value::Object(settings)).map_err(|e| {
            SettingsError::Parsing {
                path: self.display_path(),
                message: e.to_string(),
            }
        })?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }

    /// Connection string `name`, if present.
    pub fn connection_string(&self, name: &str) -> Result<Option<String>, SettingsError> {
        let settings = self.load()?;
        Ok(get_ignore_case(&settings, CONNECTION_STRINGS_SECTION)
            .and_then(Value::as_object)
            .and_then(|section| get_ignore_case(section, name))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Replace connection string `name`; the section must exist.
    pub fn set_connection_string(&self, name: &str, value: &str) -> Result<(), SettingsError> {
        let mut settings = self.load()?;
        let section_key = find_key(&settings, CONNECTION_STRINGS_SECTION).cloned();
        let section = section_key
            .and_then(|key| settings.get_mut(&key))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| SettingsError::InvalidSection {
                section: CONNECTION_STRINGS_SECTION.to_string(),
                message: "section not found".to_string(),
            })?;
        insert_ignore_case(section, name, Value::String(value.to_string()));
        self.write(settings)
    }

    /// The `CMSHeadless` section, or defaults when it is missing.
    pub fn cms_headless(&self) -> Result<CmsHeadlessConfiguration, SettingsError> {
        let settings = self.load()?;
        match get_ignore_case(&settings, CMS_HEADLESS_SECTION) {
            Some(section) => serde_json::from_value(section.clone()).map_err(|e| {
                SettingsError::InvalidSection {
                    section: CMS_HEADLESS_SECTION.to_string(),
                    message: e.to_string(),
                }
            }),
            None => Ok(CmsHeadlessConfiguration::default()),
        }
    }

    pub fn set_cms_headless(&self, config: &CmsHeadlessConfiguration) -> Result<(), SettingsError> {
        let mut settings = self.load()?;
        let value = serde_json::to_value(config).map_err(|e| SettingsError::InvalidSection {
            section: CMS_HEADLESS_SECTION.to_string(),
            message: e.to_string(),
        })?;
        insert_ignore_case(&mut settings, CMS_HEADLESS_SECTION, value);
        self.write(settings)
    }

    /// `keys` with the values stored in the file, in the given order.
    pub fn configuration_keys(&self, keys: &[ConfigurationKey]) -> Result<Vec<KeyValue>, SettingsError> {
        let settings = self.load()?;
        Ok(keys
            .iter()
            .map(|key| KeyValue {
                key: *key,
                actual: get_ignore_case(&settings, key.name).cloned(),
            })
            .collect())
    }

    /// Set a root-level key, replacing an existing one of any casing.
    pub fn set_key_value(&self, name: &str, value: Value) -> Result<(), SettingsError> {
        let mut settings = self.load()?;
        insert_ignore_case(&mut settings, name, value);
        self.write(settings)
    }
}
