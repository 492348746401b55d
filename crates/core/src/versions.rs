//! Package version lookup
//!
//! Queries the public package registry for every published version of a
//! package and narrows the list to versions an operator may select: stable,
//! non-legacy releases at or above a minimum major version.
//!
//! ## Examples
//!
//! ```rust
//! use xman_core::versions::{parse_version, selectable_versions};
//!
//! let versions = ["27.0.0", "28.1.0", "28.2.0-preview", "29.0.1"]
//!     .iter()
//!     .filter_map(|v| parse_version(v))
//!     .collect::<Vec<_>>();
//! let listed = selectable_versions(&versions, 28);
//! assert_eq!(listed.len(), 2);
//! assert_eq!(listed[0].to_string(), "29.0.1");
//! ```

use crate::constants::NUGET_BASE_URL;
use crate::errors::VersionError;
use semver::Version;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Parse a registry version string
///
/// Handles "v1.2.3", "1.2.3", "1.2" and "1". Four-part legacy versions
/// ("1.2.3.4") are not semantic versions and yield `None`.
pub fn parse_version(raw: &str) -> Option<Version> {
    let raw = raw.trim();
    let version_str = raw.strip_prefix('v').unwrap_or(raw);
    let core = version_str.split(['-', '+']).next().unwrap_or_default();
    if core.split('.').count() > 3 {
        return None;
    }

    if let Ok(version) = Version::parse(version_str) {
        return Some(version);
    }
    if let Ok(version) = Version::parse(&format!("{}.0", version_str)) {
        return Some(version);
    }
    if let Ok(version) = Version::parse(&format!("{}.0.0", version_str)) {
        return Some(version);
    }

    None
}

/// Stable versions with `major >= min_major`, newest first, without duplicates.
pub fn selectable_versions(versions: &[Version], min_major: u64) -> Vec<Version> {
    let mut listed: Vec<Version> = versions
        .iter()
        .filter(|v| v.pre.is_empty() && v.major >= min_major)
        .cloned()
        .collect();
    listed.sort_by(|a, b| b.cmp(a));
    listed.dedup();
    listed
}

/// The newest published version when it is newer than `current`.
pub fn newer_version(versions: &[Version], current: &Version) -> Option<Version> {
    versions
        .iter()
        .filter(|v| v.pre.is_empty())
        .max()
        .filter(|latest| *latest > current)
        .cloned()
}

/// Source of published package versions
#[async_trait::async_trait]
pub trait VersionSource: Send + Sync {
    /// All versions published for `package`, in registry order.
    async fn package_versions(&self, package: &str) -> Result<Vec<Version>, VersionError>;
}

#[derive(Debug, Deserialize)]
struct VersionIndex {
    versions: Vec<String>,
}

/// Registry client using the flat-container endpoint
#[derive(Debug, Clone)]
pub struct NuGetClient {
    client: reqwest::Client,
    base_url: String,
}

impl NuGetClient {
    /// Client for the public registry
    pub fn new() -> Self {
        Self::with_base_url(NUGET_BASE_URL)
    }

    /// Client for another registry root, e.g. a mirror or test server
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn index_url(&self, package: &str) -> String {
        format!(
            "{}/v3-flatcontainer/{}/index.json",
            self.base_url,
            package.to_lowercase()
        )
    }
}

impl Default for NuGetClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl VersionSource for NuGetClient {
    #[instrument(skip(self))]
    async fn package_versions(&self, package: &str) -> Result<Vec<Version>, VersionError> {
        let url = self.index_url(package);
        debug!("Fetching package versions from {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(VersionError::Status {
                package: package.to_string(),
                status: response.status().as_u16(),
            });
        }

        let index: VersionIndex = response.json().await?;
        let versions: Vec<Version> = index
            .versions
            .iter()
            .filter_map(|v| parse_version(v))
            .collect();
        debug!(
            "Registry listed {} versions, {} usable",
            index.versions.len(),
            versions.len()
        );
        Ok(versions)
    }
}

pub mod mock {
    //! Fixed version lists for tests.

    use super::*;
    use std::collections::HashMap;

    /// Version source answering from an in-memory map
    #[derive(Debug, Default, Clone)]
    pub struct StaticVersionSource {
        packages: HashMap<String, Vec<Version>>,
    }

    impl StaticVersionSource {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register versions for a package (case-insensitive id).
        pub fn with_package(mut self, package: &str, versions: &[&str]) -> Self {
            self.packages.insert(
                package.to_lowercase(),
                versions.iter().filter_map(|v| parse_version(v)).collect(),
            );
            self
        }
    }

    #[async_trait::async_trait]
    impl VersionSource for StaticVersionSource {
        async fn package_versions(&self, package: &str) -> Result<Vec<Version>, VersionError> {
            Ok(self
                .packages
                .get(&package.to_lowercase())
                .cloned()
                .unwrap_or_default())
        }
    }
}
