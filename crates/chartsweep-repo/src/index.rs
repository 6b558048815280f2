//! Repository index types
//!
//! Helm-compatible version index format: a YAML document whose `entries`
//! field maps chart names to lists of version entries.

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{RepoError, Result};

/// Canonical index file name appended to index repository URLs
pub const INDEX_FILE: &str = "index.yaml";

/// Normalize a repository URL into its index document URL.
///
/// Strips exactly one trailing slash and appends the index file name
/// unless the URL already ends in it.
pub fn index_url(repository: &str) -> String {
    let base = repository.strip_suffix('/').unwrap_or(repository);
    if base.ends_with(INDEX_FILE) {
        base.to_string()
    } else {
        format!("{}/{}", base, INDEX_FILE)
    }
}

/// Version index of one repository
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryIndex {
    /// API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Version entries indexed by chart name
    #[serde(default)]
    pub entries: HashMap<String, Vec<ChartVersionInfo>>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

impl Default for RepositoryIndex {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            entries: HashMap::new(),
        }
    }
}

impl RepositoryIndex {
    /// Parse index from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| RepoError::ParseError {
            message: format!("Invalid index document: {}", e),
        })
    }

    /// Parse index from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let yaml = std::str::from_utf8(bytes).map_err(|e| RepoError::ParseError {
            message: format!("Invalid UTF-8: {}", e),
        })?;
        Self::from_yaml(yaml)
    }

    /// Get all version entries of a chart.
    ///
    /// An absent chart yields an empty slice, not an error.
    pub fn versions_for(&self, name: &str) -> &[ChartVersionInfo] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One version entry discovered in a repository.
///
/// The version string need not be valid semver; invalid entries are
/// tolerated here and excluded later when strict comparison is needed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartVersionInfo {
    /// Chart version string
    pub version: String,

    /// Version of the packaged application
    #[serde(default)]
    pub app_version: Option<String>,

    /// Creation timestamp
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,

    /// Content digest of the archive
    #[serde(default)]
    pub digest: Option<String>,
}

impl ChartVersionInfo {
    /// Create an entry carrying only a version string
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Default::default()
        }
    }

    /// Parse the version string as semver
    pub fn parsed_version(&self) -> Option<Version> {
        Version::parse(&self.version).ok()
    }
}
