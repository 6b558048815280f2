//! Chart dependency records extracted from manifests
//!
//! The manifest scanner emits one `ChartDependency` per chart reference it
//! finds. The resolution engine consumes these read-only and never mutates
//! the manifests themselves.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{CoreError, Result};

/// One chart reference found in a manifest document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDependency {
    /// Path of the manifest file the reference was found in
    pub manifest_path: PathBuf,

    /// Document index within the manifest file (multi-document YAML)
    #[serde(default)]
    pub document_index: usize,

    /// Chart name
    pub name: String,

    /// Repository URL the chart is sourced from
    pub repository: String,

    /// Repository kind (auto-detected if not specified)
    #[serde(default)]
    pub kind: RepositoryKind,

    /// Currently declared chart version
    pub version: String,

    /// Field path locating the version inside the document.
    /// Owned by the file updater; carried through untouched.
    #[serde(default)]
    pub version_path: Vec<String>,
}

impl ChartDependency {
    /// Create a dependency record, detecting the repository kind from the URL
    pub fn new(
        manifest_path: impl Into<PathBuf>,
        name: impl Into<String>,
        repository: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        let repository = repository.into();
        let kind = RepositoryKind::detect(&repository)?;

        Ok(Self {
            manifest_path: manifest_path.into(),
            document_index: 0,
            name: name.into(),
            repository,
            kind,
            version: version.into(),
            version_path: Vec::new(),
        })
    }
}

/// Repository kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    /// Traditional HTTP repository publishing a version index document
    #[default]
    Index,

    /// Container-style registry listing versions as tags
    Registry,
}

impl RepositoryKind {
    /// Auto-detect repository kind from URL
    pub fn detect(url: &str) -> Result<Self> {
        if url.starts_with("oci://") {
            Ok(RepositoryKind::Registry)
        } else if url.starts_with("http://") || url.starts_with("https://") {
            Ok(RepositoryKind::Index)
        } else {
            Err(CoreError::InvalidRepositoryUrl {
                url: url.to_string(),
                reason: "URL must start with http://, https://, or oci://".to_string(),
            })
        }
    }
}

/// A proposed version update for one dependency.
///
/// The new version is always strictly greater than the current version
/// under semantic-version ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionUpdate {
    /// The originating dependency record
    pub dependency: ChartDependency,

    /// Currently declared version
    pub current_version: String,

    /// Selected new version
    pub new_version: String,
}
