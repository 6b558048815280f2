//! Registry tag-list types
//!
//! Container-registry style repositories list chart versions as tags on a
//! `/v2/{name}/tags/list` endpoint. Only the version strings carry over;
//! there is no further metadata.

use serde::Deserialize;

use crate::error::{RepoError, Result};

/// Normalize a registry repository URL and chart name into the HTTPS
/// tag-listing endpoint.
///
/// Accepts URLs with or without an `oci://` prefix. A path after the host
/// (`oci://ghcr.io/myorg/charts`) is preserved between `/v2/` and the
/// chart name.
pub fn tags_url(repository: &str, chart: &str) -> Result<String> {
    let stripped = repository
        .strip_prefix("oci://")
        .or_else(|| repository.strip_prefix("https://"))
        .or_else(|| repository.strip_prefix("http://"))
        .unwrap_or(repository);
    let base = stripped.strip_suffix('/').unwrap_or(stripped);

    if base.is_empty() || chart.is_empty() {
        return Err(RepoError::InvalidRepositoryUrl {
            url: repository.to_string(),
            reason: "registry URL and chart name must be non-empty".to_string(),
        });
    }

    Ok(match base.split_once('/') {
        Some((host, path)) => format!("https://{}/v2/{}/{}/tags/list", host, path, chart),
        None => format!("https://{}/v2/{}/tags/list", base, chart),
    })
}

/// Tag-listing response of a registry
#[derive(Debug, Clone, Deserialize)]
pub struct TagList {
    /// Repository name as reported by the registry
    #[serde(default)]
    pub name: Option<String>,

    /// Available tags, possibly empty
    pub tags: Vec<String>,
}

impl TagList {
    /// Parse a tag-listing response from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| RepoError::ParseError {
            message: format!("Invalid tag list: {}", e),
        })
    }
}
