//! Repository fetchers
//!
//! Two fetcher kinds share one contract: normalize a (repository, chart)
//! pair to a fetch URL, perform exactly one HTTP GET, and parse the body.
//! Neither retries internally; retry policy belongs to the transport.

use async_trait::async_trait;
use std::sync::Arc;

use crate::credentials::RepoClient;
use crate::error::Result;
use crate::index::{self, ChartVersionInfo, RepositoryIndex};
use crate::registry::{self, TagList};

/// One fetched repository response.
///
/// Cached whole, per fetch URL; individual charts are sliced out of it on
/// demand so repeated lookups never refetch.
#[derive(Debug, Clone)]
pub enum RepositoryResponse {
    /// Parsed version index covering every chart in the repository
    Index(RepositoryIndex),

    /// Tag list of one registry path
    Tags(Vec<String>),
}

impl RepositoryResponse {
    /// Slice out the version entries for one chart.
    ///
    /// An absent chart yields an empty list, not an error.
    pub fn versions_for(&self, chart: &str) -> Vec<ChartVersionInfo> {
        match self {
            RepositoryResponse::Index(index) => index.versions_for(chart).to_vec(),
            RepositoryResponse::Tags(tags) => {
                tags.iter().map(|tag| ChartVersionInfo::new(tag.as_str())).collect()
            }
        }
    }
}

/// Common contract of the two fetcher kinds
#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    /// Normalized fetch URL for a chart in a repository.
    /// Also serves as the fetch cache key.
    fn endpoint(&self, repository: &str, chart: &str) -> Result<String>;

    /// Perform the single HTTP GET and parse the response
    async fn fetch(&self, endpoint: &str) -> Result<RepositoryResponse>;
}

/// Fetcher for index-style repositories (one document lists all charts)
pub struct IndexFetcher {
    client: Arc<RepoClient>,
}

impl IndexFetcher {
    pub fn new(client: Arc<RepoClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RepositoryFetcher for IndexFetcher {
    fn endpoint(&self, repository: &str, _chart: &str) -> Result<String> {
        Ok(index::index_url(repository))
    }

    async fn fetch(&self, endpoint: &str) -> Result<RepositoryResponse> {
        let bytes = self.client.get_bytes(endpoint).await?;
        let parsed = RepositoryIndex::from_bytes(&bytes)?;
        Ok(RepositoryResponse::Index(parsed))
    }
}

/// Fetcher for registry-style repositories (tag listing per chart)
pub struct TagFetcher {
    client: Arc<RepoClient>,
}

impl TagFetcher {
    pub fn new(client: Arc<RepoClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RepositoryFetcher for TagFetcher {
    fn endpoint(&self, repository: &str, chart: &str) -> Result<String> {
        registry::tags_url(repository, chart)
    }

    async fn fetch(&self, endpoint: &str) -> Result<RepositoryResponse> {
        let bytes = self.client.get_bytes(endpoint).await?;
        let parsed = TagList::from_bytes(&bytes)?;
        Ok(RepositoryResponse::Tags(parsed.tags))
    }
}
