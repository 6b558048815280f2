//! Per-call fetch cache
//!
//! Deduplicates repository fetches within one resolution call: each fetch
//! URL is fetched at most once, and concurrent requests for the same URL
//! share the single in-flight fetch. Failures are memoized for the call
//! so a broken endpoint is not hammered. Nothing persists across calls.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use crate::error::{RepoError, Result};
use crate::fetcher::RepositoryResponse;

/// Memoized outcome of one fetch
pub type CachedFetch = std::result::Result<Arc<RepositoryResponse>, Arc<RepoError>>;

/// Fetch cache keyed by normalized fetch URL.
///
/// Single-flight: the first request for a key runs the fetch; concurrent
/// duplicates await the same pending operation instead of fetching again.
#[derive(Default)]
pub struct FetchCache {
    cells: Mutex<HashMap<String, Arc<OnceCell<CachedFetch>>>>,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached response for `endpoint`, running `fetch` if this
    /// is the first request for it.
    pub async fn get_or_fetch<F, Fut>(&self, endpoint: &str, fetch: F) -> CachedFetch
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RepositoryResponse>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells
                .entry(endpoint.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        if let Some(cached) = cell.get() {
            debug!(endpoint, "fetch cache hit");
            return cached.clone();
        }

        cell.get_or_init(|| async {
            match fetch().await {
                Ok(response) => Ok(Arc::new(response)),
                Err(e) => Err(Arc::new(e)),
            }
        })
        .await
        .clone()
    }
}
