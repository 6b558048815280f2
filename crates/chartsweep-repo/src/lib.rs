//! Chartsweep Version Resolution
//!
//! This crate turns chart dependency records into update proposals:
//!
//! - **Repository fetchers**: index-style repositories (one `index.yaml`
//!   lists every chart) and registry-style repositories (tag listing per
//!   chart), behind one contract
//! - **Fetch cache**: at most one network fetch per repository per
//!   resolution call, with single-flight deduplication
//! - **Credential decoration**: per-host basic/bearer auth applied
//!   uniformly to both fetcher kinds
//! - **Update strategy evaluation**: major/minor/patch/all strategies
//!   combined with per-chart ignore rules
//! - **Fault isolation**: one unreachable repository never blocks the
//!   others and never fails the resolution call
//!
//! ## Example
//!
//! ```rust,no_run
//! use chartsweep_core::{ChartDependency, UpdateSettings};
//! use chartsweep_repo::VersionResolver;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let deps = vec![ChartDependency::new(
//!     "clusters/prod/web.yaml",
//!     "nginx",
//!     "https://charts.bitnami.com/bitnami",
//!     "15.9.0",
//! )?];
//!
//! let resolver = VersionResolver::new(UpdateSettings::default())?;
//! for update in resolver.check_for_updates(&deps).await {
//!     println!(
//!         "{}: {} -> {}",
//!         update.dependency.name, update.current_version, update.new_version
//!     );
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod credentials;
pub mod error;
pub mod fetcher;
pub mod index;
pub mod registry;
pub mod resolver;
pub mod strategy;

// Re-exports for convenience
pub use cache::FetchCache;
pub use credentials::{RepoClient, auth_header, authorize, find_credential};
pub use error::{RepoError, Result};
pub use fetcher::{IndexFetcher, RepositoryFetcher, RepositoryResponse, TagFetcher};
pub use index::{ChartVersionInfo, RepositoryIndex, index_url};
pub use registry::{TagList, tags_url};
pub use resolver::{FetchFailure, VersionResolver, VersionTable};
pub use strategy::{classify, select_update};
