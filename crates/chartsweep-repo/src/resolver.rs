//! Version resolution and update detection
//!
//! The orchestrator of the engine: fans out one fetch per unique
//! repository, aggregates the results into a lookup table, then evaluates
//! the update strategy per dependency. A failed repository is logged and
//! skipped; it never aborts the others.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use chartsweep_core::{ChartDependency, RepositoryKind, UpdateSettings, VersionUpdate};

use crate::cache::FetchCache;
use crate::credentials::RepoClient;
use crate::error::Result;
use crate::fetcher::{IndexFetcher, RepositoryFetcher, TagFetcher};
use crate::index::ChartVersionInfo;
use crate::strategy;

/// A repository fetch that failed and was excluded from the version table
#[derive(Debug, Clone)]
pub struct FetchFailure {
    /// Repository URL the fetch targeted
    pub repository: String,

    /// Chart that triggered the fetch
    pub chart: String,

    /// Diagnostic message
    pub error: String,
}

/// Lookup table from repository URL + chart name to available versions.
///
/// Built fresh per resolution call and never persisted. A repository
/// whose fetch failed has no entry; its failure record is kept so callers
/// can tell "no update" apart from "repository unreachable".
#[derive(Debug, Default)]
pub struct VersionTable {
    entries: HashMap<String, Vec<ChartVersionInfo>>,
    failures: Vec<FetchFailure>,
}

impl VersionTable {
    /// Lookup key for a chart in a repository
    pub fn key(repository: &str, chart: &str) -> String {
        format!("{}/{}", repository, chart)
    }

    /// Available versions for a chart, if its repository was resolved.
    ///
    /// `Some` with an empty slice means the repository answered but does
    /// not carry the chart; `None` means the fetch failed.
    pub fn versions_for(&self, repository: &str, chart: &str) -> Option<&[ChartVersionInfo]> {
        self.entries
            .get(&Self::key(repository, chart))
            .map(Vec::as_slice)
    }

    /// Fetch failures recorded during resolution
    pub fn failures(&self) -> &[FetchFailure] {
        &self.failures
    }

    /// Number of resolved (repository, chart) entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Version resolution engine.
///
/// Owns its fetchers and policy settings; every resolution call starts
/// with a fresh fetch cache, so nothing is shared across invocations.
pub struct VersionResolver {
    index: Arc<dyn RepositoryFetcher>,
    registry: Arc<dyn RepositoryFetcher>,
    settings: UpdateSettings,
}

impl VersionResolver {
    /// Create a resolver with HTTP fetchers for both repository kinds
    pub fn new(settings: UpdateSettings) -> Result<Self> {
        let client = Arc::new(RepoClient::new(settings.registry_credentials.clone())?);
        Ok(Self {
            index: Arc::new(IndexFetcher::new(Arc::clone(&client))),
            registry: Arc::new(TagFetcher::new(client)),
            settings,
        })
    }

    /// Create a resolver with caller-supplied fetchers
    pub fn with_fetchers(
        index: Arc<dyn RepositoryFetcher>,
        registry: Arc<dyn RepositoryFetcher>,
        settings: UpdateSettings,
    ) -> Self {
        Self {
            index,
            registry,
            settings,
        }
    }

    fn fetcher_for(&self, kind: RepositoryKind) -> &dyn RepositoryFetcher {
        match kind {
            RepositoryKind::Index => self.index.as_ref(),
            RepositoryKind::Registry => self.registry.as_ref(),
        }
    }

    /// Fetch the available versions for every unique (repository, chart)
    /// pair among the dependencies.
    ///
    /// All unique fetches are dispatched concurrently. A failed fetch is
    /// logged, recorded, and left out of the table; it never raises and
    /// never blocks the remaining repositories.
    pub async fn resolve_versions(&self, dependencies: &[ChartDependency]) -> VersionTable {
        let mut seen = HashSet::new();
        let unique: Vec<&ChartDependency> = dependencies
            .iter()
            .filter(|dep| seen.insert((dep.repository.as_str(), dep.name.as_str())))
            .collect();

        let cache = FetchCache::new();
        let fetches = unique.into_iter().map(|dep| {
            let cache = &cache;
            async move {
                let fetcher = self.fetcher_for(dep.kind);
                let outcome = match fetcher.endpoint(&dep.repository, &dep.name) {
                    Ok(endpoint) => cache
                        .get_or_fetch(&endpoint, || fetcher.fetch(&endpoint))
                        .await
                        .map(|response| response.versions_for(&dep.name))
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                (dep, outcome)
            }
        });

        let mut table = VersionTable::default();
        for (dep, outcome) in join_all(fetches).await {
            match outcome {
                Ok(versions) => {
                    debug!(
                        repository = %dep.repository,
                        chart = %dep.name,
                        count = versions.len(),
                        "resolved chart versions"
                    );
                    table
                        .entries
                        .insert(VersionTable::key(&dep.repository, &dep.name), versions);
                }
                Err(error) => {
                    warn!(
                        repository = %dep.repository,
                        chart = %dep.name,
                        %error,
                        "repository fetch failed, skipping"
                    );
                    table.failures.push(FetchFailure {
                        repository: dep.repository.clone(),
                        chart: dep.name.clone(),
                        error,
                    });
                }
            }
        }
        table
    }

    /// Evaluate the update strategy for each dependency against an
    /// already-resolved version table.
    ///
    /// Dependencies without a table entry are skipped silently. Pure with
    /// respect to its inputs; repeated evaluation yields identical output.
    pub fn evaluate_updates(
        &self,
        table: &VersionTable,
        dependencies: &[ChartDependency],
    ) -> Vec<VersionUpdate> {
        let mut updates = Vec::new();

        for dep in dependencies {
            let Some(available) = table.versions_for(&dep.repository, &dep.name) else {
                debug!(
                    repository = %dep.repository,
                    chart = %dep.name,
                    "no resolved versions, skipping"
                );
                continue;
            };

            if let Some(new_version) = strategy::select_update(
                &dep.name,
                &dep.version,
                available,
                self.settings.update_strategy,
                &self.settings.ignore,
                self.settings.allow_prerelease,
            ) {
                debug!(
                    chart = %dep.name,
                    current = %dep.version,
                    new = %new_version,
                    "update available"
                );
                updates.push(VersionUpdate {
                    dependency: dep.clone(),
                    current_version: dep.version.clone(),
                    new_version: new_version.to_string(),
                });
            }
        }

        updates
    }

    /// Resolve all repositories and report every available update
    pub async fn check_for_updates(&self, dependencies: &[ChartDependency]) -> Vec<VersionUpdate> {
        let table = self.resolve_versions(dependencies).await;
        self.evaluate_updates(&table, dependencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepoError;
    use crate::fetcher::RepositoryResponse;
    use crate::index::RepositoryIndex;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Fetcher serving canned responses, keyed by repository URL
    #[derive(Default)]
    struct StaticFetcher {
        responses: HashMap<String, RepositoryResponse>,
        failing: HashMap<String, u16>,
        calls: AtomicUsize,
    }

    impl StaticFetcher {
        fn with_index(mut self, repository: &str, yaml: &str) -> Self {
            let index = RepositoryIndex::from_yaml(yaml).unwrap();
            self.responses
                .insert(repository.to_string(), RepositoryResponse::Index(index));
            self
        }

        fn with_tags(mut self, repository: &str, tags: &[&str]) -> Self {
            self.responses.insert(
                repository.to_string(),
                RepositoryResponse::Tags(tags.iter().map(|t| t.to_string()).collect()),
            );
            self
        }

        fn with_failure(mut self, repository: &str, status: u16) -> Self {
            self.failing.insert(repository.to_string(), status);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RepositoryFetcher for StaticFetcher {
        fn endpoint(&self, repository: &str, _chart: &str) -> crate::error::Result<String> {
            Ok(repository.to_string())
        }

        async fn fetch(&self, endpoint: &str) -> crate::error::Result<RepositoryResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(status) = self.failing.get(endpoint) {
                return Err(RepoError::HttpError {
                    status: *status,
                    message: format!("Request to {} failed", endpoint),
                });
            }
            self.responses
                .get(endpoint)
                .cloned()
                .ok_or_else(|| RepoError::HttpError {
                    status: 404,
                    message: format!("Request to {} failed", endpoint),
                })
        }
    }

    fn dependency(
        name: &str,
        repository: &str,
        kind: RepositoryKind,
        version: &str,
    ) -> ChartDependency {
        ChartDependency {
            manifest_path: PathBuf::from("clusters/prod/apps.yaml"),
            document_index: 0,
            name: name.to_string(),
            repository: repository.to_string(),
            kind,
            version: version.to_string(),
            version_path: vec!["spec".to_string(), "chart".to_string(), "version".to_string()],
        }
    }

    fn make_resolver(fetcher: Arc<StaticFetcher>, settings: UpdateSettings) -> VersionResolver {
        let index: Arc<dyn RepositoryFetcher> = Arc::clone(&fetcher);
        let registry: Arc<dyn RepositoryFetcher> = fetcher;
        VersionResolver::with_fetchers(index, registry, settings)
    }

    const BITNAMI: &str = "https://charts.bitnami.com/bitnami";

    const BITNAMI_INDEX: &str = r#"
entries:
  nginx:
    - version: "15.9.0"
    - version: "15.9.1"
    - version: "15.10.0"
    - version: "16.0.0"
  postgresql:
    - version: "12.5.0"
    - version: "12.6.0"
"#;

    #[tokio::test]
    async fn shared_repository_fetched_exactly_once() {
        let fetcher = Arc::new(StaticFetcher::default().with_index(BITNAMI, BITNAMI_INDEX));
        let resolver = make_resolver(Arc::clone(&fetcher), UpdateSettings::default());

        let deps = vec![
            dependency("nginx", BITNAMI, RepositoryKind::Index, "15.9.0"),
            dependency("postgresql", BITNAMI, RepositoryKind::Index, "12.5.0"),
            // Same chart referenced from a second manifest
            dependency("nginx", BITNAMI, RepositoryKind::Index, "15.9.0"),
        ];

        let table = resolver.resolve_versions(&deps).await;

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(table.versions_for(BITNAMI, "nginx").unwrap().len(), 4);
        assert_eq!(table.versions_for(BITNAMI, "postgresql").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_repository_is_isolated() {
        let down = "https://charts.down.example.com";
        let fetcher = Arc::new(
            StaticFetcher::default()
                .with_index(BITNAMI, BITNAMI_INDEX)
                .with_failure(down, 503),
        );
        let resolver = make_resolver(fetcher, UpdateSettings::default());

        let deps = vec![
            dependency("postgresql", down, RepositoryKind::Index, "12.5.0"),
            dependency("nginx", BITNAMI, RepositoryKind::Index, "15.9.0"),
        ];

        let table = resolver.resolve_versions(&deps).await;

        assert!(table.versions_for(down, "postgresql").is_none());
        assert!(table.versions_for(BITNAMI, "nginx").is_some());
        assert_eq!(table.failures().len(), 1);
        assert_eq!(table.failures()[0].repository, down);
        assert!(table.failures()[0].error.contains("503"));

        // The failed repository yields no update and no error
        let updates = resolver.evaluate_updates(&table, &deps);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].dependency.name, "nginx");
    }

    #[tokio::test]
    async fn absent_chart_yields_no_update() {
        let fetcher = Arc::new(StaticFetcher::default().with_index(BITNAMI, BITNAMI_INDEX));
        let resolver = make_resolver(fetcher, UpdateSettings::default());

        let deps = vec![dependency(
            "not-in-this-repo",
            BITNAMI,
            RepositoryKind::Index,
            "1.0.0",
        )];

        let table = resolver.resolve_versions(&deps).await;
        // Repository answered, chart absent: entry exists but is empty
        let entry = table.versions_for(BITNAMI, "not-in-this-repo");
        assert_eq!(entry.map(|v| v.len()), Some(0));
        assert!(table.failures().is_empty());

        let updates = resolver.evaluate_updates(&table, &deps);
        assert!(updates.is_empty());
    }

    #[tokio::test]
    async fn minor_strategy_scenario() {
        let fetcher = Arc::new(StaticFetcher::default().with_index(BITNAMI, BITNAMI_INDEX));
        let settings = UpdateSettings {
            update_strategy: chartsweep_core::UpdateStrategy::Minor,
            ..Default::default()
        };
        let resolver = make_resolver(fetcher, settings);

        let deps = vec![dependency("nginx", BITNAMI, RepositoryKind::Index, "15.9.0")];
        let updates = resolver.check_for_updates(&deps).await;

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].current_version, "15.9.0");
        assert_eq!(updates[0].new_version, "15.10.0");
    }

    #[tokio::test]
    async fn registry_dependencies_use_the_tag_fetcher() {
        let registry_url = "oci://ghcr.io/myorg/charts";
        let index_fetcher = Arc::new(StaticFetcher::default());
        let tag_fetcher = Arc::new(
            StaticFetcher::default().with_tags(registry_url, &["12.5.0", "12.6.0", "13.0.0"]),
        );
        let index: Arc<dyn RepositoryFetcher> = Arc::clone(&index_fetcher);
        let registry: Arc<dyn RepositoryFetcher> = Arc::clone(&tag_fetcher);
        let resolver =
            VersionResolver::with_fetchers(index, registry, UpdateSettings::default());

        let deps = vec![dependency(
            "postgresql",
            registry_url,
            RepositoryKind::Registry,
            "12.5.0",
        )];
        let updates = resolver.check_for_updates(&deps).await;

        assert_eq!(index_fetcher.calls(), 0);
        assert_eq!(tag_fetcher.calls(), 1);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].new_version, "13.0.0");
    }

    #[tokio::test]
    async fn ignore_rules_are_applied() {
        let fetcher = Arc::new(StaticFetcher::default().with_index(BITNAMI, BITNAMI_INDEX));
        let settings = UpdateSettings {
            ignore: vec![chartsweep_core::IgnoreRule {
                dependency_name: "nginx".to_string(),
                update_types: Some(vec![chartsweep_core::UpdateType::Major]),
            }],
            ..Default::default()
        };
        let resolver = make_resolver(fetcher, settings);

        let deps = vec![dependency("nginx", BITNAMI, RepositoryKind::Index, "15.9.0")];
        let updates = resolver.check_for_updates(&deps).await;

        // Major 16.0.0 suppressed, minor 15.10.0 still eligible
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].new_version, "15.10.0");
    }

    #[tokio::test]
    async fn evaluation_is_deterministic() {
        let fetcher = Arc::new(StaticFetcher::default().with_index(BITNAMI, BITNAMI_INDEX));
        let resolver = make_resolver(fetcher, UpdateSettings::default());

        let deps = vec![
            dependency("nginx", BITNAMI, RepositoryKind::Index, "15.9.0"),
            dependency("postgresql", BITNAMI, RepositoryKind::Index, "12.5.0"),
        ];

        let table = resolver.resolve_versions(&deps).await;
        let first = resolver.evaluate_updates(&table, &deps);
        for _ in 0..2 {
            assert_eq!(resolver.evaluate_updates(&table, &deps), first);
        }
    }

    #[tokio::test]
    async fn end_to_end_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.yaml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BITNAMI_INDEX))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = VersionResolver::new(UpdateSettings::default()).unwrap();
        let deps = vec![
            dependency("nginx", &server.uri(), RepositoryKind::Index, "15.9.0"),
            dependency("postgresql", &server.uri(), RepositoryKind::Index, "12.5.0"),
        ];

        let updates = resolver.check_for_updates(&deps).await;

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].new_version, "16.0.0");
        assert_eq!(updates[1].new_version, "12.6.0");
    }

    #[tokio::test]
    async fn end_to_end_unreachable_repository() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let resolver = VersionResolver::new(UpdateSettings::default()).unwrap();
        let deps = vec![dependency(
            "postgresql",
            &server.uri(),
            RepositoryKind::Index,
            "12.5.0",
        )];

        let updates = resolver.check_for_updates(&deps).await;
        assert!(updates.is_empty());
    }
}
