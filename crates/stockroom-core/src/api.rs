//! Facade wiring the catalog, index client, search and tracker together.

use crate::catalog::{KeywordSource, SqliteCatalog};
use crate::config::{IndexConfig, IndexServiceConfig};
use crate::index::{HttpIndexClient, IndexNaming, IndexService, IndexTask, TaskSummary};
use crate::search::{KindHits, SearchPlan, SearchService};
use crate::tracker::{IndexTaskTracker, TaskWatcher};
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Builder for [`StockroomApi`].
///
/// # Example
///
/// ```rust,ignore
/// use stockroom_core::{IndexServiceConfig, StockroomApi};
///
/// let config = IndexServiceConfig::new("http://127.0.0.1:7700")?.with_api_key("masterKey");
/// let api = StockroomApi::builder(config)
///     .catalog_path("./stockroom.db")
///     .index_prefix("staging_")
///     .build()?;
/// let hits = api.search("team-1", "is:asset chair", 20).await?;
/// ```
pub struct StockroomApiBuilder {
    service_config: IndexServiceConfig,
    catalog_path: Option<PathBuf>,
    index_prefix: String,
    service: Option<Arc<dyn IndexService>>,
}

impl StockroomApiBuilder {
    pub fn new(service_config: IndexServiceConfig) -> Self {
        Self {
            service_config,
            catalog_path: None,
            index_prefix: IndexConfig::DEFAULT_INDEX_PREFIX.to_string(),
            service: None,
        }
    }

    /// SQLite file holding custom-field definitions.
    ///
    /// Default: an in-memory catalog.
    pub fn catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    /// Prefix prepended to every index uid.
    pub fn index_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.index_prefix = prefix.into();
        self
    }

    /// Use an existing index service instead of an HTTP client built from
    /// the service config.
    pub fn with_service(mut self, service: Arc<dyn IndexService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn build(self) -> Result<StockroomApi> {
        let catalog = match &self.catalog_path {
            Some(path) => SqliteCatalog::open(path)?,
            None => SqliteCatalog::open_in_memory()?,
        };
        let catalog = Arc::new(catalog);

        let service: Arc<dyn IndexService> = match self.service {
            Some(service) => service,
            None => Arc::new(HttpIndexClient::new(self.service_config.clone())?),
        };

        let naming = IndexNaming::new(self.index_prefix);
        let keywords = KeywordSource::new(catalog.clone());
        let search =
            SearchService::new(keywords.clone(), service.clone()).with_naming(naming.clone());
        let tracker = IndexTaskTracker::new(service, keywords).with_naming(naming);

        info!(
            "Stockroom API ready (index service {}, catalog {})",
            self.service_config.base_url,
            self.catalog_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ":memory:".to_string())
        );

        Ok(StockroomApi {
            catalog,
            search,
            tracker,
        })
    }
}

/// Entry point for search, task tracking and catalog access.
#[derive(Debug, Clone)]
pub struct StockroomApi {
    catalog: Arc<SqliteCatalog>,
    search: SearchService,
    tracker: IndexTaskTracker,
}

impl StockroomApi {
    pub fn builder(service_config: IndexServiceConfig) -> StockroomApiBuilder {
        StockroomApiBuilder::new(service_config)
    }

    pub fn catalog(&self) -> &SqliteCatalog {
        &self.catalog
    }

    pub async fn plan(&self, team_id: &str, raw: &str) -> Result<SearchPlan> {
        self.search.plan(team_id, raw).await
    }

    pub async fn search(&self, team_id: &str, raw: &str, limit: u32) -> Result<Vec<KindHits>> {
        self.search.search(team_id, raw, limit).await
    }

    pub async fn list_tasks(&self, team_id: &str) -> Result<Vec<IndexTask>> {
        self.tracker.list_tasks(team_id).await
    }

    pub fn watch_tasks(&self, team_id: &str, interval: Duration) -> TaskWatcher {
        self.tracker.watch(team_id, interval)
    }

    pub async fn rebuild_indexes(&self, team_id: &str) -> Result<Vec<TaskSummary>> {
        self.tracker.rebuild_indexes(team_id).await
    }
}
