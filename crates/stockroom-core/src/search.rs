//! Search execution: compile a team's query and run it against its indexes.

use crate::catalog::KeywordSource;
use crate::index::{IndexNaming, IndexService};
use crate::query::{CompiledQuery, EntityKind, IndexQuery, QueryCompiler};
use crate::{Result, StockroomError};
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// What a search will send, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPlan {
    pub query: IndexQuery,
    /// Kind selected with `is:`; `None` searches every kind.
    pub kind: Option<EntityKind>,
    /// Target indexes, paired with the kind each one stores.
    pub indexes: Vec<(EntityKind, String)>,
}

/// Hits from one index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindHits {
    pub kind: EntityKind,
    pub index_uid: String,
    pub hits: Vec<serde_json::Value>,
    pub estimated_total_hits: Option<u64>,
}

/// Compiles queries with the team's current keywords and runs them.
#[derive(Clone)]
pub struct SearchService {
    keywords: KeywordSource,
    service: Arc<dyn IndexService>,
    naming: IndexNaming,
    compiler: QueryCompiler,
}

impl SearchService {
    pub fn new(keywords: KeywordSource, service: Arc<dyn IndexService>) -> Self {
        Self {
            keywords,
            service,
            naming: IndexNaming::default(),
            compiler: QueryCompiler::new(),
        }
    }

    pub fn with_naming(mut self, naming: IndexNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Compile `raw` for `team_id` without contacting the index service.
    ///
    /// Fails only when the team id is invalid or the catalog is unreachable.
    pub async fn plan(&self, team_id: &str, raw: &str) -> Result<SearchPlan> {
        let indexes = self.naming.team_indexes(team_id)?;
        let keywords = self.keywords.recognized_keywords(team_id).await?;
        let compiled: CompiledQuery = self.compiler.compile(raw, &keywords);

        let indexes = match compiled.kind {
            Some(kind) => indexes.into_iter().filter(|(k, _)| *k == kind).collect(),
            None => indexes,
        };

        Ok(SearchPlan {
            query: compiled.to_index_query(),
            kind: compiled.kind,
            indexes,
        })
    }

    /// Run `raw` against the team's indexes and return the hits per index.
    pub async fn search(&self, team_id: &str, raw: &str, limit: u32) -> Result<Vec<KindHits>> {
        let plan = self.plan(team_id, raw).await?;
        debug!(
            "Searching {} indexes for team {}: {:?}",
            plan.indexes.len(),
            team_id,
            plan.query
        );

        let query = &plan.query;
        try_join_all(plan.indexes.iter().map(|(kind, uid)| async move {
            let response = self.service.search(uid, query, limit).await?;
            Ok::<_, StockroomError>(KindHits {
                kind: *kind,
                index_uid: uid.clone(),
                hits: response.hits,
                estimated_total_hits: response.estimated_total_hits,
            })
        }))
        .await
    }
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("naming", &self.naming)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CustomField, CustomFieldType, SqliteCatalog};
    use crate::index::{IndexTask, SearchResponse, TaskSummary};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingService {
        searches: Mutex<Vec<(String, IndexQuery)>>,
        fail: bool,
    }

    #[async_trait]
    impl IndexService for RecordingService {
        async fn list_tasks(&self, _: &[String], _: u32) -> Result<Vec<IndexTask>> {
            Ok(Vec::new())
        }

        async fn update_filterable_attributes(&self, _: &str, _: &[String]) -> Result<TaskSummary> {
            Err(StockroomError::Other("not used".into()))
        }

        async fn search(&self, uid: &str, query: &IndexQuery, _: u32) -> Result<SearchResponse> {
            if self.fail {
                return Err(StockroomError::IndexService {
                    status: 503,
                    code: None,
                    message: "unavailable".into(),
                });
            }
            self.searches
                .lock()
                .unwrap()
                .push((uid.to_string(), query.clone()));
            Ok(SearchResponse {
                hits: vec![serde_json::json!({ "index": uid })],
                estimated_total_hits: Some(1),
                processing_time_ms: 0,
            })
        }
    }

    fn service_with(fake: Arc<RecordingService>) -> SearchService {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog
            .upsert_field(&CustomField::new("t1", "Price", CustomFieldType::Currency))
            .unwrap();
        SearchService::new(KeywordSource::new(Arc::new(catalog)), fake)
    }

    #[tokio::test]
    async fn test_plan_uses_team_keywords() {
        let search = service_with(Arc::new(RecordingService::default()));

        let plan = search.plan("t1", "is:asset price:>100 chair").await.unwrap();
        assert_eq!(plan.kind, Some(EntityKind::Asset));
        assert_eq!(plan.query.q.as_deref(), Some("chair"));
        assert_eq!(plan.query.filter.as_deref(), Some("price > 100"));
        assert_eq!(plan.indexes, vec![(EntityKind::Asset, "t1-assets".to_string())]);

        // Another team has no `price` field.
        let plan = search.plan("t2", "price:>100").await.unwrap();
        assert_eq!(plan.query.q.as_deref(), Some("price:>100"));
        assert_eq!(plan.query.filter, None);
        assert_eq!(plan.indexes.len(), 3);
    }

    #[tokio::test]
    async fn test_search_without_kind_hits_every_index() {
        let fake = Arc::new(RecordingService::default());
        let search = service_with(fake.clone());

        let results = search.search("t1", "chair", 10).await.unwrap();
        let kinds: Vec<EntityKind> = results.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, EntityKind::ALL.to_vec());
        assert_eq!(fake.searches.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_search_errors_are_not_empty_results() {
        let search = service_with(Arc::new(RecordingService {
            fail: true,
            ..Default::default()
        }));

        let err = search.search("t1", "is:tag red", 10).await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
