//! [`IndexService`] over the Meilisearch REST API.

use super::types::{IndexTask, SearchResponse, TaskStatus, TaskSummary, TaskType};
use super::IndexService;
use crate::config::IndexServiceConfig;
use crate::network::HttpClient;
use crate::query::IndexQuery;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Task record as it appears on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTask {
    uid: u64,
    index_uid: Option<String>,
    status: TaskStatus,
    #[serde(rename = "type")]
    task_type: TaskType,
    enqueued_at: DateTime<Utc>,
    #[serde(default)]
    error: Option<WireTaskError>,
}

#[derive(Debug, Deserialize)]
struct WireTaskError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TasksPage {
    results: Vec<WireTask>,
}

impl From<WireTask> for IndexTask {
    fn from(task: WireTask) -> Self {
        IndexTask {
            uid: task.uid,
            enqueued_at: task.enqueued_at,
            index_id: task.index_uid,
            task_type: task.task_type,
            status: task.status,
            error_message: task.error.map(|e| e.message),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SettingsPatch<'a> {
    filterable_attributes: &'a [String],
}

#[derive(Debug, Serialize)]
struct SearchBody<'a> {
    #[serde(flatten)]
    query: &'a IndexQuery,
    limit: u32,
}

/// Client for a Meilisearch-compatible index service.
#[derive(Debug, Clone)]
pub struct HttpIndexClient {
    http: HttpClient,
}

impl HttpIndexClient {
    pub fn new(config: IndexServiceConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }

    fn index_path(index_uid: &str, rest: &str) -> String {
        format!("/indexes/{}/{}", urlencoding::encode(index_uid), rest)
    }
}

#[async_trait]
impl IndexService for HttpIndexClient {
    async fn list_tasks(&self, index_uids: &[String], limit: u32) -> Result<Vec<IndexTask>> {
        let mut path = format!("/tasks?limit={}", limit);
        if !index_uids.is_empty() {
            let uids: Vec<String> = index_uids
                .iter()
                .map(|uid| urlencoding::encode(uid).into_owned())
                .collect();
            path.push_str("&indexUids=");
            path.push_str(&uids.join(","));
        }

        let page: TasksPage = self.http.get_json(&path).await?;
        debug!("Fetched {} index tasks", page.results.len());
        Ok(page.results.into_iter().map(IndexTask::from).collect())
    }

    async fn update_filterable_attributes(
        &self,
        index_uid: &str,
        attributes: &[String],
    ) -> Result<TaskSummary> {
        let body = SettingsPatch {
            filterable_attributes: attributes,
        };
        let summary: TaskSummary = self
            .http
            .patch_json(&Self::index_path(index_uid, "settings"), &body)
            .await?;

        info!(
            "Enqueued settings update for {} as task {}",
            index_uid, summary.task_uid
        );
        Ok(summary)
    }

    async fn search(&self, index_uid: &str, query: &IndexQuery, limit: u32) -> Result<SearchResponse> {
        let body = SearchBody { query, limit };
        self.http
            .post_json(&Self::index_path(index_uid, "search"), &body)
            .await
    }
}
