//! External index service.
//!
//! The service stores each team's assets, asset types and tags in separate
//! indexes and runs writes as asynchronous tasks. [`IndexService`] is the seam
//! between the tracker/search layers and the HTTP client.

mod client;
mod types;

pub use client::HttpIndexClient;
pub use types::{
    validate_team_id, IndexNaming, IndexTask, SearchResponse, TaskStatus, TaskSummary, TaskType,
};

use crate::query::IndexQuery;
use crate::Result;
use async_trait::async_trait;

/// Operations the search core needs from the index service.
#[async_trait]
pub trait IndexService: Send + Sync {
    /// Most recent tasks touching any of `index_uids`, newest first.
    async fn list_tasks(&self, index_uids: &[String], limit: u32) -> Result<Vec<IndexTask>>;

    /// Replace an index's filterable attributes. The service reindexes the
    /// documents in the background and reports the enqueued task.
    async fn update_filterable_attributes(
        &self,
        index_uid: &str,
        attributes: &[String],
    ) -> Result<TaskSummary>;

    async fn search(&self, index_uid: &str, query: &IndexQuery, limit: u32)
        -> Result<SearchResponse>;
}
