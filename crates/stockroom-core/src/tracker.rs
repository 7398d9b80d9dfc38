//! Index task tracking and rebuilds.
//!
//! The index service owns task state; this module only reads it, either on
//! demand ([`IndexTaskTracker::list_tasks`]) or periodically through a
//! [`TaskWatcher`] whose latest snapshot is always available without waiting
//! for the next poll.

use crate::cancel::CancellationToken;
use crate::catalog::KeywordSource;
use crate::config::IndexConfig;
use crate::index::{IndexNaming, IndexService, IndexTask, TaskSummary};
use crate::Result;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Reads and drives the index tasks of a team.
#[derive(Clone)]
pub struct IndexTaskTracker {
    service: Arc<dyn IndexService>,
    keywords: KeywordSource,
    naming: IndexNaming,
    task_limit: u32,
}

impl IndexTaskTracker {
    pub fn new(service: Arc<dyn IndexService>, keywords: KeywordSource) -> Self {
        Self {
            service,
            keywords,
            naming: IndexNaming::default(),
            task_limit: IndexConfig::TASK_LIST_LIMIT,
        }
    }

    pub fn with_naming(mut self, naming: IndexNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Maximum number of tasks fetched per listing.
    pub fn with_task_limit(mut self, limit: u32) -> Self {
        self.task_limit = limit.max(1);
        self
    }

    /// The team's most recent tasks across all of its indexes.
    pub async fn list_tasks(&self, team_id: &str) -> Result<Vec<IndexTask>> {
        let uids: Vec<String> = self
            .naming
            .team_indexes(team_id)?
            .into_iter()
            .map(|(_, uid)| uid)
            .collect();

        let tasks = self.service.list_tasks(&uids, self.task_limit).await?;
        debug!("Team {} has {} recent index tasks", team_id, tasks.len());
        Ok(tasks)
    }

    /// Ask the service to reindex every team index with the team's current
    /// custom fields as filterable attributes.
    ///
    /// Returns once the service has accepted the updates. Earlier failed
    /// tasks are not consulted.
    pub async fn rebuild_indexes(&self, team_id: &str) -> Result<Vec<TaskSummary>> {
        let indexes = self.naming.team_indexes(team_id)?;
        let slugs = self.keywords.catalog().custom_field_slugs(team_id).await?;
        let attributes = filterable_attributes(&slugs);

        info!(
            "Rebuilding {} indexes for team {} with {} filterable attributes",
            indexes.len(),
            team_id,
            attributes.len()
        );

        let attributes = &attributes;
        try_join_all(indexes.iter().map(|(_, uid)| {
            self.service
                .update_filterable_attributes(uid, attributes)
        }))
        .await
    }

    /// Start polling the team's tasks every `interval`.
    ///
    /// The first poll runs immediately. Polling stops when the returned
    /// watcher is stopped or dropped.
    pub fn watch(&self, team_id: &str, interval: Duration) -> TaskWatcher {
        let (sender, receiver) = watch::channel(TaskSnapshot::default());
        let token = CancellationToken::new();
        let tracker = self.clone();
        let team_id = team_id.to_string();
        let loop_token = token.clone();

        let handle = tokio::spawn(async move {
            info!("Watching index tasks for team {} every {:?}", team_id, interval);

            loop {
                let result = tokio::select! {
                    _ = loop_token.cancelled() => break,
                    result = tracker.list_tasks(&team_id) => result,
                };
                publish(&sender, result);

                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }

            info!("Stopped watching index tasks for team {}", team_id);
        });

        TaskWatcher {
            token,
            receiver,
            handle: Some(handle),
        }
    }
}

impl std::fmt::Debug for IndexTaskTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexTaskTracker")
            .field("naming", &self.naming)
            .field("task_limit", &self.task_limit)
            .finish_non_exhaustive()
    }
}

/// Base attributes followed by the slugs, without duplicates.
fn filterable_attributes(slugs: &[String]) -> Vec<String> {
    let mut attributes: Vec<String> = IndexConfig::BASE_FILTERABLE_ATTRIBUTES
        .iter()
        .map(|a| a.to_string())
        .collect();
    for slug in slugs {
        if !slug.is_empty() && !attributes.contains(slug) {
            attributes.push(slug.clone());
        }
    }
    attributes
}

fn publish(sender: &watch::Sender<TaskSnapshot>, result: Result<Vec<IndexTask>>) {
    sender.send_modify(|snapshot| match result {
        Ok(tasks) => {
            snapshot.tasks = tasks;
            snapshot.refreshed_at = Some(Utc::now());
            snapshot.last_error = None;
        }
        Err(e) => {
            warn!("Index task poll failed: {}", e);
            snapshot.last_error = Some(e.to_string());
        }
    });
}

/// Latest known task state of a watched team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    /// Tasks from the last successful poll.
    pub tasks: Vec<IndexTask>,
    /// When `tasks` was fetched; `None` until the first successful poll.
    pub refreshed_at: Option<DateTime<Utc>>,
    /// Error of the most recent poll, cleared by the next success.
    pub last_error: Option<String>,
}

impl TaskSnapshot {
    pub fn failed(&self) -> impl Iterator<Item = &IndexTask> {
        self.tasks.iter().filter(|t| t.status.is_failed())
    }

    pub fn pending(&self) -> impl Iterator<Item = &IndexTask> {
        self.tasks.iter().filter(|t| t.status.is_pending())
    }
}

/// Handle to a background task poll. Dropping it stops the poll.
#[derive(Debug)]
pub struct TaskWatcher {
    token: CancellationToken,
    receiver: watch::Receiver<TaskSnapshot>,
    handle: Option<JoinHandle<()>>,
}

impl TaskWatcher {
    /// The most recent snapshot, without waiting.
    pub fn snapshot(&self) -> TaskSnapshot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published snapshot. Returns `None` once polling has
    /// stopped.
    pub async fn changed(&mut self) -> Option<TaskSnapshot> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// An independent receiver for the snapshot stream.
    pub fn subscribe(&self) -> watch::Receiver<TaskSnapshot> {
        self.receiver.clone()
    }

    /// Request the poll loop to stop.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
            && self
                .handle
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop polling and wait for the loop to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Task watcher ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for TaskWatcher {
    fn drop(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
