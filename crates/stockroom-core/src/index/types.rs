//! Index task records, search responses and index naming.

use crate::config::IndexConfig;
use crate::query::EntityKind;
use crate::{Result, StockroomError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of work an index task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskType {
    IndexCreation,
    IndexUpdate,
    IndexDeletion,
    IndexSwap,
    DocumentAdditionOrUpdate,
    DocumentDeletion,
    SettingsUpdate,
    DumpCreation,
    TaskCancelation,
    TaskDeletion,
    SnapshotCreation,
    /// A task type this version does not know about.
    #[serde(other)]
    Unknown,
}

/// Lifecycle state of an index task, owned by the index service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    Enqueued,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// Still waiting or running.
    pub fn is_pending(&self) -> bool {
        matches!(self, TaskStatus::Enqueued | TaskStatus::Processing)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Enqueued => "enqueued",
            TaskStatus::Processing => "processing",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
            TaskStatus::Canceled => "canceled",
            TaskStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A task record as reported by the index service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexTask {
    pub uid: u64,
    pub enqueued_at: DateTime<Utc>,
    /// Index the task applies to; `None` for global tasks such as dumps.
    pub index_id: Option<String>,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub error_message: Option<String>,
}

/// Acknowledgement returned when the service accepts an asynchronous task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub task_uid: u64,
    pub index_uid: Option<String>,
    pub status: TaskStatus,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub enqueued_at: DateTime<Utc>,
}

/// Hits returned by a search against one index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub hits: Vec<serde_json::Value>,
    #[serde(default)]
    pub estimated_total_hits: Option<u64>,
    #[serde(default)]
    pub processing_time_ms: u64,
}

/// Maps a team and entity kind to the index that stores those documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNaming {
    prefix: String,
}

impl IndexNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Index uid for one kind of a team's documents.
    pub fn index_uid(&self, team_id: &str, kind: EntityKind) -> Result<String> {
        validate_team_id(team_id)?;
        let suffix = match kind {
            EntityKind::Asset => "assets",
            EntityKind::AssetType => "asset-types",
            EntityKind::Tag => "tags",
        };
        Ok(format!("{}{}-{}", self.prefix, team_id, suffix))
    }

    /// Every index uid of a team, paired with its kind.
    pub fn team_indexes(&self, team_id: &str) -> Result<Vec<(EntityKind, String)>> {
        EntityKind::ALL
            .iter()
            .map(|kind| Ok((*kind, self.index_uid(team_id, *kind)?)))
            .collect()
    }
}

impl Default for IndexNaming {
    fn default() -> Self {
        Self::new(IndexConfig::DEFAULT_INDEX_PREFIX)
    }
}

/// Team ids become part of index uids, which only allow ASCII alphanumerics,
/// hyphens and underscores.
pub fn validate_team_id(team_id: &str) -> Result<()> {
    if team_id.is_empty() {
        return Err(StockroomError::validation("team_id", "must not be empty"));
    }
    if !team_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(StockroomError::validation(
            "team_id",
            format!("'{}' may only contain letters, digits, '-' and '_'", team_id),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_uids() {
        let naming = IndexNaming::new("prod_");
        assert_eq!(
            naming.index_uid("team-1", EntityKind::AssetType).unwrap(),
            "prod_team-1-asset-types"
        );

        let all = IndexNaming::default().team_indexes("t1").unwrap();
        assert_eq!(
            all,
            vec![
                (EntityKind::Asset, "t1-assets".to_string()),
                (EntityKind::AssetType, "t1-asset-types".to_string()),
                (EntityKind::Tag, "t1-tags".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_team_ids() {
        assert!(validate_team_id("").is_err());
        assert!(validate_team_id("team 1").is_err());
        assert!(validate_team_id("team/1").is_err());
        assert!(validate_team_id("Team_1-a").is_ok());
    }

    #[test]
    fn test_unknown_task_type_and_status() {
        let task_type: TaskType = serde_json::from_str("\"upgradeDatabase\"").unwrap();
        assert_eq!(task_type, TaskType::Unknown);
        let status: TaskStatus = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(status, TaskStatus::Unknown);
    }

    #[test]
    fn test_status_predicates() {
        assert!(TaskStatus::Enqueued.is_pending());
        assert!(TaskStatus::Processing.is_pending());
        assert!(!TaskStatus::Failed.is_pending());
        assert!(TaskStatus::Failed.is_failed());
        assert_eq!(TaskStatus::Canceled.to_string(), "canceled");
    }

    #[test]
    fn test_task_summary_deserialization() {
        let summary: TaskSummary = serde_json::from_value(serde_json::json!({
            "taskUid": 12,
            "indexUid": "t1-assets",
            "status": "enqueued",
            "type": "settingsUpdate",
            "enqueuedAt": "2024-03-01T10:00:00.123456Z"
        }))
        .unwrap();
        assert_eq!(summary.task_uid, 12);
        assert_eq!(summary.task_type, TaskType::SettingsUpdate);
        assert_eq!(summary.status, TaskStatus::Enqueued);
    }
}
