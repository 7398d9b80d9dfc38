//! Custom-field catalog and the per-request keyword vocabulary built from it.
//!
//! This module provides:
//! - The [`CustomFieldCatalog`] contract consumed by search
//! - A SQLite implementation ([`SqliteCatalog`])
//! - [`KeywordSource`], which turns a team's slugs into
//!   [`RecognizedKeywords`](crate::query::RecognizedKeywords)

mod sqlite;
mod types;

pub use sqlite::SqliteCatalog;
pub use types::{slugify, CustomField, CustomFieldType};

use crate::query::RecognizedKeywords;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Read access to a team's custom-field definitions.
///
/// Implementations must report failures as errors rather than returning an
/// empty list, so callers can tell "no custom fields" from "catalog down".
#[async_trait]
pub trait CustomFieldCatalog: Send + Sync {
    /// Slugs of the team's custom fields that may be used as search keywords.
    async fn custom_field_slugs(&self, team_id: &str) -> Result<Vec<String>>;
}

/// Resolves the recognized keyword set for a team, fresh on every call.
#[derive(Clone)]
pub struct KeywordSource {
    catalog: Arc<dyn CustomFieldCatalog>,
}

impl KeywordSource {
    pub fn new(catalog: Arc<dyn CustomFieldCatalog>) -> Self {
        Self { catalog }
    }

    /// `{"is"} ∪ custom_field_slugs(team_id)`.
    pub async fn recognized_keywords(&self, team_id: &str) -> Result<RecognizedKeywords> {
        let slugs = self.catalog.custom_field_slugs(team_id).await?;
        debug!("Team {} has {} custom-field keywords", team_id, slugs.len());
        Ok(RecognizedKeywords::from_slugs(slugs))
    }

    /// The underlying catalog.
    pub fn catalog(&self) -> &Arc<dyn CustomFieldCatalog> {
        &self.catalog
    }
}

impl std::fmt::Debug for KeywordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordSource").finish_non_exhaustive()
    }
}
