//! Stockroom Core - free-text search for an asset inventory.
//!
//! A user types something like `is:asset serial:"AB 12" price:>100 chair`.
//! This crate turns that string into free text, a filter expression and an
//! entity kind for an external Meilisearch-compatible index, using the
//! team's custom fields as the keyword vocabulary. It also reads and drives
//! the index service's asynchronous tasks.
//!
//! # Example
//!
//! ```
//! use stockroom_core::query::{compile, RecognizedKeywords};
//!
//! let keywords = RecognizedKeywords::from_slugs(["price"]);
//! let compiled = compile("is:asset price:>100 office chair", &keywords);
//!
//! assert_eq!(compiled.query.as_deref(), Some("office chair"));
//! assert_eq!(compiled.filter.as_deref(), Some("price > 100"));
//! ```

pub mod cancel;
pub mod catalog;
pub mod config;
pub mod error;
pub mod index;
pub mod network;
pub mod query;
pub mod search;
pub mod tracker;

mod api;

// Re-export commonly used types
pub use api::{StockroomApi, StockroomApiBuilder};
pub use cancel::CancellationToken;
pub use catalog::{CustomField, CustomFieldCatalog, CustomFieldType, KeywordSource, SqliteCatalog};
pub use config::IndexServiceConfig;
pub use error::{Result, StockroomError};
pub use index::{HttpIndexClient, IndexNaming, IndexService, IndexTask, TaskStatus};
pub use query::{compile, CompiledQuery, EntityKind, QueryCompiler, RecognizedKeywords};
pub use search::{KindHits, SearchPlan, SearchService};
pub use tracker::{IndexTaskTracker, TaskSnapshot, TaskWatcher};
