//! Free-text search query compiler.
//!
//! Turns a typed search string such as
//!
//! ```text
//! is:asset purchasePrice:>100 createdAt:<2024-01-01 "office chair"
//! ```
//!
//! into the free text (`"office chair"`), a filter expression for the index
//! (`purchasePrice > 100 AND createdAt < 1704067200000`) and an entity kind
//! (`asset`).
//!
//! Everything here is pure and synchronous. The vocabulary of keywords is
//! passed in on every call because it depends on the team's custom fields.
//! Nothing in this module fails: malformed input degrades to plain text or
//! string literals.

mod compiler;
mod filter;
mod kind;
mod normalize;
mod proptests;
mod tokenizer;

pub use compiler::{compile, CompiledQuery, IndexQuery, QueryCompiler};
pub use filter::{quote_literal, FilterSyntax, MeiliFilterSyntax};
pub use kind::{classify, EntityKind};
pub use normalize::{normalize, parse_iso8601_millis, Comparison, FilterValue, NormalizedValue};
pub use tokenizer::{tokenize, Offset, RecognizedKeywords, Tokenized, IS_KEYWORD};
