//! Filter expression syntax for the external index.
//!
//! The compiler decides which terms to emit; a [`FilterSyntax`] decides how
//! they are spelled. [`MeiliFilterSyntax`] targets the Meilisearch filter
//! grammar:
//! - `name:"Hello World"` → `name = "Hello World"`
//! - `price:>100` → `price > 100`
//! - `createdAt:<2024-01-01` → `createdAt < 1704067200000`

use super::normalize::{Comparison, FilterValue};

/// Spelling of filter terms and their conjunction.
pub trait FilterSyntax: Send + Sync {
    /// Render one `field operator value` term.
    fn term(&self, field: &str, operator: Comparison, value: &FilterValue) -> String;

    /// Join terms so that all of them must hold. Never called with an empty
    /// slice.
    fn all_of(&self, terms: &[String]) -> String;
}

/// Meilisearch filter expressions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeiliFilterSyntax;

impl FilterSyntax for MeiliFilterSyntax {
    fn term(&self, field: &str, operator: Comparison, value: &FilterValue) -> String {
        let literal = match value {
            FilterValue::Number(number) => number.clone(),
            FilterValue::Timestamp(millis) => millis.to_string(),
            FilterValue::Text(text) => quote_literal(text),
        };
        format!("{} {} {}", field, operator, literal)
    }

    fn all_of(&self, terms: &[String]) -> String {
        terms.join(" AND ")
    }
}

/// Wrap a string in double quotes, escaping backslashes and quotes.
pub fn quote_literal(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}
