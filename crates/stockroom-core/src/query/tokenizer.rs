//! Query tokenizer and `keyword:value` extraction.

use serde::Serialize;
use std::collections::HashSet;

/// The built-in keyword that selects an entity kind.
pub const IS_KEYWORD: &str = "is";

/// Set of keyword names eligible for `keyword:value` extraction.
///
/// Always contains [`IS_KEYWORD`]; the rest comes from a team's custom-field
/// slugs and must be rebuilt per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedKeywords {
    names: HashSet<String>,
}

impl RecognizedKeywords {
    /// A set holding only the built-in `is` keyword.
    pub fn new() -> Self {
        let mut names = HashSet::new();
        names.insert(IS_KEYWORD.to_string());
        Self { names }
    }

    /// Build a set from custom-field slugs. Empty slugs are ignored.
    pub fn from_slugs<I, S>(slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keywords = Self::new();
        for slug in slugs {
            keywords.insert(slug);
        }
        keywords
    }

    /// Add a keyword name.
    pub fn insert(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !name.is_empty() {
            self.names.insert(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Keyword names in sorted order.
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for RecognizedKeywords {
    fn default() -> Self {
        Self::new()
    }
}

/// A token from the raw query annotated with its byte range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Offset {
    /// A recognized `keyword:value` pair. The value has its surrounding
    /// quotes removed.
    Keyword {
        keyword: String,
        value: String,
        start: usize,
        end: usize,
    },
    /// Any other token, verbatim.
    Text { text: String, start: usize, end: usize },
}

impl Offset {
    pub fn start(&self) -> usize {
        match self {
            Offset::Keyword { start, .. } | Offset::Text { start, .. } => *start,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            Offset::Keyword { end, .. } | Offset::Text { end, .. } => *end,
        }
    }

    pub fn is_keyword(&self) -> bool {
        matches!(self, Offset::Keyword { .. })
    }
}

/// Outcome of tokenizing a query. Both variants are successful results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tokenized<'a> {
    /// No recognized keyword was present; the raw query is returned as is.
    PlainText(&'a str),
    /// At least one recognized keyword was extracted.
    Offsets(Vec<Offset>),
}

/// Split a query into text and keyword offsets.
///
/// Whitespace outside double quotes separates tokens. An unterminated quote
/// runs to the end of the input. A token is a keyword offset only when the
/// part before its first colon is in `keywords` and the part after it is
/// non-empty.
pub fn tokenize<'a>(query: &'a str, keywords: &RecognizedKeywords) -> Tokenized<'a> {
    let offsets: Vec<Offset> = split_tokens(query)
        .into_iter()
        .map(|(start, end)| classify_token(&query[start..end], start, end, keywords))
        .collect();

    if offsets.iter().any(Offset::is_keyword) {
        Tokenized::Offsets(offsets)
    } else {
        Tokenized::PlainText(query)
    }
}

/// Byte ranges of whitespace-separated tokens, honouring double quotes.
fn split_tokens(query: &str) -> Vec<(usize, usize)> {
    let mut tokens = Vec::new();
    let mut token_start: Option<usize> = None;
    let mut in_quote = false;

    for (idx, ch) in query.char_indices() {
        if ch.is_whitespace() && !in_quote {
            if let Some(start) = token_start.take() {
                tokens.push((start, idx));
            }
            continue;
        }

        if token_start.is_none() {
            token_start = Some(idx);
        }
        if ch == '"' {
            in_quote = !in_quote;
        }
    }

    // Only an unterminated quote reaches here with trailing whitespace.
    if let Some(start) = token_start {
        tokens.push((start, query.trim_end().len()));
    }

    tokens
}

fn classify_token(token: &str, start: usize, end: usize, keywords: &RecognizedKeywords) -> Offset {
    if let Some((keyword, raw_value)) = token.split_once(':') {
        if !raw_value.is_empty() && keywords.contains(keyword) {
            return Offset::Keyword {
                keyword: keyword.to_string(),
                value: strip_quotes(raw_value).to_string(),
                start,
                end,
            };
        }
    }

    Offset::Text {
        text: token.to_string(),
        start,
        end,
    }
}

/// Remove one pair of surrounding double quotes, or a lone leading quote
/// left by an unterminated span.
fn strip_quotes(value: &str) -> &str {
    match value.strip_prefix('"') {
        Some(inner) => inner.strip_suffix('"').unwrap_or(inner),
        None => value,
    }
}
