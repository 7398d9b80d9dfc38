//! Compiles a raw search string into free text, a filter expression and an
//! entity kind.

use super::filter::{FilterSyntax, MeiliFilterSyntax};
use super::kind::{classify, EntityKind};
use super::normalize::normalize;
use super::tokenizer::{tokenize, Offset, RecognizedKeywords, Tokenized, IS_KEYWORD};
use serde::{Deserialize, Serialize};

/// Result of compiling a search string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompiledQuery {
    /// Leftover free text, single-space joined. `None` when every token was
    /// a keyword pair.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Conjunctive filter expression. `None` when no filter terms were
    /// produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Entity kind selected by the last `is:` keyword, if it was recognized.
    #[serde(rename = "is", skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntityKind>,
}

impl CompiledQuery {
    /// The `{q, filter}` pair sent to the index service.
    pub fn to_index_query(&self) -> IndexQuery {
        IndexQuery {
            q: self.query.clone(),
            filter: self.filter.clone(),
        }
    }
}

/// Query body accepted by the index service's search call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Query compiler parameterised by a filter syntax.
///
/// Holds no per-call state; one instance can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler<S = MeiliFilterSyntax> {
    syntax: S,
}

impl QueryCompiler<MeiliFilterSyntax> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: FilterSyntax> QueryCompiler<S> {
    /// Use a different filter grammar.
    pub fn with_syntax(syntax: S) -> Self {
        Self { syntax }
    }

    /// Compile a raw query against the given keyword vocabulary.
    pub fn compile(&self, raw: &str, keywords: &RecognizedKeywords) -> CompiledQuery {
        match tokenize(raw, keywords) {
            Tokenized::PlainText(text) => {
                let text = text.trim();
                CompiledQuery {
                    query: (!text.is_empty()).then(|| text.to_string()),
                    filter: None,
                    kind: None,
                }
            }
            Tokenized::Offsets(offsets) => self.compile_offsets(&offsets),
        }
    }

    /// Compile already-extracted offsets.
    pub fn compile_offsets(&self, offsets: &[Offset]) -> CompiledQuery {
        let mut terms = Vec::new();
        let mut text = Vec::new();
        let mut kind = None;

        for offset in offsets {
            match offset {
                Offset::Keyword { keyword, value, .. } if keyword == IS_KEYWORD => {
                    // Last one wins, including an unrecognized value.
                    kind = classify(value);
                }
                Offset::Keyword { keyword, value, .. } => {
                    let normalized = normalize(value);
                    terms.push(self.syntax.term(keyword, normalized.operator, &normalized.value));
                }
                Offset::Text { text: token, .. } => text.push(token.as_str()),
            }
        }

        CompiledQuery {
            query: (!text.is_empty()).then(|| text.join(" ")),
            filter: (!terms.is_empty()).then(|| self.syntax.all_of(&terms)),
            kind,
        }
    }
}

/// Compile with the default Meilisearch filter syntax.
pub fn compile(raw: &str, keywords: &RecognizedKeywords) -> CompiledQuery {
    QueryCompiler::new().compile(raw, keywords)
}
