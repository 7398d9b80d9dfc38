//! Entity-kind classification for the `is:` keyword.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The coarse category a search can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Asset,
    AssetType,
    Tag,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Asset, EntityKind::AssetType, EntityKind::Tag];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Asset => "asset",
            EntityKind::AssetType => "asset-type",
            EntityKind::Tag => "tag",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an `is:` value to an entity kind.
///
/// The value is lower-cased and trimmed, then its first space and its first
/// underscore each become a hyphen. Unknown values yield `None`.
pub fn classify(raw: &str) -> Option<EntityKind> {
    let normalized = raw
        .trim()
        .to_lowercase()
        .replacen(' ', "-", 1)
        .replacen('_', "-", 1);

    match normalized.as_str() {
        "asset" => Some(EntityKind::Asset),
        "asset-type" | "assettype" => Some(EntityKind::AssetType),
        "tag" => Some(EntityKind::Tag),
        _ => None,
    }
}
