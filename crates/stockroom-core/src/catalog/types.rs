//! Custom-field definitions.

use crate::error::{Result, StockroomError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value type of a custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomFieldType {
    String,
    Number,
    Boolean,
    Date,
    Time,
    Datetime,
    Currency,
    Tag,
}

impl CustomFieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomFieldType::String => "string",
            CustomFieldType::Number => "number",
            CustomFieldType::Boolean => "boolean",
            CustomFieldType::Date => "date",
            CustomFieldType::Time => "time",
            CustomFieldType::Datetime => "datetime",
            CustomFieldType::Currency => "currency",
            CustomFieldType::Tag => "tag",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "string" => Ok(CustomFieldType::String),
            "number" => Ok(CustomFieldType::Number),
            "boolean" => Ok(CustomFieldType::Boolean),
            "date" => Ok(CustomFieldType::Date),
            "time" => Ok(CustomFieldType::Time),
            "datetime" => Ok(CustomFieldType::Datetime),
            "currency" => Ok(CustomFieldType::Currency),
            "tag" => Ok(CustomFieldType::Tag),
            other => Err(StockroomError::validation(
                "field_type",
                format!("unknown custom field type '{}'", other),
            )),
        }
    }
}

impl fmt::Display for CustomFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A team's custom field as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub id: String,
    pub team_id: String,
    pub name: String,
    /// Keyword name used in search queries, derived from `name`.
    pub slug: String,
    pub field_type: CustomFieldType,
    pub created_at: DateTime<Utc>,
}

impl CustomField {
    /// Create a new field with a fresh id and a slug derived from its name.
    pub fn new(team_id: impl Into<String>, name: impl Into<String>, field_type: CustomFieldType) -> Self {
        let name = name.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            team_id: team_id.into(),
            slug: slugify(&name),
            name,
            field_type,
            created_at: Utc::now(),
        }
    }
}

/// Derive a search keyword from a field name.
///
/// Alphanumeric words are joined in lower camel case; everything else
/// separates words: `"Created At"` → `createdAt`, `"serial_no."` →
/// `serialNo`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());

    for word in name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let lower = word.to_lowercase();
        if slug.is_empty() {
            slug.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                slug.extend(first.to_uppercase());
                slug.push_str(chars.as_str());
            }
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Created At"), "createdAt");
        assert_eq!(slugify("purchase price"), "purchasePrice");
        assert_eq!(slugify("serial_no."), "serialNo");
        assert_eq!(slugify("  Warranty  "), "warranty");
        assert_eq!(slugify("Größe"), "größe");
        assert_eq!(slugify("--"), "");
    }

    #[test]
    fn test_new_field_gets_slug_and_id() {
        let field = CustomField::new("team-1", "Purchase Date", CustomFieldType::Date);
        assert_eq!(field.slug, "purchaseDate");
        assert!(!field.id.is_empty());
        assert_eq!(field.team_id, "team-1");
    }

    #[test]
    fn test_field_type_roundtrip() {
        for field_type in [
            CustomFieldType::String,
            CustomFieldType::Number,
            CustomFieldType::Boolean,
            CustomFieldType::Date,
            CustomFieldType::Time,
            CustomFieldType::Datetime,
            CustomFieldType::Currency,
            CustomFieldType::Tag,
        ] {
            assert_eq!(CustomFieldType::parse(field_type.as_str()).unwrap(), field_type);
        }
        assert!(CustomFieldType::parse("color").is_err());
    }
}
