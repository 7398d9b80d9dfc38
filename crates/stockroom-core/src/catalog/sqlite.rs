//! SQLite-backed custom-field catalog.

use super::types::{slugify, CustomField, CustomFieldType};
use super::CustomFieldCatalog;
use crate::{Result, StockroomError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Custom-field catalog stored in SQLite.
///
/// Reads always hit the database; nothing is cached between calls so renamed
/// or deleted fields are visible to the very next search.
#[derive(Clone)]
pub struct SqliteCatalog {
    db_path: Option<PathBuf>,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalog {
    /// Create or open a catalog at the given path.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| StockroomError::Database {
                    message: format!("Failed to create directory {}: {}", parent.display(), e),
                    source: None,
                })?;
            }
        }

        let conn = Connection::open(&db_path)?;
        Self::configure_connection(&conn)?;
        Self::ensure_schema(&conn)?;

        Ok(Self {
            db_path: Some(db_path),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a private in-memory catalog.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::ensure_schema(&conn)?;

        Ok(Self {
            db_path: None,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA busy_timeout=30000;
            PRAGMA synchronous=NORMAL;
            ",
        )?;
        Ok(())
    }

    fn ensure_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS custom_fields (
                id TEXT PRIMARY KEY,
                team_id TEXT NOT NULL,
                name TEXT NOT NULL,
                slug TEXT NOT NULL,
                field_type TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_custom_fields_team ON custom_fields(team_id)",
            [],
        )?;

        Ok(())
    }

    /// Path of the database file, `None` for in-memory catalogs.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StockroomError::Database {
            message: "Failed to acquire connection lock".to_string(),
            source: None,
        })
    }

    /// Insert or update a field.
    pub fn upsert_field(&self, field: &CustomField) -> Result<()> {
        if field.team_id.trim().is_empty() {
            return Err(StockroomError::validation("team_id", "must not be empty"));
        }
        if field.slug.is_empty() {
            return Err(empty_slug(&field.name));
        }

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO custom_fields (id, team_id, name, slug, field_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                 team_id=excluded.team_id,
                 name=excluded.name,
                 slug=excluded.slug,
                 field_type=excluded.field_type",
            params![
                field.id,
                field.team_id,
                field.name,
                field.slug,
                field.field_type.as_str(),
                field.created_at.to_rfc3339(),
            ],
        )?;

        debug!("Upserted custom field {} ({})", field.slug, field.id);
        Ok(())
    }

    /// Rename a field, re-deriving its slug. Returns `false` if no such field.
    pub fn rename_field(&self, id: &str, new_name: &str) -> Result<bool> {
        let slug = slugify(new_name);
        if slug.is_empty() {
            return Err(empty_slug(new_name));
        }

        let conn = self.lock()?;
        let rows = conn.execute(
            "UPDATE custom_fields SET name = ?2, slug = ?3 WHERE id = ?1",
            params![id, new_name, slug],
        )?;
        Ok(rows > 0)
    }

    /// Delete a field. Returns `false` if no such field.
    pub fn delete_field(&self, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM custom_fields WHERE id = ?1", params![id])?;
        if rows > 0 {
            debug!("Deleted custom field {}", id);
        }
        Ok(rows > 0)
    }

    /// Get a field by id.
    pub fn get_field(&self, id: &str) -> Result<Option<CustomField>> {
        let conn = self.lock()?;
        let field = conn
            .query_row(
                "SELECT id, team_id, name, slug, field_type, created_at
                 FROM custom_fields WHERE id = ?1",
                params![id],
                row_to_raw,
            )
            .optional()?;

        field.map(RawField::into_field).transpose()
    }

    /// All fields of a team ordered by creation time.
    pub fn list_fields(&self, team_id: &str) -> Result<Vec<CustomField>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, team_id, name, slug, field_type, created_at
             FROM custom_fields WHERE team_id = ?1
             ORDER BY created_at, name",
        )?;

        let rows = stmt.query_map(params![team_id], row_to_raw)?;
        let mut fields = Vec::new();
        for row in rows {
            fields.push(row?.into_field()?);
        }
        Ok(fields)
    }

    fn slugs_for_team(&self, team_id: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT slug FROM custom_fields
             WHERE team_id = ?1 AND slug <> ''
             ORDER BY slug",
        )?;
        let slugs = stmt
            .query_map(params![team_id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(slugs)
    }
}

#[async_trait]
impl CustomFieldCatalog for SqliteCatalog {
    async fn custom_field_slugs(&self, team_id: &str) -> Result<Vec<String>> {
        self.slugs_for_team(team_id)
    }
}

impl std::fmt::Debug for SqliteCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCatalog")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// Row as stored, before the type and timestamp are parsed.
struct RawField {
    id: String,
    team_id: String,
    name: String,
    slug: String,
    field_type: String,
    created_at: String,
}

impl RawField {
    fn into_field(self) -> Result<CustomField> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StockroomError::Database {
                message: format!("Invalid created_at for field {}: {}", self.id, e),
                source: None,
            })?;

        Ok(CustomField {
            field_type: CustomFieldType::parse(&self.field_type)?,
            id: self.id,
            team_id: self.team_id,
            name: self.name,
            slug: self.slug,
            created_at,
        })
    }
}

fn row_to_raw(row: &Row<'_>) -> rusqlite::Result<RawField> {
    Ok(RawField {
        id: row.get(0)?,
        team_id: row.get(1)?,
        name: row.get(2)?,
        slug: row.get(3)?,
        field_type: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn empty_slug(name: &str) -> StockroomError {
    StockroomError::validation(
        "name",
        format!("'{}' has no letters or digits to form a keyword", name),
    )
}
