//! Persistent store for languages and cached translations.
//!
//! Mirrors the shape of the domain model: a `languages` table keyed by ISO
//! code and a `translations` table holding one record per (key, language)
//! pair. The (key, language_code) uniqueness is backed by a real UNIQUE
//! index, and `create_translation` inserts with ON CONFLICT DO NOTHING and
//! re-reads, so two concurrent writers racing on the same new pair converge
//! on a single canonical row.

use crate::error::{ServiceError, ServiceResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Activation status of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageStatus {
    Active,
    Inactive,
}

impl LanguageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageStatus::Active => "active",
            LanguageStatus::Inactive => "inactive",
        }
    }

    fn from_column(value: &str) -> LanguageStatus {
        match value {
            "inactive" => LanguageStatus::Inactive,
            _ => LanguageStatus::Active,
        }
    }
}

/// Free-form display metadata attached to a language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageMetadata {
    /// Script direction, "ltr" or "rtl".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
}

/// A registered language.
#[derive(Debug, Clone, Serialize)]
pub struct Language {
    /// ISO 639-1 language code; primary identifier.
    pub code: String,
    pub name: String,
    pub local_name: Option<String>,
    /// Display glyph, e.g. a flag emoji.
    pub flag: Option<String>,
    pub status: LanguageStatus,
    pub is_default: bool,
    pub metadata: Option<LanguageMetadata>,
}

/// Optional tags describing where in the UI a translation is used.
///
/// Stored for bookkeeping and audit only; context never participates in
/// cache key derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// A cached translation with its approval and usage metadata.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationRecord {
    pub id: i64,
    /// Derived cache key, see [`crate::keys::derive_key`].
    pub key: String,
    pub original: String,
    pub destination: String,
    pub language_code: String,
    pub context: Option<TranslationContext>,
    pub is_approved: bool,
    pub approved_by: Option<String>,
    pub approved_at: Option<String>,
    pub usage_count: i64,
    pub last_used_at: Option<String>,
    pub created_at: String,
}

/// Fields for creating a new translation record.
#[derive(Debug, Clone)]
pub struct NewTranslation {
    pub key: String,
    pub original: String,
    pub destination: String,
    pub language_code: String,
    pub context: Option<TranslationContext>,
}

/// Page request. Pages are 1-indexed.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "Pagination::default_page")]
    pub page: u32,
    #[serde(default = "Pagination::default_per_page")]
    pub per_page: u32,
}

impl Pagination {
    fn default_page() -> u32 {
        1
    }

    fn default_per_page() -> u32 {
        20
    }

    fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, per_page: 20 }
    }
}

/// A page of results plus the total count.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database and set up the schema.
    pub fn new(database_path: &str) -> ServiceResult<Self> {
        let conn = Connection::open(database_path)?;
        Self::create_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database; used by tests and demos.
    pub fn in_memory() -> ServiceResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::create_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn create_schema(conn: &Connection) -> ServiceResult<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS languages (
                code TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                local_name TEXT,
                flag TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                is_default INTEGER NOT NULL DEFAULT 0,
                metadata TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS translations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL,
                original TEXT NOT NULL,
                destination TEXT NOT NULL,
                language_code TEXT NOT NULL,
                context TEXT,
                is_approved INTEGER NOT NULL DEFAULT 0,
                approved_by TEXT,
                approved_at TEXT,
                usage_count INTEGER NOT NULL DEFAULT 0,
                last_used_at TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_translations_key_language
             ON translations (key, language_code)",
            [],
        )?;

        Ok(())
    }

    // ==================== Languages ====================

    /// Insert a new language. When the language is flagged as default, the
    /// previous default is cleared in the same transaction so readers never
    /// observe zero or two defaults.
    pub fn insert_language(&self, language: &Language) -> ServiceResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if language.is_default {
            tx.execute("UPDATE languages SET is_default = 0 WHERE is_default = 1", [])?;
        }

        tx.execute(
            "INSERT INTO languages (code, name, local_name, flag, status, is_default, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                language.code,
                language.name,
                language.local_name,
                language.flag,
                language.status.as_str(),
                language.is_default as i64,
                encode_json(&language.metadata)?,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Overwrite a language record, applying the same transactional
    /// default-swap as [`Database::insert_language`].
    ///
    /// Returns false when no language with that code exists.
    pub fn save_language(&self, language: &Language) -> ServiceResult<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if language.is_default {
            tx.execute(
                "UPDATE languages SET is_default = 0 WHERE is_default = 1 AND code != ?1",
                params![language.code],
            )?;
        }

        let rows = tx.execute(
            "UPDATE languages
             SET name = ?1, local_name = ?2, flag = ?3, status = ?4, is_default = ?5, metadata = ?6
             WHERE code = ?7",
            params![
                language.name,
                language.local_name,
                language.flag,
                language.status.as_str(),
                language.is_default as i64,
                encode_json(&language.metadata)?,
                language.code,
            ],
        )?;

        tx.commit()?;
        Ok(rows > 0)
    }

    pub fn get_language(&self, code: &str) -> ServiceResult<Option<Language>> {
        let conn = self.conn.lock().unwrap();
        let language = conn
            .query_row(
                "SELECT code, name, local_name, flag, status, is_default, metadata
                 FROM languages WHERE code = ?1",
                params![code],
                map_language_row,
            )
            .optional()?;
        Ok(language)
    }

    pub fn list_active_languages(&self) -> ServiceResult<Vec<Language>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT code, name, local_name, flag, status, is_default, metadata
             FROM languages WHERE status = 'active' ORDER BY code",
        )?;
        let languages = stmt
            .query_map([], map_language_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(languages)
    }

    pub fn list_languages_paged(&self, pagination: Pagination) -> ServiceResult<Page<Language>> {
        let conn = self.conn.lock().unwrap();

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM languages", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(
            "SELECT code, name, local_name, flag, status, is_default, metadata
             FROM languages ORDER BY code LIMIT ?1 OFFSET ?2",
        )?;
        let items = stmt
            .query_map(params![pagination.per_page, pagination.offset()], map_language_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
        })
    }

    /// Remove a language. Returns false when no such language exists.
    pub fn delete_language(&self, code: &str) -> ServiceResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute("DELETE FROM languages WHERE code = ?1", params![code])?;
        Ok(rows > 0)
    }

    /// The current default language, if any.
    pub fn default_language(&self) -> ServiceResult<Option<Language>> {
        let conn = self.conn.lock().unwrap();
        let language = conn
            .query_row(
                "SELECT code, name, local_name, flag, status, is_default, metadata
                 FROM languages WHERE is_default = 1",
                [],
                map_language_row,
            )
            .optional()?;
        Ok(language)
    }

    // ==================== Translations ====================

    /// Create a translation record, tolerating a concurrent writer on the
    /// same (key, language) pair.
    ///
    /// Returns the canonical record plus whether this call inserted it. When
    /// the pair already exists the existing row is returned unchanged with
    /// `created == false`.
    pub fn create_translation(
        &self,
        new: &NewTranslation,
    ) -> ServiceResult<(TranslationRecord, bool)> {
        let conn = self.conn.lock().unwrap();
        let created_at = Utc::now().to_rfc3339();

        let inserted = conn.execute(
            "INSERT INTO translations
                 (key, original, destination, language_code, context, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (key, language_code) DO NOTHING",
            params![
                new.key,
                new.original,
                new.destination,
                new.language_code,
                encode_json(&new.context)?,
                created_at,
            ],
        )?;

        let record = conn
            .query_row(
                &format!(
                    "SELECT {TRANSLATION_COLUMNS} FROM translations
                     WHERE key = ?1 AND language_code = ?2"
                ),
                params![new.key, new.language_code],
                map_translation_row,
            )
            .optional()?
            .ok_or_else(|| {
                ServiceError::Storage(rusqlite::Error::QueryReturnedNoRows)
            })?;

        Ok((record, inserted > 0))
    }

    pub fn find_by_key_and_language(
        &self,
        key: &str,
        language_code: &str,
    ) -> ServiceResult<Option<TranslationRecord>> {
        let conn = self.conn.lock().unwrap();
        let record = conn
            .query_row(
                &format!(
                    "SELECT {TRANSLATION_COLUMNS} FROM translations
                     WHERE key = ?1 AND language_code = ?2"
                ),
                params![key, language_code],
                map_translation_row,
            )
            .optional()?;
        Ok(record)
    }

    pub fn get_translation(&self, id: i64) -> ServiceResult<Option<TranslationRecord>> {
        let conn = self.conn.lock().unwrap();
        let record = conn
            .query_row(
                &format!("SELECT {TRANSLATION_COLUMNS} FROM translations WHERE id = ?1"),
                params![id],
                map_translation_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Patch the mutable fields of a translation. Returns false when no such
    /// record exists.
    pub fn update_translation(
        &self,
        id: i64,
        destination: &str,
        context: &Option<TranslationContext>,
    ) -> ServiceResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE translations SET destination = ?1, context = ?2 WHERE id = ?3",
            params![destination, encode_json(context)?, id],
        )?;
        Ok(rows > 0)
    }

    /// Bump the usage counter as a single in-place update so concurrent
    /// cache hits on the same record never lose increments to each other.
    pub fn increment_usage(&self, id: i64) -> ServiceResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE translations
             SET usage_count = usage_count + 1, last_used_at = ?1
             WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    /// Mark a record approved. Returns false when the record was already
    /// approved (the WHERE clause guards the once-only rule at the storage
    /// layer too).
    pub fn approve_translation(&self, id: i64, approved_by: &str) -> ServiceResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE translations
             SET is_approved = 1, approved_by = ?1, approved_at = ?2
             WHERE id = ?3 AND is_approved = 0",
            params![approved_by, Utc::now().to_rfc3339(), id],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_translation(&self, id: i64) -> ServiceResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute("DELETE FROM translations WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn find_pending_approval(&self) -> ServiceResult<Vec<TranslationRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRANSLATION_COLUMNS} FROM translations
             WHERE is_approved = 0 ORDER BY created_at"
        ))?;
        let records = stmt
            .query_map([], map_translation_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn count_by_language(&self, language_code: &str) -> ServiceResult<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM translations WHERE language_code = ?1",
            params![language_code],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn count_approved_by_language(&self, language_code: &str) -> ServiceResult<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM translations WHERE language_code = ?1 AND is_approved = 1",
            params![language_code],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Substring search over original, destination and key.
    pub fn search_translations(
        &self,
        query: &str,
        pagination: Pagination,
    ) -> ServiceResult<Page<TranslationRecord>> {
        let conn = self.conn.lock().unwrap();
        let pattern = format!("%{}%", query);

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM translations
             WHERE original LIKE ?1 OR destination LIKE ?1 OR key LIKE ?1",
            params![pattern],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {TRANSLATION_COLUMNS} FROM translations
             WHERE original LIKE ?1 OR destination LIKE ?1 OR key LIKE ?1
             ORDER BY id LIMIT ?2 OFFSET ?3"
        ))?;
        let items = stmt
            .query_map(
                params![pattern, pagination.per_page, pagination.offset()],
                map_translation_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
        })
    }

    pub fn find_paginated(&self, pagination: Pagination) -> ServiceResult<Page<TranslationRecord>> {
        let conn = self.conn.lock().unwrap();

        let total: i64 =
            conn.query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {TRANSLATION_COLUMNS} FROM translations ORDER BY id LIMIT ?1 OFFSET ?2"
        ))?;
        let items = stmt
            .query_map(params![pagination.per_page, pagination.offset()], map_translation_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
        })
    }
}

const TRANSLATION_COLUMNS: &str = "id, key, original, destination, language_code, context, \
     is_approved, approved_by, approved_at, usage_count, last_used_at, created_at";

fn map_language_row(row: &Row<'_>) -> rusqlite::Result<Language> {
    Ok(Language {
        code: row.get(0)?,
        name: row.get(1)?,
        local_name: row.get(2)?,
        flag: row.get(3)?,
        status: LanguageStatus::from_column(&row.get::<_, String>(4)?),
        is_default: row.get::<_, i64>(5)? != 0,
        metadata: decode_json(row.get::<_, Option<String>>(6)?),
    })
}

fn map_translation_row(row: &Row<'_>) -> rusqlite::Result<TranslationRecord> {
    Ok(TranslationRecord {
        id: row.get(0)?,
        key: row.get(1)?,
        original: row.get(2)?,
        destination: row.get(3)?,
        language_code: row.get(4)?,
        context: decode_json(row.get::<_, Option<String>>(5)?),
        is_approved: row.get::<_, i64>(6)? != 0,
        approved_by: row.get(7)?,
        approved_at: row.get(8)?,
        usage_count: row.get(9)?,
        last_used_at: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn encode_json<T: Serialize>(value: &Option<T>) -> ServiceResult<Option<String>> {
    match value {
        Some(v) => serde_json::to_string(v)
            .map(Some)
            .map_err(|e| ServiceError::Storage(rusqlite::Error::ToSqlConversionFailure(Box::new(e)))),
        None => Ok(None),
    }
}

fn decode_json<T: for<'de> Deserialize<'de>>(column: Option<String>) -> Option<T> {
    column.and_then(|raw| serde_json::from_str(&raw).ok())
}
