// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document index backed by SQLite.
//
// The index holds every committed document record but NOT the bytes; those
// live in the content store and are referenced by `storage_location`.
//
// Schema:
//   documents(
//     id                INTEGER PRIMARY KEY AUTOINCREMENT,  -- never reused
//     kind              TEXT    NOT NULL,                   -- "image" | "pdf"
//     title             TEXT    NOT NULL,
//     storage_location  TEXT    NOT NULL UNIQUE,
//     uploaded_at       TEXT    NOT NULL,                   -- RFC 3339, UTC, micros
//     width, height, channel_count                          -- images only
//     page_count, first_page_width, first_page_height       -- PDFs only
//     content_sha256    TEXT    NOT NULL,
//     byte_size         INTEGER NOT NULL
//   )

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use folio_core::error::IndexError;
use folio_core::types::{
    Document, DocumentId, DocumentKind, ImageMetadata, Metadata, NewDocument, Page, PageRequest,
    PdfMetadata, StorageLocation,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info, instrument};

/// SQLite schema. The CHECK constraint keeps metadata columns consistent with
/// the row's kind.
const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        kind              TEXT    NOT NULL CHECK (kind IN ('image', 'pdf')),
        title             TEXT    NOT NULL,
        storage_location  TEXT    NOT NULL UNIQUE,
        uploaded_at       TEXT    NOT NULL,
        width             INTEGER,
        height            INTEGER,
        channel_count     INTEGER,
        page_count        INTEGER,
        first_page_width  REAL,
        first_page_height REAL,
        content_sha256    TEXT    NOT NULL,
        byte_size         INTEGER NOT NULL,
        CHECK (
            (kind = 'image'
                AND width IS NOT NULL AND height IS NOT NULL AND channel_count IS NOT NULL
                AND page_count IS NULL AND first_page_width IS NULL AND first_page_height IS NULL)
            OR
            (kind = 'pdf'
                AND page_count IS NOT NULL AND first_page_width IS NOT NULL
                AND first_page_height IS NOT NULL
                AND width IS NULL AND height IS NULL AND channel_count IS NULL)
        )
    );
    CREATE INDEX IF NOT EXISTS documents_recency
        ON documents (kind, uploaded_at DESC, id DESC);
"#;

/// Column list shared by every SELECT; order must match `read_row`.
const SELECT_COLUMNS: &str = "id, kind, title, storage_location, uploaded_at, width, height, \
     channel_count, page_count, first_page_width, first_page_height, content_sha256, byte_size";

/// Persistent document index backed by a SQLite database.
///
/// The connection sits behind a mutex that is held for one statement or one
/// transaction at a time, never across a whole ingestion.
pub struct DocumentIndex {
    conn: Mutex<Connection>,
}

impl DocumentIndex {
    /// Open (or create) the index database at the given path.
    ///
    /// Applies WAL journal mode and creates the schema if it does not exist.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| IndexError::Database(format!("open: {e}")))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| IndexError::Database(format!("WAL pragma: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| IndexError::Database(format!("create table: {e}")))?;

        info!("document index opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self, IndexError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| IndexError::Database(format!("open in-memory: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| IndexError::Database(format!("create table: {e}")))?;

        debug!("in-memory document index opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, IndexError> {
        self.conn.lock().map_err(|_| IndexError::Poisoned)
    }

    // -- Writes ---------------------------------------------------------------

    /// Commit a fully resolved record, assigning its id and upload time.
    #[instrument(skip(self, record), fields(kind = %record.kind(), location = %record.storage_location))]
    pub fn create(&self, record: NewDocument) -> Result<Document, IndexError> {
        let uploaded_at = Utc::now().trunc_subsecs(6);
        let (image, pdf) = match &record.metadata {
            Metadata::Image(meta) => (Some(meta), None),
            Metadata::Pdf(meta) => (None, Some(meta)),
        };
        let byte_size = i64::try_from(record.byte_size)
            .map_err(|_| IndexError::Database(format!("byte size {} too large", record.byte_size)))?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (kind, title, storage_location, uploaded_at,
             width, height, channel_count, page_count, first_page_width, first_page_height,
             content_sha256, byte_size)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                record.kind().as_str(),
                record.title,
                record.storage_location.as_str(),
                timestamp(&uploaded_at),
                image.map(|m| m.width),
                image.map(|m| m.height),
                image.map(|m| m.channel_count),
                pdf.map(|m| m.page_count),
                pdf.map(|m| m.first_page_width),
                pdf.map(|m| m.first_page_height),
                record.content_sha256,
                byte_size,
            ],
        )
        .map_err(|e| IndexError::Database(format!("insert document: {e}")))?;
        let id = DocumentId(conn.last_insert_rowid());
        drop(conn);

        info!(document_id = %id, "document committed");
        Ok(Document {
            id,
            title: record.title,
            storage_location: record.storage_location,
            uploaded_at,
            metadata: record.metadata,
            content_sha256: record.content_sha256,
            byte_size: record.byte_size,
        })
    }

    /// Remove a record and return it. `None` when no such record existed, so
    /// repeated deletes are harmless.
    #[instrument(skip_all, fields(document_id = %id))]
    pub fn delete(&self, id: DocumentId) -> Result<Option<Document>, IndexError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| IndexError::Database(format!("begin delete: {e}")))?;

        let existing = select_one(&tx, id)?;
        if existing.is_some() {
            tx.execute("DELETE FROM documents WHERE id = ?1", params![id.0])
                .map_err(|e| IndexError::Database(format!("delete document: {e}")))?;
        }
        tx.commit()
            .map_err(|e| IndexError::Database(format!("commit delete: {e}")))?;

        match &existing {
            Some(_) => info!("document removed from index"),
            None => debug!("document already absent from index"),
        }
        Ok(existing)
    }

    // -- Reads ----------------------------------------------------------------

    /// Retrieve a single record by id.
    #[instrument(skip_all, fields(document_id = %id))]
    pub fn get(&self, id: DocumentId) -> Result<Document, IndexError> {
        let conn = self.lock()?;
        select_one(&conn, id)?.ok_or(IndexError::NotFound(id))
    }

    /// One page of records, newest first (ties broken by id, newest first).
    /// `kind = None` lists every kind.
    #[instrument(skip_all, fields(kind = ?kind, offset = request.offset, limit = request.limit))]
    pub fn list(
        &self,
        kind: Option<DocumentKind>,
        request: PageRequest,
    ) -> Result<Page<Document>, IndexError> {
        let kind_tag = kind.map(|k| k.as_str());
        let limit = i64::from(request.limit.max(1));
        let offset = i64::try_from(request.offset).unwrap_or(i64::MAX);

        let conn = self.lock()?;
        let total = count_rows(&conn, kind_tag)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM documents
                 WHERE ?1 IS NULL OR kind = ?1
                 ORDER BY uploaded_at DESC, id DESC
                 LIMIT ?2 OFFSET ?3"
            ))
            .map_err(|e| IndexError::Database(format!("prepare list: {e}")))?;

        let rows = stmt
            .query_map(params![kind_tag, limit, offset], read_row)
            .map_err(|e| IndexError::Database(format!("query list: {e}")))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| IndexError::Database(format!("collect rows: {e}")))?;
        drop(stmt);
        drop(conn);

        let items = rows
            .into_iter()
            .map(DocumentRow::into_document)
            .collect::<Result<Vec<_>, _>>()?;

        let reached = request.offset.saturating_add(items.len() as u64);
        let next_offset = (!items.is_empty() && reached < total).then_some(reached);

        debug!(count = items.len(), total, "listed documents");
        Ok(Page {
            items,
            next_offset,
            total,
        })
    }

    /// Number of records of `kind` (all kinds when `None`).
    pub fn count(&self, kind: Option<DocumentKind>) -> Result<u64, IndexError> {
        let conn = self.lock()?;
        count_rows(&conn, kind.map(|k| k.as_str()))
    }

    /// Storage locations referenced by any record.
    pub fn storage_locations(&self) -> Result<HashSet<StorageLocation>, IndexError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT storage_location FROM documents")
            .map_err(|e| IndexError::Database(format!("prepare locations: {e}")))?;

        let locations = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| IndexError::Database(format!("query locations: {e}")))?
            .map(|key| key.map(StorageLocation::new))
            .collect::<Result<HashSet<_>, _>>()
            .map_err(|e| IndexError::Database(format!("collect locations: {e}")))?;
        Ok(locations)
    }
}

// ---------------------------------------------------------------------------
// Query helpers
// ---------------------------------------------------------------------------

fn select_one(conn: &Connection, id: DocumentId) -> Result<Option<Document>, IndexError> {
    conn.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM documents WHERE id = ?1"),
        params![id.0],
        read_row,
    )
    .optional()
    .map_err(|e| IndexError::Database(format!("query document: {e}")))?
    .map(DocumentRow::into_document)
    .transpose()
}

fn count_rows(conn: &Connection, kind_tag: Option<&str>) -> Result<u64, IndexError> {
    let total: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM documents WHERE ?1 IS NULL OR kind = ?1",
            params![kind_tag],
            |row| row.get(0),
        )
        .map_err(|e| IndexError::Database(format!("count documents: {e}")))?;
    Ok(total.max(0) as u64)
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Raw column values of one `documents` row, before domain validation.
struct DocumentRow {
    id: i64,
    kind: String,
    title: String,
    storage_location: String,
    uploaded_at: String,
    width: Option<i64>,
    height: Option<i64>,
    channel_count: Option<i64>,
    page_count: Option<i64>,
    first_page_width: Option<f64>,
    first_page_height: Option<f64>,
    content_sha256: String,
    byte_size: i64,
}

/// Column indices must match `SELECT_COLUMNS`.
fn read_row(row: &Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        title: row.get(2)?,
        storage_location: row.get(3)?,
        uploaded_at: row.get(4)?,
        width: row.get(5)?,
        height: row.get(6)?,
        channel_count: row.get(7)?,
        page_count: row.get(8)?,
        first_page_width: row.get(9)?,
        first_page_height: row.get(10)?,
        content_sha256: row.get(11)?,
        byte_size: row.get(12)?,
    })
}

impl DocumentRow {
    fn into_document(self) -> Result<Document, IndexError> {
        let id = self.id;
        let corrupt = |reason: String| IndexError::CorruptRow { id, reason };

        let kind: DocumentKind = self.kind.parse().map_err(corrupt)?;
        let metadata = match kind {
            DocumentKind::Image => Metadata::Image(ImageMetadata {
                width: narrow(self.width, "width").map_err(corrupt)?,
                height: narrow(self.height, "height").map_err(corrupt)?,
                channel_count: narrow(self.channel_count, "channel_count").map_err(corrupt)?,
            }),
            DocumentKind::Pdf => Metadata::Pdf(PdfMetadata {
                page_count: narrow(self.page_count, "page_count").map_err(corrupt)?,
                first_page_width: self
                    .first_page_width
                    .ok_or_else(|| corrupt("first_page_width is NULL".into()))?,
                first_page_height: self
                    .first_page_height
                    .ok_or_else(|| corrupt("first_page_height is NULL".into()))?,
            }),
        };

        let uploaded_at = DateTime::parse_from_rfc3339(&self.uploaded_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| corrupt(format!("uploaded_at: {e}")))?;
        let byte_size =
            u64::try_from(self.byte_size).map_err(|_| corrupt("negative byte_size".into()))?;

        Ok(Document {
            id: DocumentId(id),
            title: self.title,
            storage_location: StorageLocation::new(self.storage_location),
            uploaded_at,
            metadata,
            content_sha256: self.content_sha256,
            byte_size,
        })
    }
}

/// Narrow a nullable integer column into the metadata field's type.
fn narrow<T: TryFrom<i64>>(value: Option<i64>, column: &str) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("{column} is NULL"))?;
    T::try_from(value).map_err(|_| format!("{column} value {value} out of range"))
}
