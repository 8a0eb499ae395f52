//! SQLite reference backends
//!
//! Durable metadata and feature stores on rusqlite. Connections sit behind a
//! mutex and every call hops through `spawn_blocking` so the async capability
//! surface never blocks a runtime worker on disk IO.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{MemoryError, Result};
use crate::memory::{MemoryItem, MemoryType};
use crate::storage::{FeatureStore, MetadataStore};

const ITEM_COLUMNS: &str = "id, type, owner, summary, content_json, tags_json, \
     created_at, updated_at, last_accessed, tier, pointer_json, \
     ttl_seconds, confidence, authority, stability";

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    configure_connection(&conn)?;
    Ok(conn)
}

async fn with_connection<T, F>(conn: &Arc<Mutex<Connection>>, task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
{
    let conn = Arc::clone(conn);
    tokio::task::spawn_blocking(move || {
        let conn = conn
            .lock()
            .map_err(|_| MemoryError::Backend("sqlite connection lock poisoned".to_string()))?;
        task(&conn)
    })
    .await
    .map_err(|e| MemoryError::Backend(format!("sqlite task failed: {e}")))?
}

// ============================================================================
// METADATA STORE
// ============================================================================

/// Canonical item storage in a single `memory_items` table.
pub struct SqliteMetadataStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMetadataStore {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = open_connection(path.as_ref())?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS memory_items (
                id TEXT PRIMARY KEY,
                type TEXT NOT NULL,
                owner TEXT NOT NULL,
                summary TEXT NOT NULL,
                content_json TEXT,
                tags_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                last_accessed TEXT,
                tier TEXT NOT NULL,
                pointer_json TEXT NOT NULL,
                ttl_seconds INTEGER,
                confidence REAL NOT NULL,
                authority REAL NOT NULL,
                stability REAL NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_memory_items_owner
                ON memory_items(owner);",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

type ItemRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
    String,
    String,
    Option<i64>,
    f64,
    f64,
    f64,
);

fn read_item_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
        row.get(13)?,
        row.get(14)?,
    ))
}

fn row_to_item(row: ItemRow) -> Result<MemoryItem> {
    let (
        id,
        memory_type,
        owner,
        summary,
        content_json,
        tags_json,
        created_at,
        updated_at,
        last_accessed,
        tier,
        pointer_json,
        ttl_seconds,
        confidence,
        authority,
        stability,
    ) = row;

    let content: Option<Value> = match content_json {
        Some(raw) => Some(serde_json::from_str(&raw)?),
        None => None,
    };
    let tags: Vec<String> = serde_json::from_str(&tags_json)?;
    let pointer: BTreeMap<String, String> = serde_json::from_str(&pointer_json)?;

    Ok(MemoryItem {
        id: Uuid::parse_str(&id)
            .map_err(|e| MemoryError::Backend(format!("corrupt item id {id}: {e}")))?,
        memory_type: memory_type.parse()?,
        owner,
        summary,
        content,
        tags,
        created_at,
        updated_at,
        last_accessed,
        tier: tier.parse()?,
        pointer,
        ttl_seconds: ttl_seconds.map(|ttl| ttl.max(0) as u64),
        confidence,
        authority,
        stability,
    })
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn upsert(&self, item: &MemoryItem) -> Result<()> {
        let item = item.clone();
        with_connection(&self.conn, move |conn| {
            let content_json = match &item.content {
                Some(content) => Some(serde_json::to_string(content)?),
                None => None,
            };
            conn.execute(
                "INSERT INTO memory_items (
                    id, type, owner, summary, content_json, tags_json,
                    created_at, updated_at, last_accessed, tier, pointer_json,
                    ttl_seconds, confidence, authority, stability
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                ON CONFLICT(id) DO UPDATE SET
                    type = excluded.type,
                    owner = excluded.owner,
                    summary = excluded.summary,
                    content_json = excluded.content_json,
                    tags_json = excluded.tags_json,
                    created_at = excluded.created_at,
                    updated_at = excluded.updated_at,
                    last_accessed = excluded.last_accessed,
                    tier = excluded.tier,
                    pointer_json = excluded.pointer_json,
                    ttl_seconds = excluded.ttl_seconds,
                    confidence = excluded.confidence,
                    authority = excluded.authority,
                    stability = excluded.stability",
                rusqlite::params![
                    item.id.to_string(),
                    item.memory_type.as_str(),
                    item.owner,
                    item.summary,
                    content_json,
                    serde_json::to_string(&item.tags)?,
                    item.created_at,
                    item.updated_at,
                    item.last_accessed,
                    item.tier.as_str(),
                    serde_json::to_string(&item.pointer)?,
                    item.ttl_seconds.map(|ttl| ttl as i64),
                    item.confidence,
                    item.authority,
                    item.stability,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get(&self, id: Uuid) -> Result<Option<MemoryItem>> {
        with_connection(&self.conn, move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ITEM_COLUMNS} FROM memory_items WHERE id = ?"
            ))?;
            let mut rows = stmt.query_map([id.to_string()], read_item_row)?;
            match rows.next() {
                Some(row) => Ok(Some(row_to_item(row?)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        with_connection(&self.conn, move |conn| {
            conn.execute("DELETE FROM memory_items WHERE id = ?", [id.to_string()])?;
            Ok(())
        })
        .await
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<MemoryItem>> {
        let owner = owner.to_string();
        with_connection(&self.conn, move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ITEM_COLUMNS} FROM memory_items WHERE owner = ? ORDER BY created_at"
            ))?;
            let rows = stmt.query_map([owner], read_item_row)?;
            rows.map(|row| row_to_item(row?)).collect()
        })
        .await
    }

    async fn list_by_owner_and_type(
        &self,
        owner: &str,
        types: &[MemoryType],
    ) -> Result<Vec<MemoryItem>> {
        if types.is_empty() {
            return Ok(Vec::new());
        }
        let owner = owner.to_string();
        let type_names: Vec<String> = types.iter().map(|t| t.as_str().to_string()).collect();
        with_connection(&self.conn, move |conn| {
            let placeholders = vec!["?"; type_names.len()].join(",");
            let mut stmt = conn.prepare(&format!(
                "SELECT {ITEM_COLUMNS} FROM memory_items \
                 WHERE owner = ? AND type IN ({placeholders}) ORDER BY created_at"
            ))?;
            let mut params: Vec<String> = vec![owner];
            params.extend(type_names);
            let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), read_item_row)?;
            rows.map(|row| row_to_item(row?)).collect()
        })
        .await
    }

    async fn update_access(&self, id: Uuid) -> Result<()> {
        with_connection(&self.conn, move |conn| {
            conn.execute(
                "UPDATE memory_items SET last_accessed = ?1 WHERE id = ?2",
                rusqlite::params![Utc::now(), id.to_string()],
            )?;
            Ok(())
        })
        .await
    }
}

// ============================================================================
// FEATURE STORE
// ============================================================================

/// Append-only perceptual feature log.
pub struct SqliteFeatureStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteFeatureStore {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = open_connection(path.as_ref())?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS features (
                owner TEXT NOT NULL,
                created_at TEXT NOT NULL,
                payload_json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_features_owner
                ON features(owner, created_at);",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl FeatureStore for SqliteFeatureStore {
    async fn write_feature(&self, owner: &str, payload: &Value) -> Result<()> {
        let owner = owner.to_string();
        let payload = payload.clone();
        with_connection(&self.conn, move |conn| {
            conn.execute(
                "INSERT INTO features (owner, created_at, payload_json) VALUES (?1, ?2, ?3)",
                rusqlite::params![owner, Utc::now(), serde_json::to_string(&payload)?],
            )?;
            Ok(())
        })
        .await
    }

    async fn query_features(&self, owner: &str, limit: usize) -> Result<Vec<Value>> {
        let owner = owner.to_string();
        with_connection(&self.conn, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT payload_json FROM features \
                 WHERE owner = ? ORDER BY created_at DESC LIMIT ?",
            )?;
            let rows = stmt.query_map(
                rusqlite::params![owner, limit as i64],
                |row| row.get::<_, String>(0),
            )?;
            rows.map(|raw| Ok(serde_json::from_str(&raw?)?)).collect()
        })
        .await
    }
}

// ============================================================================
// TESTS
// ============================================================================
