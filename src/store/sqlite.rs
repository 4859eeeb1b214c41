//! SQLite document store
//!
//! All collections share one `documents` table; bodies are JSON text and
//! queries use SQLite's JSON functions, so sort and filter keys need no
//! schema changes.

use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::{merge, now_millis, Collection, Document, DocumentStore, Query, StoreError};
use crate::core::identity::EntityId;

/// Current schema version - the table layout is recreated on mismatch
const SCHEMA_VERSION: i32 = 1;

/// Document store backed by a SQLite database file
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );
            "#,
        )?;

        let version: Option<i32> = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match version {
            None => {
                self.conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![SCHEMA_VERSION],
                )?;
            }
            Some(v) if v != SCHEMA_VERSION => {
                return Err(StoreError::Backend(format!(
                    "database schema version {} is not supported (expected {})",
                    v, SCHEMA_VERSION
                )));
            }
            Some(_) => {}
        }

        Ok(())
    }

    fn decode(collection: Collection, id: &str, body: &str) -> Result<Document, StoreError> {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(doc)) => Ok(doc),
            Ok(_) => Err(StoreError::Decode {
                collection,
                id: id.to_string(),
                message: "document is not an object".to_string(),
            }),
            Err(e) => Err(StoreError::Decode {
                collection,
                id: id.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn encode(doc: &Document) -> Result<String, StoreError> {
        serde_json::to_string(doc).map_err(|e| StoreError::Encode(e.to_string()))
    }
}

/// Convert a JSON filter value into the SQL value `json_extract` yields
fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

impl DocumentStore for SqliteStore {
    fn add(&self, collection: Collection, doc: Document) -> Result<String, StoreError> {
        let id = EntityId::new(collection.prefix()).to_string();
        self.conn.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
            params![collection.name(), id, Self::encode(&doc)?],
        )?;
        Ok(id)
    }

    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection.name(), id],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|b| Self::decode(collection, id, &b)).transpose()
    }

    fn update(&self, collection: Collection, id: &str, patch: Document) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let body: Option<String> = tx
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection.name(), id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(body) = body else {
            return Err(StoreError::Missing {
                collection,
                id: id.to_string(),
            });
        };

        let mut doc = Self::decode(collection, id, &body)?;
        merge(&mut doc, patch);
        tx.execute(
            "UPDATE documents SET body = ?3 WHERE collection = ?1 AND id = ?2",
            params![collection.name(), id, Self::encode(&doc)?],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn query(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let mut sql = String::from("SELECT id, body FROM documents WHERE collection = ?1");
        let mut values: Vec<SqlValue> = vec![SqlValue::Text(collection.name().to_string())];

        if let Some((field, value)) = &query.filter {
            values.push(SqlValue::Text(format!("$.{}", field)));
            let path_idx = values.len();
            if value.is_null() {
                sql.push_str(&format!(" AND json_extract(body, ?{}) IS NULL", path_idx));
            } else {
                values.push(to_sql_value(value));
                sql.push_str(&format!(
                    " AND json_extract(body, ?{}) = ?{}",
                    path_idx,
                    values.len()
                ));
            }
        }

        if let Some(field) = &query.order_by_desc {
            values.push(SqlValue::Text(format!("$.{}", field)));
            sql.push_str(&format!(
                " ORDER BY json_extract(body, ?{}) DESC, id DESC",
                values.len()
            ));
        }

        if let Some(limit) = query.limit {
            values.push(SqlValue::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
            sql.push_str(&format!(" LIMIT ?{}", values.len()));
        }

        debug!(%collection, sql = %sql, "running document query");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, body) = row?;
            let doc = Self::decode(collection, &id, &body)?;
            docs.push((id, doc));
        }
        Ok(docs)
    }

    fn server_timestamp(&self) -> DateTime<Utc> {
        now_millis()
    }
}
