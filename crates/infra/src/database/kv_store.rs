//! SQLite-backed implementation of the durable key-value store.
//!
//! Values are stored as JSON text. A single `set` call is committed in one
//! transaction; separate calls are independent.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use feedminder_core::KeyValueStore;
use feedminder_domain::Result as DomainResult;
use rusqlite::{params, OptionalExtension};
use serde_json::Value;
use tokio::task;

use super::manager::{map_join_error, map_sql_error, DbManager};
use crate::errors::InfraError;

pub struct SqliteKeyValueStore {
    db: Arc<DbManager>,
}

impl SqliteKeyValueStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> DomainResult<Option<Value>> {
        let db = Arc::clone(&self.db);
        let key = key.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<Value>> {
            let conn = db.get_connection()?;
            let raw: Option<String> = conn
                .query_row("SELECT value FROM kv_store WHERE key = ?1", params![&key], |row| {
                    row.get(0)
                })
                .optional()
                .map_err(map_sql_error)?;

            match raw {
                Some(text) => Ok(Some(serde_json::from_str(&text).map_err(InfraError::from)?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set(&self, entries: Vec<(String, Value)>) -> DomainResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            let now = Utc::now().timestamp_millis();
            {
                let mut stmt = tx
                    .prepare(
                        "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    )
                    .map_err(map_sql_error)?;
                for (key, value) in &entries {
                    let text = serde_json::to_string(value).map_err(InfraError::from)?;
                    stmt.execute(params![key, text, now]).map_err(map_sql_error)?;
                }
            }
            tx.commit().map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn remove(&self, key: &str) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let key = key.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute("DELETE FROM kv_store WHERE key = ?1", params![&key])
                .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}
