//! SQLite-persisted alarm clock.
//!
//! Alarms survive restarts; the cron sweep drains due rows through
//! [`AlarmClock::take_due`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use feedminder_core::AlarmClock;
use feedminder_domain::{Alarm, Result as DomainResult};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;
use tracing::debug;

use super::manager::{map_join_error, map_sql_error, DbManager};

pub struct SqliteAlarmClock {
    db: Arc<DbManager>,
}

impl SqliteAlarmClock {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AlarmClock for SqliteAlarmClock {
    async fn create(&self, name: &str, fire_at_ms: i64) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let name = name.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT OR REPLACE INTO alarms (name, scheduled_time, created_at) VALUES (?1, ?2, ?3)",
                params![&name, fire_at_ms, Utc::now().timestamp_millis()],
            )
            .map_err(map_sql_error)?;
            debug!(alarm = %name, fire_at_ms, "alarm registered");
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn clear(&self, name: &str) -> DomainResult<bool> {
        let db = Arc::clone(&self.db);
        let name = name.to_string();

        task::spawn_blocking(move || -> DomainResult<bool> {
            let conn = db.get_connection()?;
            let removed = conn
                .execute("DELETE FROM alarms WHERE name = ?1", params![&name])
                .map_err(map_sql_error)?;
            Ok(removed > 0)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get(&self, name: &str) -> DomainResult<Option<Alarm>> {
        let db = Arc::clone(&self.db);
        let name = name.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<Alarm>> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT name, scheduled_time FROM alarms WHERE name = ?1",
                params![&name],
                map_alarm_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get_all(&self) -> DomainResult<Vec<Alarm>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<Alarm>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare("SELECT name, scheduled_time FROM alarms ORDER BY scheduled_time, name")
                .map_err(map_sql_error)?;
            let rows = stmt.query_map([], map_alarm_row).map_err(map_sql_error)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn take_due(&self, now_ms: i64) -> DomainResult<Vec<Alarm>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<Alarm>> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            let due = {
                let mut stmt = tx
                    .prepare(
                        "SELECT name, scheduled_time FROM alarms WHERE scheduled_time <= ?1
                         ORDER BY scheduled_time, name",
                    )
                    .map_err(map_sql_error)?;
                let rows = stmt.query_map(params![now_ms], map_alarm_row).map_err(map_sql_error)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(map_sql_error)?
            };
            tx.execute("DELETE FROM alarms WHERE scheduled_time <= ?1", params![now_ms])
                .map_err(map_sql_error)?;
            tx.commit().map_err(map_sql_error)?;
            Ok(due)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_alarm_row(row: &Row<'_>) -> rusqlite::Result<Alarm> {
    Ok(Alarm { name: row.get(0)?, scheduled_time: row.get(1)? })
}
