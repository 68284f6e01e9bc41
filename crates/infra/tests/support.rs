//! Shared helpers for `feedminder-infra` integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use feedminder_core::ReminderStore;
use feedminder_infra::database::{DbManager, SqliteAlarmClock, SqliteKeyValueStore};
use tempfile::TempDir;

/// Temporary database that keeps its directory alive for the duration of a
/// test and can be reopened from the same file.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager = open(&temp_dir);
        Self { manager, temp_dir }
    }

    /// Drop the pool and open a fresh one on the same file.
    pub fn reopen(self) -> Self {
        let Self { manager, temp_dir } = self;
        drop(manager);
        let manager = open(&temp_dir);
        Self { manager, temp_dir }
    }

    pub fn kv(&self) -> Arc<SqliteKeyValueStore> {
        Arc::new(SqliteKeyValueStore::new(self.manager.clone()))
    }

    pub fn alarms(&self) -> Arc<SqliteAlarmClock> {
        Arc::new(SqliteAlarmClock::new(self.manager.clone()))
    }

    pub fn store(&self) -> ReminderStore {
        ReminderStore::new(self.kv())
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

fn open(temp_dir: &TempDir) -> Arc<DbManager> {
    let manager =
        DbManager::new(temp_dir.path().join("feedminder.db"), 4).expect("db manager should be created");
    manager.run_migrations().expect("migrations should run");
    Arc::new(manager)
}
