use rusqlite::{Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

use crate::db::DbPool;
use crate::error::{AppError, Result};

/// Storage keys. Names and value shapes match the browser app's local
/// storage so old backups and exports stay compatible.
pub mod keys {
    pub const PLAN: &str = "plan";
    pub const PLAN_RECURRING: &str = "planRecurring";
    pub const PLAN_COMPLETED: &str = "planCompleted";
    pub const PLAN_NOTES: &str = "planNotes";
    pub const LOG: &str = "log";
    pub const PRS: &str = "prs";
    pub const USER_WORKOUTS: &str = "userWorkouts";
    pub const GITHUB_REPO: &str = "githubRepo";
    pub const GITHUB_PATH: &str = "githubPath";
    pub const GITHUB_BRANCH: &str = "githubBranch";
    pub const GITHUB_TOKEN: &str = "githubToken";
    pub const GITHUB_MESSAGE: &str = "githubMessage";
    pub const GITHUB_AUTO_LOAD: &str = "githubAutoLoad";
    pub const AUTO_SYNC: &str = "autoSyncAfterWorkout";
    pub const CHART_KEYWORDS: &str = "chartKeywords";
    pub const PROGRESS_FILTERS: &str = "progressFilters";
    pub const INCLUDED_WORKOUTS: &str = "includedWorkouts";
    pub const PROGRESS_CATEGORIES: &str = "progressCategories";
}

/// Key under which an unparseable value of `key` is preserved.
pub fn corrupt_key(key: &str) -> String {
    format!("{key}.corrupt")
}

/// Read a JSON value. A value that no longer parses is copied to
/// [`corrupt_key`], logged, and treated as missing.
pub fn read_json<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM kv_store WHERE key = ?", [key], |row| {
            row.get(0)
        })
        .optional()?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            let backup = corrupt_key(key);
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                [backup.as_str(), raw.as_str()],
            )?;
            tracing::warn!(key, copy = %backup, error = %e, "ignoring corrupt stored value");
            Ok(None)
        }
    }
}

pub fn read_or_default<T: DeserializeOwned + Default>(conn: &Connection, key: &str) -> Result<T> {
    Ok(read_json(conn, key)?.unwrap_or_default())
}

pub fn write_json<T: Serialize + ?Sized>(conn: &Connection, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        [key, raw.as_str()],
    )?;
    Ok(())
}

pub fn delete_key(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM kv_store WHERE key = ?", [key])?;
    Ok(())
}

/// Key-value store over the `kv_store` table.
#[derive(Clone)]
pub struct KvStore {
    pool: DbPool,
}

impl KvStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Run `f` inside one transaction on a blocking thread. Nothing is written
    /// unless `f` succeeds.
    pub async fn transact<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;
            let out = f(&tx)?;
            tx.commit()?;
            Ok(out)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn get<T>(&self, key: &'static str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.transact(move |conn| read_json(conn, key)).await
    }

    pub async fn get_or_default<T>(&self, key: &'static str) -> Result<T>
    where
        T: DeserializeOwned + Default + Send + 'static,
    {
        Ok(self.get(key).await?.unwrap_or_default())
    }

    pub async fn set<T>(&self, key: &'static str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let raw = serde_json::to_value(value)?;
        self.transact(move |conn| write_json(conn, key, &raw)).await
    }

    pub async fn remove(&self, key: &'static str) -> Result<()> {
        self.transact(move |conn| delete_key(conn, key)).await
    }

    /// Read-modify-write of one key.
    pub async fn update<T, R, F>(&self, key: &'static str, f: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Default + 'static,
        F: FnOnce(&mut T) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.transact(move |conn| {
            let mut value: T = read_or_default(conn, key)?;
            let out = f(&mut value);
            write_json(conn, key, &value)?;
            Ok(out)
        })
        .await
    }
}
