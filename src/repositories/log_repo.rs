use rusqlite::Connection;

use super::kv_store::{keys, read_or_default, write_json, KvStore};
use crate::error::Result;
use crate::models::{LogEntry, PersonalRecords};

pub fn load_log(conn: &Connection) -> Result<Vec<LogEntry>> {
    read_or_default(conn, keys::LOG)
}

pub fn append_entry(conn: &Connection, entry: LogEntry) -> Result<()> {
    let mut log = load_log(conn)?;
    log.push(entry);
    write_json(conn, keys::LOG, &log)
}

pub fn load_prs(conn: &Connection) -> Result<PersonalRecords> {
    read_or_default(conn, keys::PRS)
}

/// Session history and personal records.
#[derive(Clone)]
pub struct LogRepository {
    kv: KvStore,
}

impl LogRepository {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    pub async fn all(&self) -> Result<Vec<LogEntry>> {
        self.kv.transact(|conn| load_log(conn)).await
    }

    pub async fn append(&self, entry: LogEntry) -> Result<()> {
        self.kv.transact(move |conn| append_entry(conn, entry)).await
    }

    /// Remove the entry at `index`. Returns false when out of range.
    pub async fn delete(&self, index: usize) -> Result<bool> {
        self.kv
            .update(keys::LOG, move |log: &mut Vec<LogEntry>| {
                if index < log.len() {
                    log.remove(index);
                    true
                } else {
                    false
                }
            })
            .await
    }

    pub async fn clear(&self) -> Result<()> {
        tracing::info!("Clearing workout log");
        self.kv.set(keys::LOG, &Vec::<LogEntry>::new()).await
    }

    pub async fn personal_records(&self) -> Result<PersonalRecords> {
        self.kv.transact(|conn| load_prs(conn)).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::create_memory_pool;
    use crate::migrations::run_migrations_for_tests;

    fn repo() -> LogRepository {
        let pool = create_memory_pool().unwrap();
        run_migrations_for_tests(&pool).unwrap();
        LogRepository::new(KvStore::new(pool))
    }

    fn note(text: &str) -> LogEntry {
        LogEntry::note(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(), text)
    }

    #[tokio::test]
    async fn test_append_delete_clear() {
        let repo = repo();
        repo.append(note("a")).await.unwrap();
        repo.append(note("b")).await.unwrap();
        repo.append(note("c")).await.unwrap();

        assert!(repo.delete(1).await.unwrap());
        assert!(!repo.delete(5).await.unwrap());
        let summaries: Vec<String> = repo
            .all()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.summary)
            .collect();
        assert_eq!(summaries, vec!["a", "c"]);

        repo.clear().await.unwrap();
        assert!(repo.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_records_by_default() {
        assert!(repo().personal_records().await.unwrap().best.is_empty());
    }
}
