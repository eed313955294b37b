use rusqlite::Connection;

use super::kv_store::{keys, read_or_default, write_json, KvStore};
use super::log_repo::{load_log, load_prs};
use super::plan_repo::{load_plan, store_plan};
use super::workout_repo::{load_library, store_library};
use crate::backup::merge::merge;
use crate::error::Result;
use crate::models::Backup;

fn export(conn: &Connection) -> Result<Backup> {
    Ok(Backup::snapshot(
        load_plan(conn)?,
        load_library(conn)?,
        load_log(conn)?,
        load_prs(conn)?,
        read_or_default(conn, keys::PROGRESS_CATEGORIES)?,
    ))
}

/// Overwrite every key present in the backup; absent keys are untouched.
fn import(conn: &Connection, backup: &Backup) -> Result<()> {
    let mut plan = load_plan(conn)?;
    let mut plan_changed = false;
    if let Some(dated) = &backup.plan {
        plan.dated = dated.clone();
        plan_changed = true;
    }
    if let Some(recurring) = &backup.plan_recurring {
        plan.recurring = recurring.clone();
        plan_changed = true;
    }
    if let Some(completed) = &backup.plan_completed {
        plan.completed = completed.clone();
        plan_changed = true;
    }
    if let Some(notes) = &backup.plan_notes {
        plan.notes = notes.clone();
        plan_changed = true;
    }
    if plan_changed {
        store_plan(conn, &plan)?;
    }

    if let Some(names) = &backup.activities {
        let mut library = load_library(conn)?;
        library.replace_activities(names);
        store_library(conn, &library)?;
    }
    if let Some(log) = &backup.log {
        write_json(conn, keys::LOG, log)?;
    }
    if let Some(prs) = &backup.prs {
        write_json(conn, keys::PRS, prs)?;
    }
    // A full workout list wins over the bare activity names above.
    if let Some(library) = &backup.user_workouts {
        store_library(conn, library)?;
    }
    if let Some(categories) = &backup.progress_categories {
        write_json(conn, keys::PROGRESS_CATEGORIES, categories)?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct BackupRepository {
    kv: KvStore,
}

impl BackupRepository {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    pub async fn export(&self) -> Result<Backup> {
        self.kv.transact(|conn| export(conn)).await
    }

    pub async fn import(&self, backup: Backup) -> Result<()> {
        self.kv.transact(move |conn| import(conn, &backup)).await?;
        tracing::info!("Imported backup");
        Ok(())
    }

    /// Merge `remote` into the current local data and keep the result, all in
    /// one transaction. Without a remote copy this is a plain export.
    pub async fn merge_remote(&self, remote: Option<Backup>) -> Result<Backup> {
        self.kv
            .transact(move |conn| {
                let local = export(conn)?;
                let Some(remote) = remote else {
                    return Ok(local);
                };
                let merged = merge(&local, &remote);
                import(conn, &merged)?;
                Ok(merged)
            })
            .await
    }
}
