use chrono::NaiveDate;
use rusqlite::Connection;

use super::kv_store::{keys, read_or_default, write_json, KvStore};
use super::log_repo::append_entry;
use super::workout_repo::load_library;
use crate::error::Result;
use crate::models::{LibraryEntry, LogEntry, Plan};

pub fn load_plan(conn: &Connection) -> Result<Plan> {
    Ok(Plan {
        dated: read_or_default(conn, keys::PLAN)?,
        recurring: read_or_default(conn, keys::PLAN_RECURRING)?,
        completed: read_or_default(conn, keys::PLAN_COMPLETED)?,
        notes: read_or_default(conn, keys::PLAN_NOTES)?,
    })
}

pub fn store_plan(conn: &Connection, plan: &Plan) -> Result<()> {
    write_json(conn, keys::PLAN, &plan.dated)?;
    write_json(conn, keys::PLAN_RECURRING, &plan.recurring)?;
    write_json(conn, keys::PLAN_COMPLETED, &plan.completed)?;
    write_json(conn, keys::PLAN_NOTES, &plan.notes)?;
    Ok(())
}

#[derive(Clone)]
pub struct PlanRepository {
    kv: KvStore,
}

impl PlanRepository {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    pub async fn load(&self) -> Result<Plan> {
        self.kv.transact(|conn| load_plan(conn)).await
    }

    async fn modify<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection, &mut Plan) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        self.kv
            .transact(move |conn| {
                let mut plan = load_plan(conn)?;
                let out = f(conn, &mut plan)?;
                store_plan(conn, &plan)?;
                Ok(out)
            })
            .await
    }

    pub async fn schedule(&self, date: NaiveDate, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.modify(move |_, plan| Ok(plan.schedule(date, &id))).await
    }

    pub async fn unschedule(&self, date: NaiveDate, id: &str) -> Result<()> {
        let id = id.to_string();
        self.modify(move |_, plan| {
            plan.unschedule(date, &id);
            Ok(())
        })
        .await
    }

    pub async fn toggle_recurring(&self, date: NaiveDate, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.modify(move |_, plan| Ok(plan.toggle_recurring(date, &id)))
            .await
    }

    /// Flip completion. Completing an activity also logs it, with the
    /// optional note. Returns the new state.
    pub async fn toggle_completed(
        &self,
        date: NaiveDate,
        id: &str,
        note: Option<String>,
    ) -> Result<bool> {
        let id = id.to_string();
        self.modify(move |conn, plan| {
            let completed = plan.toggle_completed(date, &id);
            if completed {
                if let Some(LibraryEntry::Activity(activity)) = load_library(conn)?.find(&id) {
                    let entry = LogEntry::activity(date, &activity.title(), note.as_deref());
                    append_entry(conn, entry)?;
                }
            }
            Ok(completed)
        })
        .await
    }

    /// Save (or clear, when blank) the day's note. A non-empty note is also
    /// appended to the log.
    pub async fn set_note(&self, date: NaiveDate, text: &str) -> Result<()> {
        let text = text.trim().to_string();
        self.modify(move |conn, plan| {
            plan.set_note(date, &text);
            if !text.is_empty() {
                append_entry(conn, LogEntry::note(date, &text))?;
            }
            Ok(())
        })
        .await
    }

    pub async fn delete_note(&self, date: NaiveDate) -> Result<bool> {
        self.modify(move |_, plan| Ok(plan.delete_note(date))).await
    }
}
