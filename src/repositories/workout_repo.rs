use rusqlite::Connection;

use super::kv_store::{keys, read_or_default, write_json, KvStore};
use crate::error::Result;
use crate::models::{Library, LibraryEntry, Workout};

pub fn load_library(conn: &Connection) -> Result<Library> {
    read_or_default(conn, keys::USER_WORKOUTS)
}

pub fn store_library(conn: &Connection, library: &Library) -> Result<()> {
    write_json(conn, keys::USER_WORKOUTS, library)
}

/// Workout templates and activities, stored together under `userWorkouts`.
#[derive(Clone)]
pub struct WorkoutRepository {
    kv: KvStore,
}

impl WorkoutRepository {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    pub async fn library(&self) -> Result<Library> {
        self.kv.transact(|conn| load_library(conn)).await
    }

    pub async fn find(&self, id: &str) -> Result<Option<LibraryEntry>> {
        let id = id.to_string();
        self.kv
            .transact(move |conn| Ok(load_library(conn)?.find(&id).cloned()))
            .await
    }

    pub async fn find_workout(&self, id: &str) -> Result<Option<Workout>> {
        let id = id.to_string();
        self.kv
            .transact(move |conn| Ok(load_library(conn)?.find_workout(&id).cloned()))
            .await
    }

    async fn modify<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Library) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.kv.update(keys::USER_WORKOUTS, f).await
    }

    pub async fn save_workout(&self, workout: Workout) -> Result<()> {
        tracing::debug!(id = %workout.id, name = %workout.name, "saving workout");
        self.modify(move |lib| lib.save_workout(workout)).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.modify(move |lib| lib.delete(&id)).await
    }

    pub async fn add_activity(&self, name: &str) -> Result<()> {
        let name = name.to_string();
        self.modify(move |lib| lib.add_activity(&name)).await
    }

    pub async fn remove_activity(&self, name: &str) -> Result<bool> {
        let name = name.to_string();
        self.modify(move |lib| lib.remove_activity(&name)).await
    }

    pub async fn update_activity(
        &self,
        old_name: &str,
        new_name: &str,
        note: Option<String>,
    ) -> Result<()> {
        let (old_name, new_name) = (old_name.to_string(), new_name.to_string());
        self.modify(move |lib| lib.update_activity(&old_name, &new_name, note))
            .await
    }

    /// Startup cleanup of workouts shadowed by an activity of the same name.
    pub async fn dedupe_activity_conflicts(&self) -> Result<bool> {
        let changed = self.modify(|lib| lib.dedupe_activity_conflicts()).await?;
        if changed {
            tracing::info!("Removed workouts that collided with activity names");
        }
        Ok(changed)
    }
}
