use chrono::{DateTime, Utc};

use super::kv_store::{keys, write_json, KvStore};
use super::log_repo::{append_entry, load_prs};
use super::plan_repo::{load_plan, store_plan};
use super::workout_repo::{load_library, store_library};
use crate::error::Result;
use crate::models::LogEntry;
use crate::timer::SessionState;

/// Persists the outcome of a finished session.
#[derive(Clone)]
pub struct SessionRepository {
    kv: KvStore,
}

impl SessionRepository {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    /// Log the session, update personal records, tick the plan occurrence
    /// and write a changed weight or depth back to the template, all in one
    /// transaction.
    pub async fn record_completion(
        &self,
        state: SessionState,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<LogEntry> {
        self.kv
            .transact(move |conn| {
                let mut prs = load_prs(conn)?;
                let entry = state.build_log_entry(prs.get(&state.workout.id), note.as_deref(), now);

                if state.workout.has_weight && prs.record(&state.workout.id, entry.best_value) {
                    write_json(conn, keys::PRS, &prs)?;
                }

                append_entry(conn, entry.clone())?;

                if let Some(date) = state.plan_date {
                    let mut plan = load_plan(conn)?;
                    if plan.mark_completed(date, &state.workout.id) {
                        store_plan(conn, &plan)?;
                    }
                }

                if let Some(template) = state.updated_template() {
                    let mut library = load_library(conn)?;
                    if library.find_workout(&template.id).is_some() {
                        library.save_workout(template);
                        store_library(conn, &library)?;
                    }
                }

                Ok(entry)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::db::create_memory_pool;
    use crate::migrations::run_migrations_for_tests;
    use crate::models::{Workout, WorkoutKind};
    use crate::repositories::{LogRepository, PlanRepository, WorkoutRepository};

    fn pull() -> Workout {
        Workout {
            id: "pull".to_string(),
            name: "Weighted pull-ups".to_string(),
            tool: "Pull-up bar".to_string(),
            sets: 1,
            kind: Some(WorkoutKind::Reps),
            reps: Some(5),
            has_weight: true,
            weight: Some(10.0),
            rest: Some(120),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_record_completion_updates_everything() {
        let pool = create_memory_pool().unwrap();
        run_migrations_for_tests(&pool).unwrap();
        let kv = KvStore::new(pool);
        let sessions = SessionRepository::new(kv.clone());
        let logs = LogRepository::new(kv.clone());
        let plans = PlanRepository::new(kv.clone());
        let workouts = WorkoutRepository::new(kv);

        workouts.save_workout(pull()).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        plans.schedule(date, "pull").await.unwrap();

        let mut state = SessionState::new(pull(), Some(date));
        state.begin(Some(12.5), None).unwrap();
        state.toggle_set(0).unwrap();

        let now = Utc.with_ymd_and_hms(2026, 10, 16, 19, 0, 0).unwrap();
        let entry = sessions.record_completion(state, None, now).await.unwrap();
        assert!(entry.is_pr);
        assert_eq!(entry.day(), date);

        assert_eq!(logs.all().await.unwrap().len(), 1);
        assert_eq!(logs.personal_records().await.unwrap().get("pull"), Some(12.5));
        assert!(plans.load().await.unwrap().is_completed(date, "pull"));
        let saved = workouts.find_workout("pull").await.unwrap().unwrap();
        assert_eq!(saved.weight, Some(12.5));
    }
}
