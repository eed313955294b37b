use chrono::{DateTime, Utc};

use super::SessionState;
use crate::models::log_entry::start_of_day;
use crate::models::{LogEntry, WorkoutKind};

impl SessionState {
    /// Unit of the per-set values in `inputs`.
    fn value_unit(&self) -> &'static str {
        match self.workout.kind() {
            WorkoutKind::Duration => "s",
            WorkoutKind::Repeaters => "cycles",
            WorkoutKind::Reps | WorkoutKind::Both => "reps",
        }
    }

    fn weight(&self) -> f64 {
        self.preset_weight
            .or(self.workout.weight)
            .unwrap_or(0.0)
    }

    fn depth_suffix(&self) -> String {
        match self.preset_depth.or(self.workout.depth) {
            Some(d) if d > 0 => format!(" {d} mm"),
            _ => String::new(),
        }
    }

    /// Value compared against personal records and charted.
    pub fn best_value(&self) -> f64 {
        if self.workout.has_weight {
            self.weight()
        } else if self.workout.kind() == WorkoutKind::Duration {
            self.workout
                .duration
                .or_else(|| self.inputs.first().copied())
                .unwrap_or(0) as f64
        } else {
            self.inputs.first().copied().unwrap_or(0) as f64
        }
    }

    /// Turn a completed session into its log entry.
    ///
    /// `previous_pr` is the stored record for this workout, if any.
    pub fn build_log_entry(
        &self,
        previous_pr: Option<f64>,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> LogEntry {
        let best = self.best_value();
        let is_pr = self.workout.has_weight && previous_pr.map_or(true, |p| best > p);
        let sets = self.total_sets;
        let unit = self.value_unit();
        let depth = self.depth_suffix();
        let pr = if is_pr { " – NEW PR" } else { "" };

        let (mut summary, details) = if self.workout.has_weight
            && self.workout.kind() != WorkoutKind::Repeaters
        {
            let wu = self.workout.unit().as_str();
            let fallback = if self.workout.kind().has_duration() {
                self.workout.duration.unwrap_or(0)
            } else {
                0
            };
            let per_set = self.inputs.first().copied().unwrap_or(fallback);
            let summary = format!("{sets} sets: {per_set} {unit}{depth} @ {best} {wu}{pr}");
            let details = if self.inputs.is_empty() {
                (0..sets)
                    .map(|_| format!("Set: {fallback} {unit}{depth} @ {best} {wu}"))
                    .collect()
            } else {
                self.inputs
                    .iter()
                    .enumerate()
                    .map(|(i, v)| format!("Set {}: {v} {unit}{depth} @ {best} {wu}", i + 1))
                    .collect()
            };
            (summary, details)
        } else {
            let best_unit = if self.workout.has_weight {
                self.workout.unit().as_str()
            } else {
                unit
            };
            let summary = format!("{sets} sets × {best} {best_unit}{depth}{pr}");
            let details = self
                .inputs
                .iter()
                .enumerate()
                .map(|(i, v)| format!("Set {}: {v} {unit}{depth}", i + 1))
                .collect();
            (summary, details)
        };

        if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
            summary.push_str(" — ");
            summary.push_str(note);
        }

        LogEntry {
            date: self.plan_date.map(start_of_day).unwrap_or(now),
            workout_id: Some(self.workout.id.clone()),
            workout_name: self.workout.name.clone(),
            best_value: best,
            is_pr,
            summary,
            details,
        }
    }
}
