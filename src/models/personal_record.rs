use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Best recorded weight per workout id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonalRecords {
    pub best: BTreeMap<String, f64>,
}

impl PersonalRecords {
    pub fn get(&self, workout_id: &str) -> Option<f64> {
        self.best.get(workout_id).copied()
    }

    /// Store `value` when it beats the previous best (or there is none).
    /// Returns whether a new record was set.
    pub fn record(&mut self, workout_id: &str, value: f64) -> bool {
        match self.best.get(workout_id) {
            Some(prev) if value <= *prev => false,
            _ => {
                self.best.insert(workout_id.to_string(), value);
                true
            }
        }
    }

    /// Keep the larger value for every id present in either side.
    pub fn merge_max(&mut self, other: &PersonalRecords) {
        for (id, value) in &other.best {
            self.best
                .entry(id.clone())
                .and_modify(|v| *v = v.max(*value))
                .or_insert(*value);
        }
    }
}
