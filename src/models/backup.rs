use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Library, LogEntry, PersonalRecords, Plan};

/// Full data snapshot, as exported to a file or to GitHub.
///
/// Every field is optional on import: only the keys present in the document
/// overwrite local state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<BTreeMap<NaiveDate, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_recurring: Option<BTreeMap<u8, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_completed: Option<BTreeMap<NaiveDate, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_notes: Option<BTreeMap<NaiveDate, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<Vec<LogEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prs: Option<PersonalRecords>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_workouts: Option<Library>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_categories: Option<Vec<String>>,
}

impl Backup {
    pub fn snapshot(
        plan: Plan,
        library: Library,
        log: Vec<LogEntry>,
        prs: PersonalRecords,
        progress_categories: Vec<String>,
    ) -> Self {
        let activities = library.activities().map(|a| a.name.clone()).collect();
        Self {
            plan: Some(plan.dated),
            plan_recurring: Some(plan.recurring),
            plan_completed: Some(plan.completed),
            plan_notes: Some(plan.notes),
            activities: Some(activities),
            log: Some(log),
            prs: Some(prs),
            user_workouts: Some(library),
            progress_categories: Some(progress_categories),
        }
    }

    /// Plan view of the snapshot; absent parts are empty.
    pub fn to_plan(&self) -> Plan {
        Plan {
            dated: self.plan.clone().unwrap_or_default(),
            recurring: self.plan_recurring.clone().unwrap_or_default(),
            completed: self.plan_completed.clone().unwrap_or_default(),
            notes: self.plan_notes.clone().unwrap_or_default(),
        }
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
