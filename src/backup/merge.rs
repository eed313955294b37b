//! Union of a local snapshot with the copy already on GitHub, so a save
//! from one device does not drop data written by another.

use std::collections::{BTreeMap, HashSet};

use crate::models::{Backup, Library, LogEntry, PersonalRecords};

fn union_ids<K: Ord + Clone>(
    local: Option<&BTreeMap<K, Vec<String>>>,
    remote: Option<&BTreeMap<K, Vec<String>>>,
) -> BTreeMap<K, Vec<String>> {
    let mut merged = local.cloned().unwrap_or_default();
    for (key, ids) in remote.into_iter().flatten() {
        let slot = merged.entry(key.clone()).or_default();
        for id in ids {
            if !slot.contains(id) {
                slot.push(id.clone());
            }
        }
    }
    merged
}

fn union_names(local: Option<&Vec<String>>, remote: Option<&Vec<String>>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for name in local.into_iter().chain(remote).flatten() {
        if !merged.contains(name) {
            merged.push(name.clone());
        }
    }
    merged
}

fn union_library(local: Option<&Library>, remote: Option<&Library>) -> Library {
    let mut merged = local.cloned().unwrap_or_default();
    for entry in remote.into_iter().flat_map(|l| &l.entries) {
        if merged.find(entry.id()).is_none() {
            merged.entries.push(entry.clone());
        }
    }
    merged
}

fn union_log(local: Option<&Vec<LogEntry>>, remote: Option<&Vec<LogEntry>>) -> Vec<LogEntry> {
    let mut seen = HashSet::new();
    let mut merged: Vec<LogEntry> = local
        .into_iter()
        .chain(remote)
        .flatten()
        .filter(|e| {
            seen.insert((
                e.date,
                e.workout_id.clone(),
                e.workout_name.clone(),
                e.summary.clone(),
            ))
        })
        .cloned()
        .collect();
    merged.sort_by_key(|e| e.date);
    merged
}

pub fn merge(local: &Backup, remote: &Backup) -> Backup {
    let mut notes = local.plan_notes.clone().unwrap_or_default();
    for (date, text) in remote.plan_notes.iter().flatten() {
        notes.entry(*date).or_insert_with(|| text.clone());
    }

    let mut prs = local.prs.clone().unwrap_or_default();
    prs.merge_max(remote.prs.as_ref().unwrap_or(&PersonalRecords::default()));

    let activities = union_names(local.activities.as_ref(), remote.activities.as_ref());
    let mut library = union_library(local.user_workouts.as_ref(), remote.user_workouts.as_ref());
    // Import applies the workout list last, so it must carry every activity.
    for name in &activities {
        library.add_activity(name);
    }

    Backup {
        plan: Some(union_ids(local.plan.as_ref(), remote.plan.as_ref())),
        plan_recurring: Some(union_ids(
            local.plan_recurring.as_ref(),
            remote.plan_recurring.as_ref(),
        )),
        plan_completed: Some(union_ids(
            local.plan_completed.as_ref(),
            remote.plan_completed.as_ref(),
        )),
        plan_notes: Some(notes),
        activities: Some(activities),
        log: Some(union_log(local.log.as_ref(), remote.log.as_ref())),
        prs: Some(prs),
        user_workouts: Some(library),
        progress_categories: Some(union_names(
            local.progress_categories.as_ref(),
            remote.progress_categories.as_ref(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Backup {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_plan_ids_union_local_first() {
        let local = parse(r#"{"plan":{"2026-10-16":["a","b"]},"planRecurring":{"1":["x"]}}"#);
        let remote = parse(
            r#"{"plan":{"2026-10-16":["c","a"],"2026-10-17":["d"]},"planRecurring":{"1":["y"],"2":["z"]}}"#,
        );
        let merged = merge(&local, &remote);
        let plan = merged.plan.unwrap();
        assert_eq!(plan.len(), 2);
        let day = chrono::NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(plan[&day], vec!["a", "b", "c"]);
        let recurring = merged.plan_recurring.unwrap();
        assert_eq!(recurring[&1], vec!["x", "y"]);
        assert_eq!(recurring[&2], vec!["z"]);
    }

    #[test]
    fn test_local_note_wins() {
        let local = parse(r#"{"planNotes":{"2026-10-16":"mine"}}"#);
        let remote = parse(r#"{"planNotes":{"2026-10-16":"theirs","2026-10-17":"other"}}"#);
        let notes = merge(&local, &remote).plan_notes.unwrap();
        assert_eq!(notes.len(), 2);
        assert!(notes.values().any(|n| n == "mine"));
        assert!(!notes.values().any(|n| n == "theirs"));
    }

    #[test]
    fn test_workouts_union_by_id_local_wins() {
        let local = parse(r#"{"userWorkouts":[{"id":"a","name":"Local A","sets":1}]}"#);
        let remote = parse(
            r#"{"userWorkouts":[{"id":"a","name":"Remote A","sets":1},{"id":"activity:yoga","name":"yoga","isActivity":true}]}"#,
        );
        let lib = merge(&local, &remote).user_workouts.unwrap();
        assert_eq!(lib.entries.len(), 2);
        assert_eq!(lib.find("a").unwrap().name(), "Local A");
        assert!(lib.find("activity:yoga").unwrap().is_activity());
    }

    #[test]
    fn test_log_deduplicated_and_sorted() {
        let local = parse(
            r#"{"log":[{"date":"2026-10-16T10:00:00Z","workoutId":"a","workoutName":"A","summary":"s"}]}"#,
        );
        let remote = parse(
            r#"{"log":[
                {"date":"2026-10-16T10:00:00Z","workoutId":"a","workoutName":"A","summary":"s"},
                {"date":"2026-10-15","workoutId":null,"workoutName":"","summary":"note"}
            ]}"#,
        );
        let log = merge(&local, &remote).log.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].summary, "note");
    }

    #[test]
    fn test_prs_keep_maximum_and_names_union() {
        let local = parse(r#"{"prs":{"a":10,"b":5},"activities":["yoga"]}"#);
        let remote = parse(r#"{"prs":{"a":12,"c":1},"activities":["run","yoga"]}"#);
        let merged = merge(&local, &remote);
        let prs = merged.prs.unwrap();
        assert_eq!(prs.get("a"), Some(12.0));
        assert_eq!(prs.get("b"), Some(5.0));
        assert_eq!(prs.get("c"), Some(1.0));
        assert_eq!(merged.activities.unwrap(), vec!["yoga", "run"]);
        assert_eq!(merged.progress_categories.unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_library_carries_remote_activity_names() {
        let local = parse(r#"{"userWorkouts":[{"id":"a","name":"Running","sets":1}]}"#);
        let remote = parse(r#"{"activities":["running"]}"#);
        let lib = merge(&local, &remote).user_workouts.unwrap();
        // The activity evicts the workout of the same name.
        assert_eq!(lib.entries.len(), 1);
        assert!(lib.find("activity:running").unwrap().is_activity());
    }
}
