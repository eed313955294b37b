use serde::{Deserialize, Deserializer, Serialize};

use super::Workout;

pub const ACTIVITY_PREFIX: &str = "activity:";

/// Free-form plan item (yoga, bouldering, ...) without a timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub is_activity: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Activity {
    pub fn new(name: &str, note: Option<String>) -> Self {
        let name = normalize_name(name);
        Self {
            id: activity_id(&name),
            name,
            is_activity: true,
            note: note.filter(|n| !n.trim().is_empty()),
        }
    }

    /// Display title, first letter upper-cased.
    pub fn title(&self) -> String {
        capitalize(&self.name)
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn activity_id(name: &str) -> String {
    format!("{}{}", ACTIVITY_PREFIX, name)
}

pub fn is_activity_id(id: &str) -> bool {
    id.starts_with(ACTIVITY_PREFIX)
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One element of the `userWorkouts` list, which holds both kinds of item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LibraryEntry {
    Activity(Activity),
    Workout(Workout),
}

impl<'de> Deserialize<'de> for LibraryEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let flagged = value
            .get("isActivity")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let prefixed = value
            .get("id")
            .and_then(|v| v.as_str())
            .map(is_activity_id)
            .unwrap_or(false);

        if flagged || prefixed {
            let name = value.get("name").and_then(|v| v.as_str()).unwrap_or("");
            let note = value
                .get("note")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            let mut activity = Activity::new(name, note);
            if let Some(id) = value.get("id").and_then(|v| v.as_str()) {
                activity.id = id.to_string();
            }
            Ok(LibraryEntry::Activity(activity))
        } else {
            serde_json::from_value(value)
                .map(LibraryEntry::Workout)
                .map_err(serde::de::Error::custom)
        }
    }
}

impl LibraryEntry {
    pub fn id(&self) -> &str {
        match self {
            LibraryEntry::Activity(a) => &a.id,
            LibraryEntry::Workout(w) => &w.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LibraryEntry::Activity(a) => &a.name,
            LibraryEntry::Workout(w) => &w.name,
        }
    }

    pub fn as_workout(&self) -> Option<&Workout> {
        match self {
            LibraryEntry::Workout(w) => Some(w),
            LibraryEntry::Activity(_) => None,
        }
    }

    pub fn as_activity(&self) -> Option<&Activity> {
        match self {
            LibraryEntry::Activity(a) => Some(a),
            LibraryEntry::Workout(_) => None,
        }
    }

    pub fn is_activity(&self) -> bool {
        matches!(self, LibraryEntry::Activity(_))
    }
}

/// Operations over the flat `userWorkouts` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Library {
    pub entries: Vec<LibraryEntry>,
}

impl Library {
    pub fn new(entries: Vec<LibraryEntry>) -> Self {
        Self { entries }
    }

    pub fn workouts(&self) -> impl Iterator<Item = &Workout> {
        self.entries.iter().filter_map(LibraryEntry::as_workout)
    }

    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.entries.iter().filter_map(LibraryEntry::as_activity)
    }

    pub fn find(&self, id: &str) -> Option<&LibraryEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn find_workout(&self, id: &str) -> Option<&Workout> {
        self.find(id).and_then(LibraryEntry::as_workout)
    }

    /// Insert or replace by id.
    pub fn save_workout(&mut self, workout: Workout) {
        match self.entries.iter_mut().find(|e| e.id() == workout.id) {
            Some(slot) => *slot = LibraryEntry::Workout(workout),
            None => self.entries.push(LibraryEntry::Workout(workout)),
        }
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id() != id);
        self.entries.len() != before
    }

    fn drop_workouts_named(&mut self, normalized: &str) {
        self.entries
            .retain(|e| e.is_activity() || normalize_name(e.name()) != normalized);
    }

    /// Add an activity, evicting any workout with the same name.
    pub fn add_activity(&mut self, name: &str) {
        let norm = normalize_name(name);
        if norm.is_empty() {
            return;
        }
        self.drop_workouts_named(&norm);
        let id = activity_id(&norm);
        if self.find(&id).is_none() {
            self.entries
                .push(LibraryEntry::Activity(Activity::new(&norm, None)));
        }
    }

    pub fn remove_activity(&mut self, name: &str) -> bool {
        let norm = normalize_name(name);
        let before = self.entries.len();
        self.entries
            .retain(|e| !matches!(e, LibraryEntry::Activity(a) if a.name == norm));
        self.entries.len() != before
    }

    /// Rename and/or re-annotate an activity, merging into an existing one of
    /// the new name.
    pub fn update_activity(&mut self, old_name: &str, new_name: &str, note: Option<String>) {
        let old_norm = normalize_name(old_name);
        let new_norm = normalize_name(new_name);
        if old_norm.is_empty() || new_norm.is_empty() {
            return;
        }
        let note = note.filter(|n| !n.trim().is_empty());
        self.drop_workouts_named(&new_norm);

        let position = |entries: &[LibraryEntry], name: &str| {
            entries
                .iter()
                .position(|e| matches!(e, LibraryEntry::Activity(a) if a.name == name))
        };
        let existing = position(&self.entries, &new_norm);
        let old = position(&self.entries, &old_norm);

        match (existing, old) {
            (Some(existing), Some(old)) if existing != old => {
                if let LibraryEntry::Activity(a) = &mut self.entries[existing] {
                    a.note = note;
                }
                self.entries.remove(old);
            }
            (_, Some(old)) => {
                if let LibraryEntry::Activity(a) = &mut self.entries[old] {
                    a.id = activity_id(&new_norm);
                    a.name = new_norm;
                    a.note = note;
                }
            }
            (_, None) => self
                .entries
                .push(LibraryEntry::Activity(Activity::new(&new_norm, note))),
        }
    }

    /// Drop workouts whose name collides with an activity. Returns whether
    /// anything changed.
    pub fn dedupe_activity_conflicts(&mut self) -> bool {
        let names: std::collections::HashSet<String> = self
            .activities()
            .map(|a| normalize_name(&a.name))
            .collect();
        let before = self.entries.len();
        self.entries.retain(|e| {
            e.is_activity() || {
                let n = normalize_name(e.name());
                n.is_empty() || !names.contains(&n)
            }
        });
        self.entries.len() != before
    }

    /// Replace all activity entries with the given names.
    pub fn replace_activities(&mut self, names: &[String]) {
        self.entries.retain(|e| !e.is_activity());
        for name in names {
            let activity = Activity::new(name, None);
            if self.find(&activity.id).is_none() {
                self.entries.push(LibraryEntry::Activity(activity));
            }
        }
    }
}
