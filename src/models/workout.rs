use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub const FINGER_BLOCK: &str = "Finger block";

/// Seconds between hands in finger block left/right mode.
pub const SWITCH_DELAY_SECS: u32 = 5;
pub const DEFAULT_HAND_SECS: u32 = 30;

pub const TOOLS: &[&str] = &[
    "Hangboard",
    "Pull-up bar",
    "Barbell",
    "Dumbbell",
    "Cable",
    "Body-weight",
    "Campus",
    FINGER_BLOCK,
    "Other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    #[default]
    Duration,
    Reps,
    Both,
    Repeaters,
}

impl WorkoutKind {
    pub const ALL: [WorkoutKind; 4] = [
        WorkoutKind::Duration,
        WorkoutKind::Reps,
        WorkoutKind::Both,
        WorkoutKind::Repeaters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutKind::Duration => "duration",
            WorkoutKind::Reps => "reps",
            WorkoutKind::Both => "both",
            WorkoutKind::Repeaters => "repeaters",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkoutKind::Duration => "Duration only",
            WorkoutKind::Reps => "Reps only",
            WorkoutKind::Both => "Duration AND reps",
            WorkoutKind::Repeaters => "Repeaters (7s on / 3s off)",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "duration" => Some(WorkoutKind::Duration),
            "reps" => Some(WorkoutKind::Reps),
            "both" => Some(WorkoutKind::Both),
            "repeaters" => Some(WorkoutKind::Repeaters),
            _ => None,
        }
    }

    pub fn has_duration(&self) -> bool {
        matches!(self, WorkoutKind::Duration | WorkoutKind::Both)
    }

    pub fn has_reps(&self) -> bool {
        matches!(self, WorkoutKind::Reps | WorkoutKind::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lbs => "lbs",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "lbs" => WeightUnit::Lbs,
            _ => WeightUnit::Kg,
        }
    }
}

/// A user-defined exercise template.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Workout {
    pub id: String,
    pub name: String,
    pub tool: String,
    pub sets: u32,
    #[serde(rename = "type")]
    pub kind: Option<WorkoutKind>,
    pub duration: Option<u32>,
    pub reps: Option<u32>,
    pub repeater_work: Option<u32>,
    pub repeater_rest: Option<u32>,
    pub repeater_count: Option<u32>,
    pub has_weight: bool,
    pub weight: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
    pub rest: Option<u32>,
    pub left_right_mode: bool,
    pub depth: Option<u32>,
    /// Fields this app does not know about, kept so imports round-trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Workout {
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn kind(&self) -> WorkoutKind {
        self.kind.unwrap_or_default()
    }

    pub fn is_left_right(&self) -> bool {
        self.tool == FINGER_BLOCK && self.left_right_mode
    }

    /// Reps-only workouts run without a timer.
    pub fn is_reps_only(&self) -> bool {
        self.kind() == WorkoutKind::Reps && self.duration.is_none()
    }

    /// Hangboard-style workouts track edge depth.
    pub fn is_finger(&self) -> bool {
        let tool = self.tool.to_lowercase();
        let name = self.name.to_lowercase();
        ["finger", "hang"]
            .iter()
            .any(|kw| tool.contains(kw) || name.contains(kw))
    }

    pub fn unit(&self) -> WeightUnit {
        self.weight_unit.unwrap_or_default()
    }

    pub fn rest_secs(&self) -> u32 {
        self.rest.unwrap_or(0)
    }

    pub fn hand_secs(&self) -> u32 {
        self.duration.unwrap_or(DEFAULT_HAND_SECS)
    }

    pub fn repeater_work_secs(&self) -> u32 {
        self.repeater_work.unwrap_or(7)
    }

    pub fn repeater_rest_secs(&self) -> u32 {
        self.repeater_rest.unwrap_or(3)
    }

    pub fn repeater_cycles(&self) -> u32 {
        self.repeater_count.unwrap_or(10)
    }

    /// Rest after the right hand, shortened by the switch and the right-hand hang.
    pub fn effective_left_right_rest(&self) -> u32 {
        self.rest_secs()
            .saturating_sub(SWITCH_DELAY_SECS)
            .saturating_sub(self.hand_secs())
    }

    /// First failing rule, in the order the form shows its fields.
    pub fn validate(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some("Name required");
        }
        if self.tool.trim().is_empty() {
            return Some("Tool required");
        }
        if self.sets < 1 {
            return Some("Sets ≥ 1");
        }
        let Some(kind) = self.kind else {
            return Some("Type required");
        };
        if kind.has_duration() && self.duration.unwrap_or(0) == 0 {
            return Some("Duration > 0");
        }
        if kind.has_reps() && self.reps.unwrap_or(0) == 0 {
            return Some("Reps > 0");
        }
        if kind == WorkoutKind::Repeaters && self.repeater_count.unwrap_or(0) < 1 {
            return Some("Repeater cycles ≥ 1");
        }
        if self.rest.is_none() {
            return Some("Rest ≥ 0");
        }
        None
    }

    pub fn summary(&self) -> String {
        let mut s = format!("{} sets", self.sets);
        if self.is_left_right() {
            s.push_str(&format!(
                " × {}s per hand ({}s switch) / {}s rest",
                self.hand_secs(),
                SWITCH_DELAY_SECS,
                self.effective_left_right_rest()
            ));
        } else {
            match self.kind() {
                WorkoutKind::Duration => {
                    s.push_str(&format!(" × {}s", self.duration.unwrap_or(0)))
                }
                WorkoutKind::Reps => s.push_str(&format!(" × {} reps", self.reps.unwrap_or(0))),
                WorkoutKind::Both => s.push_str(&format!(
                    " × {} reps × {}s",
                    self.reps.unwrap_or(0),
                    self.duration.unwrap_or(0)
                )),
                WorkoutKind::Repeaters => s.push_str(&format!(
                    " × {} cycles ({}s/{}s)",
                    self.repeater_cycles(),
                    self.repeater_work_secs(),
                    self.repeater_rest_secs()
                )),
            }
        }
        if self.has_weight {
            s.push_str(" + weight");
        }
        if !self.is_left_right() {
            s.push_str(&format!(" / {}s rest", self.rest_secs()));
        }
        s
    }
}

/// Treat empty form fields as absent instead of failing to parse.
pub(crate) fn deserialize_optional_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Create/edit form as posted by `workouts/form.html`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tool: String,
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    pub sets: Option<u32>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    pub duration: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    pub reps: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    pub repeater_work: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    pub repeater_rest: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    pub repeater_count: Option<u32>,
    pub has_weight: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    pub weight: Option<f64>,
    pub weight_unit: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    pub rest: Option<u32>,
    pub left_right_mode: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    pub depth: Option<u32>,
}

impl WorkoutForm {
    /// Build a template from the form, keeping only the fields its type uses.
    pub fn into_workout(self, id: String) -> Workout {
        let kind = self.kind.as_deref().and_then(WorkoutKind::parse);
        let repeaters = kind == Some(WorkoutKind::Repeaters);
        let has_weight = self.has_weight.as_deref() == Some("on");
        let tool = self.tool.trim().to_string();
        let left_right_mode = tool == FINGER_BLOCK && self.left_right_mode.as_deref() == Some("on");

        Workout {
            id,
            name: self.name.trim().to_string(),
            sets: self.sets.unwrap_or(0),
            duration: kind.filter(|k| k.has_duration()).and(self.duration),
            reps: kind.filter(|k| k.has_reps()).and(self.reps),
            repeater_work: repeaters.then(|| self.repeater_work.filter(|v| *v > 0).unwrap_or(7)),
            repeater_rest: repeaters.then(|| self.repeater_rest.filter(|v| *v > 0).unwrap_or(3)),
            repeater_count: repeaters
                .then(|| self.repeater_count.filter(|v| *v > 0).unwrap_or(10)),
            has_weight,
            weight: if has_weight { self.weight } else { None },
            weight_unit: has_weight
                .then(|| WeightUnit::parse(self.weight_unit.as_deref().unwrap_or("kg"))),
            rest: self.rest,
            left_right_mode,
            depth: self.depth,
            kind,
            tool,
            extra: Map::new(),
        }
    }
}
