use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Accept RFC 3339 timestamps as well as bare `YYYY-MM-DD` dates (plan-day
/// entries were historically stored that way).
fn deserialize_flexible_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flexible_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
}

pub fn parse_flexible_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(start_of_day)
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Historical record of a finished session, note or activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(deserialize_with = "deserialize_flexible_date")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub workout_id: Option<String>,
    #[serde(default)]
    pub workout_name: String,
    #[serde(default)]
    pub best_value: f64,
    #[serde(default, rename = "isPR")]
    pub is_pr: bool,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub details: Vec<String>,
}

impl LogEntry {
    /// Free-text note pinned to a plan day.
    pub fn note(date: NaiveDate, text: &str) -> Self {
        Self {
            date: start_of_day(date),
            workout_id: None,
            workout_name: String::new(),
            best_value: 0.0,
            is_pr: false,
            summary: text.to_string(),
            details: Vec::new(),
        }
    }

    /// Completed activity, optionally annotated.
    pub fn activity(date: NaiveDate, title: &str, note: Option<&str>) -> Self {
        let summary = match note.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => format!("{title} — {n}"),
            None => title.to_string(),
        };
        Self {
            date: start_of_day(date),
            workout_id: None,
            workout_name: title.to_string(),
            best_value: 0.0,
            is_pr: false,
            summary,
            details: Vec::new(),
        }
    }

    pub fn is_workout(&self) -> bool {
        self.workout_id.is_some()
    }

    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }
}

/// Entries for one calendar day, newest first, with their index in the log.
#[derive(Debug, Clone)]
pub struct LogDay {
    pub date: NaiveDate,
    pub entries: Vec<(usize, LogEntry)>,
}

impl LogDay {
    pub fn pretty_date(&self) -> String {
        self.date.format("%A, %b %-d").to_string()
    }
}

/// Group entries by day, newest day first; within a day the most recently
/// appended entry comes first.
pub fn group_by_day(log: &[LogEntry]) -> Vec<LogDay> {
    let mut days: Vec<LogDay> = Vec::new();
    for (idx, entry) in log.iter().enumerate().rev() {
        let date = entry.day();
        match days.iter_mut().find(|d| d.date == date) {
            Some(day) => day.entries.push((idx, entry.clone())),
            None => days.push(LogDay {
                date,
                entries: vec![(idx, entry.clone())],
            }),
        }
    }
    days.sort_by(|a, b| b.date.cmp(&a.date));
    days
}
