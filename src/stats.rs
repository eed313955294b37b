//! Chart data derived from the log: weekly training volume by category and
//! strength progress per workout.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{ChartKeywords, LogEntry, ProgressFilters};

pub const VOLUME_WINDOW_DAYS: i64 = 7;
pub const PROGRESS_WINDOW_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Finger,
    Pull,
    Board,
    Climbing,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Finger => "Finger Training",
            Category::Pull => "Pull-ups",
            Category::Board => "Board Climbing",
            Category::Climbing => "Climbing",
        }
    }

    fn keywords<'a>(&self, keywords: &'a ChartKeywords) -> &'a [String] {
        match self {
            Category::Finger => &keywords.finger,
            Category::Pull => &keywords.pull,
            Category::Board => &keywords.board,
            Category::Climbing => &keywords.climbing,
        }
    }

    fn matches(&self, name: &str, keywords: &ChartKeywords) -> bool {
        let name = name.to_lowercase();
        self.keywords(keywords)
            .iter()
            .any(|w| name.contains(&w.to_lowercase()))
    }
}

/// First matching category in chart order; names matching nothing count as
/// climbing.
pub fn classify(name: &str, keywords: &ChartKeywords) -> Category {
    [
        Category::Finger,
        Category::Pull,
        Category::Board,
        Category::Climbing,
    ]
    .into_iter()
    .find(|c| c.matches(name, keywords))
    .unwrap_or(Category::Climbing)
}

/// Pull or finger, the only categories with a progress line.
fn progress_category(name: &str, keywords: &ChartKeywords) -> Option<Category> {
    [Category::Pull, Category::Finger]
        .into_iter()
        .find(|c| c.matches(name, keywords))
}

fn enabled(category: Category, filters: &ProgressFilters) -> bool {
    match category {
        Category::Pull => filters.pull,
        Category::Finger => filters.finger,
        _ => false,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Volume {
    pub finger: u32,
    pub pull: u32,
    pub board: u32,
    pub climbing: u32,
}

impl Volume {
    fn bump(&mut self, category: Category) {
        match category {
            Category::Finger => self.finger += 1,
            Category::Pull => self.pull += 1,
            Category::Board => self.board += 1,
            Category::Climbing => self.climbing += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.finger + self.pull + self.board + self.climbing
    }

    /// (label, count) pairs in chart order.
    pub fn slices(&self) -> Vec<(&'static str, u32)> {
        vec![
            (Category::Finger.label(), self.finger),
            (Category::Pull.label(), self.pull),
            (Category::Board.label(), self.board),
            (Category::Climbing.label(), self.climbing),
        ]
    }
}

/// Workout sessions of the last seven days per category.
pub fn weekly_volume(log: &[LogEntry], keywords: &ChartKeywords, now: DateTime<Utc>) -> Volume {
    let cutoff = now - Duration::days(VOLUME_WINDOW_DAYS);
    let mut volume = Volume::default();
    for entry in log
        .iter()
        .filter(|e| e.is_workout() && e.date >= cutoff)
    {
        volume.bump(classify(&entry.workout_name, keywords));
    }
    volume
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSeries {
    pub workout_id: String,
    pub name: String,
    pub points: Vec<ProgressPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressPoint {
    pub date: NaiveDate,
    pub value: f64,
}

fn is_included(name: &str, included: Option<&[String]>) -> bool {
    let Some(included) = included else {
        return true;
    };
    let name = name.trim().to_lowercase();
    included.iter().any(|n| n.trim().to_lowercase() == name)
}

/// Daily best value per workout over the last 90 days, for pull and finger
/// workouts that are enabled and included.
pub fn progress(
    log: &[LogEntry],
    keywords: &ChartKeywords,
    filters: &ProgressFilters,
    included: Option<&[String]>,
    now: DateTime<Utc>,
) -> Vec<ProgressSeries> {
    let cutoff = now - Duration::days(PROGRESS_WINDOW_DAYS);
    let mut by_workout: BTreeMap<String, (String, BTreeMap<NaiveDate, f64>)> = BTreeMap::new();

    for entry in log.iter().filter(|e| e.date >= cutoff) {
        let Some(id) = entry.workout_id.as_deref().filter(|id| !id.is_empty()) else {
            continue;
        };
        let Some(category) = progress_category(&entry.workout_name, keywords) else {
            continue;
        };
        if !enabled(category, filters) || !is_included(&entry.workout_name, included) {
            continue;
        }

        let (_, days) = by_workout
            .entry(id.to_string())
            .or_insert_with(|| (entry.workout_name.clone(), BTreeMap::new()));
        days.entry(entry.day())
            .and_modify(|best| *best = best.max(entry.best_value))
            .or_insert(entry.best_value);
    }

    by_workout
        .into_iter()
        .map(|(workout_id, (name, days))| ProgressSeries {
            workout_id,
            name,
            points: days
                .into_iter()
                .map(|(date, value)| ProgressPoint { date, value })
                .collect(),
        })
        .collect()
}

/// Workout names from the last 90 days that could appear on the progress
/// chart, sorted.
pub fn progress_candidates(
    log: &[LogEntry],
    keywords: &ChartKeywords,
    filters: &ProgressFilters,
    now: DateTime<Utc>,
) -> Vec<String> {
    let cutoff = now - Duration::days(PROGRESS_WINDOW_DAYS);
    let mut names: Vec<String> = log
        .iter()
        .filter(|e| e.is_workout() && e.date >= cutoff && !e.workout_name.is_empty())
        .filter(|e| {
            [Category::Pull, Category::Finger]
                .into_iter()
                .any(|c| enabled(c, filters) && c.matches(&e.workout_name, keywords))
        })
        .map(|e| e.workout_name.clone())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Everything the log page charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub volume: Volume,
    pub progress: Vec<ProgressSeries>,
    /// Union of all progress dates, for a shared x-axis.
    pub dates: Vec<NaiveDate>,
}

impl ChartData {
    pub fn build(
        log: &[LogEntry],
        keywords: &ChartKeywords,
        filters: &ProgressFilters,
        included: Option<&[String]>,
        now: DateTime<Utc>,
    ) -> Self {
        let progress = progress(log, keywords, filters, included, now);
        let mut dates: Vec<NaiveDate> = progress
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.date))
            .collect();
        dates.sort();
        dates.dedup();
        Self {
            volume: weekly_volume(log, keywords, now),
            progress,
            dates,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn entry(days_ago: i64, id: Option<&str>, name: &str, best: f64) -> LogEntry {
        LogEntry {
            date: now() - Duration::days(days_ago),
            workout_id: id.map(str::to_string),
            workout_name: name.to_string(),
            best_value: best,
            is_pr: false,
            summary: String::new(),
            details: Vec::new(),
        }
    }

    #[test]
    fn test_classify_uses_first_match_and_fallback() {
        let kw = ChartKeywords::default();
        assert_eq!(classify("Max Hangs", &kw), Category::Finger);
        assert_eq!(classify("Weighted pull-ups", &kw), Category::Pull);
        assert_eq!(classify("Moonboard", &kw), Category::Board);
        assert_eq!(classify("Yoga", &kw), Category::Climbing);
    }

    #[test]
    fn test_weekly_volume_skips_old_and_notes() {
        let log = vec![
            entry(1, Some("a"), "Max hangs", 10.0),
            entry(2, Some("b"), "Pull-ups", 5.0),
            entry(3, Some("b"), "Pull-ups", 5.0),
            entry(8, Some("b"), "Pull-ups", 5.0),
            entry(1, None, "", 0.0),
            entry(0, Some("c"), "Kilter board", 0.0),
        ];
        let v = weekly_volume(&log, &ChartKeywords::default(), now());
        assert_eq!(
            v,
            Volume {
                finger: 1,
                pull: 2,
                board: 1,
                climbing: 0
            }
        );
        assert_eq!(v.total(), 4);
    }

    #[test]
    fn test_progress_daily_max_sorted() {
        let log = vec![
            entry(1, Some("p"), "Weighted pull-ups", 12.0),
            entry(5, Some("p"), "Weighted pull-ups", 10.0),
            entry(1, Some("p"), "Weighted pull-ups", 15.0),
            entry(100, Some("p"), "Weighted pull-ups", 50.0),
            entry(1, Some("y"), "Yoga", 1.0),
        ];
        let series = progress(
            &log,
            &ChartKeywords::default(),
            &ProgressFilters::default(),
            None,
            now(),
        );
        assert_eq!(series.len(), 1);
        let values: Vec<f64> = series[0].points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![10.0, 15.0]);
        assert_eq!(series[0].name, "Weighted pull-ups");
    }

    #[test]
    fn test_progress_respects_filters_and_included() {
        let log = vec![
            entry(1, Some("p"), "Weighted pull-ups", 12.0),
            entry(1, Some("h"), "Max hangs", 20.0),
        ];
        let filters = ProgressFilters {
            pull: false,
            finger: true,
        };
        let kw = ChartKeywords::default();
        let series = progress(&log, &kw, &filters, None, now());
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].workout_id, "h");

        let included = vec!["  max HANGS ".to_string()];
        let all = ProgressFilters::default();
        let series = progress(&log, &kw, &all, Some(included.as_slice()), now());
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].workout_id, "h");

        let series = progress(&log, &kw, &all, Some(Vec::new().as_slice()), now());
        assert!(series.is_empty());
    }

    #[test]
    fn test_progress_candidates_unique_sorted() {
        let log = vec![
            entry(1, Some("p"), "Weighted pull-ups", 12.0),
            entry(2, Some("p"), "Weighted pull-ups", 12.0),
            entry(1, Some("h"), "Max hangs", 20.0),
            entry(1, Some("b"), "Moonboard", 0.0),
        ];
        let names = progress_candidates(
            &log,
            &ChartKeywords::default(),
            &ProgressFilters::default(),
            now(),
        );
        assert_eq!(names, vec!["Max hangs", "Weighted pull-ups"]);
    }

    #[test]
    fn test_chart_data_shares_dates() {
        let log = vec![
            entry(1, Some("p"), "Weighted pull-ups", 12.0),
            entry(3, Some("h"), "Max hangs", 20.0),
            entry(1, Some("h"), "Max hangs", 22.0),
        ];
        let data = ChartData::build(
            &log,
            &ChartKeywords::default(),
            &ProgressFilters::default(),
            None,
            now(),
        );
        assert_eq!(data.dates.len(), 2);
        assert_eq!(data.progress.len(), 2);
        assert_eq!(data.volume.total(), 3);
    }
}
