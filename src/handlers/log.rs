use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::log_entry::group_by_day;
use crate::models::{ChartKeywords, LogEntry, ProgressFilters};
use crate::repositories::{ChartSettings, LogRepository, SettingsRepository};
use crate::stats::{progress_candidates, ChartData};

#[derive(Clone)]
pub struct LogState {
    pub log_repo: LogRepository,
    pub settings_repo: SettingsRepository,
}

pub struct EntryView {
    pub index: usize,
    pub name: String,
    pub summary: String,
    pub details: Vec<String>,
    pub is_pr: bool,
    pub is_note: bool,
}

pub struct DayGroup {
    pub label: String,
    pub entries: Vec<EntryView>,
}

pub struct BarView {
    pub label: &'static str,
    pub count: u32,
    pub percent: u32,
}

pub struct SeriesView {
    pub name: String,
    pub points: Vec<(String, String)>,
}

#[derive(Template)]
#[template(path = "log/index.html")]
struct LogTemplate {
    days: Vec<DayGroup>,
    bars: Vec<BarView>,
    total: u32,
    series: Vec<SeriesView>,
}

fn entry_view(index: usize, entry: LogEntry) -> EntryView {
    EntryView {
        index,
        is_note: entry.workout_id.is_none() && entry.workout_name.is_empty(),
        name: entry.workout_name,
        summary: entry.summary,
        details: entry.details,
        is_pr: entry.is_pr,
    }
}

async fn chart_data(state: &LogState, log: &[LogEntry]) -> Result<ChartData> {
    let charts = state.settings_repo.charts().await?;
    Ok(ChartData::build(
        log,
        &charts.keywords,
        &charts.filters,
        charts.included_workouts.as_deref(),
        Utc::now(),
    ))
}

pub async fn index(State(state): State<LogState>) -> Result<Response> {
    let log = state.log_repo.all().await?;
    let data = chart_data(&state, &log).await?;

    let total = data.volume.total();
    let bars = data
        .volume
        .slices()
        .into_iter()
        .map(|(label, count)| BarView {
            label,
            count,
            percent: if total == 0 { 0 } else { count * 100 / total },
        })
        .collect();

    let series = data
        .progress
        .iter()
        .map(|s| SeriesView {
            name: s.name.clone(),
            points: s
                .points
                .iter()
                .map(|p| (p.date.format("%b %-d").to_string(), p.value.to_string()))
                .collect(),
        })
        .collect();

    let days = group_by_day(&log)
        .into_iter()
        .map(|day| DayGroup {
            label: day.pretty_date(),
            entries: day
                .entries
                .into_iter()
                .map(|(index, entry)| entry_view(index, entry))
                .collect(),
        })
        .collect();

    let template = LogTemplate {
        days,
        bars,
        total,
        series,
    };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn charts_json(State(state): State<LogState>) -> Result<Json<ChartData>> {
    let log = state.log_repo.all().await?;
    Ok(Json(chart_data(&state, &log).await?))
}

pub async fn delete(
    State(state): State<LogState>,
    Path(index): Path<usize>,
) -> Result<Response> {
    if !state.log_repo.delete(index).await? {
        return Err(AppError::NotFound("Log entry not found".to_string()));
    }
    Ok(Redirect::to("/log").into_response())
}

pub async fn clear(State(state): State<LogState>) -> Result<Response> {
    state.log_repo.clear().await?;
    Ok(Redirect::to("/log").into_response())
}

pub struct CandidateView {
    pub name: String,
    pub checked: bool,
}

#[derive(Template)]
#[template(path = "log/settings.html")]
struct ChartSettingsTemplate {
    finger: String,
    pull: String,
    board: String,
    climbing: String,
    progress_pull: bool,
    progress_finger: bool,
    candidates: Vec<CandidateView>,
}

pub async fn settings_page(State(state): State<LogState>) -> Result<Response> {
    let charts = state.settings_repo.charts().await?;
    let log = state.log_repo.all().await?;
    let names = progress_candidates(&log, &charts.keywords, &charts.filters, Utc::now());

    let candidates = names
        .into_iter()
        .map(|name| CandidateView {
            checked: charts
                .included_workouts
                .as_ref()
                .map_or(true, |included| included.contains(&name)),
            name,
        })
        .collect();

    let k = &charts.keywords;
    let template = ChartSettingsTemplate {
        finger: k.finger.join(", "),
        pull: k.pull.join(", "),
        board: k.board.join(", "),
        climbing: k.climbing.join(", "),
        progress_pull: charts.filters.pull,
        progress_finger: charts.filters.finger,
        candidates,
    };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

/// Checkboxes repeat the `included` key, so the form is read as pairs.
pub async fn save_settings(
    State(state): State<LogState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let field = |name: &str| {
        fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    };
    let list = |name: &str, fallback: Vec<String>| {
        let parsed = ChartKeywords::parse_list(field(name).unwrap_or_default());
        if parsed.is_empty() {
            fallback
        } else {
            parsed
        }
    };

    let defaults = ChartKeywords::default();
    let keywords = ChartKeywords {
        finger: list("finger", defaults.finger),
        pull: list("pull", defaults.pull),
        board: list("board", defaults.board),
        climbing: list("climbing", defaults.climbing),
    };
    let filters = ProgressFilters {
        pull: field("progress_pull") == Some("on"),
        finger: field("progress_finger") == Some("on"),
    };
    let included = fields
        .iter()
        .filter(|(k, _)| k == "included")
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();

    state
        .settings_repo
        .save_charts(ChartSettings {
            keywords,
            filters,
            included_workouts: Some(included),
        })
        .await?;
    tracing::info!("Saved chart settings");
    Ok(Redirect::to("/log").into_response())
}
