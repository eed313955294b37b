use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::plan::{month_grid, next_seven_days, shift_month};
use crate::models::{Library, LibraryEntry, Plan};
use crate::repositories::{PlanRepository, WorkoutRepository};

#[derive(Clone)]
pub struct PlanState {
    pub plan_repo: PlanRepository,
    pub workout_repo: WorkoutRepository,
}

pub struct ItemView {
    pub id: String,
    pub id_encoded: String,
    pub name: String,
    pub is_activity: bool,
    pub is_workout: bool,
    pub recurring: bool,
    pub completed: bool,
}

pub struct DayView {
    pub iso: String,
    pub label: String,
    pub is_today: bool,
    pub items: Vec<ItemView>,
    pub note: String,
    pub has_note: bool,
}

pub struct MonthCell {
    pub iso: String,
    pub day: u32,
    pub is_today: bool,
    pub planned: usize,
    pub completed: usize,
    pub has_note: bool,
}

pub struct ChoiceView {
    pub id: String,
    pub label: String,
}

#[derive(Template)]
#[template(path = "plan/week.html")]
struct WeekTemplate {
    days: Vec<DayView>,
    choices: Vec<ChoiceView>,
    week: i64,
    prev_week: i64,
    next_week: i64,
}

#[derive(Template)]
#[template(path = "plan/month.html")]
struct MonthTemplate {
    title: String,
    weeks: Vec<Vec<Option<MonthCell>>>,
    prev_month: i32,
    next_month: i32,
}

#[derive(Deserialize)]
pub struct PlanQuery {
    week: Option<i64>,
    view: Option<String>,
    month: Option<i32>,
}

fn item_view(plan: &Plan, library: &Library, date: NaiveDate, id: String) -> ItemView {
    let entry = library.find(&id);
    let name = match entry {
        Some(LibraryEntry::Activity(a)) => a.title(),
        Some(LibraryEntry::Workout(w)) => w.name.clone(),
        None => format!("{id} (deleted)"),
    };
    ItemView {
        id_encoded: urlencoding::encode(&id).into_owned(),
        is_activity: matches!(entry, Some(LibraryEntry::Activity(_))),
        is_workout: matches!(entry, Some(LibraryEntry::Workout(_))),
        recurring: plan.is_recurring(date, &id),
        completed: plan.is_completed(date, &id),
        name,
        id,
    }
}

fn day_view(plan: &Plan, library: &Library, date: NaiveDate, today: NaiveDate) -> DayView {
    let note = plan.notes.get(&date).cloned().unwrap_or_default();
    DayView {
        iso: date.to_string(),
        label: date.format("%a %b %-d").to_string(),
        is_today: date == today,
        items: plan
            .items_for(date)
            .into_iter()
            .map(|id| item_view(plan, library, date, id))
            .collect(),
        has_note: !note.is_empty(),
        note,
    }
}

fn choices(library: &Library) -> Vec<ChoiceView> {
    let workouts = library.workouts().map(|w| ChoiceView {
        id: w.id.clone(),
        label: w.name.clone(),
    });
    let activities = library.activities().map(|a| ChoiceView {
        id: a.id.clone(),
        label: format!("{} (activity)", a.title()),
    });
    workouts.chain(activities).collect()
}

pub async fn index(
    State(state): State<PlanState>,
    Query(query): Query<PlanQuery>,
) -> Result<Response> {
    let today = chrono::Local::now().date_naive();
    let plan = state.plan_repo.load().await?;

    if query.view.as_deref() == Some("month") {
        let offset = query.month.unwrap_or(0);
        let first = shift_month(today, offset)
            .and_then(|(year, month)| NaiveDate::from_ymd_opt(year, month, 1))
            .ok_or_else(|| AppError::BadRequest("Month out of range".to_string()))?;
        let (year, month) = (first.year(), first.month());
        let weeks = month_grid(year, month)
            .into_iter()
            .map(|week| {
                week.into_iter()
                    .map(|cell| {
                        cell.map(|date| MonthCell {
                            iso: date.to_string(),
                            day: date.day(),
                            is_today: date == today,
                            planned: plan.items_for(date).len(),
                            completed: plan.completed.get(&date).map_or(0, Vec::len),
                            has_note: plan.notes.contains_key(&date),
                        })
                    })
                    .collect()
            })
            .collect();

        let template = MonthTemplate {
            title: first.format("%B %Y").to_string(),
            weeks,
            prev_month: offset.saturating_sub(1),
            next_month: offset.saturating_add(1),
        };
        return Ok(Html(
            template
                .render()
                .map_err(|e| AppError::Internal(e.to_string()))?,
        )
        .into_response());
    }

    let week = query.week.unwrap_or(0);
    let library = state.workout_repo.library().await?;
    let days = next_seven_days(today, week)
        .ok_or_else(|| AppError::BadRequest("Week out of range".to_string()))?
        .into_iter()
        .map(|date| day_view(&plan, &library, date, today))
        .collect();

    let template = WeekTemplate {
        days,
        choices: choices(&library),
        week,
        prev_week: week.saturating_sub(1),
        next_week: week.saturating_add(1),
    };

    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

#[derive(Deserialize)]
pub struct ScheduleForm {
    id: String,
}

pub async fn schedule(
    State(state): State<PlanState>,
    Path(date): Path<NaiveDate>,
    Form(form): Form<ScheduleForm>,
) -> Result<Response> {
    let id = form.id.trim();
    if id.is_empty() {
        return Err(AppError::Validation("Pick a workout or activity".to_string()));
    }
    state.plan_repo.schedule(date, id).await?;
    Ok(Redirect::to("/plan").into_response())
}

pub async fn unschedule(
    State(state): State<PlanState>,
    Path((date, id)): Path<(NaiveDate, String)>,
) -> Result<Response> {
    state.plan_repo.unschedule(date, &id).await?;
    Ok(Redirect::to("/plan").into_response())
}

pub async fn toggle_recurring(
    State(state): State<PlanState>,
    Path((date, id)): Path<(NaiveDate, String)>,
) -> Result<Response> {
    state.plan_repo.toggle_recurring(date, &id).await?;
    Ok(Redirect::to("/plan").into_response())
}

#[derive(Deserialize, Default)]
pub struct CompleteForm {
    #[serde(default)]
    note: Option<String>,
}

pub async fn toggle_completed(
    State(state): State<PlanState>,
    Path((date, id)): Path<(NaiveDate, String)>,
    Form(form): Form<CompleteForm>,
) -> Result<Response> {
    state
        .plan_repo
        .toggle_completed(date, &id, form.note)
        .await?;
    Ok(Redirect::to("/plan").into_response())
}

#[derive(Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    text: String,
}

pub async fn set_note(
    State(state): State<PlanState>,
    Path(date): Path<NaiveDate>,
    Form(form): Form<NoteForm>,
) -> Result<Response> {
    state.plan_repo.set_note(date, &form.text).await?;
    Ok(Redirect::to("/plan").into_response())
}

pub async fn delete_note(
    State(state): State<PlanState>,
    Path(date): Path<NaiveDate>,
) -> Result<Response> {
    state.plan_repo.delete_note(date).await?;
    Ok(Redirect::to("/plan").into_response())
}
