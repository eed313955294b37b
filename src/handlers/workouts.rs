use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};

use crate::error::{AppError, Result};
use crate::models::workout::TOOLS;
use crate::models::{Workout, WorkoutForm, WorkoutKind};
use crate::repositories::WorkoutRepository;

#[derive(Clone)]
pub struct WorkoutsState {
    pub workout_repo: WorkoutRepository,
}

pub struct WorkoutRow {
    pub id: String,
    pub name: String,
    pub tool: String,
    pub summary: String,
}

pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Form fields pre-rendered as strings so blank inputs stay blank.
pub struct FormView {
    pub action: String,
    pub heading: String,
    pub name: String,
    pub tools: Vec<SelectOption>,
    pub kinds: Vec<SelectOption>,
    pub units: Vec<SelectOption>,
    pub sets: String,
    pub duration: String,
    pub reps: String,
    pub repeater_work: String,
    pub repeater_rest: String,
    pub repeater_count: String,
    pub has_weight: bool,
    pub weight: String,
    pub rest: String,
    pub left_right_mode: bool,
    pub depth: String,
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl FormView {
    fn new(action: String, heading: &str, w: &Workout) -> Self {
        let kind = w.kind;
        Self {
            action,
            heading: heading.to_string(),
            name: w.name.clone(),
            tools: TOOLS
                .iter()
                .map(|t| SelectOption {
                    value: t.to_string(),
                    label: t.to_string(),
                    selected: w.tool == *t,
                })
                .collect(),
            kinds: WorkoutKind::ALL
                .iter()
                .map(|k| SelectOption {
                    value: k.as_str().to_string(),
                    label: k.label().to_string(),
                    selected: kind == Some(*k),
                })
                .collect(),
            units: ["kg", "lbs"]
                .iter()
                .map(|u| SelectOption {
                    value: u.to_string(),
                    label: u.to_string(),
                    selected: w.unit().as_str() == *u,
                })
                .collect(),
            sets: if w.sets == 0 { String::new() } else { w.sets.to_string() },
            duration: opt(w.duration),
            reps: opt(w.reps),
            repeater_work: opt(w.repeater_work),
            repeater_rest: opt(w.repeater_rest),
            repeater_count: opt(w.repeater_count),
            has_weight: w.has_weight,
            weight: opt(w.weight),
            rest: opt(w.rest),
            left_right_mode: w.left_right_mode,
            depth: opt(w.depth),
        }
    }
}

#[derive(Template)]
#[template(path = "workouts/list.html")]
struct WorkoutsListTemplate {
    workouts: Vec<WorkoutRow>,
}

#[derive(Template)]
#[template(path = "workouts/form.html")]
struct WorkoutFormTemplate {
    form: FormView,
    error: Option<String>,
}

fn render_form(form: FormView, error: Option<String>) -> Result<Response> {
    let template = WorkoutFormTemplate { form, error };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn list(State(state): State<WorkoutsState>) -> Result<Response> {
    let library = state.workout_repo.library().await?;
    let workouts = library
        .workouts()
        .map(|w| WorkoutRow {
            id: w.id.clone(),
            name: w.name.clone(),
            tool: w.tool.clone(),
            summary: w.summary(),
        })
        .collect();

    let template = WorkoutsListTemplate { workouts };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn new_page() -> Result<Response> {
    let blank = Workout {
        sets: 3,
        kind: Some(WorkoutKind::Duration),
        rest: Some(120),
        ..Default::default()
    };
    render_form(
        FormView::new("/workouts".to_string(), "New workout", &blank),
        None,
    )
}

pub async fn create(
    State(state): State<WorkoutsState>,
    Form(form): Form<WorkoutForm>,
) -> Result<Response> {
    let workout = form.into_workout(Workout::generate_id());
    if let Some(error) = workout.validate() {
        return render_form(
            FormView::new("/workouts".to_string(), "New workout", &workout),
            Some(error.to_string()),
        );
    }

    tracing::info!(id = %workout.id, name = %workout.name, "Created workout");
    state.workout_repo.save_workout(workout).await?;
    Ok(Redirect::to("/workouts").into_response())
}

pub async fn edit_page(
    State(state): State<WorkoutsState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let workout = state
        .workout_repo
        .find_workout(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Workout not found".to_string()))?;

    render_form(
        FormView::new(format!("/workouts/{}", workout.id), "Edit workout", &workout),
        None,
    )
}

pub async fn update(
    State(state): State<WorkoutsState>,
    Path(id): Path<String>,
    Form(form): Form<WorkoutForm>,
) -> Result<Response> {
    let existing = state
        .workout_repo
        .find_workout(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Workout not found".to_string()))?;

    let mut workout = form.into_workout(id);
    workout.extra = existing.extra;
    if let Some(error) = workout.validate() {
        return render_form(
            FormView::new(format!("/workouts/{}", workout.id), "Edit workout", &workout),
            Some(error.to_string()),
        );
    }

    state.workout_repo.save_workout(workout).await?;
    Ok(Redirect::to("/workouts").into_response())
}

pub async fn delete(
    State(state): State<WorkoutsState>,
    Path(id): Path<String>,
) -> Result<Response> {
    if !state.workout_repo.delete(&id).await? {
        return Err(AppError::NotFound("Workout not found".to_string()));
    }
    Ok(Redirect::to("/workouts").into_response())
}
