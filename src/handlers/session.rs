use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::backup::BackupService;
use crate::error::{AppError, Result};
use crate::models::workout::deserialize_optional_number;
use crate::repositories::{SessionRepository, WorkoutRepository};
use crate::timer::{Phase, SessionError, SessionManager, SessionState};

#[derive(Clone)]
pub struct TimerState {
    pub sessions: SessionManager,
    pub workout_repo: WorkoutRepository,
    pub session_repo: SessionRepository,
    pub backup: BackupService,
}

/// Live timer state, as polled by the remote display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub workout_id: String,
    pub workout_name: String,
    pub phase: Phase,
    pub label: &'static str,
    pub seconds_left: u32,
    pub time_left: u32,
    pub current_set: u32,
    pub total_sets: u32,
    pub current_rep: u32,
    pub repeater_counter: u32,
    pub repeater_cycles: u32,
    pub inputs: Vec<u32>,
    pub reps_checked: Vec<bool>,
}

impl From<&SessionState> for TimerSnapshot {
    fn from(s: &SessionState) -> Self {
        Self {
            workout_id: s.workout.id.clone(),
            workout_name: s.workout.name.clone(),
            phase: s.phase,
            label: s.phase.label(),
            seconds_left: s.seconds_left(),
            time_left: s.time_left,
            current_set: s.current_set + 1,
            total_sets: s.total_sets,
            current_rep: s.current_rep,
            repeater_counter: s.repeater_counter,
            repeater_cycles: s.workout.repeater_cycles(),
            inputs: s.inputs.clone(),
            reps_checked: s.reps_checked.clone(),
        }
    }
}

pub struct SetRow {
    pub index: usize,
    pub number: usize,
    pub reps: u32,
    pub checked: bool,
}

pub struct SessionView {
    pub workout_name: String,
    pub summary: String,
    pub label: &'static str,
    pub clock: String,
    pub set_label: String,
    pub is_setup: bool,
    pub is_timed: bool,
    pub is_rest: bool,
    pub is_reps_ui: bool,
    pub is_finished: bool,
    pub counts_reps: bool,
    pub current_rep: u32,
    pub repeater_label: Option<String>,
    pub has_weight: bool,
    pub weight: String,
    pub weight_unit: &'static str,
    pub asks_depth: bool,
    pub depth: String,
    pub sets: Vec<SetRow>,
    pub can_finish: bool,
}

fn clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

impl From<&SessionState> for SessionView {
    fn from(s: &SessionState) -> Self {
        let w = &s.workout;
        let repeaters = matches!(s.phase, Phase::RepeatersWork | Phase::RepeatersRest);
        Self {
            workout_name: w.name.clone(),
            summary: w.summary(),
            label: s.phase.label(),
            clock: clock(s.seconds_left()),
            set_label: format!("Set {} / {}", s.current_set + 1, s.total_sets),
            is_setup: s.phase == Phase::Setup,
            is_timed: s.phase.is_timed(),
            is_rest: s.phase.is_rest(),
            is_reps_ui: s.phase == Phase::RepsUi,
            is_finished: s.phase == Phase::Finished,
            counts_reps: s.phase == Phase::Work && w.kind().has_reps(),
            current_rep: s.current_rep,
            repeater_label: repeaters.then(|| {
                format!("Cycle {} / {}", s.repeater_counter + 1, w.repeater_cycles())
            }),
            has_weight: w.has_weight,
            weight: s
                .preset_weight
                .or(w.weight)
                .map(|v| v.to_string())
                .unwrap_or_default(),
            weight_unit: w.unit().as_str(),
            asks_depth: w.is_finger(),
            depth: s
                .preset_depth
                .or(w.depth)
                .map(|v| v.to_string())
                .unwrap_or_default(),
            sets: s
                .inputs
                .iter()
                .zip(s.reps_checked.iter())
                .enumerate()
                .map(|(index, (reps, checked))| SetRow {
                    index,
                    number: index + 1,
                    reps: *reps,
                    checked: *checked,
                })
                .collect(),
            can_finish: s.ready_to_finish().is_ok(),
        }
    }
}

#[derive(Template)]
#[template(path = "session/show.html")]
struct SessionTemplate {
    session: Option<SessionView>,
}

#[derive(Template)]
#[template(path = "session/remote.html")]
struct RemoteTemplate {
    session: Option<SessionView>,
}

#[derive(Deserialize)]
pub struct StartForm {
    workout_id: String,
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    plan_date: Option<NaiveDate>,
}

pub async fn start(
    State(state): State<TimerState>,
    Form(form): Form<StartForm>,
) -> Result<Response> {
    let workout = state
        .workout_repo
        .find_workout(&form.workout_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Workout not found".to_string()))?;

    state.sessions.start(workout, form.plan_date).await;
    Ok(Redirect::to("/session").into_response())
}

pub async fn show(State(state): State<TimerState>) -> Result<Response> {
    let session = state.sessions.snapshot().await;
    let template = SessionTemplate {
        session: session.as_ref().map(SessionView::from),
    };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn remote(State(state): State<TimerState>) -> Result<Response> {
    let session = state.sessions.snapshot().await;
    let template = RemoteTemplate {
        session: session.as_ref().map(SessionView::from),
    };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn state_json(State(state): State<TimerState>) -> Result<Json<TimerSnapshot>> {
    let session = state
        .sessions
        .snapshot()
        .await
        .ok_or(SessionError::NoSession)?;
    Ok(Json(TimerSnapshot::from(&session)))
}

#[derive(Deserialize)]
pub struct BeginForm {
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    weight: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    depth: Option<u32>,
}

pub async fn begin(
    State(state): State<TimerState>,
    Form(form): Form<BeginForm>,
) -> Result<Response> {
    state
        .sessions
        .update(move |s| s.begin(form.weight, form.depth))
        .await?;
    Ok(Redirect::to("/session").into_response())
}

#[derive(Deserialize)]
pub struct DeltaForm {
    delta: i32,
}

pub async fn adjust(
    State(state): State<TimerState>,
    Form(form): Form<DeltaForm>,
) -> Result<Response> {
    state.sessions.update(move |s| s.adjust(form.delta)).await?;
    Ok(Redirect::to("/session").into_response())
}

pub async fn skip(State(state): State<TimerState>) -> Result<Response> {
    state.sessions.update(|s| s.skip().map(|_| ())).await?;
    Ok(Redirect::to("/session").into_response())
}

/// Count reps during a timed work phase.
pub async fn add_reps(
    State(state): State<TimerState>,
    Form(form): Form<DeltaForm>,
) -> Result<Response> {
    state
        .sessions
        .update(move |s| {
            if s.phase != Phase::Work || !s.workout.kind().has_reps() {
                return Err(SessionError::WrongPhase(s.phase));
            }
            s.add_reps(form.delta);
            Ok(())
        })
        .await?;
    Ok(Redirect::to("/session").into_response())
}

pub async fn set_reps(
    State(state): State<TimerState>,
    Path(index): Path<usize>,
    Form(form): Form<DeltaForm>,
) -> Result<Response> {
    state
        .sessions
        .update(move |s| s.adjust_set_reps(index, form.delta))
        .await?;
    Ok(Redirect::to("/session").into_response())
}

pub async fn toggle_set(
    State(state): State<TimerState>,
    Path(index): Path<usize>,
) -> Result<Response> {
    state.sessions.update(move |s| s.toggle_set(index)).await?;
    Ok(Redirect::to("/session").into_response())
}

#[derive(Deserialize)]
pub struct WeightForm {
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    weight: Option<f64>,
}

pub async fn set_weight(
    State(state): State<TimerState>,
    Form(form): Form<WeightForm>,
) -> Result<Response> {
    state
        .sessions
        .update(move |s| s.set_weight(form.weight.unwrap_or(0.0)))
        .await?;
    Ok(Redirect::to("/session").into_response())
}

#[derive(Deserialize, Default)]
pub struct FinishForm {
    #[serde(default)]
    note: Option<String>,
}

pub async fn finish(
    State(state): State<TimerState>,
    Form(form): Form<FinishForm>,
) -> Result<Response> {
    let session = state.sessions.finish().await?;

    let entry = match state
        .session_repo
        .record_completion(session.clone(), form.note, Utc::now())
        .await
    {
        Ok(entry) => entry,
        Err(e) => {
            state.sessions.restore(session).await;
            return Err(e);
        }
    };
    tracing::info!(
        workout = %entry.workout_name,
        summary = %entry.summary,
        new_pr = entry.is_pr,
        "Logged session"
    );

    state.backup.spawn_auto_sync().await;

    Ok(Redirect::to("/log").into_response())
}

pub async fn cancel(State(state): State<TimerState>) -> Result<Response> {
    state.sessions.cancel().await;
    Ok(Redirect::to("/plan").into_response())
}
