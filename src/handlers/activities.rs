use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::repositories::WorkoutRepository;

#[derive(Clone)]
pub struct ActivitiesState {
    pub workout_repo: WorkoutRepository,
}

pub struct ActivityRow {
    pub name: String,
    pub name_encoded: String,
    pub title: String,
    pub note: String,
}

#[derive(Template)]
#[template(path = "activities.html")]
struct ActivitiesTemplate {
    activities: Vec<ActivityRow>,
}

pub async fn list(State(state): State<ActivitiesState>) -> Result<Response> {
    let library = state.workout_repo.library().await?;
    let activities = library
        .activities()
        .map(|a| ActivityRow {
            name: a.name.clone(),
            name_encoded: urlencoding::encode(&a.name).into_owned(),
            title: a.title(),
            note: a.note.clone().unwrap_or_default(),
        })
        .collect();

    let template = ActivitiesTemplate { activities };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

#[derive(Deserialize)]
pub struct AddActivityForm {
    name: String,
}

pub async fn create(
    State(state): State<ActivitiesState>,
    Form(form): Form<AddActivityForm>,
) -> Result<Response> {
    if form.name.trim().is_empty() {
        return Err(AppError::Validation("Activity name required".to_string()));
    }
    state.workout_repo.add_activity(&form.name).await?;
    Ok(Redirect::to("/activities").into_response())
}

#[derive(Deserialize)]
pub struct UpdateActivityForm {
    name: String,
    #[serde(default)]
    note: Option<String>,
}

pub async fn update(
    State(state): State<ActivitiesState>,
    Path(old_name): Path<String>,
    Form(form): Form<UpdateActivityForm>,
) -> Result<Response> {
    if form.name.trim().is_empty() {
        return Err(AppError::Validation("Activity name required".to_string()));
    }
    state
        .workout_repo
        .update_activity(&old_name, &form.name, form.note)
        .await?;
    Ok(Redirect::to("/activities").into_response())
}

pub async fn delete(
    State(state): State<ActivitiesState>,
    Path(name): Path<String>,
) -> Result<Response> {
    if !state.workout_repo.remove_activity(&name).await? {
        return Err(AppError::NotFound("Activity not found".to_string()));
    }
    Ok(Redirect::to("/activities").into_response())
}
