use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::backup::BackupService;
use crate::error::{AppError, Result};
use crate::models::settings::{DEFAULT_BACKUP_PATH, DEFAULT_BRANCH, DEFAULT_COMMIT_MESSAGE};
use crate::models::GitHubSettings;
use crate::repositories::SettingsRepository;
use crate::version::GIT_VERSION;

#[derive(Clone)]
pub struct SettingsState {
    pub settings_repo: SettingsRepository,
    pub backup: BackupService,
}

#[derive(Template)]
#[template(path = "settings.html")]
struct SettingsTemplate {
    repo: String,
    path: String,
    branch: String,
    message: String,
    token_saved: bool,
    auto_load: bool,
    auto_sync: bool,
    flash: Option<String>,
    default_path: &'static str,
    default_branch: &'static str,
    default_message: &'static str,
    git_version: &'static str,
}

#[derive(Deserialize)]
pub struct FlashQuery {
    message: Option<String>,
}

fn redirect_with(message: &str) -> Response {
    Redirect::to(&format!(
        "/settings?message={}",
        urlencoding::encode(message)
    ))
    .into_response()
}

pub async fn index(
    State(state): State<SettingsState>,
    Query(query): Query<FlashQuery>,
) -> Result<Response> {
    let github = state.settings_repo.github().await?;
    let auto_sync = state.settings_repo.auto_sync().await?;

    let template = SettingsTemplate {
        repo: github.repo.unwrap_or_default(),
        path: github.path.unwrap_or_default(),
        branch: github.branch.unwrap_or_default(),
        message: github.message.unwrap_or_default(),
        token_saved: github.token.is_some(),
        auto_load: github.auto_load,
        auto_sync,
        flash: query.message.filter(|m| !m.is_empty()),
        default_path: DEFAULT_BACKUP_PATH,
        default_branch: DEFAULT_BRANCH,
        default_message: DEFAULT_COMMIT_MESSAGE,
        git_version: GIT_VERSION,
    };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

#[derive(Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    repo: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    branch: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    token: String,
    remember: Option<String>,
    auto_load: Option<String>,
    auto_sync: Option<String>,
}

fn non_blank(value: String) -> Option<String> {
    let value = value.trim().to_string();
    (!value.is_empty()).then_some(value)
}

pub async fn save(
    State(state): State<SettingsState>,
    Form(form): Form<SettingsForm>,
) -> Result<Response> {
    let remember = form.remember.is_some();
    let existing = state.settings_repo.github().await?;
    // A blank token field keeps a remembered token.
    let token = non_blank(form.token).or(existing.token);

    let settings = GitHubSettings {
        repo: non_blank(form.repo),
        path: non_blank(form.path),
        branch: non_blank(form.branch),
        message: non_blank(form.message),
        token,
        auto_load: form.auto_load.is_some(),
    };
    state.settings_repo.save_github(settings, remember).await?;
    state
        .settings_repo
        .set_auto_sync(form.auto_sync.is_some())
        .await?;

    tracing::info!(remember_token = remember, "Saved GitHub settings");
    Ok(redirect_with("Settings saved"))
}

#[derive(Deserialize, Default)]
pub struct TokenForm {
    #[serde(default)]
    token: String,
}

pub async fn github_save(
    State(state): State<SettingsState>,
    Form(form): Form<TokenForm>,
) -> Result<Response> {
    let outcome = state.backup.save_to_github(non_blank(form.token)).await?;
    tracing::info!(path = %outcome.path, snapshot = %outcome.snapshot_path, "Saved backup to GitHub");
    Ok(redirect_with(&format!(
        "Saved to {} and {}",
        outcome.path, outcome.snapshot_path
    )))
}

pub async fn github_load(
    State(state): State<SettingsState>,
    Form(form): Form<TokenForm>,
) -> Result<Response> {
    state.backup.load_from_github(non_blank(form.token)).await?;
    Ok(redirect_with("Loaded backup from GitHub"))
}
