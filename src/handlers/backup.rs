use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Local;
use serde_json::json;

use crate::error::Result;
use crate::models::Backup;
use crate::repositories::BackupRepository;

#[derive(Clone)]
pub struct BackupState {
    pub backups: BackupRepository,
}

/// Download everything as a dated JSON file.
pub async fn export(State(state): State<BackupState>) -> Result<Response> {
    let backup = state.backups.export().await?;
    let body = backup.to_pretty_json()?;
    let filename = format!(
        "crimpd-backup-{}.json",
        Local::now().date_naive().format("%Y-%m-%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn import(
    State(state): State<BackupState>,
    Json(backup): Json<Backup>,
) -> Result<Json<serde_json::Value>> {
    state.backups.import(backup).await?;
    tracing::info!("Imported backup upload");
    Ok(Json(json!({ "status": "ok" })))
}
