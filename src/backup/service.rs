use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use super::github::{BackupTarget, GitHubClient};
use crate::error::{AppError, Result};
use crate::models::Backup;
use crate::repositories::{BackupRepository, SettingsRepository};

/// `data/backup.json` at 2026-10-16 18:00:00 becomes
/// `data/backup-20261016T180000Z.json`.
pub fn timestamped_path(path: &str, now: DateTime<Utc>) -> String {
    let stamp = now.format("%Y%m%dT%H%M%SZ");
    let (dir, file) = match path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, path),
    };
    let file = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{stamp}.{ext}"),
        _ => format!("{file}-{stamp}"),
    };
    match dir {
        Some(dir) => format!("{dir}/{file}"),
        None => file,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub path: String,
    pub snapshot_path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AutoLoad {
    LocalFile(PathBuf),
    GitHub,
    Skipped,
    Failed(String),
}

#[derive(Clone)]
pub struct BackupService {
    client: GitHubClient,
    backups: BackupRepository,
    settings: SettingsRepository,
    data_dir: PathBuf,
}

impl BackupService {
    pub fn new(
        client: GitHubClient,
        backups: BackupRepository,
        settings: SettingsRepository,
        data_dir: PathBuf,
    ) -> Self {
        Self {
            client,
            backups,
            settings,
            data_dir,
        }
    }

    async fn target(&self, token: Option<String>) -> Result<BackupTarget> {
        let settings = self.settings.github().await?;
        BackupTarget::from_settings(&settings, token)
    }

    /// Merge local data with the remote backup, keep the merged result
    /// locally, then write it to the configured path plus a timestamped copy.
    pub async fn save_to_github(&self, token: Option<String>) -> Result<SaveOutcome> {
        let target = self.target(token).await?;

        // Local data is read after the fetch, inside the merge transaction.
        let (remote, sha) = match self.client.fetch_file(&target, &target.path).await? {
            Some(file) => match serde_json::from_slice::<Backup>(&file.content) {
                Ok(remote) => (Some(remote), Some(file.sha)),
                Err(e) => {
                    tracing::warn!(error = %e, "Remote backup unreadable, overwriting it");
                    (None, Some(file.sha))
                }
            },
            None => (None, None),
        };
        let merged = self.backups.merge_remote(remote).await?;

        let content = merged.to_pretty_json()?;
        self.client
            .put_file(&target, &target.path, content.as_bytes(), sha.as_deref())
            .await?;

        let snapshot_path = timestamped_path(&target.path, Utc::now());
        self.client
            .put_file(&target, &snapshot_path, content.as_bytes(), None)
            .await?;

        Ok(SaveOutcome {
            path: target.path,
            snapshot_path,
        })
    }

    /// Replace local data with the GitHub copy.
    pub async fn load_from_github(&self, token: Option<String>) -> Result<()> {
        let target = self.target(token).await?;
        let file = self
            .client
            .fetch_file(&target, &target.path)
            .await?
            .ok_or_else(|| AppError::GitHub("Not Found".to_string()))?;
        let backup: Backup = serde_json::from_slice(&file.content)
            .map_err(|e| AppError::GitHub(format!("Backup is not valid JSON: {e}")))?;
        self.backups.import(backup).await?;
        tracing::info!(path = %target.path, "Loaded backup from GitHub");
        Ok(())
    }

    async fn read_backup_file(path: &Path) -> std::result::Result<Backup, String> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| e.to_string())?;
        serde_json::from_str(&raw).map_err(|e| e.to_string())
    }

    /// Startup restore: a backup file under the data directory wins,
    /// otherwise GitHub when auto-load is on. Never fails startup.
    pub async fn auto_load_on_startup(&self) -> AutoLoad {
        let settings = match self.settings.github().await {
            Ok(settings) => settings,
            Err(e) => return AutoLoad::Failed(e.to_string()),
        };

        let local = self.data_dir.join(settings.path_or_default().trim_start_matches('/'));
        let is_file = tokio::fs::metadata(&local)
            .await
            .is_ok_and(|meta| meta.is_file());
        if is_file {
            return match Self::read_backup_file(&local).await {
                Ok(backup) => match self.backups.import(backup).await {
                    Ok(()) => {
                        tracing::info!(path = %local.display(), "Auto-loaded local backup");
                        AutoLoad::LocalFile(local)
                    }
                    Err(e) => AutoLoad::Failed(e.to_string()),
                },
                Err(e) => {
                    tracing::warn!(path = %local.display(), error = %e, "Local backup unreadable");
                    AutoLoad::Failed(e)
                }
            };
        }

        if !settings.auto_load || !settings.repo_configured() {
            tracing::debug!("No backup to auto-load");
            return AutoLoad::Skipped;
        }

        match self.load_from_github(None).await {
            Ok(()) => AutoLoad::GitHub,
            Err(e) => {
                tracing::warn!(error = %e, "Auto-load from GitHub failed");
                AutoLoad::Failed(e.to_string())
            }
        }
    }

    /// Back up in the background after a workout, when enabled.
    pub async fn spawn_auto_sync(&self) -> Option<JoinHandle<()>> {
        let enabled = self.settings.auto_sync().await.unwrap_or(false);
        let configured = self
            .settings
            .github()
            .await
            .map(|s| s.repo_configured())
            .unwrap_or(false);
        if !enabled {
            return None;
        }
        if !configured {
            tracing::info!("Auto-save skipped: no GitHub repo configured");
            return None;
        }

        let service = self.clone();
        Some(tokio::spawn(async move {
            tracing::info!("Auto-saving backup to GitHub...");
            match service.save_to_github(None).await {
                Ok(outcome) => tracing::info!(path = %outcome.path, "Auto-save complete"),
                Err(e) => tracing::error!(error = %e, "Auto-save failed"),
            }
        }))
    }
}
