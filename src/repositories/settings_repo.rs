use rusqlite::Connection;

use super::kv_store::{delete_key, keys, read_json, read_or_default, write_json, KvStore};
use crate::error::Result;
use crate::models::{ChartKeywords, GitHubSettings, ProgressFilters};

fn read_string(conn: &Connection, key: &str) -> Result<Option<String>> {
    Ok(read_json::<String>(conn, key)?.filter(|s| !s.trim().is_empty()))
}

fn write_optional(conn: &Connection, key: &str, value: Option<&str>) -> Result<()> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => write_json(conn, key, v),
        None => delete_key(conn, key),
    }
}

/// Chart configuration as edited on the log settings page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSettings {
    pub keywords: ChartKeywords,
    pub filters: ProgressFilters,
    /// `None` until the user first saves the list; every candidate counts
    /// as included until then.
    pub included_workouts: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct SettingsRepository {
    kv: KvStore,
}

impl SettingsRepository {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    pub async fn github(&self) -> Result<GitHubSettings> {
        self.kv
            .transact(|conn| {
                Ok(GitHubSettings {
                    repo: read_string(conn, keys::GITHUB_REPO)?,
                    path: read_string(conn, keys::GITHUB_PATH)?,
                    branch: read_string(conn, keys::GITHUB_BRANCH)?,
                    token: read_string(conn, keys::GITHUB_TOKEN)?,
                    message: read_string(conn, keys::GITHUB_MESSAGE)?,
                    auto_load: read_or_default(conn, keys::GITHUB_AUTO_LOAD)?,
                })
            })
            .await
    }

    /// Store the GitHub target. The token is only kept when
    /// `remember_token` is set; otherwise any stored token is forgotten.
    pub async fn save_github(&self, settings: GitHubSettings, remember_token: bool) -> Result<()> {
        self.kv
            .transact(move |conn| {
                write_optional(conn, keys::GITHUB_REPO, settings.repo.as_deref())?;
                write_optional(conn, keys::GITHUB_PATH, settings.path.as_deref())?;
                write_optional(conn, keys::GITHUB_BRANCH, settings.branch.as_deref())?;
                write_optional(conn, keys::GITHUB_MESSAGE, settings.message.as_deref())?;
                let token = if remember_token {
                    settings.token.as_deref()
                } else {
                    None
                };
                write_optional(conn, keys::GITHUB_TOKEN, token)?;
                write_json(conn, keys::GITHUB_AUTO_LOAD, &settings.auto_load)
            })
            .await
    }

    pub async fn auto_sync(&self) -> Result<bool> {
        Ok(self.kv.get(keys::AUTO_SYNC).await?.unwrap_or(true))
    }

    pub async fn set_auto_sync(&self, enabled: bool) -> Result<()> {
        self.kv.set(keys::AUTO_SYNC, &enabled).await
    }

    pub async fn charts(&self) -> Result<ChartSettings> {
        self.kv
            .transact(|conn| {
                Ok(ChartSettings {
                    keywords: read_or_default(conn, keys::CHART_KEYWORDS)?,
                    filters: read_or_default(conn, keys::PROGRESS_FILTERS)?,
                    included_workouts: read_json(conn, keys::INCLUDED_WORKOUTS)?,
                })
            })
            .await
    }

    pub async fn save_charts(&self, charts: ChartSettings) -> Result<()> {
        self.kv
            .transact(move |conn| {
                write_json(conn, keys::CHART_KEYWORDS, &charts.keywords)?;
                write_json(conn, keys::PROGRESS_FILTERS, &charts.filters)?;
                match &charts.included_workouts {
                    Some(names) => write_json(conn, keys::INCLUDED_WORKOUTS, names),
                    None => delete_key(conn, keys::INCLUDED_WORKOUTS),
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::migrations::run_migrations_for_tests;

    fn repo() -> SettingsRepository {
        let pool = create_memory_pool().unwrap();
        run_migrations_for_tests(&pool).unwrap();
        SettingsRepository::new(KvStore::new(pool))
    }

    #[tokio::test]
    async fn test_token_only_kept_when_remembered() {
        let repo = repo();
        let settings = GitHubSettings {
            repo: Some("me/climbs".to_string()),
            token: Some("secret".to_string()),
            auto_load: true,
            ..Default::default()
        };
        repo.save_github(settings.clone(), false).await.unwrap();
        let stored = repo.github().await.unwrap();
        assert_eq!(stored.repo.as_deref(), Some("me/climbs"));
        assert!(stored.token.is_none());
        assert!(stored.auto_load);

        repo.save_github(settings, true).await.unwrap();
        assert_eq!(repo.github().await.unwrap().token.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_auto_sync_defaults_on() {
        let repo = repo();
        assert!(repo.auto_sync().await.unwrap());
        repo.set_auto_sync(false).await.unwrap();
        assert!(!repo.auto_sync().await.unwrap());
    }

    #[tokio::test]
    async fn test_chart_settings_round_trip() {
        let repo = repo();
        assert!(repo.charts().await.unwrap().included_workouts.is_none());

        let charts = ChartSettings {
            keywords: ChartKeywords {
                pull: vec!["pull".to_string()],
                ..Default::default()
            },
            filters: ProgressFilters {
                pull: true,
                finger: false,
            },
            included_workouts: Some(vec!["Weighted pull-ups".to_string()]),
        };
        repo.save_charts(charts.clone()).await.unwrap();
        assert_eq!(repo.charts().await.unwrap(), charts);
    }
}
