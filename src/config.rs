use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub github_api_url: String,
    pub tick_millis: u64,
    /// Directory searched for a backup file to restore at startup.
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:crimpd.db?mode=rwc".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            github_api_url: env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| DEFAULT_GITHUB_API_URL.to_string()),
            tick_millis: env::var("TICK_MILLIS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(100),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}
