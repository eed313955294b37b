use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKUP_PATH: &str = "data/backup.json";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_COMMIT_MESSAGE: &str = "crimpd backup from web";

/// GitHub backup destination as entered on the settings page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitHubSettings {
    pub repo: Option<String>,
    pub path: Option<String>,
    pub branch: Option<String>,
    pub token: Option<String>,
    pub message: Option<String>,
    pub auto_load: bool,
}

impl GitHubSettings {
    pub fn path_or_default(&self) -> &str {
        non_empty(&self.path).unwrap_or(DEFAULT_BACKUP_PATH)
    }

    pub fn branch_or_default(&self) -> &str {
        non_empty(&self.branch).unwrap_or(DEFAULT_BRANCH)
    }

    pub fn message_or_default(&self) -> &str {
        non_empty(&self.message).unwrap_or(DEFAULT_COMMIT_MESSAGE)
    }

    pub fn repo_configured(&self) -> bool {
        non_empty(&self.repo).is_some()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Keyword lists used to bucket log entries into chart categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartKeywords {
    pub finger: Vec<String>,
    pub pull: Vec<String>,
    pub board: Vec<String>,
    pub climbing: Vec<String>,
}

impl Default for ChartKeywords {
    fn default() -> Self {
        let words = |ws: &[&str]| ws.iter().map(|w| w.to_string()).collect();
        Self {
            finger: words(&["finger", "hang", "crimp", "edge"]),
            pull: words(&["pull", "chin", "lock-off"]),
            board: words(&["board", "moon", "kilter", "tension"]),
            climbing: words(&["climb", "boulder", "lead", "route"]),
        }
    }
}

impl ChartKeywords {
    /// Parse a comma-separated form field.
    pub fn parse_list(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Which categories feed the progress chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressFilters {
    pub pull: bool,
    pub finger: bool,
}

impl Default for ProgressFilters {
    fn default() -> Self {
        Self {
            pull: true,
            finger: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_defaults_ignore_blank_values() {
        let settings = GitHubSettings {
            path: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.path_or_default(), DEFAULT_BACKUP_PATH);
        assert_eq!(settings.branch_or_default(), "main");
        assert!(!settings.repo_configured());
    }

    #[test]
    fn test_parse_keyword_list() {
        assert_eq!(
            ChartKeywords::parse_list(" pull, chin ,,"),
            vec!["pull".to_string(), "chin".to_string()]
        );
    }
}
