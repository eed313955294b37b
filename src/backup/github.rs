//! Minimal client for the GitHub Contents API.

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::GitHubSettings;
use crate::version::GIT_VERSION;

const ACCEPT: &str = "application/vnd.github.v3+json";

/// Where a backup goes, resolved from the saved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupTarget {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub branch: String,
    pub token: Option<String>,
    pub message: String,
}

impl BackupTarget {
    /// `token` overrides the stored token, for tokens the user chose not to
    /// remember.
    pub fn from_settings(settings: &GitHubSettings, token: Option<String>) -> Result<Self> {
        let repo = settings
            .repo
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AppError::BadRequest("No GitHub repo configured".to_string()))?;
        let (owner, name) = repo
            .split_once('/')
            .filter(|(o, n)| !o.is_empty() && !n.is_empty())
            .ok_or_else(|| AppError::BadRequest("Repo must be in owner/repo format".to_string()))?;

        Ok(Self {
            owner: owner.to_string(),
            repo: name.to_string(),
            path: settings.path_or_default().trim_matches('/').to_string(),
            branch: settings.branch_or_default().to_string(),
            token: token
                .filter(|t| !t.trim().is_empty())
                .or_else(|| settings.token.clone()),
            message: settings.message_or_default().to_string(),
        })
    }
}

/// File contents as returned by GET.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    pub sha: String,
    pub content: Vec<u8>,
}

#[derive(Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
}

impl GitHubClient {
    pub fn new(api_base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn contents_url(&self, target: &BackupTarget, path: &str) -> String {
        let path = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            urlencoding::encode(&target.owner),
            urlencoding::encode(&target.repo),
            path
        )
    }

    fn authorize(&self, builder: RequestBuilder, target: &BackupTarget) -> RequestBuilder {
        let builder = builder
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(reqwest::header::USER_AGENT, format!("crimpd/{GIT_VERSION}"));
        match &target.token {
            Some(token) => builder.header(reqwest::header::AUTHORIZATION, format!("token {token}")),
            None => builder,
        }
    }

    async fn error_from(response: reqwest::Response, fallback: &str) -> AppError {
        let status = response.status();
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| fallback.to_string());
        tracing::warn!(%status, %message, "GitHub request failed");
        AppError::GitHub(message)
    }

    /// Fetch a file. A missing file is `None`.
    pub async fn fetch_file(&self, target: &BackupTarget, path: &str) -> Result<Option<RemoteFile>> {
        let url = self.contents_url(target, path);
        let response = self
            .authorize(self.http.get(&url), target)
            .query(&[("ref", target.branch.as_str())])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response, "Failed to fetch file from GitHub").await);
        }

        let body: ContentsResponse = response.json().await?;
        let encoded: String = body
            .content
            .ok_or_else(|| AppError::GitHub("No content field in GitHub response".to_string()))?
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let content = STANDARD
            .decode(encoded)
            .map_err(|e| AppError::GitHub(format!("Invalid base64 content: {e}")))?;

        Ok(Some(RemoteFile {
            sha: body.sha,
            content,
        }))
    }

    /// Create or replace a file. `sha` must name the current blob when the
    /// file already exists.
    pub async fn put_file(
        &self,
        target: &BackupTarget,
        path: &str,
        content: &[u8],
        sha: Option<&str>,
    ) -> Result<()> {
        let url = self.contents_url(target, path);
        let body = PutRequest {
            message: &target.message,
            content: STANDARD.encode(content),
            branch: &target.branch,
            sha,
        };
        let response = self
            .authorize(self.http.put(&url), target)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "GitHub save failed").await);
        }
        tracing::info!(
            repo = %format!("{}/{}", target.owner, target.repo),
            path,
            "Saved file to GitHub"
        );
        Ok(())
    }
}
