// publish.rs
// Phase 5: Push the JSON table to a GitHub repository

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Where and how to publish.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub token: String,
    /// `owner/name`
    pub repository: String,
    pub branch: Option<String>,
    pub api_url: String,
    pub commit_message: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            repository: String::new(),
            branch: None,
            api_url: "https://api.github.com".to_string(),
            commit_message: format!(
                "Automatic offsets update ({})",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to read file: {0}")]
    Read(#[source] std::io::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("GitHub answered {status}: {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("existing file has no sha")]
    MissingSha,
    #[error("bad API url: {0}")]
    BadUrl(String),
}

/// What happened to the remote copy.
#[derive(Debug)]
pub enum PublishOutcome {
    Created,
    Updated,
    Skipped(String),
    Failed(PublishError),
}

/// Something that can make a remote object match a local file.
#[allow(async_fn_in_trait)]
pub trait Publisher {
    async fn publish(&self, path: &Path) -> PublishOutcome;
}

/// Publishes through the GitHub repository contents API, keyed by the
/// file's base name at the repository root.
pub struct GitHubPublisher {
    config: PublishConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    sha: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

impl GitHubPublisher {
    pub fn new(config: PublishConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// `{api_url}/repos/{owner}/{name}/contents/{file}`, each part a
    /// percent-encoded path segment.
    fn contents_url(&self, name: &str) -> Result<Url, PublishError> {
        let mut url = Url::parse(&self.config.api_url)
            .map_err(|e| PublishError::BadUrl(format!("{}: {}", self.config.api_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| PublishError::BadUrl(self.config.api_url.clone()))?
            .pop_if_empty()
            .push("repos")
            .extend(self.config.repository.split('/'))
            .push("contents")
            .push(name);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", concat!("offsetgen/", env!("CARGO_PKG_VERSION")))
    }

    /// Current blob sha of `name`, or `None` when it does not exist yet.
    async fn existing_sha(&self, name: &str) -> Result<Option<String>, PublishError> {
        let mut request = self.request(reqwest::Method::GET, self.contents_url(name)?);
        if let Some(branch) = &self.config.branch {
            request = request.query(&[("ref", branch)]);
        }
        let response = request.send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let entry: ContentsEntry = response.json().await?;
                entry.sha.map(Some).ok_or(PublishError::MissingSha)
            }
            status => Err(PublishError::Rejected {
                status,
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn upload(&self, path: &Path) -> Result<PublishOutcome, PublishError> {
        let bytes = std::fs::read(path).map_err(PublishError::Read)?;
        let name = base_name(path);

        let url = self.contents_url(&name)?;
        let sha = self.existing_sha(&name).await?;
        let outcome = if sha.is_some() {
            PublishOutcome::Updated
        } else {
            PublishOutcome::Created
        };

        let body = put_body(&self.config, &bytes, sha);
        let response = self
            .request(reqwest::Method::PUT, url)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected { status, body });
        }

        Ok(outcome)
    }
}

impl Publisher for GitHubPublisher {
    async fn publish(&self, path: &Path) -> PublishOutcome {
        if self.config.token.is_empty() {
            return PublishOutcome::Skipped("no GitHub token configured".to_string());
        }
        if self.config.repository.is_empty() {
            return PublishOutcome::Skipped("no GitHub repository configured".to_string());
        }

        match self.upload(path).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Publishing {} failed: {}", path.display(), e);
                PublishOutcome::Failed(e)
            }
        }
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn put_body<'a>(config: &'a PublishConfig, bytes: &[u8], sha: Option<String>) -> PutContents<'a> {
    PutContents {
        message: &config.commit_message,
        content: BASE64.encode(bytes),
        sha,
        branch: config.branch.as_deref(),
    }
}
