//! GitHub contents API client implementing [`RepoContents`].
//!
//! - Construct with [`GitHubContents::new`] or [`GitHubContents::from_config`].
//! - `GITHUB_TOKEN` is optional; without it requests are subject to the anonymous rate limit.
//! - A 404 is reported as "absent", every other non-success status as [`FetchError::Status`].

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::config::RepositoryConfig;
use crate::contract::{DirEntry, FetchError, RemoteFile, RepoContents};

const USER_AGENT_VALUE: &str = concat!("fetch-dev-docs/", env!("CARGO_PKG_VERSION"));

pub struct GitHubContents {
    client: Client,
    api_base: Url,
    owner: String,
    repo: String,
    reference: Option<String>,
}

/// Raw item of the contents API, shared by file and listing responses.
#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    path: String,
    #[serde(default)]
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<serde_json::Value>),
    Single(Box<ContentItem>),
}

impl GitHubContents {
    pub fn new(
        api_base: &str,
        owner: &str,
        repo: &str,
        reference: Option<String>,
        token: Option<&str>,
    ) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| FetchError::Other(format!("invalid GITHUB_TOKEN header value: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder().default_headers(headers).build()?;
        let api_base = Url::parse(api_base)
            .map_err(|e| FetchError::Other(format!("invalid API base URL {api_base:?}: {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(FetchError::Other(format!("API base URL {api_base} cannot hold a path")));
        }

        tracing::info!(
            api_base = %api_base,
            owner,
            repo,
            authenticated = token.map(|t| !t.is_empty()).unwrap_or(false),
            "Initialised GitHub contents client"
        );

        Ok(Self {
            client,
            api_base,
            owner: owner.to_string(),
            repo: repo.to_string(),
            reference,
        })
    }

    pub fn from_config(repo: &RepositoryConfig, token: Option<&str>) -> Result<Self, FetchError> {
        Self::new(
            &repo.api_base_url,
            &repo.owner,
            &repo.name,
            repo.reference.clone(),
            token,
        )
    }

    /// Each path segment is percent-encoded, so names containing `#`, `?` or `%` stay in the path.
    fn contents_url(&self, path: &str) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repos", self.owner.as_str(), self.repo.as_str(), "contents"])
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }
        url
    }

    /// `None` on 404.
    async fn get_contents(&self, path: &str) -> Result<Option<ContentsResponse>, FetchError> {
        let url = self.contents_url(path);
        let mut request = self.client.get(url.clone());
        if let Some(reference) = &self.reference {
            request = request.query(&[("ref", reference)]);
        }
        tracing::debug!(url = %url, "Requesting repository contents");

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(path, "Path not found in repository");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, path, body = %body, "Contents API returned error");
            return Err(FetchError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        let bytes = response.bytes().await?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn download_raw(&self, url: &str, path: &str) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(url, path, "Downloading file above inline size limit");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

fn decode_base64(encoded: &str, path: &str) -> Result<Vec<u8>, FetchError> {
    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(|source| FetchError::Decode {
        path: path.to_string(),
        source,
    })
}

#[async_trait]
impl RepoContents for GitHubContents {
    async fn fetch_file(&self, path: &str) -> Result<Option<RemoteFile>, FetchError> {
        let item = match self.get_contents(path).await? {
            Some(ContentsResponse::Single(item)) if item.kind == "file" => item,
            Some(_) => {
                tracing::debug!(path, "Path is not a file, skipping");
                return Ok(None);
            }
            None => return Ok(None),
        };

        let content = match (item.encoding.as_deref(), item.content.as_deref()) {
            (Some("base64"), Some(encoded)) => decode_base64(encoded, &item.path)?,
            _ => match item.download_url.as_deref() {
                Some(url) => self.download_raw(url, &item.path).await?,
                None => {
                    return Err(FetchError::Other(format!(
                        "no inline content or download_url for {}",
                        item.path
                    )))
                }
            },
        };

        tracing::debug!(path = %item.path, size = content.len(), "Fetched file");
        Ok(Some(RemoteFile {
            path: item.path,
            sha: item.sha,
            content,
        }))
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, FetchError> {
        match self.get_contents(path).await? {
            Some(ContentsResponse::Listing(values)) => {
                let mut entries = Vec::with_capacity(values.len());
                for value in values {
                    match serde_json::from_value::<DirEntry>(value) {
                        Ok(entry) => entries.push(entry),
                        Err(e) => tracing::warn!(path, error = %e, "Skipping unrecognised directory entry"),
                    }
                }
                tracing::debug!(path, count = entries.len(), "Listed directory");
                Ok(entries)
            }
            Some(ContentsResponse::Single(item)) => {
                tracing::debug!(path, kind = %item.kind, name = %item.name, "Path is not a directory");
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }
}
