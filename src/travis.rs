//! TravisCI v3 api, reached through the same discovered proxy as Buildkite.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Method};
use serde::{Deserialize, Serialize};

use crate::client::{decode, send, ProxyEndpoint};
use crate::discovery::Discovery;
use crate::error::Result;
use crate::status::{normalize, BuildStatus};

pub const DEFAULT_TRAVIS_PROXY_PATH: &str = "/travisci/api";

const API_VERSION_HEADER: &str = "Travis-API-Version";
const API_VERSION: &str = "3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravisPermissions {
    pub read: bool,
    pub cancel: bool,
    pub restart: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravisRepository {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravisBranch {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravisCommit {
    pub id: u64,
    pub sha: String,
    #[serde(rename = "ref", default)]
    pub git_ref: Option<String>,
    pub message: String,
    pub compare_url: String,
    pub committed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravisJobRef {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravisUser {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravisBuild {
    pub id: u64,
    /// Travis reports build numbers as strings.
    pub number: String,
    pub state: String,
    #[serde(default)]
    pub duration: Option<u64>,
    pub event_type: String,
    #[serde(default)]
    pub previous_state: Option<String>,
    #[serde(default)]
    pub pull_request_title: Option<String>,
    #[serde(default)]
    pub pull_request_number: Option<u64>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    pub repository: TravisRepository,
    pub branch: TravisBranch,
    pub commit: TravisCommit,
    #[serde(default)]
    pub jobs: Vec<TravisJobRef>,
    #[serde(rename = "@permissions", default)]
    pub permissions: Option<TravisPermissions>,
    #[serde(default)]
    pub created_by: Option<TravisUser>,
}

impl TravisBuild {
    pub fn status(&self) -> BuildStatus {
        match self.state.as_str() {
            "created" | "received" | "started" => BuildStatus::Running,
            "errored" => BuildStatus::Failed,
            other => normalize(Some(other)),
        }
    }

    pub fn can_restart(&self) -> bool {
        self.permissions.map_or(false, |p| p.restart)
    }
}

#[derive(Deserialize)]
struct BuildsPage {
    builds: Vec<TravisBuild>,
}

#[async_trait]
pub trait TravisCiApi: Send + Sync {
    /// Builds of `repo_slug` (`owner/repo`), newest first.
    async fn get_builds(
        &self,
        limit: u32,
        offset: u32,
        repo_slug: &str,
    ) -> Result<Vec<TravisBuild>>;

    async fn get_build(&self, build_id: u64) -> Result<TravisBuild>;

    /// Restarts a build. Travis answers with a pending request, not the build.
    async fn retry(&self, build_id: u64) -> Result<()>;

    async fn get_user(&self) -> Result<TravisUser>;
}

#[derive(Clone)]
pub struct TravisClient {
    http: reqwest::Client,
    endpoint: ProxyEndpoint,
}

impl TravisClient {
    pub fn new(discovery: Arc<dyn Discovery>) -> Self {
        Self::with_proxy_path(discovery, DEFAULT_TRAVIS_PROXY_PATH)
    }

    pub fn with_proxy_path(discovery: Arc<dyn Discovery>, proxy_path: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: ProxyEndpoint::new(discovery, proxy_path),
        }
    }

    async fn call(&self, method: Method, path: &str) -> Result<(reqwest::Response, String)> {
        let url = self.endpoint.url(path).await?;
        tracing::debug!(%method, %url, "travis request");

        let req = self
            .http
            .request(method, url.as_str())
            .header(header::ACCEPT, "application/json")
            .header(API_VERSION_HEADER, API_VERSION);
        let res = send(req, &url).await?;
        Ok((res, url))
    }
}

impl std::fmt::Debug for TravisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TravisClient")
            .field("proxy_path", &self.endpoint.proxy_path())
            .finish()
    }
}

#[async_trait]
impl TravisCiApi for TravisClient {
    async fn get_builds(
        &self,
        limit: u32,
        offset: u32,
        repo_slug: &str,
    ) -> Result<Vec<TravisBuild>> {
        let slug: String = url::form_urlencoded::byte_serialize(repo_slug.as_bytes()).collect();
        let path = format!("repo/{}/builds?limit={}&offset={}", slug, limit, offset);
        let (res, url) = self.call(Method::GET, &path).await?;
        let page: BuildsPage = decode(res, &url).await?;
        Ok(page.builds)
    }

    async fn get_build(&self, build_id: u64) -> Result<TravisBuild> {
        let (res, url) = self
            .call(Method::GET, &format!("build/{}", build_id))
            .await?;
        decode(res, &url).await
    }

    async fn retry(&self, build_id: u64) -> Result<()> {
        self.call(Method::POST, &format!("build/{}/restart", build_id))
            .await?;
        tracing::info!("requested restart of travis build {}", build_id);
        Ok(())
    }

    async fn get_user(&self) -> Result<TravisUser> {
        let (res, url) = self.call(Method::GET, "user").await?;
        decode(res, &url).await
    }
}
