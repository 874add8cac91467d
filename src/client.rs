use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header, Method};
use serde::de::DeserializeOwned;

use crate::discovery::Discovery;
use crate::error::{DashError, Result};
use crate::models::{BuildRecord, LogPayload};
use crate::url_builder::BuildPath;

pub const DEFAULT_PROXY_PATH: &str = "/buildkite/api";

/// Operations the dashboard needs from Buildkite.
///
/// Every call is a single request. Nothing is retried here, callers decide
/// what to do with a failure.
#[async_trait]
pub trait BuildkiteApi: Send + Sync {
    /// `page` is the provider page, starting at 1.
    async fn get_builds(&self, page: u32, per_page: u32) -> Result<Vec<BuildRecord>>;

    async fn restart_build(
        &self,
        org_slug: &str,
        pipeline_slug: &str,
        build_number: u64,
    ) -> Result<BuildRecord>;

    async fn get_single_build(
        &self,
        org_slug: &str,
        pipeline_slug: &str,
        build_number: u64,
    ) -> Result<BuildRecord>;

    async fn get_log(
        &self,
        org_slug: &str,
        pipeline_slug: &str,
        build_number: u64,
        job_id: &str,
    ) -> Result<LogPayload>;
}

/// A CI api mounted below the discovered proxy.
#[derive(Clone)]
pub(crate) struct ProxyEndpoint {
    discovery: Arc<dyn Discovery>,
    proxy_path: String,
}

impl ProxyEndpoint {
    pub(crate) fn new(discovery: Arc<dyn Discovery>, proxy_path: &str) -> Self {
        let proxy_path = format!("/{}", proxy_path.trim_matches('/'));
        Self {
            discovery,
            proxy_path: proxy_path.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn proxy_path(&self) -> &str {
        &self.proxy_path
    }

    pub(crate) async fn url(&self, path: &str) -> Result<String> {
        let proxy_url = self.discovery.base_url("proxy").await?;
        Ok(format!(
            "{}{}/{}",
            proxy_url.trim_end_matches('/'),
            self.proxy_path,
            path
        ))
    }
}

/// Sends `req`, turning transport failures and non-2xx answers into
/// [`DashError::Network`].
pub(crate) async fn send(req: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Response> {
    let res = req.send().await.map_err(|e| DashError::network(url, &e))?;

    let status = res.status();
    if !status.is_success() {
        return Err(DashError::Network {
            url: url.to_string(),
            status: Some(status.as_u16()),
            reason: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        });
    }
    Ok(res)
}

pub(crate) async fn decode<T: DeserializeOwned>(res: reqwest::Response, url: &str) -> Result<T> {
    let body = res.text().await.map_err(|e| DashError::network(url, &e))?;
    Ok(serde_json::from_str(&body)?)
}

#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    endpoint: ProxyEndpoint,
}

impl RestClient {
    pub fn new(discovery: Arc<dyn Discovery>) -> Self {
        Self::with_proxy_path(discovery, DEFAULT_PROXY_PATH)
    }

    pub fn with_proxy_path(discovery: Arc<dyn Discovery>, proxy_path: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: ProxyEndpoint::new(discovery, proxy_path),
        }
    }

    async fn request<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T> {
        let url = self.endpoint.url(path).await?;
        tracing::debug!(%method, %url, "buildkite request");

        let req = self
            .http
            .request(method, url.as_str())
            .header(header::ACCEPT, "application/json");
        let res = send(req, &url).await?;
        decode(res, &url).await
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("proxy_path", &self.endpoint.proxy_path())
            .finish()
    }
}

#[async_trait]
impl BuildkiteApi for RestClient {
    async fn get_builds(&self, page: u32, per_page: u32) -> Result<Vec<BuildRecord>> {
        self.request(
            Method::GET,
            &format!("builds?page={}&per_page={}", page, per_page),
        )
        .await
    }

    async fn restart_build(
        &self,
        org_slug: &str,
        pipeline_slug: &str,
        build_number: u64,
    ) -> Result<BuildRecord> {
        let path = BuildPath::new(org_slug, pipeline_slug, build_number);
        self.request(Method::PUT, &path.rebuild_path()).await
    }

    async fn get_single_build(
        &self,
        org_slug: &str,
        pipeline_slug: &str,
        build_number: u64,
    ) -> Result<BuildRecord> {
        let path = BuildPath::new(org_slug, pipeline_slug, build_number);
        self.request(Method::GET, &path.build_path()).await
    }

    async fn get_log(
        &self,
        org_slug: &str,
        pipeline_slug: &str,
        build_number: u64,
        job_id: &str,
    ) -> Result<LogPayload> {
        let path = BuildPath::new(org_slug, pipeline_slug, build_number).with_job(job_id);
        let log_path = path
            .log_path()
            .ok_or_else(|| DashError::MalformedUrl(path.build_path()))?;
        self.request(Method::GET, &log_path).await
    }
}
