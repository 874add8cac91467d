//! Dashboard configuration, loaded from environment variables.

use itertools::Itertools;
use serde::Serialize;

use crate::client::DEFAULT_PROXY_PATH;
use crate::error::{DashError, Result};
use crate::services::builds::DEFAULT_PAGE_SIZE;

pub const DEFAULT_DISCOVERY_PATTERN: &str = "http://localhost:7007/api/{{pluginId}}";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// The `owner/repo` pair the dashboard shows builds for. `owner` is the
/// Buildkite organization, `repo` the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProjectSlug {
    pub owner: String,
    pub repo: String,
}

impl ProjectSlug {
    pub fn parse(slug: &str) -> Result<Self> {
        slug.trim()
            .split('/')
            .collect_tuple()
            .filter(|(owner, repo): &(&str, &str)| !owner.is_empty() && !repo.is_empty())
            .map(|(owner, repo)| ProjectSlug {
                owner: owner.to_string(),
                repo: repo.to_string(),
            })
            .ok_or_else(|| {
                DashError::Config(format!("project slug {:?} is not owner/repo", slug))
            })
    }
}

impl std::fmt::Display for ProjectSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[derive(Clone, Debug)]
pub struct DashConfig {
    /// Project shown by the dashboard.
    pub project: ProjectSlug,
    /// Discovery pattern, `{{pluginId}}` is replaced by the service name.
    pub discovery_pattern: String,
    /// Path of the Buildkite api below the proxy.
    pub proxy_path: String,
    /// Rows per page until a consumer asks for something else.
    pub page_size: u32,
    /// Address the http front binds to.
    pub listen_addr: String,
}

impl DashConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let project = var("BUILDKITE_PROJECT_SLUG")
            .ok_or_else(|| DashError::Config("BUILDKITE_PROJECT_SLUG is not set".into()))?;
        let project = ProjectSlug::parse(&project)?;

        let discovery_pattern =
            var("DISCOVERY_URL_PATTERN").unwrap_or_else(|| DEFAULT_DISCOVERY_PATTERN.to_string());
        let proxy_path =
            var("BUILDKITE_PROXY_PATH").unwrap_or_else(|| DEFAULT_PROXY_PATH.to_string());
        let page_size = match var("DASH_PAGE_SIZE") {
            Some(size) => match size.parse() {
                Ok(size) if size > 0 => size,
                _ => {
                    tracing::warn!(
                        "DASH_PAGE_SIZE={:?} is not a positive number, using {}",
                        size,
                        DEFAULT_PAGE_SIZE
                    );
                    DEFAULT_PAGE_SIZE
                }
            },
            None => DEFAULT_PAGE_SIZE,
        };
        let listen_addr =
            var("DASH_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

        Ok(Self {
            project,
            discovery_pattern,
            proxy_path,
            page_size,
            listen_addr,
        })
    }
}
