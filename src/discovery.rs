use async_trait::async_trait;

use crate::error::{DashError, Result};

/// Resolves a logical service name (e.g. "proxy") to a concrete url prefix.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn base_url(&self, name: &str) -> Result<String>;
}

const PLUGIN_ID: &str = "{{pluginId}}";

/// Discovery backed by a single url pattern, where `{{pluginId}}` is replaced
/// by the requested name. A pattern without the placeholder resolves every
/// name to the same url.
#[derive(Debug, Clone)]
pub struct UrlPatternDiscovery {
    pattern: String,
}

impl UrlPatternDiscovery {
    pub fn compile(pattern: &str) -> Result<Self> {
        let sample = pattern.replace(PLUGIN_ID, "sample");
        url::Url::parse(&sample).map_err(|e| {
            DashError::Config(format!("invalid discovery pattern {:?}: {}", pattern, e))
        })?;

        Ok(Self {
            pattern: pattern.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Discovery for UrlPatternDiscovery {
    async fn base_url(&self, name: &str) -> Result<String> {
        if name.is_empty() {
            return Err(DashError::Discovery(name.to_string()));
        }
        Ok(self.pattern.replace(PLUGIN_ID, name))
    }
}
