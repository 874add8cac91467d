use std::sync::Arc;

use crate::client::BuildkiteApi;
use crate::config::ProjectSlug;
use crate::error::Result;
use crate::reporting::ErrorSink;
use crate::services::BuildListService;

/// Everything the handlers share.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn BuildkiteApi>,
    pub errors: Arc<dyn ErrorSink>,
    pub project: ProjectSlug,
    pub builds: BuildListService,
}

impl AppState {
    pub fn new(
        api: Arc<dyn BuildkiteApi>,
        errors: Arc<dyn ErrorSink>,
        project: ProjectSlug,
        page_size: u32,
    ) -> Self {
        let builds = BuildListService::new(
            api.clone(),
            errors.clone(),
            project.to_string(),
            page_size,
        );
        Self {
            api,
            errors,
            project,
            builds,
        }
    }
}

/// Failures already reach the error sink and the snapshot, the handlers only
/// note them.
pub fn log_outcome(what: &str, outcome: Result<()>) {
    if let Err(e) = outcome {
        tracing::debug!("{} ended in error state: {}", what, e);
    }
}
