//! Fetch-on-mount services for a single Buildkite resource: one build, or the
//! log of one job.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;

use crate::client::BuildkiteApi;
use crate::error::{DashError, Result};
use crate::models::{BuildView, LogPayload};
use crate::reporting::ErrorSink;
use crate::url_builder::BuildPath;

use super::{Phase, RequestSequence};

#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Value: Clone + Debug + Serialize + Send + Sync + 'static;

    async fn fetch(&self, api: &dyn BuildkiteApi, params: &BuildPath) -> Result<Self::Value>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SingleBuild;

#[async_trait]
impl Resource for SingleBuild {
    type Value = BuildView;

    async fn fetch(&self, api: &dyn BuildkiteApi, params: &BuildPath) -> Result<BuildView> {
        let build = api
            .get_single_build(&params.org_slug, &params.pipeline_slug, params.build_number)
            .await?;
        Ok(BuildView::new(build))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JobLog;

#[async_trait]
impl Resource for JobLog {
    type Value = LogPayload;

    async fn fetch(&self, api: &dyn BuildkiteApi, params: &BuildPath) -> Result<LogPayload> {
        let job_id = params
            .job_id
            .as_deref()
            .ok_or_else(|| DashError::MalformedUrl(params.build_path()))?;
        api.get_log(
            &params.org_slug,
            &params.pipeline_slug,
            params.build_number,
            job_id,
        )
        .await
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceSnapshot<T> {
    pub params: BuildPath,
    pub phase: Phase,
    pub loading: bool,
    pub value: Option<T>,
    pub error: Option<String>,
}

struct Inner<R: Resource> {
    resource: R,
    api: Arc<dyn BuildkiteApi>,
    errors: Arc<dyn ErrorSink>,
    state: watch::Sender<ResourceSnapshot<R::Value>>,
    sequence: RequestSequence,
}

pub struct ResourceService<R: Resource> {
    inner: Arc<Inner<R>>,
}

pub type SingleBuildService = ResourceService<SingleBuild>;
pub type LogService = ResourceService<JobLog>;

impl<R: Resource> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Resource> ResourceService<R> {
    pub fn new(
        resource: R,
        api: Arc<dyn BuildkiteApi>,
        errors: Arc<dyn ErrorSink>,
        params: BuildPath,
    ) -> Self {
        let (state, _) = watch::channel(ResourceSnapshot {
            params,
            phase: Phase::Idle,
            loading: false,
            value: None,
            error: None,
        });

        Self {
            inner: Arc::new(Inner {
                resource,
                api,
                errors,
                state,
                sequence: RequestSequence::default(),
            }),
        }
    }

    pub fn snapshot(&self) -> ResourceSnapshot<R::Value> {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceSnapshot<R::Value>> {
        self.inner.state.subscribe()
    }

    pub async fn mount(&self) -> Result<()> {
        self.fetch().await
    }

    pub async fn retry(&self) -> Result<()> {
        self.fetch().await
    }

    /// Points the service at another resource. Unchanged parameters do not
    /// trigger a fetch.
    pub async fn set_params(&self, params: BuildPath) -> Result<()> {
        let changed = self.inner.state.send_if_modified(|s| {
            if s.params == params {
                return false;
            }
            s.params = params;
            s.value = None;
            true
        });
        if !changed {
            return Ok(());
        }
        self.fetch().await
    }

    pub fn dispose(&self) {
        self.inner.sequence.dispose();
    }

    async fn fetch(&self) -> Result<()> {
        let seq = self.inner.sequence.begin();
        let params = self.inner.state.borrow().params.clone();
        if !self.inner.sequence.is_disposed() {
            self.inner.state.send_modify(|s| {
                s.phase = Phase::Loading;
                s.loading = true;
            });
        }

        tracing::debug!(seq, "fetching {}", params.build_path());
        let fetched = self
            .inner
            .resource
            .fetch(&*self.inner.api, &params)
            .await;

        if let Err(e) = &fetched {
            self.inner.errors.post(e);
        }
        if !self.inner.sequence.is_current(seq) {
            tracing::debug!(seq, "dropping stale response for {}", params.build_path());
            return Ok(());
        }

        let (phase, value, error, result) = match fetched {
            Ok(value) => (Phase::Loaded, Some(value), None, Ok(())),
            Err(e) => (Phase::Error, None, Some(e.to_string()), Err(e)),
        };
        self.inner.state.send_modify(|s| {
            s.phase = phase;
            s.loading = false;
            s.error = error;
            if value.is_some() {
                s.value = value;
            }
        });
        result
    }
}

impl ResourceService<SingleBuild> {
    pub fn for_build(
        api: Arc<dyn BuildkiteApi>,
        errors: Arc<dyn ErrorSink>,
        owner: &str,
        repo: &str,
        build_number: u64,
    ) -> Self {
        Self::new(
            SingleBuild,
            api,
            errors,
            BuildPath::new(owner, repo, build_number),
        )
    }
}

impl ResourceService<JobLog> {
    pub fn for_job(
        api: Arc<dyn BuildkiteApi>,
        errors: Arc<dyn ErrorSink>,
        owner: &str,
        repo: &str,
        build_number: u64,
        job_id: &str,
    ) -> Self {
        Self::new(
            JobLog,
            api,
            errors,
            BuildPath::new(owner, repo, build_number).with_job(job_id),
        )
    }

    /// Builds the service from the `log_url` stored on a job.
    pub fn from_log_url(
        api: Arc<dyn BuildkiteApi>,
        errors: Arc<dyn ErrorSink>,
        log_url: &str,
    ) -> Result<Self> {
        let parsed = BuildPath::parse(log_url).and_then(|params| match params.job_id {
            Some(_) => Ok(params),
            None => Err(DashError::MalformedUrl(log_url.to_string())),
        });
        match parsed {
            Ok(params) => Ok(Self::new(JobLog, api, errors, params)),
            Err(e) => {
                errors.post(&e);
                Err(e)
            }
        }
    }
}
