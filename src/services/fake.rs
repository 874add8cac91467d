//! Scripted in-memory Buildkite api for service tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::client::BuildkiteApi;
use crate::error::{DashError, Result};
use crate::models::fixtures::build;
use crate::models::{BuildRecord, LogPayload};
use crate::url_builder::BuildPath;

type Scripted<T> = (Option<Arc<Notify>>, Result<T>);

#[derive(Default)]
pub(crate) struct FakeApi {
    pages: Mutex<VecDeque<Scripted<Vec<BuildRecord>>>>,
    builds: Mutex<VecDeque<Scripted<BuildRecord>>>,
    logs: Mutex<VecDeque<Result<LogPayload>>>,
    restart_error: Mutex<Option<DashError>>,
    build_calls: Mutex<Vec<(u32, u32)>>,
    single_calls: Mutex<Vec<BuildPath>>,
    restarts: Mutex<Vec<BuildPath>>,
}

pub(crate) fn page_of(numbers: &[u64]) -> Vec<BuildRecord> {
    numbers.iter().map(|n| build(*n, "queued")).collect()
}

impl FakeApi {
    pub(crate) fn push_page(&self, page: Result<Vec<BuildRecord>>) {
        self.pages.lock().unwrap().push_back((None, page));
    }

    pub(crate) fn push_gated_page(&self, gate: Arc<Notify>, page: Result<Vec<BuildRecord>>) {
        self.pages.lock().unwrap().push_back((Some(gate), page));
    }

    pub(crate) fn push_build(&self, record: Result<BuildRecord>) {
        self.builds.lock().unwrap().push_back((None, record));
    }

    pub(crate) fn push_gated_build(&self, gate: Arc<Notify>, record: Result<BuildRecord>) {
        self.builds.lock().unwrap().push_back((Some(gate), record));
    }

    pub(crate) fn push_log(&self, log: Result<LogPayload>) {
        self.logs.lock().unwrap().push_back(log);
    }

    pub(crate) fn fail_restarts(&self, error: DashError) {
        *self.restart_error.lock().unwrap() = Some(error);
    }

    pub(crate) fn build_calls(&self) -> Vec<(u32, u32)> {
        self.build_calls.lock().unwrap().clone()
    }

    pub(crate) fn single_calls(&self) -> Vec<BuildPath> {
        self.single_calls.lock().unwrap().clone()
    }

    pub(crate) fn restarts(&self) -> Vec<BuildPath> {
        self.restarts.lock().unwrap().clone()
    }
}

async fn resolve<T>(
    scripted: Option<Scripted<T>>,
    fallback: impl FnOnce() -> Result<T>,
) -> Result<T> {
    match scripted {
        Some((gate, result)) => {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            result
        }
        None => fallback(),
    }
}

#[async_trait]
impl BuildkiteApi for FakeApi {
    async fn get_builds(&self, page: u32, per_page: u32) -> Result<Vec<BuildRecord>> {
        self.build_calls.lock().unwrap().push((page, per_page));
        let scripted = self.pages.lock().unwrap().pop_front();
        resolve(scripted, || Ok(page_of(&[42, 41, 40, 39, 38]))).await
    }

    async fn restart_build(
        &self,
        org_slug: &str,
        pipeline_slug: &str,
        build_number: u64,
    ) -> Result<BuildRecord> {
        let restart_error = self.restart_error.lock().unwrap().clone();
        if let Some(e) = restart_error {
            return Err(e);
        }
        self.restarts
            .lock()
            .unwrap()
            .push(BuildPath::new(org_slug, pipeline_slug, build_number));
        Ok(build(build_number + 100, "scheduled"))
    }

    async fn get_single_build(
        &self,
        org_slug: &str,
        pipeline_slug: &str,
        build_number: u64,
    ) -> Result<BuildRecord> {
        self.single_calls
            .lock()
            .unwrap()
            .push(BuildPath::new(org_slug, pipeline_slug, build_number));
        let scripted = self.builds.lock().unwrap().pop_front();
        resolve(scripted, || Ok(build(build_number, "passed"))).await
    }

    async fn get_log(
        &self,
        org_slug: &str,
        pipeline_slug: &str,
        build_number: u64,
        job_id: &str,
    ) -> Result<LogPayload> {
        self.single_calls.lock().unwrap().push(
            BuildPath::new(org_slug, pipeline_slug, build_number).with_job(job_id),
        );
        let scripted = self.logs.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(LogPayload {
                content: format!("log of {}", job_id),
                size: 10,
            })
        })
    }
}
