//! Paginated build list for one project.
//!
//! The service owns the page state and publishes a [`BuildListSnapshot`] on
//! every change. Consumers read it with [`BuildListService::snapshot`] or
//! follow it with [`BuildListService::subscribe`].

use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::age;
use crate::client::BuildkiteApi;
use crate::error::{DashError, Result};
use crate::models::BuildRecord;
use crate::reporting::ErrorSink;
use crate::status::BuildStatus;
use crate::url_builder::BuildPath;

use super::{Phase, RequestSequence};

pub const DEFAULT_PAGE_SIZE: u32 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct BuildListSnapshot {
    pub page: u32,
    pub page_size: u32,
    /// Highest build number seen on the first page, not a real count.
    pub total: u64,
    pub phase: Phase,
    pub loading: bool,
    pub rows: Vec<TableRow>,
    pub project_name: String,
    pub error: Option<String>,
}

impl BuildListSnapshot {
    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.loading = phase == Phase::Loading;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableRow {
    #[serde(flatten)]
    pub build: BuildRecord,
    pub status: BuildStatus,
    pub age: String,
    /// Set when the build was rebuilt from an earlier one.
    pub retry: bool,
    #[serde(skip)]
    pub on_restart_click: RestartAction,
}

/// Restarts the build of one row, then reloads the page the list is on.
#[derive(Clone)]
pub struct RestartAction {
    target: Result<BuildPath>,
    service: Weak<Inner>,
}

impl RestartAction {
    pub fn target(&self) -> Option<&BuildPath> {
        self.target.as_ref().ok()
    }

    pub async fn call(&self) -> Result<()> {
        let inner = match self.service.upgrade() {
            Some(inner) => inner,
            None => {
                tracing::debug!("build list is gone, ignoring restart");
                return Ok(());
            }
        };
        let service = BuildListService { inner };

        match &self.target {
            Ok(target) => service.restart_build(target).await,
            Err(e) => {
                service.fail(e.clone());
                Err(e.clone())
            }
        }
    }
}

impl std::fmt::Debug for RestartAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestartAction")
            .field("target", &self.target)
            .finish()
    }
}

struct Inner {
    api: Arc<dyn BuildkiteApi>,
    errors: Arc<dyn ErrorSink>,
    state: watch::Sender<BuildListSnapshot>,
    sequence: RequestSequence,
}

#[derive(Clone)]
pub struct BuildListService {
    inner: Arc<Inner>,
}

/// Turns fetched records into rows bound to `service`.
pub fn transform(
    records: Vec<BuildRecord>,
    service: &BuildListService,
    now: DateTime<Utc>,
) -> Vec<TableRow> {
    let weak = Arc::downgrade(&service.inner);
    records
        .into_iter()
        .map(|build| TableRow {
            status: build.status(),
            age: age::relative(build.created_at, now),
            retry: build.is_retry(),
            on_restart_click: RestartAction {
                target: build.identity(),
                service: weak.clone(),
            },
            build,
        })
        .collect()
}

impl BuildListService {
    pub fn new(
        api: Arc<dyn BuildkiteApi>,
        errors: Arc<dyn ErrorSink>,
        project_name: impl Into<String>,
        page_size: u32,
    ) -> Self {
        let (state, _) = watch::channel(BuildListSnapshot {
            page: 0,
            page_size: page_size.max(1),
            total: 0,
            phase: Phase::Idle,
            loading: false,
            rows: Vec::new(),
            project_name: project_name.into(),
            error: None,
        });

        Self {
            inner: Arc::new(Inner {
                api,
                errors,
                state,
                sequence: RequestSequence::default(),
            }),
        }
    }

    pub fn snapshot(&self) -> BuildListSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BuildListSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn row(&self, build_number: u64) -> Option<TableRow> {
        self.inner
            .state
            .borrow()
            .rows
            .iter()
            .find(|row| row.build.number == build_number)
            .cloned()
    }

    /// Initial load.
    pub async fn mount(&self) -> Result<()> {
        self.fetch().await
    }

    /// Reloads the current page, keeping the rows on display meanwhile.
    pub async fn retry(&self) -> Result<()> {
        self.fetch().await
    }

    pub async fn set_page(&self, page: u32) -> Result<()> {
        self.check_page(page)?;
        self.inner.state.send_modify(|s| {
            s.page = page;
            s.rows.clear();
        });
        self.fetch().await
    }

    pub async fn set_page_size(&self, page_size: u32) -> Result<()> {
        self.inner.state.send_modify(|s| {
            s.page_size = page_size.max(1);
            s.rows.clear();
        });
        self.fetch().await
    }

    /// Moves to `page` with `page_size` rows in a single fetch.
    pub async fn paginate(&self, page: u32, page_size: u32) -> Result<()> {
        self.check_page(page)?;
        self.inner.state.send_modify(|s| {
            s.page = page;
            s.page_size = page_size.max(1);
            s.rows.clear();
        });
        self.fetch().await
    }

    /// Pending fetches of a disposed service never touch its state.
    pub fn dispose(&self) {
        self.inner.sequence.dispose();
    }

    async fn restart_build(&self, target: &BuildPath) -> Result<()> {
        let restarted = self
            .inner
            .api
            .restart_build(
                &target.org_slug,
                &target.pipeline_slug,
                target.build_number,
            )
            .await;

        match restarted {
            Ok(build) => {
                tracing::info!(
                    "restarted {}/{}#{} as #{}",
                    target.org_slug,
                    target.pipeline_slug,
                    target.build_number,
                    build.number
                );
                // The rebuild went through, a failed reload only shows in the
                // snapshot and the error sink.
                if let Err(e) = self.fetch().await {
                    tracing::warn!("reload after restart failed: {}", e);
                }
                Ok(())
            }
            Err(e) => {
                self.fail(e.clone());
                Err(e)
            }
        }
    }

    /// Maps a page to the provider's 1-based page, reporting pages that have
    /// no such number.
    fn check_page(&self, page: u32) -> Result<u32> {
        page.checked_add(1).ok_or_else(|| {
            let e = DashError::PageOutOfRange(page);
            self.fail(e.clone());
            e
        })
    }

    async fn fetch(&self) -> Result<()> {
        let seq = self.inner.sequence.begin();
        let (page, page_size) = {
            let state = self.inner.state.borrow();
            (state.page, state.page_size)
        };
        let provider_page = self.check_page(page)?;
        if !self.inner.sequence.is_disposed() {
            self.inner.state.send_modify(|s| s.set_phase(Phase::Loading));
        }

        tracing::debug!(seq, page, page_size, "fetching builds");
        let fetched = self.inner.api.get_builds(provider_page, page_size).await;

        if let Err(e) = &fetched {
            self.inner.errors.post(e);
        }
        if !self.inner.sequence.is_current(seq) {
            tracing::debug!(seq, "dropping stale builds response");
            return Ok(());
        }

        match fetched {
            Ok(records) => {
                let rows = transform(records, self, Utc::now());
                self.inner.state.send_modify(|s| {
                    if page == 0 {
                        s.total = rows.iter().map(|row| row.build.number).max().unwrap_or(0);
                    }
                    s.rows = rows;
                    s.error = None;
                    s.set_phase(Phase::Loaded);
                });
                Ok(())
            }
            Err(e) => {
                self.inner.state.send_modify(|s| {
                    s.error = Some(e.to_string());
                    s.set_phase(Phase::Error);
                });
                Err(e)
            }
        }
    }

    /// Reports `error` and flags the list, keeping whatever rows it shows.
    fn fail(&self, error: DashError) {
        self.inner.errors.post(&error);
        if self.inner.sequence.is_disposed() {
            return;
        }
        self.inner.state.send_modify(|s| {
            s.error = Some(error.to_string());
            s.set_phase(Phase::Error);
        });
    }
}
