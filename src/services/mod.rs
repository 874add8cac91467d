use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;

pub mod builds;
#[cfg(test)]
pub(crate) mod fake;
pub mod resource;

pub use builds::{transform, BuildListService, BuildListSnapshot, RestartAction, TableRow};
pub use resource::{
    JobLog, LogService, ResourceService, ResourceSnapshot, SingleBuild, SingleBuildService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    Error,
}

/// Orders fetches by the time they were started. Only the most recently
/// started fetch of a live service may commit its result.
#[derive(Debug, Default)]
pub(crate) struct RequestSequence {
    latest: AtomicU64,
    disposed: AtomicBool,
}

impl RequestSequence {
    pub(crate) fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn is_current(&self, seq: u64) -> bool {
        !self.is_disposed() && self.latest.load(Ordering::SeqCst) == seq
    }

    pub(crate) fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}
