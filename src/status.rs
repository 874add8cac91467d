use serde::Serialize;

/// Coarse status used to color builds and jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Failed,
    Running,
    Success,
    Neutral,
}

pub fn normalize(state: Option<&str>) -> BuildStatus {
    match state {
        Some("failed") => BuildStatus::Failed,
        Some("running" | "queued" | "scheduled") => BuildStatus::Running,
        Some("passed" | "success") => BuildStatus::Success,
        _ => BuildStatus::Neutral,
    }
}
