use poem::handler;
use poem::web::{Data, Json, Path};

use crate::models::{BuildView, LogPayload};
use crate::services::{LogService, ResourceSnapshot, SingleBuildService};
use crate::views::utils::{log_outcome, AppState};

#[handler]
pub async fn build_detail(
    Path(number): Path<u64>,
    state: Data<&AppState>,
) -> Json<ResourceSnapshot<BuildView>> {
    let service = SingleBuildService::for_build(
        state.api.clone(),
        state.errors.clone(),
        &state.project.owner,
        &state.project.repo,
        number,
    );
    log_outcome("build detail", service.mount().await);

    Json(service.snapshot())
}

#[handler]
pub async fn job_log(
    Path((number, job_id)): Path<(u64, String)>,
    state: Data<&AppState>,
) -> Json<ResourceSnapshot<LogPayload>> {
    let service = LogService::for_job(
        state.api.clone(),
        state.errors.clone(),
        &state.project.owner,
        &state.project.repo,
        number,
        &job_id,
    );
    log_outcome("job log", service.mount().await);

    Json(service.snapshot())
}
