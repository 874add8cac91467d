use poem::error::NotFoundError;
use poem::web::{Data, Json, Path, Query};
use poem::{handler, Result};
use serde::Deserialize;

use crate::services::BuildListSnapshot;
use crate::views::utils::{log_outcome, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    page: Option<u32>,
    page_size: Option<u32>,
}

/// Current page of builds. Without parameters the page on display is
/// reloaded.
#[handler]
pub async fn build_list(
    Query(params): Query<ListParams>,
    state: Data<&AppState>,
) -> Json<BuildListSnapshot> {
    let builds = &state.builds;
    let current = builds.snapshot();

    let outcome = match (params.page, params.page_size) {
        (None, None) => builds.retry().await,
        (Some(page), None) => builds.set_page(page).await,
        (None, Some(page_size)) => builds.set_page_size(page_size).await,
        (Some(page), Some(page_size)) if page_size == current.page_size => {
            builds.set_page(page).await
        }
        (Some(page), Some(page_size)) => builds.paginate(page, page_size).await,
    };
    log_outcome("build list", outcome);

    Json(builds.snapshot())
}

#[handler]
pub async fn restart(
    Path(number): Path<u64>,
    state: Data<&AppState>,
) -> Result<Json<BuildListSnapshot>> {
    let row = state.builds.row(number).ok_or(NotFoundError)?;
    tracing::info!("restarting {}#{}", state.project, number);
    row.on_restart_click.call().await?;

    Ok(Json(state.builds.snapshot()))
}
