//! JSON front of the dashboard: the build list, one build and one job log
//! of the configured project.

pub mod build;
pub mod build_list;
pub mod utils;

use poem::{get, post, Endpoint, EndpointExt, Route};

pub use utils::AppState;

pub fn app(state: AppState) -> impl Endpoint {
    Route::new()
        .at("/builds", get(build_list::build_list))
        .at("/builds/:number", get(build::build_detail))
        .at("/builds/:number/restart", post(build_list::restart))
        .at("/builds/:number/jobs/:job_id/log", get(build::job_log))
        .data(state)
        .inspect_all_err(|err| {
            tracing::error!("{:?}", err);
        })
}
