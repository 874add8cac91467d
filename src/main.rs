use std::sync::Arc;

use anyhow::Result;
use poem::{listener::TcpListener, Server};

use buildkite_dash::config::DashConfig;
use buildkite_dash::discovery::UrlPatternDiscovery;
use buildkite_dash::reporting::TracingErrorSink;
use buildkite_dash::views::{self, AppState};
use buildkite_dash::RestClient;

fn setup_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();
}

fn setup_builds(state: &AppState) {
    let builds = state.builds.clone();
    tokio::spawn(async move {
        if let Err(e) = builds.mount().await {
            tracing::warn!("initial build list load failed: {}", e);
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    let config = DashConfig::from_env()?;

    let discovery = UrlPatternDiscovery::compile(&config.discovery_pattern)?;
    let api = RestClient::with_proxy_path(Arc::new(discovery), &config.proxy_path);
    let state = AppState::new(
        Arc::new(api),
        Arc::new(TracingErrorSink),
        config.project.clone(),
        config.page_size,
    );
    setup_builds(&state);

    tracing::info!("serving builds of {} on {}", config.project, config.listen_addr);
    Server::new(TcpListener::bind(config.listen_addr.clone()))
        .run(views::app(state))
        .await?;

    Ok(())
}
