use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use eta_board::card::CardContext;
use eta_board::config::DashboardConfig;
use eta_board::dashboard::Dashboard;
use eta_board::directory::Directory;
use eta_board::store::{FileKeyValue, SavedGroupStore};
use eta_board::surface::HtmlSurface;
use eta_board::upstream::{ReqwestFetch, Upstream};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("eta_board=info")),
        )
        .init();

    let config = match DashboardConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let fetch = match ReqwestFetch::new(config.timeout) {
        Ok(fetch) => Arc::new(fetch),
        Err(e) => {
            eprintln!("Failed to create HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let upstream = Upstream::new(fetch, &config);
    info!("Loading route directory...");
    let directory = Directory::preload(&upstream.bus).await;

    let store = SavedGroupStore::new(FileKeyValue::new(&config.store_path));
    let surface = HtmlSurface::spawn(&config.output_path);
    info!(output = %config.output_path.display(), "Writing dashboard");

    let removal_delay = config.removal_delay;
    let ctx = Arc::new(CardContext::new(upstream, directory, config));
    let dashboard = Dashboard::new(ctx, surface.clone(), store);

    if let Err(e) = dashboard.load_preferences().await {
        error!(error = %e, "Failed to read preferences, using defaults");
    }

    match dashboard.load_default_group().await {
        Ok(Some(group)) => info!(name = %group.name, "Showing default group"),
        Ok(None) => info!("No saved groups yet"),
        Err(e) => error!(error = %e, "Failed to load saved groups"),
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
    dashboard.clear_all().await;
    // Let pending exit animations finish before the last write.
    tokio::time::sleep(removal_delay * 2).await;
    surface.flushed().await;
    ExitCode::SUCCESS
}
