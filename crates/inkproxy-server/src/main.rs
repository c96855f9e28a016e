use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use inkproxy_client::ChromiumLauncher;
use inkproxy_core::{FileSnapshots, NullSnapshots, SiteProfile, SnapshotSink, Workflow};
use inkproxy_server::config::ServerConfig;
use inkproxy_server::routes;
use inkproxy_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("inkproxy=info".parse()?))
        .with_target(false)
        .init();

    let config = ServerConfig::parse();
    config.validate()?;

    match config.snapshot_dir() {
        Some(dir) => {
            tracing::info!("Debug snapshots go to {}", dir.display());
            serve(&config, FileSnapshots::new(dir)).await
        }
        None => {
            tracing::info!("Debug snapshots disabled");
            serve(&config, NullSnapshots).await
        }
    }
}

async fn serve<S>(config: &ServerConfig, snapshots: S) -> anyhow::Result<()>
where
    S: SnapshotSink + 'static,
{
    let workflow = Workflow::new(
        ChromiumLauncher::new(config.launch_options()),
        snapshots,
        SiteProfile::default(),
        config.workflow_config(),
    );
    let state = Arc::new(AppState { workflow });

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
