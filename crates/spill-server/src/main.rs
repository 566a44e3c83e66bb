mod config;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use spill_api::AppStateInner;
use spill_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spill_server=debug,spill_api=debug,spill_core=info,spill_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = Database::open(&config.db_path)?;
    let state = AppStateInner::new(db, config.jwt_secret);

    let app = spill_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Spill server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
