//! Mushaf Marks server
//!
//! Serves the annotation store and reading units to the reader front end.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mushaf_marks::config::Config;
use mushaf_marks::db;
use mushaf_marks::marks::MarksRepository;
use mushaf_marks::state::AppState;
use mushaf_marks::verses::VerseRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mushaf_marks=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    tracing::info!("Starting Mushaf Marks v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Persistence timeout: {} ms", config.persistence.timeout_ms);

    let marks_pool = db::create_marks_pool(&config.database.marks_url)
        .await
        .with_context(|| format!("failed to open marks database {}", config.database.marks_url))?;
    tracing::info!("Marks database initialized at {}", config.database.marks_url);

    let verses_pool = db::open_verses_pool(&config.database.verses_url)
        .await
        .with_context(|| format!("failed to open verse database {}", config.database.verses_url))?;
    tracing::info!("Verse database opened at {}", config.database.verses_url);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;

    let state = AppState::new(
        config,
        MarksRepository::new(marks_pool),
        VerseRepository::new(verses_pool),
    );
    let app = mushaf_marks::app(state);

    // Start server with graceful shutdown
    tracing::info!("Mushaf Marks listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
