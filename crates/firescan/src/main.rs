//! firescan - read-only web viewer for Firestore collections.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use firescan::cli::Cli;
use firescan::handlers::VERSION;
use firescan::{AppState, Config, Renderer, StoreEnv, build_router, open_store};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let mut config = Config::load(&cli.config).with_context(|| {
        format!(
            "failed to load configuration from {}",
            cli.config.display()
        )
    })?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    let templates = cli.templates_dir();
    let renderer = Renderer::load(&templates).with_context(|| {
        format!("failed to load templates from {}", templates.display())
    })?;

    let store = open_store(&config, &StoreEnv::from_env())
        .context("failed to initialize the document store client")?;

    info!(
        version = VERSION,
        project = %config.project_id,
        source = %store.describe(),
        collections = config.collections.len(),
        batch_size = config.batch_size,
        "Starting firescan"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(AppState::new(config, renderer, store));
    let app = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    info!("Shut down");
    Ok(())
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
