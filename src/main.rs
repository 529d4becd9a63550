use std::sync::Arc;

use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

use pharmledger::{
    api::{self, AppState},
    config::{CliArgs, Config, LoggingConfig},
    mirror::{self, SpreadsheetMirror},
    service::LedgerService,
    storage,
};

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    if config.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = CliArgs::parse();
    let config = Config::load(&cli);
    init_logging(&config.logging);

    let metrics = if config.metrics.enabled {
        Some(PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };

    let store = storage::open_store(&config.storage)?;
    let mut service = LedgerService::new(store, config.auth.default_password.clone())
        .with_history_limit(config.storage.history_limit);

    let worker = if config.mirror.enabled {
        let (queue, worker) = mirror::spawn(SpreadsheetMirror::new(&config.mirror.path));
        service = service.with_mirror(queue);
        Some(worker)
    } else {
        tracing::info!("Spreadsheet mirror disabled");
        None
    };

    let app = api::router(AppState {
        service: Arc::new(service),
        metrics,
    });

    let addr = config.listen_addr()?;
    tracing::info!(%addr, "PharmLedger listening");

    axum::Server::try_bind(&addr)?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and with it every queue handle) is gone; let pending
    // appends finish before exiting.
    if let Some(worker) = worker {
        let failures = worker.join().await?;
        tracing::info!(failures, "Spreadsheet mirror drained");
    }

    Ok(())
}
