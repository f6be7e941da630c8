use std::error::Error;
use std::sync::Arc;

use chatrelay_common::{GlobalConfig, GlobalConfigPatch};
use chatrelay_core::TokenEstimator;
use chatrelay_provider::{BackendRegistry, TiktokenEstimator};
use chatrelay_router::{RelayState, relay_router};
use clap::Parser;
use tracing::info;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("chatrelay failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.log_filter);
    info!(
        host = %config.host,
        port = config.port,
        echo = config.echo,
        redact_rules = config.redact.len(),
        "config loaded"
    );

    let estimator: Arc<dyn TokenEstimator> = Arc::new(TiktokenEstimator::new()?);
    let app = relay_router(RelayState {
        config: Arc::new(config.clone()),
        backends: BackendRegistry::echo_only(),
        estimator,
    });

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("shutdown complete");
    Ok(())
}

fn load_config(cli: &Cli) -> Result<GlobalConfig, Box<dyn Error + Send + Sync>> {
    let mut patch = match &cli.config {
        Some(path) => GlobalConfigPatch::from_json_file(path)?,
        None => GlobalConfigPatch::default(),
    };
    patch.overlay(cli.patch());
    Ok(patch.into_config()?)
}

fn init_tracing(fallback: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
