//! tutorhub REST API server.
//!
//! ```bash
//! tutorhub-server --port 9000 --storage-url memory://
//! RUST_LOG=debug tutorhub-server --log-format json --metrics-addr 127.0.0.1:9100
//! ```

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tutorhub_server::app::AppServices;
use tutorhub_server::config::{LogFormat, ServerArgs};
use tutorhub_server::network::ServerModule;
use tutorhub_server::storage::open_stores;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Fmt => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "could not listen for Ctrl-C; shutting down");
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    init_tracing(args.log_format);

    if let Some(addr) = args.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install Prometheus exporter")?;
        info!(%addr, "metrics exporter listening");
    }

    let stores = open_stores(&args.storage_config()).await?;
    let services = AppServices::wire(stores);

    let mut server = ServerModule::new(args.network_config(), services);
    let port = server.start().await?;
    info!(port, "tutorhub server starting");

    server.serve(ctrl_c()).await?;
    info!("tutorhub server stopped");
    Ok(())
}
