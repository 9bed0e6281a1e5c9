//! singbox-exporter: Prometheus exporter for sing-box traffic counters.
//!
//! Connects to sing-box's V2Ray stats API once at startup and serves
//! per-user and per-inbound byte counters over HTTP.
//!
//! # Usage
//!
//! ```text
//! singbox-exporter --singbox 127.0.0.1:19998 --listen :9091
//! singbox-exporter --inbounds main,relay --users alice,bob
//! singbox-exporter --config /etc/singbox-exporter.toml
//! ```

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use singbox_exporter::{Args, ExporterConfig, LogFormat, build_router};
use singbox_metrics::{ScrapeCollector, Strategy};
use singbox_stats::{EntityKind, GrpcStatsClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let config = args.into_config()?;
    run(config).await
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    let filter = config.filter();
    let strategy = config.strategy();

    info!(
        listen = %config.listen,
        upstream = %config.upstream,
        timeout = ?config.timeout(),
        strategy = strategy.as_str(),
        "sing-box exporter starting"
    );
    info!(
        users = ?filter.allowed(EntityKind::User),
        inbounds = ?filter.allowed(EntityKind::Inbound),
        "monitored entities"
    );
    match strategy {
        Strategy::Enumerate if filter.is_unrestricted() => {
            info!("no users or inbounds listed; reporting every entity sing-box tracks");
        }
        Strategy::Targeted if filter.allowed(EntityKind::User).is_empty() => {
            warn!("no users specified to monitor; use --users to report per-user traffic");
        }
        _ => {}
    }

    // Without the stats API the exporter has nothing to do.
    let client = match GrpcStatsClient::connect(&config.upstream, config.timeout()).await {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "cannot reach sing-box stats api");
            return Err(e.into());
        }
    };

    let collector = ScrapeCollector::new(Arc::new(client), filter, strategy);
    let router = build_router(collector, &config.metrics_path);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    info!(addr = %config.listen, path = %config.metrics_path, "metrics server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to install CTRL+C handler");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("sing-box exporter stopped");
    Ok(())
}
