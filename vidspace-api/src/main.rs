use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use tonic::transport::Server;
use tracing::{info, warn};
use vidspace_api::{JwtIdentityResolver, VideoAccessApi, VideoAccessServer};
use vidspace_core::core_access::{AccessService, AccessSqlStore, MetadataTenantExtractor};
use vidspace_core::{init_logging_with_config, Config, LogConfig};

#[derive(Parser)]
#[command(name = "vidspace-api", about = "vidspace gRPC API server", version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "VIDSPACE_CONFIG")]
    config: Option<PathBuf>,

    /// Override server.bind_address
    #[arg(long)]
    bind: Option<SocketAddr>,
}

fn open_store(config: &Config) -> Result<AccessSqlStore> {
    if config.store.in_memory {
        warn!("using in-memory store, data is lost on exit");
        return Ok(AccessSqlStore::memory()?);
    }

    let path = &config.store.database_path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }

    let store = AccessSqlStore::open_with_pool_size(path, config.store.pool_size)
        .with_context(|| format!("opening database {}", path.display()))?;
    info!(path = %path.display(), schema = store.schema_version()?, "store ready");
    Ok(store)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                    _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    init_logging_with_config(LogConfig::try_from(&config.logging)?)?;

    if config.metrics.enabled {
        PrometheusBuilder::new()
            .with_http_listener(config.metrics.bind_address)
            .install()
            .context("installing Prometheus exporter")?;
        vidspace_core::metrics::init_metrics();
        info!(addr = %config.metrics.bind_address, "metrics endpoint listening");
    }

    let store = open_store(&config)?;
    let identity = JwtIdentityResolver::from_config(&config.auth)?;
    let tenants = MetadataTenantExtractor::new(config.server.tenant_header.as_str());
    let api = VideoAccessApi::new(AccessService::new(identity, tenants, store, config.listing));

    let addr = config.server.bind_address;
    info!(%addr, tenant_header = %config.server.tenant_header, "vidspace gRPC API server starting");

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(
        Server::builder()
            .timeout(config.server.request_timeout)
            .add_service(VideoAccessServer::new(api))
            .serve_with_shutdown(addr, async move {
                let _ = stop_rx.await;
            }),
    );

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    info!("shutting down, draining in-flight requests");
    let _ = stop_tx.send(());
    match tokio::time::timeout(config.server.shutdown_timeout, server).await {
        Ok(result) => result??,
        Err(_) => warn!(timeout = ?config.server.shutdown_timeout, "shutdown timed out"),
    }

    info!("server stopped");
    Ok(())
}
