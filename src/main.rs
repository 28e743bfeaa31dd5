use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use celium_pods::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use celium_pods::{router, CeliumClient, Config, MachinesService};

/// REST API for Celium pods.
#[derive(Parser, Debug)]
#[command(name = "celium-pods", version, about)]
struct Cli {
    /// Celium API key.
    #[arg(long, env = "CELIUM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Celium API base URL.
    #[arg(long, env = "CELIUM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Address to listen on.
    #[arg(long, env = "CELIUM_LISTEN", default_value = "0.0.0.0:8000")]
    listen: SocketAddr,

    /// Timeout for each Celium request, in seconds.
    #[arg(long, env = "CELIUM_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let config = Config::new(
        cli.api_key,
        &cli.base_url,
        Duration::from_secs(cli.timeout_secs),
    )
    .context("Failed to load configuration")?;
    let client = CeliumClient::new(&config).context("Failed to build Celium client")?;
    let app = router(MachinesService::new(client));

    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("Failed to bind {}", cli.listen))?;
    tracing::info!(addr = %cli.listen, base_url = %config.base_url(), "celium-pods listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("celium-pods stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
