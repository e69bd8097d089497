use anyhow::Context;
use cluster_mcp::cluster::kube_backend::KubeBackend;
use cluster_mcp::config::{ServerConfig, Transport};
use cluster_mcp::server::McpServer;
use cluster_mcp::tools::all_tools;
use cluster_mcp::transport;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout belongs to the stdio transport.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::from_env();

    let backend = KubeBackend::connect(&config.cluster)
        .await
        .context("failed to initialize cluster clients")?;

    let mut server = McpServer::cluster();
    server.register_tools(all_tools(Arc::new(backend)));
    info!(tools = server.list_tools().len(), "tools registered");

    let server = Arc::new(server);
    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    match config.transport {
        Transport::Stdio => {
            info!("MCP server ready (stdio)");
            transport::serve_stdio(server, shutdown).await?;
        }
        Transport::Http => {
            transport::serve_http(server, &config.http_addr, shutdown).await?;
        }
    }

    info!("MCP server stopped");
    Ok(())
}

/// Cancel the token on SIGINT or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install SIGINT handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
    shutdown.cancel();
}
