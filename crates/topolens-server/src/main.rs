//! Server entry point.

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

use topolens_attack::{ReachabilityConfig, ReachabilityEngine};
use topolens_core::config::{load_section, load_section_or_default};
use topolens_graph::{ConnectionManager, GraphConfig, Neo4jDialer};
use topolens_server::{build_router, AppState, ServerConfig};

#[derive(Parser)]
#[command(name = "topolens-server")]
#[command(about = "HTTP API serving the topolens topology views and attack graphs")]
struct Cli {
    /// Config file prefix (default: topolens).
    #[arg(short, long, default_value = "topolens")]
    config: String,

    /// Listen address, overriding `[server].bind`.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();

    let graph_config: GraphConfig = load_section(&cli.config, "neo4j")?;
    let server_config: ServerConfig = load_section_or_default(&cli.config, "server")?;
    let reach_config: ReachabilityConfig = load_section_or_default(&cli.config, "attack")?;
    let bind = cli.bind.unwrap_or(server_config.bind);

    tracing::info!(
        uri = %graph_config.uri,
        database = %graph_config.database,
        "Loaded Neo4j configuration"
    );

    let engine = ReachabilityEngine::new(reach_config)?;
    let manager = ConnectionManager::new(graph_config, Neo4jDialer);
    let app = build_router(AppState::new(manager, engine));

    let listener = TcpListener::bind(&bind).await?;
    tracing::info!(%bind, "topolens-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("topolens-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
