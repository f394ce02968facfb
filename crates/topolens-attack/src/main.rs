//! CLI entry point for one-off attack graph computation.
//!
//! Writes the attack graph JSON to stdout; logs go to stderr.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use topolens_attack::{ReachabilityConfig, ReachabilityEngine};
use topolens_core::config::{load_section, load_section_or_default};
use topolens_graph::{ConnectionManager, GraphConfig, Neo4jDialer};

#[derive(Parser)]
#[command(name = "topolens-attack")]
#[command(about = "Bounded-hop attack graph computation for the topolens device topology")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: topolens).
    #[arg(short, long, default_value = "topolens", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the attack graph around one device.
    Graph {
        /// Element id or `id` property of the target device.
        #[arg(long)]
        device: String,
        /// Override the maximum hop count (1 to 3).
        #[arg(long)]
        max_hops: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let graph_config: GraphConfig = load_section(&cli.config, "neo4j")?;
    let mut reach_config: ReachabilityConfig = load_section_or_default(&cli.config, "attack")?;

    match cli.command {
        Command::Graph { device, max_hops } => {
            if let Some(hops) = max_hops {
                reach_config.max_hops = hops;
            }
            let engine = ReachabilityEngine::new(reach_config)?;

            let manager = ConnectionManager::new(graph_config, Neo4jDialer);
            let session = manager.connect().await?;
            let result = engine.attack_graph(&session, &device).await;
            session.close();

            println!("{}", serde_json::to_string(&result?)?);
        }
    }

    Ok(())
}
