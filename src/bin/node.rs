#![forbid(unsafe_code)]
//! praxischain network node: REST API plus background peer reconciliation.

use clap::Parser;
use praxischain::api::run_api_server;
use praxischain::config::load_config;
use praxischain::node::Node;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "praxis-node", version, about = "Run a praxischain node")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Override the configured HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    if let Some(port) = cli.port {
        config.network.http_port = port;
    }

    let node = Node::init(&config)?;
    tracing::info!(
        node_id = %node.node_id,
        url = %node.node_url,
        network = %config.network.network_id,
        "node initialized"
    );

    node.connect_bootstrap_peers(&config.network.bootstrap_peers).await;

    let sync_node = node.clone();
    tokio::spawn(async move {
        sync_node.run_sync_loop().await;
    });

    run_api_server(node, &config.bind_addr()).await?;
    Ok(())
}
