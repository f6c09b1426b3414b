#![forbid(unsafe_code)]
//! Standalone miner: polls a node for jobs, grinds nonces, submits solutions.

use clap::Parser;
use praxischain::crypto::timestamp_now;
use praxischain::miner::search_nonce;
use praxischain::mining::{MinedBlockPayload, MiningJob};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "praxis-miner", version, about = "Mine blocks against a praxischain node")]
struct Cli {
    /// Base URL of the node to mine against
    #[arg(long, default_value = "http://127.0.0.1:5555")]
    node: String,

    /// Reward address (40 hex digits)
    #[arg(long)]
    address: String,

    /// Nonces to try per job before refreshing it
    #[arg(long, default_value_t = 50_000_000)]
    max_attempts: u64,

    /// Seconds to wait between job polls
    #[arg(long, default_value_t = 2)]
    poll_interval: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    tracing::info!(node = %cli.node, address = %cli.address, "miner started");

    loop {
        let job: MiningJob = match client
            .get(format!("{}/mining/get-mining-job/{}", cli.node, cli.address))
            .send()
            .await
        {
            Ok(response) => match response.json().await {
                Ok(job) => job,
                Err(e) => {
                    tracing::warn!(error = %e, "bad job response");
                    tokio::time::sleep(Duration::from_secs(cli.poll_interval)).await;
                    continue;
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "node unreachable");
                tokio::time::sleep(Duration::from_secs(cli.poll_interval)).await;
                continue;
            }
        };

        tracing::info!(
            index = job.index,
            difficulty = job.difficulty,
            transactions = job.transactions_included,
            "mining job received"
        );

        // The search is CPU-bound; keep it off the async runtime threads.
        let block_data_hash = job.block_data_hash.clone();
        let difficulty = job.difficulty;
        let max_attempts = cli.max_attempts;
        let date_created = timestamp_now();
        let search_date = date_created.clone();
        let solution = tokio::task::spawn_blocking(move || {
            search_nonce(&block_data_hash, &search_date, difficulty, max_attempts)
        })
        .await?;

        let Some((nonce, block_hash)) = solution else {
            tracing::info!("attempt budget exhausted, refreshing job");
            continue;
        };

        let payload = MinedBlockPayload {
            block_data_hash: job.block_data_hash,
            date_created,
            nonce,
            block_hash,
        };
        match client
            .post(format!("{}/mining/submit-mined-block", cli.node))
            .json(&payload)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                tracing::info!(index = job.index, nonce, "block accepted");
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(%status, body, "submission rejected");
            }
            Err(e) => tracing::warn!(error = %e, "submission failed"),
        }

        tokio::time::sleep(Duration::from_secs(cli.poll_interval)).await;
    }
}
