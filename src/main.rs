//! CLI entry point for the proof anchoring pipeline.
//!
//! Each invocation runs one anchor as an independent unit of work: a single
//! chain connection, a single suspension awaiting finality, and a receipt
//! on every post-submission outcome. Anything that prevents submission
//! exits nonzero without writing a receipt.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use proof_anchor::config::{load_config, validate_config, AnchorConfig, ConfigError};
use proof_anchor::AnchorPipeline;

#[derive(Parser)]
#[command(name = "proof-anchor", about = "Anchor block proofs on-chain")]
struct Cli {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy a root contract for the proof hash and set the item's root.
    Contract {
        block_id: String,
        proof_hash: String,
    },
    /// Mint the block proof as an NFT in the configured collection.
    Nft { block_id: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proof_anchor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match load_cli_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Configuration rejected");
            std::process::exit(1);
        }
    };

    tracing::info!(
        rpc_url = %config.chain.rpc_url,
        finality_timeout_secs = config.chain.finality_timeout_secs,
        "Configuration loaded"
    );

    let pipeline = match AnchorPipeline::from_config(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!(error = %e, "Pipeline startup failed");
            std::process::exit(1);
        }
    };

    let result = match &cli.command {
        Command::Contract {
            block_id,
            proof_hash,
        } => pipeline.anchor_contract(block_id, proof_hash).await,
        Command::Nft { block_id } => pipeline.anchor_nft(block_id).await,
    };

    match result {
        Ok(receipt) => {
            if let Some(error) = &receipt.error {
                tracing::warn!(
                    subject_id = %receipt.subject_id,
                    error = %error,
                    timed_out = receipt.timed_out,
                    explorer_url = %receipt.explorer_url,
                    "Anchor attempt recorded with error"
                );
            } else {
                tracing::info!(
                    subject_id = %receipt.subject_id,
                    item_id = receipt.item_id,
                    tx_hash = %receipt.tx_hash,
                    block_hash = %receipt.block_hash,
                    explorer_url = %receipt.explorer_url,
                    "Anchor complete"
                );
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Anchor failed");
            std::process::exit(1);
        }
    }
}

fn load_cli_config(path: Option<&std::path::Path>) -> Result<AnchorConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = AnchorConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}
