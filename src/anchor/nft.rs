//! NFT anchor path: mint into the shared collection and attach metadata in
//! one atomic batch.
//!
//! No on-chain duplicate guard exists on this path. Re-anchoring the same
//! block derives the same item id, which collides with the existing item in
//! the collection; the chain's rejection is surfaced verbatim in the
//! receipt rather than swallowed or reinterpreted.

use chrono::Utc;
use std::time::Duration;

use crate::anchor::metadata;
use crate::anchor::types::{AnchorKind, AnchorReceipt, AnchorResult};
use crate::chain::client::ChainClient;
use crate::chain::monitor;
use crate::chain::types::TransactionOutcome;
use crate::config::schema::AnchorConfig;
use crate::identity::CanonicalHash;
use crate::proof::ValidProof;

/// Write the metadata file, then mint + set-metadata atomically and wait
/// for the outcome. The proof must already be validated; everything here
/// either submits or fails with a transport error.
pub async fn submit(
    client: &dyn ChainClient,
    config: &AnchorConfig,
    block_id: &str,
    item_id: u32,
    canonical_hash: &CanonicalHash,
    proof: &ValidProof,
) -> AnchorResult<AnchorReceipt> {
    let window = Duration::from_secs(config.chain.finality_timeout_secs);
    let owner = client.signer_address();
    let collection_id = config.nft_anchor.collection_id;

    let (nft_metadata, metadata_path) = metadata::write_metadata(
        &config.nft_anchor.metadata_dir,
        &config.nft_anchor.metadata_base_url,
        &config.chain.network_name,
        block_id,
        proof,
    )?;

    tracing::info!(
        block_id = block_id,
        collection_id = collection_id,
        item_id = item_id,
        metadata_url = %nft_metadata.metadata_url,
        "Minting anchor NFT"
    );

    let pending = client
        .mint_with_metadata(
            &config.nft_anchor.collection_address,
            item_id,
            &owner,
            &nft_metadata.metadata_url,
        )
        .await?;
    let submitted_tx_hash = pending.tx_hash.clone();

    let outcome = monitor::await_outcome(pending, window).await;

    let (tx_hash, block_hash, error, timed_out) = match outcome {
        TransactionOutcome::Finalized {
            block_hash,
            tx_hash,
        } => (tx_hash, block_hash, None, false),
        TransactionOutcome::DispatchFailed {
            info,
            block_hash,
            tx_hash,
        } => {
            tracing::warn!(
                block_id = block_id,
                error = %info,
                docs = info.docs.join(" "),
                "Mint rejected by chain"
            );
            (tx_hash, block_hash, Some(info.to_string()), false)
        }
        TransactionOutcome::TimedOut => (
            submitted_tx_hash,
            String::new(),
            Some("Transaction timeout".to_string()),
            true,
        ),
    };

    let receipt = AnchorReceipt {
        subject_id: block_id.to_string(),
        item_id,
        canonical_hash: canonical_hash.clone(),
        kind: AnchorKind::Nft,
        tx_hash,
        block_hash,
        contract_address: None,
        nft_id: Some(format!("{collection_id}-{item_id}")),
        owner,
        timestamp: Utc::now(),
        explorer_url: format!(
            "{}/nft/{}/{}",
            config.chain.explorer_base.trim_end_matches('/'),
            collection_id,
            item_id
        ),
        error,
        timed_out,
    };

    if receipt.is_final() {
        metadata::finalize_metadata(&metadata_path, &nft_metadata, &receipt)?;
    }

    Ok(receipt)
}
