//! Contract anchor path: deploy a fresh root contract, then set the item's
//! merkle root.
//!
//! Every anchor call deploys its own contract instance; the NFT path reuses
//! a shared collection instead. That asymmetry is deliberate: the generated
//! source carries the proof hash in its constructor, so each deployment is
//! independently re-verifiable from the saved artifacts. Idempotency per
//! item id is enforced on-chain by the setter's "Already set" guard, not by
//! this client.

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::anchor::types::{AnchorError, AnchorKind, AnchorReceipt, AnchorResult};
use crate::chain::client::ChainClient;
use crate::chain::monitor;
use crate::chain::types::TransactionOutcome;
use crate::config::schema::AnchorConfig;
use crate::contract::compiler::{CompiledContract, ContractCompiler};
use crate::contract::source::{merkle_root_contract_source, CONTRACT_NAME};
use crate::identity::CanonicalHash;

/// A compiled contract together with its persisted artifacts.
#[derive(Debug)]
pub struct PreparedContract {
    pub compiled: CompiledContract,
    /// Path prefix of the saved `.sol` / `.abi.json` / `.bytecode.json`.
    pub artifact_base: PathBuf,
}

/// Generate, compile and persist the root contract for a proof hash.
/// Runs entirely before any chain connection is opened.
pub fn prepare(
    compiler: &dyn ContractCompiler,
    artifacts_dir: &Path,
    proof_hash: &str,
) -> AnchorResult<PreparedContract> {
    let source = merkle_root_contract_source(proof_hash);
    let compiled = compiler.compile(&source, CONTRACT_NAME)?;
    if compiled.bytecode.is_empty() || compiled.bytecode == "0x" {
        return Err(AnchorError::Compilation(format!(
            "Bytecode is empty for contract {CONTRACT_NAME}"
        )));
    }

    let artifact_base = persist_artifacts(artifacts_dir, &source, &compiled)?;
    Ok(PreparedContract {
        compiled,
        artifact_base,
    })
}

/// Save source, ABI and bytecode with a timestamp-qualified filename so
/// every deployed contract stays auditable.
fn persist_artifacts(
    artifacts_dir: &Path,
    source: &str,
    compiled: &CompiledContract,
) -> AnchorResult<PathBuf> {
    fs::create_dir_all(artifacts_dir)?;
    let ts = Utc::now().to_rfc3339().replace([':', '.'], "-");
    let base = artifacts_dir.join(format!("{CONTRACT_NAME}_{ts}"));

    fs::write(base.with_extension("sol"), source)?;
    fs::write(
        base.with_extension("abi.json"),
        serde_json::to_string_pretty(&compiled.abi)?,
    )?;
    fs::write(
        base.with_extension("bytecode.json"),
        serde_json::to_string_pretty(&serde_json::json!({ "bytecode": compiled.bytecode }))?,
    )?;

    tracing::info!(base = %base.display(), "Contract artifacts saved");
    Ok(base)
}

/// Deploy the prepared contract and anchor the canonical hash under the
/// item id. Returns a receipt for every post-submission outcome; only
/// submission-transport failures bubble up as errors.
pub async fn submit(
    client: &dyn ChainClient,
    config: &AnchorConfig,
    block_id: &str,
    item_id: u32,
    canonical_hash: &CanonicalHash,
    prepared: &PreparedContract,
) -> AnchorResult<AnchorReceipt> {
    let window = Duration::from_secs(config.chain.finality_timeout_secs);
    let owner = client.signer_address();

    let deployed = client
        .deploy_contract(&prepared.compiled, config.contract_anchor.deploy_gas_limit)
        .await?;
    let contract_address = deployed.address.clone();
    let deploy_tx_hash = deployed.pending.tx_hash.clone();

    tracing::info!(
        block_id = block_id,
        contract_address = %contract_address,
        tx_hash = %deploy_tx_hash,
        "Deploying root contract"
    );

    let deploy_outcome = monitor::await_outcome(deployed.pending, window).await;
    if !matches!(deploy_outcome, TransactionOutcome::Finalized { .. }) {
        return Ok(build_receipt(
            config,
            block_id,
            item_id,
            canonical_hash,
            &owner,
            Some(contract_address),
            deploy_tx_hash,
            deploy_outcome,
        ));
    }

    let pending = client
        .add_merkle_root(
            &contract_address,
            item_id,
            canonical_hash,
            config.contract_anchor.call_gas_limit,
        )
        .await?;
    let anchor_tx_hash = pending.tx_hash.clone();

    let outcome = monitor::await_outcome(pending, window).await;
    Ok(build_receipt(
        config,
        block_id,
        item_id,
        canonical_hash,
        &owner,
        Some(contract_address),
        anchor_tx_hash,
        outcome,
    ))
}

#[allow(clippy::too_many_arguments)]
fn build_receipt(
    config: &AnchorConfig,
    block_id: &str,
    item_id: u32,
    canonical_hash: &CanonicalHash,
    owner: &str,
    contract_address: Option<String>,
    submitted_tx_hash: String,
    outcome: TransactionOutcome,
) -> AnchorReceipt {
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
                "Anchor rejected by chain"
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

    let explorer_url = format!(
        "{}/extrinsic/{}",
        config.chain.explorer_base.trim_end_matches('/'),
        tx_hash
    );

    AnchorReceipt {
        subject_id: block_id.to_string(),
        item_id,
        canonical_hash: canonical_hash.clone(),
        kind: AnchorKind::Contract,
        tx_hash,
        block_hash,
        contract_address,
        nft_id: None,
        owner: owner.to_string(),
        timestamp: Utc::now(),
        explorer_url,
        error,
        timed_out,
    }
}
