//! Anchor pipeline orchestration.
//!
//! One pipeline invocation runs: identity derivation → transaction build →
//! submission → monitoring → receipt. Suspension happens at exactly one
//! point per run (awaiting transaction finality), bounded by the configured
//! window. Pre-submission failures abort without a receipt; everything
//! after submission resolves into a receipt, possibly an error receipt.
//!
//! Concurrent attempts for the same subject are serialized through a keyed
//! lock. The storage layer is last-write-wins and the chain is the final
//! arbiter, so without the lock two attempts could both submit and one
//! would waste a deployment (contract path) or mint a colliding item
//! (NFT path).

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::anchor::types::{AnchorError, AnchorReceipt, AnchorResult};
use crate::anchor::{contract, nft, receipt};
use crate::chain::client::{ChainClient, RpcChainClient};
use crate::chain::signer::AnchorSigner;
use crate::chain::types::ChainResult;
use crate::config::loader::ConfigError;
use crate::config::schema::{AnchorConfig, ChainConfig};
use crate::config::validation::validate_nft_config;
use crate::contract::compiler::{ContractCompiler, SolcCompiler};
use crate::identity;
use crate::proof;

/// Opens the single chain connection of an invocation. Kept behind a trait
/// so tests can count connects and substitute a fake chain; input
/// validation must run before this is ever called.
#[async_trait]
pub trait ChainConnector: Send + Sync {
    async fn connect(&self) -> ChainResult<Arc<dyn ChainClient>>;
}

/// Production connector wrapping [`RpcChainClient`].
pub struct RpcChainConnector {
    config: ChainConfig,
    signer: AnchorSigner,
}

impl RpcChainConnector {
    pub fn new(config: ChainConfig, signer: AnchorSigner) -> Self {
        Self { config, signer }
    }
}

#[async_trait]
impl ChainConnector for RpcChainConnector {
    async fn connect(&self) -> ChainResult<Arc<dyn ChainClient>> {
        let client = RpcChainClient::connect(self.config.clone(), &self.signer).await?;
        Ok(Arc::new(client))
    }
}

/// The anchoring pipeline. One instance serves one process; each anchor
/// call is an independent unit of work with its own connect/disconnect
/// cycle.
pub struct AnchorPipeline {
    config: AnchorConfig,
    connector: Arc<dyn ChainConnector>,
    compiler: Arc<dyn ContractCompiler>,
    subject_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AnchorPipeline {
    /// Build the production pipeline: load the seed from the environment,
    /// verify it derives the configured owner, and wire up the real
    /// connector and compiler. The owner check runs here, before any
    /// transaction can be built.
    pub fn from_config(config: AnchorConfig) -> AnchorResult<Self> {
        // Missing or unparseable seed material is a configuration problem,
        // not a chain transport failure.
        let signer = AnchorSigner::from_env(&config.signer.seed_env_var, config.chain.chain_id)
            .map_err(|e| {
                ConfigError::Validation(vec![crate::config::validation::ValidationError {
                    field: "signer.seed_env_var".to_string(),
                    message: e.to_string(),
                }])
            })?;

        let expected: alloy::primitives::Address =
            config.signer.owner_address.parse().map_err(|_| {
                ConfigError::Validation(vec![crate::config::validation::ValidationError {
                    field: "signer.owner_address".to_string(),
                    message: "is not a valid address".to_string(),
                }])
            })?;
        if signer.address() != expected {
            return Err(AnchorError::AddressMismatch {
                expected: expected.to_string(),
                derived: signer.address().to_string(),
            });
        }
        tracing::info!(owner = %expected, "Signer verified against configured owner");

        let connector = Arc::new(RpcChainConnector::new(config.chain.clone(), signer));
        let compiler = Arc::new(SolcCompiler::new(config.contract_anchor.solc_path.clone()));
        Ok(Self::with_parts(config, connector, compiler))
    }

    /// Assemble a pipeline from explicit collaborators (used by tests).
    pub fn with_parts(
        config: AnchorConfig,
        connector: Arc<dyn ChainConnector>,
        compiler: Arc<dyn ContractCompiler>,
    ) -> Self {
        Self {
            config,
            connector,
            compiler,
            subject_locks: DashMap::new(),
        }
    }

    /// Anchor a proof hash by deploying a root contract and calling the
    /// item-scoped setter. Writes and returns the receipt.
    pub async fn anchor_contract(
        &self,
        block_id: &str,
        proof_hash: &str,
    ) -> AnchorResult<AnchorReceipt> {
        if block_id.is_empty() || proof_hash.is_empty() {
            return Err(AnchorError::InvalidRequest(
                "blockId and proofHash are required".to_string(),
            ));
        }

        let _guard = self.lock_subject(block_id).await;

        let item_id = identity::derive_item_id(block_id);
        let canonical_hash = identity::canonicalize(proof_hash);
        tracing::info!(
            block_id = block_id,
            item_id = item_id,
            canonical_hash = %canonical_hash,
            "Contract anchor requested"
        );

        // Everything up to here — including compilation — runs before the
        // chain connection is opened.
        let prepared = contract::prepare(
            self.compiler.as_ref(),
            &self.config.contract_anchor.artifacts_dir,
            proof_hash,
        )?;

        let client = self.connector.connect().await?;
        let result = contract::submit(
            client.as_ref(),
            &self.config,
            block_id,
            item_id,
            &canonical_hash,
            &prepared,
        )
        .await;
        client.disconnect().await;

        let anchor_receipt = result?;
        receipt::persist_receipt(&self.config.storage.receipts_dir, &anchor_receipt)?;
        Ok(anchor_receipt)
    }

    /// Anchor a block proof as an NFT in the shared collection. Reads the
    /// proof file, writes metadata, mints atomically, writes the receipt.
    pub async fn anchor_nft(&self, block_id: &str) -> AnchorResult<AnchorReceipt> {
        if block_id.is_empty() {
            return Err(AnchorError::InvalidRequest(
                "blockId is required".to_string(),
            ));
        }
        validate_nft_config(&self.config)
            .map_err(|errors| AnchorError::Config(ConfigError::Validation(errors)))?;

        let _guard = self.lock_subject(block_id).await;

        let proof = proof::load_proof(&self.config.storage.proofs_dir, block_id)?;
        let item_id = identity::derive_item_id(block_id);
        let canonical_hash = identity::canonicalize(&proof.proof_hash);
        tracing::info!(
            block_id = block_id,
            item_id = item_id,
            canonical_hash = %canonical_hash,
            "NFT anchor requested"
        );

        let client = self.connector.connect().await?;
        let result = nft::submit(
            client.as_ref(),
            &self.config,
            block_id,
            item_id,
            &canonical_hash,
            &proof,
        )
        .await;
        client.disconnect().await;

        let anchor_receipt = result?;
        receipt::persist_receipt(&self.config.storage.receipts_dir, &anchor_receipt)?;
        Ok(anchor_receipt)
    }

    /// Serialize anchor attempts per subject. The guard is held across the
    /// whole submission so a second attempt for the same subject waits for
    /// the first to resolve; releasing it drops the map entry again once no
    /// other attempt holds the lock.
    async fn lock_subject(&self, subject_id: &str) -> SubjectGuard<'_> {
        let lock = {
            let entry = self
                .subject_locks
                .entry(subject_id.to_string())
                .or_default();
            Arc::clone(entry.value())
        };
        SubjectGuard {
            guard: Some(lock.lock_owned().await),
            locks: &self.subject_locks,
            subject_id: subject_id.to_string(),
        }
    }
}

/// Lock guard for one subject. Dropping it releases the mutex and prunes
/// the map entry when this was the last holder, so the lock map does not
/// grow with every subject ever anchored.
struct SubjectGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    subject_id: String,
}

impl Drop for SubjectGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Waiters hold their own clone of the Arc, so a count of one means
        // only the map entry is left.
        self.locks
            .remove_if(&self.subject_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::types::ChainError;
    use crate::contract::compiler::CompiledContract;

    // Anvil's first account.
    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const OTHER_ADDRESS: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    struct NoopConnector;

    #[async_trait]
    impl ChainConnector for NoopConnector {
        async fn connect(&self) -> ChainResult<Arc<dyn ChainClient>> {
            Err(ChainError::Rpc("no chain in this test".to_string()))
        }
    }

    struct NoopCompiler;

    impl ContractCompiler for NoopCompiler {
        fn compile(&self, _source: &str, _name: &str) -> Result<CompiledContract, AnchorError> {
            Err(AnchorError::Compilation("no compiler in this test".to_string()))
        }
    }

    fn pipeline() -> AnchorPipeline {
        AnchorPipeline::with_parts(
            AnchorConfig::default(),
            Arc::new(NoopConnector),
            Arc::new(NoopCompiler),
        )
    }

    fn config_with_seed(env_var: &str, owner: &str) -> AnchorConfig {
        let mut config = AnchorConfig::default();
        config.signer.seed_env_var = env_var.to_string();
        config.signer.owner_address = owner.to_string();
        config
    }

    #[test]
    fn test_from_config_rejects_owner_mismatch() {
        std::env::set_var("ANCHOR_TEST_SEED_MISMATCH", TEST_PRIVATE_KEY);
        let config = config_with_seed("ANCHOR_TEST_SEED_MISMATCH", OTHER_ADDRESS);

        match AnchorPipeline::from_config(config) {
            Err(AnchorError::AddressMismatch { expected, derived }) => {
                assert_eq!(expected.to_lowercase(), OTHER_ADDRESS.to_lowercase());
                assert_eq!(derived.to_lowercase(), TEST_ADDRESS.to_lowercase());
            }
            other => panic!("expected AddressMismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_from_config_accepts_matching_owner() {
        std::env::set_var("ANCHOR_TEST_SEED_MATCH", TEST_PRIVATE_KEY);
        let config = config_with_seed("ANCHOR_TEST_SEED_MATCH", TEST_ADDRESS);

        assert!(AnchorPipeline::from_config(config).is_ok());
    }

    #[test]
    fn test_from_config_missing_seed_is_config_error() {
        let config = config_with_seed("ANCHOR_TEST_SEED_NEVER_SET", TEST_ADDRESS);

        match AnchorPipeline::from_config(config) {
            Err(AnchorError::Config(e)) => assert!(e.to_string().contains("not set")),
            other => panic!("expected Config error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_subject_lock_entry_is_pruned_on_release() {
        let pipeline = pipeline();

        {
            let _guard = pipeline.lock_subject("block_1").await;
            assert_eq!(pipeline.subject_locks.len(), 1);
        }
        assert!(pipeline.subject_locks.is_empty());

        // Re-locking the same subject after release works from a clean slate.
        let _again = pipeline.lock_subject("block_1").await;
        assert_eq!(pipeline.subject_locks.len(), 1);
    }

    #[tokio::test]
    async fn test_subject_lock_entry_survives_while_contended() {
        let pipeline = Arc::new(pipeline());

        let guard = pipeline.lock_subject("block_1").await;
        let waiter = {
            let p = Arc::clone(&pipeline);
            tokio::spawn(async move {
                let _guard = p.lock_subject("block_1").await;
            })
        };
        // Let the waiter clone the lock and park on it.
        tokio::task::yield_now().await;

        drop(guard);
        waiter.await.unwrap();
        assert!(pipeline.subject_locks.is_empty());
    }
}
