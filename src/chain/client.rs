//! Chain client: the collaborator boundary in front of the chain SDK.
//!
//! # Responsibilities
//! - Connect to the configured RPC endpoint (one connect per invocation)
//! - Submit the two anchor transaction shapes: deploy-then-call and the
//!   atomic mint + set-metadata batch
//! - Feed each submission's lifecycle into a status stream for the monitor
//! - Decode chain-level rejections into structured [`DispatchInfo`]
//! - Tear the connection down on every exit path, including timeouts

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, B256, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout};

use crate::chain::signer::AnchorSigner;
use crate::chain::types::{
    ChainError, ChainResult, DeployedContract, DispatchInfo, PendingTx, StatusUpdate, TxStatus,
};
use crate::config::schema::ChainConfig;
use crate::contract::compiler::CompiledContract;
use crate::identity::CanonicalHash;

sol! {
    /// Setter interface of the per-anchor merkle root contract.
    interface IMerkleRootStatic {
        function addMerkleRoot(uint256 itemId, bytes32 root) external;
    }

    /// Interface of the long-lived proof collection. `multicall` makes the
    /// mint + set-metadata pair atomic: either both apply or neither does.
    interface IProofCollection {
        function mint(uint256 itemId, address owner) external;
        function setMetadata(uint256 itemId, string calldata uri) external;
        function multicall(bytes[] calldata data) external returns (bytes[] memory results);
    }
}

/// How often a submission's receipt is polled.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Narrow interface the anchor pipeline submits through, so alternate
/// chains or fakes can be substituted in tests.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Checksummed address of the signing account.
    fn signer_address(&self) -> String;

    /// Deploy a fresh contract instance and start watching the deployment.
    async fn deploy_contract(
        &self,
        artifact: &CompiledContract,
        gas_limit: u64,
    ) -> ChainResult<DeployedContract>;

    /// Call `addMerkleRoot(itemId, root)` on a deployed contract. The
    /// on-chain "Already set" guard makes this idempotent per item id.
    async fn add_merkle_root(
        &self,
        contract_address: &str,
        item_id: u32,
        root: &CanonicalHash,
        gas_limit: u64,
    ) -> ChainResult<PendingTx>;

    /// Mint an item into the collection and attach its metadata in one
    /// atomic batch.
    async fn mint_with_metadata(
        &self,
        collection_address: &str,
        item_id: u32,
        owner: &str,
        metadata_url: &str,
    ) -> ChainResult<PendingTx>;

    /// Release the connection and stop any outstanding watchers.
    async fn disconnect(&self);
}

/// Production [`ChainClient`] backed by an RPC provider.
pub struct RpcChainClient {
    provider: Arc<dyn Provider + Send + Sync>,
    signer_address: Address,
    config: ChainConfig,
    watchers: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl RpcChainClient {
    /// Connect to the configured endpoint with the given signer.
    pub async fn connect(config: ChainConfig, signer: &AnchorSigner) -> ChainResult<Self> {
        let url: url::Url = config
            .rpc_url
            .parse()
            .map_err(|e| ChainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e)))?;

        let provider = ProviderBuilder::new()
            .wallet(signer.wallet())
            .connect_http(url);
        let provider: Arc<dyn Provider + Send + Sync> = Arc::new(provider);

        let client = Self {
            provider,
            signer_address: signer.address(),
            config: config.clone(),
            watchers: tokio::sync::Mutex::new(Vec::new()),
        };

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    "Chain client connected"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Chain client connected but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> ChainResult<()> {
        let fut = self.provider.get_chain_id();
        let actual = match timeout(Duration::from_secs(self.config.rpc_timeout_secs), fut).await {
            Ok(Ok(id)) => id,
            Ok(Err(e)) => return Err(ChainError::Rpc(e.to_string())),
            Err(_) => return Err(ChainError::Timeout(self.config.rpc_timeout_secs)),
        };
        if actual != self.config.chain_id {
            return Err(ChainError::ChainMismatch {
                expected: self.config.chain_id,
                actual,
            });
        }
        Ok(())
    }

    /// Submit a signed transaction and spawn a watcher that feeds its
    /// lifecycle into the returned status stream.
    async fn submit(&self, request: TransactionRequest, section: &str) -> ChainResult<PendingTx> {
        let pending = self
            .provider
            .send_transaction(request.clone())
            .await
            .map_err(|e| ChainError::Submission(e.to_string()))?;
        let tx_hash = *pending.tx_hash();

        tracing::info!(tx_hash = %tx_hash, section = section, "Transaction submitted");

        let (updates, receiver) = mpsc::channel(8);
        let handle = tokio::spawn(watch_transaction(
            self.provider.clone(),
            tx_hash,
            request,
            section.to_string(),
            self.config.confirmation_blocks as u64,
            updates,
        ));
        self.watchers.lock().await.push(handle);

        Ok(PendingTx {
            tx_hash: tx_hash.to_string(),
            updates: receiver,
        })
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    fn signer_address(&self) -> String {
        self.signer_address.to_string()
    }

    async fn deploy_contract(
        &self,
        artifact: &CompiledContract,
        gas_limit: u64,
    ) -> ChainResult<DeployedContract> {
        let code = artifact.bytecode_bytes().map_err(ChainError::Deployment)?;

        let nonce = self
            .provider
            .get_transaction_count(self.signer_address)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        let address = self.signer_address.create(nonce);

        let request = TransactionRequest::default()
            .with_deploy_code(Bytes::from(code))
            .with_gas_limit(gas_limit);

        let pending = self.submit(request, "deploy").await.map_err(|e| match e {
            ChainError::Submission(msg) => ChainError::Deployment(msg),
            other => other,
        })?;

        tracing::info!(address = %address, "Contract deployment submitted");

        Ok(DeployedContract {
            address: address.to_string(),
            pending,
        })
    }

    async fn add_merkle_root(
        &self,
        contract_address: &str,
        item_id: u32,
        root: &CanonicalHash,
        gas_limit: u64,
    ) -> ChainResult<PendingTx> {
        let to: Address = contract_address
            .parse()
            .map_err(|e| ChainError::Submission(format!("Invalid contract address: {e}")))?;
        let root: B256 = root
            .as_str()
            .parse()
            .map_err(|e| ChainError::Submission(format!("Canonical hash is not bytes32: {e}")))?;

        let call = IMerkleRootStatic::addMerkleRootCall {
            itemId: U256::from(item_id),
            root,
        };
        let request = TransactionRequest::default()
            .with_to(to)
            .with_call(&call)
            .with_gas_limit(gas_limit);

        self.submit(request, "contract").await
    }

    async fn mint_with_metadata(
        &self,
        collection_address: &str,
        item_id: u32,
        owner: &str,
        metadata_url: &str,
    ) -> ChainResult<PendingTx> {
        let to: Address = collection_address
            .parse()
            .map_err(|e| ChainError::Submission(format!("Invalid collection address: {e}")))?;
        let owner: Address = owner
            .parse()
            .map_err(|e| ChainError::Submission(format!("Invalid owner address: {e}")))?;

        let item = U256::from(item_id);
        let mint = IProofCollection::mintCall {
            itemId: item,
            owner,
        }
        .abi_encode();
        let set_metadata = IProofCollection::setMetadataCall {
            itemId: item,
            uri: metadata_url.to_string(),
        }
        .abi_encode();

        let batch = IProofCollection::multicallCall {
            data: vec![Bytes::from(mint), Bytes::from(set_metadata)],
        };
        let request = TransactionRequest::default().with_to(to).with_call(&batch);

        self.submit(request, "nfts").await
    }

    async fn disconnect(&self) {
        let handles: Vec<JoinHandle<()>> = self.watchers.lock().await.drain(..).collect();
        for handle in handles {
            handle.abort();
        }
        tracing::info!(rpc_url = %self.config.rpc_url, "Chain client disconnected");
    }
}

impl std::fmt::Debug for RpcChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcChainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("signer_address", &self.signer_address)
            .finish()
    }
}

/// Poll a submission's receipt and translate it into status updates.
///
/// Emits `InBlock` when the receipt first appears and `Finalized` once the
/// confirmation depth is reached. A reverted receipt carries the decoded
/// [`DispatchInfo`] instead. The task exits as soon as the receiving side
/// is gone.
async fn watch_transaction(
    provider: Arc<dyn Provider + Send + Sync>,
    tx_hash: TxHash,
    request: TransactionRequest,
    section: String,
    required_confirmations: u64,
    updates: mpsc::Sender<StatusUpdate>,
) {
    let mut ticker = interval(POLL_INTERVAL);
    let mut in_block_sent = false;

    loop {
        ticker.tick().await;

        let receipt = match provider.get_transaction_receipt(tx_hash).await {
            Ok(Some(r)) => r,
            Ok(None) => {
                tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                continue;
            }
            Err(e) => {
                tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt query failed");
                continue;
            }
        };

        let block_hash = receipt
            .block_hash
            .map(|h| h.to_string())
            .unwrap_or_default();

        if !receipt.status() {
            let info = revert_info(provider.as_ref(), request, &section).await;
            tracing::warn!(tx_hash = %tx_hash, error = %info, "Dispatch error");
            let _ = updates
                .send(StatusUpdate {
                    status: TxStatus::InBlock { block_hash },
                    dispatch_error: Some(info),
                })
                .await;
            return;
        }

        let current = match provider.get_block_number().await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "Block number query failed");
                continue;
            }
        };
        let tx_block = receipt.block_number.unwrap_or(current);
        let confirmations = current.saturating_sub(tx_block);

        if confirmations >= required_confirmations {
            let _ = updates
                .send(StatusUpdate {
                    status: TxStatus::Finalized { block_hash },
                    dispatch_error: None,
                })
                .await;
            return;
        }

        if !in_block_sent {
            in_block_sent = true;
            if updates
                .send(StatusUpdate {
                    status: TxStatus::InBlock { block_hash },
                    dispatch_error: None,
                })
                .await
                .is_err()
            {
                return;
            }
        }
    }
}

/// Replay a reverted transaction as a call to recover its revert reason.
async fn revert_info(
    provider: &(dyn Provider + Send + Sync),
    request: TransactionRequest,
    section: &str,
) -> DispatchInfo {
    let name = match provider.call(request).await {
        Err(e) => e
            .as_error_resp()
            .and_then(|resp| resp.as_revert_data())
            .and_then(|data| alloy::sol_types::decode_revert_reason(&data))
            .unwrap_or_else(|| "Reverted".to_string()),
        Ok(_) => "Reverted".to_string(),
    };
    DispatchInfo {
        section: section.to_string(),
        name,
        docs: Vec::new(),
    }
}
