//! Chain-facing types and error definitions.

use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur while talking to the chain.
#[derive(Debug, Error)]
pub enum ChainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Signer material could not be loaded or parsed.
    #[error("Signer error: {0}")]
    Signer(String),

    /// Connected chain does not match configuration.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Contract deployment could not be submitted.
    #[error("Deployment failed: {0}")]
    Deployment(String),

    /// Transaction could not be submitted.
    #[error("Submission failed: {0}")]
    Submission(String),
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Decoded metadata of a chain-level rejection, surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchInfo {
    /// Module or pallet that rejected the transaction.
    pub section: String,
    /// Name of the rejection, e.g. the revert reason.
    pub name: String,
    /// Human-readable documentation lines, if the chain provides any.
    pub docs: Vec<String>,
}

impl fmt::Display for DispatchInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.name)
    }
}

/// Lifecycle position of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// Accepted by the node, not yet included in a block.
    Broadcast,
    /// Included in a block.
    InBlock { block_hash: String },
    /// Irreversibly included.
    Finalized { block_hash: String },
}

/// One event on a submission's status stream.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: TxStatus,
    /// Present when the chain rejected the transaction's business logic.
    pub dispatch_error: Option<DispatchInfo>,
}

/// Handle to a submitted transaction: its hash plus the asynchronous status
/// stream the monitor consumes. Dropping the receiver tears the
/// subscription down.
#[derive(Debug)]
pub struct PendingTx {
    pub tx_hash: String,
    pub updates: mpsc::Receiver<StatusUpdate>,
}

/// A freshly submitted contract deployment.
#[derive(Debug)]
pub struct DeployedContract {
    /// Address the contract will live at once the deployment is included.
    pub address: String,
    pub pending: PendingTx,
}

/// The single terminal result of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// Included cleanly; the anchor is durable.
    Finalized { block_hash: String, tx_hash: String },
    /// The chain rejected the transaction's logic (e.g. a duplicate item).
    DispatchFailed {
        info: DispatchInfo,
        block_hash: String,
        tx_hash: String,
    },
    /// No terminal status arrived within the window. The transaction may
    /// still land on-chain; retries must treat the state as unknown.
    TimedOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_info_display() {
        let info = DispatchInfo {
            section: "nfts".to_string(),
            name: "AlreadyExists".to_string(),
            docs: vec!["The item ID has already been used".to_string()],
        };
        assert_eq!(info.to_string(), "nfts.AlreadyExists");
    }

    #[test]
    fn test_error_display() {
        let err = ChainError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = ChainError::ChainMismatch {
            expected: 420420421,
            actual: 1,
        };
        assert!(err.to_string().contains("420420421"));
    }
}
