//! Anchor pipeline types and error taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::chain::types::ChainError;
use crate::config::loader::ConfigError;
use crate::identity::CanonicalHash;

/// Fatal pipeline errors. Everything here prevents a well-formed
/// transaction from being submitted and aborts the invocation without
/// writing a receipt. Chain-level rejections and timeouts after submission
/// are not errors; they resolve into a receipt instead.
#[derive(Debug, Error)]
pub enum AnchorError {
    /// Missing or invalid configuration, aborts before any network call.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The request itself is unusable (empty block id or proof hash).
    #[error("Invalid anchor request: {0}")]
    InvalidRequest(String),

    /// Block proof file does not exist.
    #[error("Block proof not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Block proof file exists but is unusable.
    #[error("Malformed proof file {path}: {reason}")]
    MalformedProof { path: PathBuf, reason: String },

    /// The compiler reported no bytecode for the expected contract.
    #[error("Solidity compilation failed: {0}")]
    Compilation(String),

    /// Seed-derived address does not match the configured owner.
    #[error("Wallet mismatch: expected {expected}, derived {derived}")]
    AddressMismatch { expected: String, derived: String },

    /// Transport-level chain failure before or during submission.
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for pipeline operations.
pub type AnchorResult<T> = Result<T, AnchorError>;

/// Which submission shape produced a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorKind {
    /// Per-request contract deployment plus an item-scoped setter call.
    Contract,
    /// Atomic mint + set-metadata batch against the shared collection.
    Nft,
}

/// The durable record of one anchor attempt, written only after a terminal
/// transaction outcome. One file per subject; last write wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorReceipt {
    pub subject_id: String,
    pub item_id: u32,
    pub canonical_hash: CanonicalHash,
    pub kind: AnchorKind,
    pub tx_hash: String,
    pub block_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nft_id: Option<String>,
    pub owner: String,
    pub timestamp: DateTime<Utc>,
    pub explorer_url: String,
    /// Present when the chain rejected the transaction; the attempt is
    /// still recorded for auditability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Distinguishes timeouts from dispatch failures: a timeout does not
    /// imply the transaction failed on-chain, so retries are safe.
    #[serde(default)]
    pub timed_out: bool,
}

impl AnchorReceipt {
    /// True when the anchor landed cleanly.
    pub fn is_final(&self) -> bool {
        self.error.is_none() && !self.timed_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::canonicalize;

    #[test]
    fn test_receipt_round_trips_optional_fields() {
        let receipt = AnchorReceipt {
            subject_id: "block_1".to_string(),
            item_id: 7,
            canonical_hash: canonicalize("0xab"),
            kind: AnchorKind::Contract,
            tx_hash: "0xtx".to_string(),
            block_hash: "0xblock".to_string(),
            contract_address: Some("0xcontract".to_string()),
            nft_id: None,
            owner: "0xowner".to_string(),
            timestamp: Utc::now(),
            explorer_url: "https://explorer/extrinsic/0xtx".to_string(),
            error: None,
            timed_out: false,
        };

        let json = serde_json::to_string(&receipt).unwrap();
        assert!(!json.contains("nft_id"));
        let back: AnchorReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(back.subject_id, "block_1");
        assert!(back.is_final());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&AnchorKind::Nft).unwrap(), "\"nft\"");
        assert_eq!(
            serde_json::to_string(&AnchorKind::Contract).unwrap(),
            "\"contract\""
        );
    }
}
