//! Block proof input files.
//!
//! The ledger-block builder (an external collaborator) writes one JSON
//! proof file per block. This module reads and validates that file; a
//! missing file or a missing `proofHash` is fatal before any chain
//! interaction is attempted.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::anchor::types::{AnchorError, AnchorResult};

/// Raw proof file shape as written by the proof generator. Read-only input;
/// the pipeline never mutates it.
#[derive(Debug, Clone, Deserialize)]
pub struct ProofRecord {
    #[serde(rename = "proofHash")]
    pub proof_hash: Option<String>,
    #[serde(rename = "merkleRoot")]
    pub merkle_root: Option<String>,
    #[serde(rename = "proofID")]
    pub proof_id: Option<String>,
    #[serde(default)]
    pub leaves: Option<ProofLeaves>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProofLeaves {
    pub block_id: Option<String>,
}

/// A proof record that passed validation.
#[derive(Debug, Clone)]
pub struct ValidProof {
    pub proof_hash: String,
    pub merkle_root: Option<String>,
    pub proof_id: Option<String>,
}

/// Path of the proof file for a block.
pub fn proof_path(proofs_dir: &Path, block_id: &str) -> PathBuf {
    proofs_dir.join(format!("block_{block_id}_proof.json"))
}

/// Read and validate the proof file for `block_id`.
pub fn load_proof(proofs_dir: &Path, block_id: &str) -> AnchorResult<ValidProof> {
    let path = proof_path(proofs_dir, block_id);
    if !path.exists() {
        return Err(AnchorError::InputNotFound { path });
    }

    let content = std::fs::read_to_string(&path)?;
    let record: ProofRecord =
        serde_json::from_str(&content).map_err(|e| AnchorError::MalformedProof {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    let proof_hash = match record.proof_hash {
        Some(h) if !h.is_empty() => h,
        _ => {
            return Err(AnchorError::MalformedProof {
                path,
                reason: "missing proofHash".to_string(),
            })
        }
    };

    // A proof written for a different block is a wiring mistake upstream.
    if let Some(leaf_block) = record.leaves.as_ref().and_then(|l| l.block_id.as_deref()) {
        if leaf_block != block_id {
            return Err(AnchorError::MalformedProof {
                path,
                reason: format!("proof belongs to block {leaf_block}, not {block_id}"),
            });
        }
    }

    tracing::debug!(block_id = block_id, path = %path.display(), "Block proof loaded");

    Ok(ValidProof {
        proof_hash,
        merkle_root: record.merkle_root,
        proof_id: record.proof_id,
    })
}
