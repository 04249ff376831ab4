//! NFT metadata files.
//!
//! The metadata file is written before minting so the on-chain metadata URL
//! resolves as soon as the batch lands; after a clean mint it is rewritten
//! with the anchor fields merged in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::anchor::types::{AnchorReceipt, AnchorResult};
use crate::proof::ValidProof;

/// Format tag stamped into every metadata file.
pub const METADATA_FORMAT: &str = "block-proof-v1";

/// Metadata written alongside each NFT anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftMetadata {
    pub name: String,
    pub block_id: String,
    pub proof_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merkle_root: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub network: String,
    pub format: String,
    pub metadata_url: String,
    pub source: String,
}

/// Filename of the metadata file for a block.
pub fn metadata_filename(block_id: &str) -> String {
    format!("nft_block_{block_id}.json")
}

/// Build and persist the pre-mint metadata file. Returns the metadata and
/// the public URL the mint transaction will reference.
pub fn write_metadata(
    metadata_dir: &Path,
    metadata_base_url: &str,
    network_name: &str,
    block_id: &str,
    proof: &ValidProof,
) -> AnchorResult<(NftMetadata, PathBuf)> {
    let filename = metadata_filename(block_id);
    let metadata_url = format!("{}/{}", metadata_base_url.trim_end_matches('/'), filename);

    let metadata = NftMetadata {
        name: format!("Block Anchor: {block_id}"),
        block_id: block_id.to_string(),
        proof_hash: proof.proof_hash.clone(),
        proof_id: proof.proof_id.clone(),
        merkle_root: proof.merkle_root.clone(),
        timestamp: Utc::now(),
        network: network_name.to_string(),
        format: METADATA_FORMAT.to_string(),
        metadata_url,
        source: "proof-anchor".to_string(),
    };

    fs::create_dir_all(metadata_dir)?;
    let path = metadata_dir.join(filename);
    fs::write(&path, serde_json::to_string_pretty(&metadata)?)?;

    tracing::info!(path = %path.display(), url = %metadata.metadata_url, "NFT metadata written");

    Ok((metadata, path))
}

/// Rewrite the metadata file with the anchor result merged in.
pub fn finalize_metadata(
    path: &Path,
    metadata: &NftMetadata,
    receipt: &AnchorReceipt,
) -> AnchorResult<()> {
    let mut merged = serde_json::to_value(metadata)?;
    if let Some(object) = merged.as_object_mut() {
        object.insert("item_id".to_string(), receipt.item_id.into());
        if let Some(nft_id) = &receipt.nft_id {
            object.insert("nft_id".to_string(), nft_id.clone().into());
        }
        object.insert("owner".to_string(), receipt.owner.clone().into());
        object.insert("anchor_tx_hash".to_string(), receipt.tx_hash.clone().into());
        object.insert(
            "anchored_at_block".to_string(),
            receipt.block_hash.clone().into(),
        );
        object.insert(
            "explorer_url".to_string(),
            receipt.explorer_url.clone().into(),
        );
    }
    fs::write(path, serde_json::to_string_pretty(&merged)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proof() -> ValidProof {
        ValidProof {
            proof_hash: "0xabcd".to_string(),
            merkle_root: Some("0xroot".to_string()),
            proof_id: None,
        }
    }

    #[test]
    fn test_write_metadata_builds_url_from_base() {
        let dir = tempfile::tempdir().unwrap();
        let (metadata, path) = write_metadata(
            dir.path(),
            "http://localhost:3005/nftblock/",
            "Westend Asset Hub",
            "b1",
            &proof(),
        )
        .unwrap();

        assert_eq!(
            metadata.metadata_url,
            "http://localhost:3005/nftblock/nft_block_b1.json"
        );
        assert!(path.exists());

        let stored: NftMetadata =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored.format, METADATA_FORMAT);
        assert_eq!(stored.proof_hash, "0xabcd");
        // proof_id is absent, not null.
        assert!(!fs::read_to_string(&path).unwrap().contains("proof_id"));
    }
}
