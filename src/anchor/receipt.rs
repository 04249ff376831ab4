//! Receipt persistence.
//!
//! One receipt file per subject, named after the subject id. Writing is
//! always last-write-wins at the storage layer; the pipeline never reads
//! before writing, so concurrent attempts for the same subject race on the
//! same path (the chain-side guard is the true arbiter, see the pipeline's
//! keyed lock).

use std::fs;
use std::path::{Path, PathBuf};

use crate::anchor::types::{AnchorReceipt, AnchorResult};

/// Path of the receipt file for a subject.
pub fn receipt_path(receipts_dir: &Path, subject_id: &str) -> PathBuf {
    receipts_dir.join(format!("block_{subject_id}_anchor.json"))
}

/// Write the receipt, overwriting any previous attempt for the subject.
pub fn persist_receipt(receipts_dir: &Path, receipt: &AnchorReceipt) -> AnchorResult<PathBuf> {
    fs::create_dir_all(receipts_dir)?;
    let path = receipt_path(receipts_dir, &receipt.subject_id);
    let body = serde_json::to_string_pretty(receipt)?;
    fs::write(&path, body)?;

    tracing::info!(
        subject_id = %receipt.subject_id,
        path = %path.display(),
        error = receipt.error.as_deref().unwrap_or(""),
        "Anchor receipt written"
    );

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::types::AnchorKind;
    use crate::identity::canonicalize;
    use chrono::Utc;

    fn receipt(subject: &str, error: Option<&str>) -> AnchorReceipt {
        AnchorReceipt {
            subject_id: subject.to_string(),
            item_id: 1,
            canonical_hash: canonicalize("0xab"),
            kind: AnchorKind::Nft,
            tx_hash: "0xtx".to_string(),
            block_hash: "0xblock".to_string(),
            contract_address: None,
            nft_id: Some("668-1".to_string()),
            owner: "0xowner".to_string(),
            timestamp: Utc::now(),
            explorer_url: "https://explorer/nft/668/1".to_string(),
            error: error.map(String::from),
            timed_out: false,
        }
    }

    #[test]
    fn test_filename_embeds_subject() {
        let dir = tempfile::tempdir().unwrap();
        let path = persist_receipt(dir.path(), &receipt("block_9", None)).unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains("block_9"));
    }

    #[test]
    fn test_overwrite_is_idempotent_per_subject() {
        let dir = tempfile::tempdir().unwrap();
        let first = persist_receipt(dir.path(), &receipt("b", None)).unwrap();
        let second =
            persist_receipt(dir.path(), &receipt("b", Some("nfts.AlreadyExists"))).unwrap();
        assert_eq!(first, second);

        // Last write wins.
        let stored: AnchorReceipt =
            serde_json::from_str(&fs::read_to_string(&second).unwrap()).unwrap();
        assert_eq!(stored.error.as_deref(), Some("nfts.AlreadyExists"));

        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }
}
