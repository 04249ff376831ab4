//! Solidity source generation for the per-anchor root contract.

/// Name of the generated contract; the compiler output is looked up under
/// this name.
pub const CONTRACT_NAME: &str = "MerkleRootStatic";

/// Produce the source of a minimal contract with the proof hash baked into
/// its constructor as a fixed, content-addressed root. Pure: the same proof
/// hash always yields the same source, so every deployed instance is
/// re-verifiable from the saved artifacts.
///
/// The `addMerkleRoot` setter rejects a second write for the same item id;
/// that on-chain check is the idempotency guard for the contract path.
pub fn merkle_root_contract_source(proof_hash: &str) -> String {
    format!(
        r#"// SPDX-License-Identifier: MIT
pragma solidity 0.8.28;

contract {CONTRACT_NAME} {{
    bytes32 public predefinedMerkleRoot;
    mapping(uint256 => bytes32) private _roots;

    event MerkleRootAdded(uint256 indexed itemId, bytes32 indexed root);

    constructor() {{
        predefinedMerkleRoot = keccak256(abi.encodePacked("{proof_hash}"));
    }}

    function addMerkleRoot(uint256 itemId, bytes32 root) external {{
        require(_roots[itemId] == bytes32(0), "Already set");
        _roots[itemId] = root;
        emit MerkleRootAdded(itemId, root);
    }}

    function getMerkleRoot(uint256 itemId) external view returns (bytes32) {{
        return _roots[itemId];
    }}
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_embeds_proof_hash() {
        let source = merkle_root_contract_source("0x1234abcd");
        assert!(source.contains(r#"abi.encodePacked("0x1234abcd")"#));
        assert!(source.contains("contract MerkleRootStatic"));
    }

    #[test]
    fn test_source_carries_duplicate_guard() {
        let source = merkle_root_contract_source("0xff");
        assert!(source.contains(r#"require(_roots[itemId] == bytes32(0), "Already set")"#));
    }

    #[test]
    fn test_source_is_deterministic() {
        assert_eq!(
            merkle_root_contract_source("0xab"),
            merkle_root_contract_source("0xab")
        );
    }
}
