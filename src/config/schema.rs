//! Configuration schema definitions.
//!
//! The complete configuration for the anchor pipeline, constructed once at
//! process start and passed by reference into every component. All types
//! derive Serde traits for deserialization from a TOML file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the anchor pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AnchorConfig {
    /// Chain endpoint and finality settings.
    pub chain: ChainConfig,

    /// Signing wallet and expected owner.
    pub signer: SignerConfig,

    /// Contract anchor path settings.
    pub contract_anchor: ContractAnchorConfig,

    /// NFT anchor path settings.
    pub nft_anchor: NftAnchorConfig,

    /// Input/output directories.
    pub storage: StorageConfig,
}

/// Chain endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// RPC endpoint URL. Exactly one connect/disconnect cycle per
    /// invocation.
    pub rpc_url: String,

    /// Expected chain ID.
    pub chain_id: u64,

    /// Per-request RPC timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Block depth at which a transaction counts as final.
    pub confirmation_blocks: u32,

    /// Window within which a submission must reach a terminal status.
    pub finality_timeout_secs: u64,

    /// Public block explorer base URL for receipt links.
    pub explorer_base: String,

    /// Human-readable network name recorded in metadata files.
    pub network_name: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://westend-asset-hub-eth-rpc.polkadot.io".to_string(),
            chain_id: 420420421,
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            finality_timeout_secs: 60,
            explorer_base: "https://westend.subscan.io".to_string(),
            network_name: "Westend Asset Hub".to_string(),
        }
    }
}

/// Signing wallet configuration. The seed itself lives in the environment,
/// never in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Address the seed must derive to; a mismatch aborts before any
    /// transaction is built.
    pub owner_address: String,

    /// Environment variable holding the wallet seed (mnemonic or hex key).
    pub seed_env_var: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            owner_address: String::new(),
            seed_env_var: crate::chain::signer::WALLET_SEED_ENV_VAR.to_string(),
        }
    }
}

/// Contract anchor path configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractAnchorConfig {
    /// Fixed gas limit for contract deployment. A generous upper bound,
    /// not computed dynamically.
    pub deploy_gas_limit: u64,

    /// Fixed gas limit for the `addMerkleRoot` call.
    pub call_gas_limit: u64,

    /// Directory for generated source, ABI and bytecode artifacts.
    pub artifacts_dir: PathBuf,

    /// Path to the `solc` binary.
    pub solc_path: String,
}

impl Default for ContractAnchorConfig {
    fn default() -> Self {
        Self {
            deploy_gas_limit: 2_000_000,
            call_gas_limit: 500_000,
            artifacts_dir: PathBuf::from("contracts"),
            solc_path: "solc".to_string(),
        }
    }
}

/// NFT anchor path configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NftAnchorConfig {
    /// Address of the long-lived shared collection contract.
    pub collection_address: String,

    /// Numeric collection id embedded in `nft_id` and explorer URLs.
    pub collection_id: u64,

    /// Directory NFT metadata files are written to.
    pub metadata_dir: PathBuf,

    /// Public base URL under which the metadata directory is served.
    pub metadata_base_url: String,
}

impl Default for NftAnchorConfig {
    fn default() -> Self {
        Self {
            collection_address: String::new(),
            collection_id: 0,
            metadata_dir: PathBuf::from("datain/nftblock"),
            metadata_base_url: "http://localhost:3005/datain/nftblock".to_string(),
        }
    }
}

/// Input and output directories.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory block proof files are read from.
    pub proofs_dir: PathBuf,

    /// Directory anchor receipts are written to.
    pub receipts_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            proofs_dir: PathBuf::from("proofs/blocks"),
            receipts_dir: PathBuf::from("datain/blocks"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnchorConfig::default();
        assert_eq!(config.chain.finality_timeout_secs, 60);
        assert_eq!(config.contract_anchor.deploy_gas_limit, 2_000_000);
        assert_eq!(config.contract_anchor.call_gas_limit, 500_000);
        assert!(config.signer.owner_address.is_empty());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
            [chain]
            rpc_url = "http://localhost:8545"
            finality_timeout_secs = 5

            [signer]
            owner_address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        "#;
        let config: AnchorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.chain.rpc_url, "http://localhost:8545");
        assert_eq!(config.chain.finality_timeout_secs, 5);
        // Unset sections fall back to defaults.
        assert_eq!(config.contract_anchor.solc_path, "solc");
    }
}
