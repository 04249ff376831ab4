//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, gas limits > 0)
//! - Check addresses and URLs parse before any network call is attempted
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function of the config value
//! - Runs eagerly at process start, before the pipeline is constructed

use alloy::primitives::Address;

use crate::config::schema::AnchorConfig;

/// A single rejected configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate everything both anchor paths need. Collects every error.
pub fn validate_config(config: &AnchorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.chain.rpc_url.is_empty() {
        errors.push(err("chain.rpc_url", "must not be empty"));
    } else if config.chain.rpc_url.parse::<url::Url>().is_err() {
        errors.push(err("chain.rpc_url", "is not a valid URL"));
    }
    if config.chain.chain_id == 0 {
        errors.push(err("chain.chain_id", "must be nonzero"));
    }
    if config.chain.rpc_timeout_secs == 0 {
        errors.push(err("chain.rpc_timeout_secs", "must be greater than zero"));
    }
    if config.chain.finality_timeout_secs == 0 {
        errors.push(err(
            "chain.finality_timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.chain.explorer_base.is_empty() {
        errors.push(err("chain.explorer_base", "must not be empty"));
    }

    if config.signer.owner_address.is_empty() {
        errors.push(err("signer.owner_address", "must be set"));
    } else if config.signer.owner_address.parse::<Address>().is_err() {
        errors.push(err("signer.owner_address", "is not a valid address"));
    }
    if config.signer.seed_env_var.is_empty() {
        errors.push(err("signer.seed_env_var", "must not be empty"));
    }

    if config.contract_anchor.deploy_gas_limit == 0 {
        errors.push(err(
            "contract_anchor.deploy_gas_limit",
            "must be greater than zero",
        ));
    }
    if config.contract_anchor.call_gas_limit == 0 {
        errors.push(err(
            "contract_anchor.call_gas_limit",
            "must be greater than zero",
        ));
    }
    if config.contract_anchor.solc_path.is_empty() {
        errors.push(err("contract_anchor.solc_path", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Extra checks the NFT path needs; the collection is not required for
/// contract-only deployments.
pub fn validate_nft_config(config: &AnchorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.nft_anchor.collection_address.is_empty() {
        errors.push(err("nft_anchor.collection_address", "must be set"));
    } else if config
        .nft_anchor
        .collection_address
        .parse::<Address>()
        .is_err()
    {
        errors.push(err(
            "nft_anchor.collection_address",
            "is not a valid address",
        ));
    }
    if config.nft_anchor.metadata_base_url.is_empty() {
        errors.push(err("nft_anchor.metadata_base_url", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AnchorConfig {
        let mut config = AnchorConfig::default();
        config.signer.owner_address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string();
        config.nft_anchor.collection_address =
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".to_string();
        config.nft_anchor.collection_id = 668;
        config
    }

    #[test]
    fn test_valid_config_passes() {
        let config = valid_config();
        assert!(validate_config(&config).is_ok());
        assert!(validate_nft_config(&config).is_ok());
    }

    #[test]
    fn test_default_config_is_rejected() {
        // The default carries no owner address; that alone must fail.
        let errors = validate_config(&AnchorConfig::default()).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "signer.owner_address"));
    }

    #[test]
    fn test_all_errors_are_collected() {
        let mut config = valid_config();
        config.chain.rpc_url.clear();
        config.chain.finality_timeout_secs = 0;
        config.signer.owner_address = "not-an-address".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_nft_validation_rejects_missing_collection() {
        let mut config = valid_config();
        config.nft_anchor.collection_address.clear();
        let errors = validate_nft_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.field == "nft_anchor.collection_address"));
    }
}
