//! Signer loading and owner verification.
//!
//! # Security
//! - Seed material is loaded ONLY from an environment variable
//! - Seeds and private keys are never logged or serialized
//! - The derived address must match the configured owner before any
//!   transaction is built

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use alloy::signers::Signer;

use crate::chain::types::{ChainError, ChainResult};

/// Default environment variable holding the wallet seed.
pub const WALLET_SEED_ENV_VAR: &str = "ANCHOR_WALLET_SEED";

/// Signing identity for anchor transactions.
#[derive(Debug, Clone)]
pub struct AnchorSigner {
    signer: PrivateKeySigner,
    chain_id: u64,
}

impl AnchorSigner {
    /// Create a signer from seed material: a BIP-39 mnemonic phrase or a
    /// hex-encoded private key (with or without `0x` prefix).
    pub fn from_seed(seed: &str, chain_id: u64) -> ChainResult<Self> {
        let seed = seed.trim();

        let signer: PrivateKeySigner = if seed.contains(' ') {
            MnemonicBuilder::<English>::default()
                .phrase(seed)
                .build()
                .map_err(|e| ChainError::Signer(format!("Invalid mnemonic phrase: {e}")))?
        } else {
            seed.strip_prefix("0x")
                .unwrap_or(seed)
                .parse()
                .map_err(|e| ChainError::Signer(format!("Invalid private key format: {e}")))?
        };
        let signer = signer.with_chain_id(Some(chain_id));

        tracing::info!(
            address = %signer.address(),
            chain_id = chain_id,
            "Signer initialized"
        );

        Ok(Self { signer, chain_id })
    }

    /// Load the signer from an environment variable.
    pub fn from_env(env_var: &str, chain_id: u64) -> ChainResult<Self> {
        let seed = std::env::var(env_var)
            .map_err(|_| ChainError::Signer(format!("Environment variable {env_var} not set")))?;
        Self::from_seed(&seed, chain_id)
    }

    /// The address derived from the seed.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// The chain ID this signer is configured for.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The wallet used to sign outgoing transactions.
    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}
