//! Chain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment variable (wallet seed)
//!     → signer.rs (seed loading, owner address derivation)
//!     → client.rs (RPC connection, submission, status streams)
//!     → monitor.rs (single terminal outcome per submission)
//! ```
//!
//! # Constraints
//! - Seed material only from environment variables, never logged
//! - One connect/disconnect cycle per pipeline invocation
//! - Every submission resolves to exactly one [`types::TransactionOutcome`]

pub mod client;
pub mod monitor;
pub mod signer;
pub mod types;

pub use client::{ChainClient, RpcChainClient};
pub use signer::AnchorSigner;
pub use types::{ChainError, DispatchInfo, PendingTx, TransactionOutcome};
