//! Anchoring subsystem.
//!
//! # Data Flow
//! ```text
//! subject id / proof hash
//!     → identity (item id, canonical hash)
//!     → contract.rs | nft.rs (build + submit)
//!     → chain::monitor (single terminal outcome)
//!     → receipt.rs (one file per subject, last write wins)
//! ```

pub mod contract;
pub mod metadata;
pub mod nft;
pub mod pipeline;
pub mod receipt;
pub mod types;

pub use pipeline::{AnchorPipeline, ChainConnector};
pub use types::{AnchorError, AnchorKind, AnchorReceipt, AnchorResult};
