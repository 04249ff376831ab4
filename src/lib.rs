//! Proof anchoring pipeline.
//!
//! Anchors off-chain computed proof hashes into external append-only
//! consensus systems and durably records the outcome.
//!
//! # Architecture Overview
//!
//! ```text
//!   block id / proof hash
//!         │
//!         ▼
//!   ┌──────────┐   ┌───────────────────┐   ┌───────────────┐
//!   │ identity │──▶│ anchor::contract  │──▶│ chain::client │──▶ RPC endpoint
//!   │          │   │ anchor::nft       │   │ (collaborator │
//!   └──────────┘   └───────────────────┘   │   boundary)   │
//!                                          └───────┬───────┘
//!                                                  │ status stream
//!                                                  ▼
//!   ┌─────────────────┐                    ┌────────────────┐
//!   │ anchor::receipt │◀───────────────────│ chain::monitor │
//!   │ (one file per   │  TransactionOutcome│ (exactly one   │
//!   │  subject)       │                    │  resolution)   │
//!   └─────────────────┘                    └────────────────┘
//!
//!   Cross-cutting: config (eager, aggregated validation),
//!   contract (source generation + solc collaborator), proof (input files)
//! ```

pub mod anchor;
pub mod chain;
pub mod config;
pub mod contract;
pub mod identity;
pub mod proof;

pub use anchor::pipeline::AnchorPipeline;
pub use anchor::types::{AnchorError, AnchorKind, AnchorReceipt};
pub use chain::types::TransactionOutcome;
pub use config::schema::AnchorConfig;
