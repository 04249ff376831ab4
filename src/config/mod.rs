//! Configuration subsystem: schema, loading, validation.
//!
//! The configuration value object is built once at process start; every
//! required field is validated eagerly and all failures are reported in one
//! aggregated error.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AnchorConfig;
pub use validation::{validate_config, validate_nft_config, ValidationError};
