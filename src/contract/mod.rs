//! Contract generation and compilation.
//!
//! Source generation is a pure function of the proof hash; compilation and
//! deployment stay behind narrow collaborator boundaries so alternate
//! chains or mock compilers can be substituted in tests.

pub mod compiler;
pub mod source;

pub use compiler::{CompiledContract, ContractCompiler, SolcCompiler};
pub use source::{merkle_root_contract_source, CONTRACT_NAME};
