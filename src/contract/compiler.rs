//! External Solidity compiler collaborator.
//!
//! The pipeline consumes the compiler as a black box behind
//! [`ContractCompiler`], so tests can substitute a fake. The production
//! implementation shells out to `solc --standard-json`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::Write;
use std::process::{Command, Stdio};

use crate::anchor::types::AnchorError;

/// Output of a successful compilation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledContract {
    pub abi: Value,
    /// Hex-encoded deployment bytecode (no `0x` prefix from solc, but one
    /// is tolerated).
    pub bytecode: String,
}

impl CompiledContract {
    /// Decode the bytecode hex into raw bytes.
    pub fn bytecode_bytes(&self) -> Result<Vec<u8>, String> {
        let hex = self.bytecode.trim_start_matches("0x");
        alloy::hex::decode(hex).map_err(|e| format!("Invalid bytecode hex: {e}"))
    }
}

/// Collaborator boundary in front of the compiler.
pub trait ContractCompiler: Send + Sync {
    /// Compile `source` and return the artifact for `contract_name`.
    /// Reporting no bytecode for that name is a compilation error.
    fn compile(&self, source: &str, contract_name: &str) -> Result<CompiledContract, AnchorError>;
}

/// Production compiler invoking the `solc` binary.
#[derive(Debug, Clone)]
pub struct SolcCompiler {
    solc_path: String,
}

impl SolcCompiler {
    pub fn new(solc_path: impl Into<String>) -> Self {
        Self {
            solc_path: solc_path.into(),
        }
    }
}

/// Build the standard-JSON compiler input for a single source file.
fn standard_json_input(file_name: &str, source: &str) -> Value {
    let mut sources = serde_json::Map::new();
    sources.insert(file_name.to_string(), json!({ "content": source }));
    json!({
        "language": "Solidity",
        "sources": sources,
        "settings": {
            "outputSelection": { "*": { "*": ["abi", "evm.bytecode"] } }
        }
    })
}

impl ContractCompiler for SolcCompiler {
    fn compile(&self, source: &str, contract_name: &str) -> Result<CompiledContract, AnchorError> {
        let file_name = format!("{contract_name}.sol");
        let input = standard_json_input(&file_name, source);

        let mut child = Command::new(&self.solc_path)
            .arg("--standard-json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                AnchorError::Compilation(format!("Failed to launch {}: {e}", self.solc_path))
            })?;

        if let Some(stdin) = child.stdin.take() {
            let mut stdin = stdin;
            stdin
                .write_all(input.to_string().as_bytes())
                .map_err(|e| AnchorError::Compilation(format!("Failed to feed solc: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| AnchorError::Compilation(format!("solc did not run: {e}")))?;

        let parsed: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| AnchorError::Compilation(format!("Unreadable solc output: {e}")))?;

        let contract = parsed
            .get("contracts")
            .and_then(|c| c.get(&file_name))
            .and_then(|c| c.get(contract_name));

        let Some(contract) = contract else {
            let errors = parsed
                .get("errors")
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(AnchorError::Compilation(format!(
                "No output for contract {contract_name}: {errors}"
            )));
        };

        let abi = contract.get("abi").cloned().unwrap_or(Value::Null);
        let bytecode = contract
            .get("evm")
            .and_then(|e| e.get("bytecode"))
            .and_then(|b| b.get("object"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        if bytecode.is_empty() || bytecode == "0x" {
            return Err(AnchorError::Compilation(format!(
                "Bytecode is empty for contract {contract_name}"
            )));
        }

        tracing::info!(
            contract = contract_name,
            bytecode_len = bytecode.len(),
            "Contract compiled"
        );

        Ok(CompiledContract { abi, bytecode })
    }
}
