//! Deterministic identity derivation for anchor subjects.
//!
//! # Responsibilities
//! - Derive a 32-bit item id from an opaque subject identifier
//! - Normalize proof hashes into a canonical 32-byte representation
//!
//! Both functions are pure and total: the same input always yields the same
//! output, across processes and across the contract and NFT anchor paths.
//! Malformed input never errors; it is padded or truncated as documented.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A proof hash normalized to exactly 32 bytes, rendered as `0x` followed by
/// 64 hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalHash(String);

impl CanonicalHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize an arbitrary proof hash string into a [`CanonicalHash`].
///
/// A value that is already `0x`-prefixed and 66 characters long passes
/// through unchanged. Anything else is stripped of any `0x` prefix,
/// left-padded with zeros to 64 characters and truncated to the first 64.
/// This never fails on malformed input.
pub fn canonicalize(value: &str) -> CanonicalHash {
    if value.starts_with("0x") && value.len() == 66 {
        return CanonicalHash(value.to_string());
    }
    let clean = value.strip_prefix("0x").unwrap_or(value);
    let padded: String = format!("{clean:0>64}").chars().take(64).collect();
    CanonicalHash(format!("0x{padded}"))
}

/// Derive the on-chain item id for a subject identifier.
///
/// The first 4 bytes (8 hex characters) of the subject's hex form are read
/// as a big-endian integer. Subjects that are already hex strings are used
/// as-is; anything else is hex-encoded from its UTF-8 bytes first. Shorter
/// inputs are right-padded with zero digits.
pub fn derive_item_id(subject: &str) -> u32 {
    let hex_form = subject_hex_form(subject);
    let mut first8: String = hex_form.chars().take(8).collect();
    while first8.len() < 8 {
        first8.push('0');
    }
    // first8 only ever contains hex digits, so the parse cannot fail.
    u32::from_str_radix(&first8, 16).unwrap_or(0)
}

fn subject_hex_form(subject: &str) -> String {
    let stripped = subject.strip_prefix("0x").unwrap_or(subject);
    if !stripped.is_empty() && stripped.bytes().all(|b| b.is_ascii_hexdigit()) {
        stripped.to_ascii_lowercase()
    } else {
        alloy::hex::encode(subject.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str =
        "0x123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef0";

    #[test]
    fn test_canonicalize_passthrough() {
        let hash = canonicalize(WELL_FORMED);
        assert_eq!(hash.as_str(), WELL_FORMED);
    }

    #[test]
    fn test_canonicalize_pads_short_input() {
        let hash = canonicalize("abc");
        assert_eq!(hash.as_str().len(), 66);
        assert!(hash.as_str().starts_with("0x"));
        assert!(hash.as_str().ends_with("abc"));
        assert_eq!(&hash.as_str()[2..5], "000");
    }

    #[test]
    fn test_canonicalize_truncates_long_input() {
        let long = "f".repeat(100);
        let hash = canonicalize(&long);
        assert_eq!(hash.as_str(), format!("0x{}", "f".repeat(64)));
    }

    #[test]
    fn test_canonicalize_strips_prefix_before_padding() {
        let hash = canonicalize("0xabc");
        assert!(hash.as_str().ends_with("abc"));
        assert_eq!(hash.as_str().len(), 66);
    }

    #[test]
    fn test_canonicalize_total_on_garbage() {
        // Documented behavior: malformed input is padded, never rejected.
        let hash = canonicalize("not hex at all");
        assert_eq!(hash.as_str().len(), 66);
    }

    #[test]
    fn test_item_id_from_textual_subject() {
        // "block_1" hex-encodes to 626c6f636b5f31; first 4 bytes are "bloc".
        assert_eq!(derive_item_id("block_1"), 0x626c6f63);
    }

    #[test]
    fn test_item_id_from_hex_subject() {
        assert_eq!(derive_item_id("deadbeefcafe"), 0xdeadbeef);
        assert_eq!(derive_item_id("0xdeadbeefcafe"), 0xdeadbeef);
    }

    #[test]
    fn test_item_id_pads_short_subjects() {
        // "ab" is hex, padded to "ab000000".
        assert_eq!(derive_item_id("ab"), 0xab000000);
    }

    #[test]
    fn test_item_id_deterministic() {
        for subject in ["block_1", "block_42", "0x1234abcd", "", "x"] {
            assert_eq!(derive_item_id(subject), derive_item_id(subject));
        }
    }
}
