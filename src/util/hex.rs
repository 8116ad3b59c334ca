//! # Hex Encoding/Decoding Utilities
//!
//! Hex helpers used for telegram payloads on the command line, in test
//! vectors and in log output, plus the two textual forms of a device
//! address used for display (`01:a2:b3:c4`) and entity ids (`01_a2_b3_c4`).
//!
//! ## Usage
//!
//! ```rust
//! use enocean_rs::util::hex::{decode_hex, format_hex_compact};
//!
//! let data = [0x55, 0x00, 0x07, 0x07];
//! assert_eq!(decode_hex("55 00 07 07").unwrap(), data);
//! assert_eq!(format_hex_compact(&data), "55 00 07 07");
//! ```

use thiserror::Error;

/// Errors that can occur during hex operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Decode hex string to bytes
///
/// Accepts both uppercase and lowercase hex characters. Whitespace and the
/// common byte separators `:` and `-` are stripped, as is a leading `0x`.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, HexError> {
    let trimmed = hex_str.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();

    if cleaned.is_empty() {
        return Err(HexError::EmptyString);
    }

    if cleaned.len() % 2 != 0 {
        return Err(HexError::OddLength(cleaned.len()));
    }

    hex::decode(&cleaned).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Format bytes as space-separated uppercase pairs for log lines
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Colon-separated lowercase form, e.g. `01:a2:b3:c4`
pub fn format_device_id_hex(id: &[u8]) -> String {
    id.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Underscore-separated lowercase form used in entity unique ids
pub fn format_device_id_hex_underscore(id: &[u8]) -> String {
    id.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join("_")
}
