//! # Utility Modules
//!
//! Common helpers used throughout the enocean-rs crate: MSB-first bit field
//! access, hex encoding/decoding and log-spam control.

pub mod bits;
pub mod hex;
pub mod logging;

pub use bits::{extract_bits, insert_bits, max_raw};
pub use hex::{decode_hex, format_device_id_hex, format_hex_compact};
pub use logging::{log_telegram_hex, LogThrottle, WarnOnce};
