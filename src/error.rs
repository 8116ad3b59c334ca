//! # EnOcean Error Handling
//!
//! This module defines the EnOceanError enum, which represents the different error
//! types that can occur in the enocean-rs crate.
//!
//! Channel-level decode problems are not errors: they are carried
//! as [`crate::payload::Validity::Invalid`] on the affected value so sibling
//! channels keep decoding. Only whole-telegram failures surface here.

use crate::eep::EepId;
use thiserror::Error;

/// Represents the different error types that can occur in the EnOcean crate.
#[derive(Debug, Error)]
pub enum EnOceanError {
    /// No profile is registered for the RORG/FUNC/TYPE triplet.
    #[error("EEP profile not found: {0}")]
    ProfileNotFound(EepId),

    /// Two table entries claim the same triplet.
    #[error("Duplicate EEP profile: {0}")]
    DuplicateProfile(EepId),

    /// A profile definition is self-contradictory.
    #[error("Invalid profile {eep}: {reason}")]
    InvalidProfile { eep: String, reason: String },

    /// A channel definition is self-contradictory.
    #[error("Invalid channel {channel} in profile {eep}: {reason}")]
    InvalidChannel {
        eep: String,
        channel: String,
        reason: String,
    },

    /// The profile table document could not be read or understood.
    #[error("Profile table error: {0}")]
    ProfileTable(String),

    /// The profile table declares a schema version this crate cannot read.
    #[error("Unsupported profile table version {found} (supported: {supported})")]
    UnsupportedTableVersion { found: u32, supported: u32 },

    /// Malformed EEP identifier text such as "D2-5O-00".
    #[error("Invalid EEP identifier: {0}")]
    InvalidEepId(String),

    /// Malformed device address text.
    #[error("Invalid device address: {0}")]
    InvalidAddress(String),

    /// The telegram RORG does not match the resolved profile.
    #[error("RORG mismatch: telegram 0x{telegram:02X}, profile {profile}")]
    RorgMismatch { telegram: u8, profile: EepId },

    /// The channel name is not part of the profile.
    #[error("Unknown channel {channel} for profile {eep}")]
    UnknownChannel { eep: EepId, channel: String },

    /// The channel surfaces on a read-only platform.
    #[error("Channel {0} does not accept commands")]
    NotCommandCapable(String),

    /// A command value lies outside the channel's declared domain.
    #[error("Command value for {channel} out of domain: {detail}")]
    CommandOutOfDomain { channel: String, detail: String },

    /// No binding exists for the device address.
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    /// Indicates an error when parsing an ESP3 packet.
    #[error("Error parsing ESP3 packet: {0}")]
    PacketParseError(String),

    /// A packet block is longer than its ESP3 length field can express.
    #[error("ESP3 {block} block too long: {len} bytes")]
    PacketTooLarge { block: &'static str, len: usize },

    /// Indicates a CRC8 mismatch in an ESP3 header or data block.
    #[error("Invalid CRC8: expected 0x{expected:02X}, calculated 0x{calculated:02X}")]
    InvalidCrc { expected: u8, calculated: u8 },

    /// Indicates an invalid hexadecimal string was provided.
    #[error("Invalid hexadecimal string")]
    InvalidHexString,

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Device store could not be read or written.
    #[error("Device store error: {0}")]
    DeviceStore(String),

    /// The gateway service has stopped.
    #[error("Gateway service closed")]
    ServiceClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch‑all error for uncategorized cases.
    #[error("Other error: {0}")]
    Other(String),
}

impl From<crate::util::hex::HexError> for EnOceanError {
    fn from(_: crate::util::hex::HexError) -> Self {
        EnOceanError::InvalidHexString
    }
}
