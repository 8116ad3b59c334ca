//! # enocean-rs - EnOcean Equipment Profile decoding for Home Assistant
//!
//! The enocean-rs crate turns EnOcean radio telegrams into typed values and
//! routes them to Home Assistant style entities. Profiles (EEPs) are data,
//! not code: a versioned YAML table describes every channel's bit position,
//! scaling and entity metadata, and one generic decoder handles them all.
//!
//! ## Features
//!
//! - Parse ESP3 serial frames and RADIO_ERP1 packets into telegrams
//! - Decode any tabled EEP into per-channel values with independent validity
//! - Encode commands for actuator channels back into telegram payloads
//! - Derive entity platforms, units and device classes from the table
//! - Teach-in (UTE, 4BS, 1BS) while learning mode is active
//! - Availability tracking, RSSI reporting and a persistent device store
//! - A tokio service wrapping the gateway behind a cloneable handle
//!
//! ## Usage
//!
//! ```rust
//! use enocean_rs::{decode_telegram, DeviceAddress, EepId, Telegram};
//!
//! let sender = DeviceAddress([0x01, 0x82, 0x5D, 0xAB]);
//! let telegram = Telegram::new(0xD2, vec![0x40, 0x7D, 0x40, 0x00], sender);
//! let values = decode_telegram(&telegram, &"D2-50-00".parse::<EepId>().unwrap()).unwrap();
//! assert_eq!(values[1].channel, "fan_speed");
//! assert!(values.iter().all(|v| v.is_valid()));
//! ```

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod eep;
pub mod error;
pub mod esp3;
pub mod gateway;
pub mod logging;
pub mod payload;
pub mod service;
pub mod store;
pub mod telegram;
pub mod util;

pub use crate::error::EnOceanError;
pub use crate::logging::{init_logger, init_logger_with_default, log_info};

// Profiles
pub use eep::{
    ChannelSpec, EepId, EntityCategory, EntityMeta, NumericScale, PlatformKind, ProfileDescriptor,
    ProfileRegistry, RegistryBuilder, StateClass, ValueKind,
};

// Telegrams and framing
pub use esp3::{build_packet, decode_packet, Esp3Decoder, Esp3Packet, PacketType};
pub use telegram::{DeviceAddress, TeachIn, TeachInKind, Telegram};

// Decoding and dispatch
pub use dispatch::{
    Availability, DeviceBinding, EntityDescriptor, EntitySink, LogSink, RecordingSink, SinkEvent,
};
pub use payload::{ChannelValue, CommandValue, DecodedValue, InvalidReason, Validity};

// Runtime
pub use config::GatewayConfig;
pub use gateway::{Gateway, IgnoreReason, TelegramOutcome};
pub use service::{ChannelSink, DeviceStatus, GatewayEvent, GatewayHandle, GatewayService};
pub use store::StoredDevice;

/// Decode a telegram against the bundled profile catalogue.
///
/// # Arguments
/// * `telegram` - Received telegram
/// * `eep` - Profile the sender is bound to
///
/// # Returns
/// * `Ok(Vec<DecodedValue>)` - One value per profile channel, in table order
/// * `Err(EnOceanError)` - Unknown profile or RORG mismatch
pub fn decode_telegram(telegram: &Telegram, eep: &EepId) -> Result<Vec<DecodedValue>, EnOceanError> {
    let registry = ProfileRegistry::builtin()?;
    payload::decode_with_registry(telegram, eep, &registry)
}

/// Encode a command payload against the bundled profile catalogue.
///
/// # Arguments
/// * `eep` - Target device profile
/// * `channel` - Command-capable channel name
/// * `value` - Value in physical units, an enum symbol or a boolean
///
/// # Returns
/// * `Ok(Vec<u8>)` - User data of the profile's length
/// * `Err(EnOceanError)` - Unknown profile or channel, or value out of domain
pub fn encode_command(eep: &EepId, channel: &str, value: &CommandValue) -> Result<Vec<u8>, EnOceanError> {
    let registry = ProfileRegistry::builtin()?;
    payload::encode_command_payload(registry.lookup(eep)?, channel, value)
}
