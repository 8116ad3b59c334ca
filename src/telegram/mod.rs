//! # Radio Telegrams
//!
//! Transport-neutral form of one ERP1 radio telegram: RORG, user data,
//! sender, optional destination and signal strength. The ESP3 layer produces
//! these from serial frames and the dispatcher produces them for commands.

pub mod teach_in;

pub use teach_in::{is_learn_telegram, parse_teach_in, TeachIn, TeachInKind};

use crate::constants::BROADCAST_ADDRESS;
use crate::error::EnOceanError;
use crate::util::hex::{decode_hex, format_device_id_hex, format_device_id_hex_underscore};
use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 32-bit EnOcean chip or base ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceAddress(pub [u8; 4]);

impl DeviceAddress {
    pub const BROADCAST: DeviceAddress = DeviceAddress(BROADCAST_ADDRESS);

    pub fn from_u32(value: u32) -> Self {
        DeviceAddress(value.to_be_bytes())
    }

    pub fn as_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// `aa_bb_cc_dd`, used as a unique-id prefix.
    pub fn to_underscore(&self) -> String {
        format_device_id_hex_underscore(&self.0)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_device_id_hex(&self.0))
    }
}

impl FromStr for DeviceAddress {
    type Err = EnOceanError;

    /// Accepts `01:80:12:34`, `01-80-12-34`, `01801234` and `0x01801234`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(s).map_err(|_| EnOceanError::InvalidAddress(s.to_string()))?;
        let bytes: [u8; 4] = bytes
            .try_into()
            .map_err(|_| EnOceanError::InvalidAddress(s.to_string()))?;
        Ok(DeviceAddress(bytes))
    }
}

impl Serialize for DeviceAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DeviceAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

bitflags! {
    /// ERP1 status byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u8 {
        /// RPS: PTM type 2 module
        const T21 = 0x20;
        /// RPS: N-message (normal) vs U-message (unassigned)
        const NU = 0x10;
        /// Repeater hop count, bits 3..0
        const REPEATER_COUNT = 0x0F;
    }
}

impl StatusFlags {
    pub fn repeater_count(self) -> u8 {
        (self & StatusFlags::REPEATER_COUNT).bits()
    }
}

/// One radio telegram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telegram {
    pub rorg: u8,
    /// User data after the RORG byte
    pub payload: Vec<u8>,
    pub sender: DeviceAddress,
    pub destination: Option<DeviceAddress>,
    pub status: u8,
    /// Received signal strength; absent for locally built telegrams
    pub dbm: Option<i8>,
}

impl Telegram {
    pub fn new(rorg: u8, payload: Vec<u8>, sender: DeviceAddress) -> Self {
        Self {
            rorg,
            payload,
            sender,
            destination: None,
            status: 0,
            dbm: None,
        }
    }

    pub fn with_destination(mut self, destination: DeviceAddress) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_status(mut self, status: u8) -> Self {
        self.status = status;
        self
    }

    pub fn with_dbm(mut self, dbm: i8) -> Self {
        self.dbm = Some(dbm);
        self
    }

    pub fn status_flags(&self) -> StatusFlags {
        StatusFlags::from_bits_retain(self.status)
    }

    /// Telegrams without a destination, or addressed to everyone.
    pub fn is_broadcast(&self) -> bool {
        self.destination.map_or(true, |d| d.is_broadcast())
    }

    /// Build from hex text of the user data, e.g. `"00 7D 01 00"`.
    pub fn from_hex(rorg: u8, payload_hex: &str, sender: DeviceAddress) -> Result<Self, EnOceanError> {
        Ok(Self::new(rorg, decode_hex(payload_hex)?, sender))
    }
}
