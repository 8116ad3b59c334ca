//! EnOcean Protocol Constants
//!
//! This module defines constants used in the EnOcean implementation, based on
//! the EnOcean Serial Protocol 3 (ESP3) and EnOcean Radio Protocol 1 (ERP1)
//! specifications and the EEP 2.6 profile conventions.

use std::time::Duration;

// ----------------------------------------------------------------------------
// RORG (radio telegram type) values
// ----------------------------------------------------------------------------

/// Repeated switch communication (rocker switches)
pub const RORG_RPS: u8 = 0xF6;

/// 1-byte communication (contacts)
pub const RORG_1BS: u8 = 0xD5;

/// 4-byte communication (sensors, dimmers)
pub const RORG_4BS: u8 = 0xA5;

/// Variable length data
pub const RORG_VLD: u8 = 0xD2;

/// Manufacturer specific communication
pub const RORG_MSC: u8 = 0xD1;

/// Universal teach-in, EEP based
pub const RORG_UTE: u8 = 0xD4;

/// Largest ERP1 user data block (VLD)
pub const ERP1_MAX_DATA_LEN: usize = 14;

// ----------------------------------------------------------------------------
// ESP3 framing
// ----------------------------------------------------------------------------

/// ESP3 synchronisation byte
pub const ESP3_SYNC_BYTE: u8 = 0x55;

/// Sync + data length (2) + optional length + packet type + CRC8H
pub const ESP3_HEADER_LEN: usize = 6;

/// ESP3 packet types
pub const ESP3_PACKET_RADIO_ERP1: u8 = 0x01;
pub const ESP3_PACKET_RESPONSE: u8 = 0x02;
pub const ESP3_PACKET_EVENT: u8 = 0x04;
pub const ESP3_PACKET_COMMON_COMMAND: u8 = 0x05;

/// Common command: reset the module
pub const CO_WR_RESET: u8 = 0x02;

/// Common command: read the base ID
pub const CO_RD_IDBASE: u8 = 0x08;

/// Sub-telegram count written into outbound RADIO_ERP1 optional data
pub const ERP1_SEND_SUBTEL: u8 = 0x03;

/// dBm placeholder for outbound telegrams
pub const ERP1_SEND_DBM: u8 = 0xFF;

// ----------------------------------------------------------------------------
// Teach-in
// ----------------------------------------------------------------------------

/// 4BS DB0 bit 3: 0 = teach-in telegram, 1 = data telegram
pub const LRN_BIT_MASK_4BS: u8 = 0x08;

/// 4BS DB0 bit 7: teach-in carries EEP information
pub const LRN_TYPE_MASK_4BS: u8 = 0x80;

/// 1BS DB0 bit 3: 0 = teach-in telegram
pub const LRN_BIT_MASK_1BS: u8 = 0x08;

/// UTE DB6 bits 3..0: command identifier, 0 = teach-in query
pub const UTE_CMD_TEACH_IN_QUERY: u8 = 0x00;

/// UTE payload length (DB6..DB0)
pub const UTE_DATA_LEN: usize = 7;

// ----------------------------------------------------------------------------
// Addressing
// ----------------------------------------------------------------------------

/// Broadcast destination address
pub const BROADCAST_ADDRESS: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];

// ----------------------------------------------------------------------------
// Gateway defaults
// ----------------------------------------------------------------------------

/// A device that stays silent this long becomes unavailable
pub const DEFAULT_AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(3600);

/// How often the service checks availability windows
pub const DEFAULT_AVAILABILITY_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Learning mode duration in minutes
pub const DEFAULT_LEARNING_MINUTES: u64 = 10;

/// Consecutive invalid telegrams from one device before a dongle reset
pub const DEFAULT_INVALID_TELEGRAM_THRESHOLD: u32 = 5;

/// Entity key of the per-device signal strength sensor
pub const RSSI_ENTITY: &str = "rssi";

/// Upper bound on the items one enum channel may declare, ranges included
pub const MAX_ENUM_ITEMS: usize = 4096;

/// Highest profile table schema version this crate reads
pub const PROFILE_TABLE_VERSION: u32 = 1;

/// Device store schema version
pub const DEVICE_STORE_VERSION: u32 = 1;
