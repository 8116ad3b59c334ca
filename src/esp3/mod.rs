//! # ESP3 Serial Framing
//!
//! Parsing and building of EnOcean Serial Protocol 3 packets, the framing
//! spoken by USB and serial EnOcean transceivers:
//!
//! ```text
//! 0x55 | data len (2) | opt len | type | CRC8H | data | optional | CRC8D
//! ```
//!
//! Parsing is done with `nom`; building writes into a `BytesMut`.
//!
//! ## Usage
//!
//! ```rust
//! use enocean_rs::esp3::{build_packet, parse_packet, Esp3Packet};
//!
//! let bytes = build_packet(&Esp3Packet::reset()).unwrap();
//! assert_eq!(&bytes[..], &[0x55, 0x00, 0x01, 0x00, 0x05, 0x70, 0x02, 0x0E]);
//!
//! let (rest, packet) = parse_packet(&bytes).unwrap();
//! assert!(rest.is_empty());
//! assert_eq!(packet, Esp3Packet::reset());
//! ```

pub mod crc;
pub mod erp1;
pub mod stream;

pub use crc::crc8;
pub use erp1::{erp1_from_telegram, telegram_from_erp1};
pub use stream::Esp3Decoder;

use crate::constants::{
    CO_RD_IDBASE, CO_WR_RESET, ESP3_HEADER_LEN, ESP3_PACKET_COMMON_COMMAND, ESP3_PACKET_EVENT,
    ESP3_PACKET_RADIO_ERP1, ESP3_PACKET_RESPONSE, ESP3_SYNC_BYTE,
};
use crate::error::EnOceanError;
use crate::telegram::DeviceAddress;
use bytes::{BufMut, BytesMut};
use nom::bytes::complete::{tag, take};
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    RadioErp1,
    Response,
    Event,
    CommonCommand,
    Other(u8),
}

impl From<u8> for PacketType {
    fn from(value: u8) -> Self {
        match value {
            ESP3_PACKET_RADIO_ERP1 => PacketType::RadioErp1,
            ESP3_PACKET_RESPONSE => PacketType::Response,
            ESP3_PACKET_EVENT => PacketType::Event,
            ESP3_PACKET_COMMON_COMMAND => PacketType::CommonCommand,
            other => PacketType::Other(other),
        }
    }
}

impl From<PacketType> for u8 {
    fn from(value: PacketType) -> Self {
        match value {
            PacketType::RadioErp1 => ESP3_PACKET_RADIO_ERP1,
            PacketType::Response => ESP3_PACKET_RESPONSE,
            PacketType::Event => ESP3_PACKET_EVENT,
            PacketType::CommonCommand => ESP3_PACKET_COMMON_COMMAND,
            PacketType::Other(other) => other,
        }
    }
}

/// One ESP3 packet with verified CRCs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Esp3Packet {
    pub packet_type: PacketType,
    pub data: Vec<u8>,
    pub optional: Vec<u8>,
}

impl Esp3Packet {
    pub fn new(packet_type: PacketType, data: Vec<u8>, optional: Vec<u8>) -> Self {
        Self {
            packet_type,
            data,
            optional,
        }
    }

    /// `CO_WR_RESET`: restart the transceiver.
    pub fn reset() -> Self {
        Self::new(PacketType::CommonCommand, vec![CO_WR_RESET], Vec::new())
    }

    /// `CO_RD_IDBASE`: ask for the transceiver's base ID.
    pub fn read_base_id() -> Self {
        Self::new(PacketType::CommonCommand, vec![CO_RD_IDBASE], Vec::new())
    }

    /// Base ID from a successful `CO_RD_IDBASE` response.
    pub fn base_id(&self) -> Option<DeviceAddress> {
        if self.packet_type != PacketType::Response || self.data.len() < 5 || self.data[0] != 0 {
            return None;
        }
        let mut id = [0u8; 4];
        id.copy_from_slice(&self.data[1..5]);
        Some(DeviceAddress(id))
    }
}

/// Raw frame fields before CRC verification.
struct RawFrame<'a> {
    header: &'a [u8],
    header_crc: u8,
    packet_type: u8,
    data: &'a [u8],
    optional: &'a [u8],
    data_crc: u8,
}

fn parse_raw(input: &[u8]) -> IResult<&[u8], RawFrame<'_>> {
    let (input, _) = tag(&[ESP3_SYNC_BYTE][..])(input)?;
    let (_, header) = take(4usize)(input)?;
    let (input, data_len) = be_u16(input)?;
    let (input, optional_len) = be_u8(input)?;
    let (input, packet_type) = be_u8(input)?;
    let (input, header_crc) = be_u8(input)?;
    let (input, data) = take(usize::from(data_len))(input)?;
    let (input, optional) = take(usize::from(optional_len))(input)?;
    let (input, data_crc) = be_u8(input)?;
    Ok((
        input,
        RawFrame {
            header,
            header_crc,
            packet_type,
            data,
            optional,
            data_crc,
        },
    ))
}

fn verify(raw: &RawFrame<'_>) -> Result<(), EnOceanError> {
    let calculated = crc8(raw.header);
    if calculated != raw.header_crc {
        return Err(EnOceanError::InvalidCrc {
            expected: raw.header_crc,
            calculated,
        });
    }
    let calculated = crc::crc8_chain(&[raw.data, raw.optional]);
    if calculated != raw.data_crc {
        return Err(EnOceanError::InvalidCrc {
            expected: raw.data_crc,
            calculated,
        });
    }
    Ok(())
}

/// Parse one packet at the start of `input`, verifying both CRCs.
///
/// A CRC mismatch is reported as a nom `Verify` error; use
/// [`decode_packet`] to get the mismatch details.
pub fn parse_packet(input: &[u8]) -> IResult<&[u8], Esp3Packet> {
    let (rest, raw) = parse_raw(input)?;
    if verify(&raw).is_err() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }
    Ok((
        rest,
        Esp3Packet::new(raw.packet_type.into(), raw.data.to_vec(), raw.optional.to_vec()),
    ))
}

/// Decode exactly one complete packet.
pub fn decode_packet(input: &[u8]) -> Result<Esp3Packet, EnOceanError> {
    let (rest, raw) = parse_raw(input).map_err(|e| EnOceanError::PacketParseError(e.to_string()))?;
    verify(&raw)?;
    if !rest.is_empty() {
        return Err(EnOceanError::PacketParseError(format!(
            "{} trailing bytes after packet",
            rest.len()
        )));
    }
    Ok(Esp3Packet::new(
        raw.packet_type.into(),
        raw.data.to_vec(),
        raw.optional.to_vec(),
    ))
}

/// Serialise a packet including sync byte and both CRCs.
pub fn build_packet(packet: &Esp3Packet) -> Result<BytesMut, EnOceanError> {
    let data_len = u16::try_from(packet.data.len()).map_err(|_| EnOceanError::PacketTooLarge {
        block: "data",
        len: packet.data.len(),
    })?;
    let optional_len =
        u8::try_from(packet.optional.len()).map_err(|_| EnOceanError::PacketTooLarge {
            block: "optional",
            len: packet.optional.len(),
        })?;

    let mut buf =
        BytesMut::with_capacity(ESP3_HEADER_LEN + packet.data.len() + packet.optional.len() + 1);
    buf.put_u8(ESP3_SYNC_BYTE);
    buf.put_u16(data_len);
    buf.put_u8(optional_len);
    buf.put_u8(packet.packet_type.into());
    let header_crc = crc8(&buf[1..5]);
    buf.put_u8(header_crc);
    buf.put_slice(&packet.data);
    buf.put_slice(&packet.optional);
    buf.put_u8(crc::crc8_chain(&[packet.data.as_slice(), packet.optional.as_slice()]));
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::hex::decode_hex;

    #[test]
    fn test_reset_packet_bytes() {
        let bytes = build_packet(&Esp3Packet::reset()).unwrap();
        assert_eq!(&bytes[..], &[0x55, 0x00, 0x01, 0x00, 0x05, 0x70, 0x02, 0x0E]);
    }

    #[test]
    fn test_parse_leaves_trailing_input() {
        let mut bytes = build_packet(&Esp3Packet::read_base_id()).unwrap().to_vec();
        bytes.extend_from_slice(&[0x55, 0x00]);
        let (rest, packet) = parse_packet(&bytes).unwrap();
        assert_eq!(rest, &[0x55, 0x00]);
        assert_eq!(packet.data, vec![CO_RD_IDBASE]);
        assert!(decode_packet(&bytes).is_err());
    }

    #[test]
    fn test_header_crc_mismatch() {
        let mut bytes = build_packet(&Esp3Packet::reset()).unwrap().to_vec();
        bytes[5] ^= 0xFF;
        assert!(matches!(
            decode_packet(&bytes),
            Err(EnOceanError::InvalidCrc { .. })
        ));
        assert!(parse_packet(&bytes).is_err());
    }

    #[test]
    fn test_data_crc_mismatch() {
        let mut bytes = build_packet(&Esp3Packet::reset()).unwrap().to_vec();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(matches!(
            decode_packet(&bytes),
            Err(EnOceanError::InvalidCrc { expected: 0x0F, calculated: 0x0E })
        ));
    }

    #[test]
    fn test_truncated_packet() {
        let bytes = build_packet(&Esp3Packet::reset()).unwrap();
        assert!(matches!(
            decode_packet(&bytes[..5]),
            Err(EnOceanError::PacketParseError(_))
        ));
    }

    #[test]
    fn test_oversized_blocks_rejected() {
        let packet = Esp3Packet::new(PacketType::RadioErp1, vec![0; 0x1_0000], Vec::new());
        assert!(matches!(
            build_packet(&packet),
            Err(EnOceanError::PacketTooLarge { block: "data", len: 0x1_0000 })
        ));

        let packet = Esp3Packet::new(PacketType::RadioErp1, vec![0xD5], vec![0; 256]);
        assert!(matches!(
            build_packet(&packet),
            Err(EnOceanError::PacketTooLarge { block: "optional", len: 256 })
        ));

        let packet = Esp3Packet::new(PacketType::RadioErp1, vec![0; 0xFFFF], vec![0; 255]);
        assert_eq!(build_packet(&packet).unwrap().len(), ESP3_HEADER_LEN + 0xFFFF + 255 + 1);
    }

    #[test]
    fn test_base_id_response() {
        let packet = decode_packet(&build_packet(&Esp3Packet::new(
            PacketType::Response,
            decode_hex("00 FF 80 12 00 0A").unwrap(),
            Vec::new(),
        ))
        .unwrap())
        .unwrap();
        assert_eq!(packet.base_id(), Some(DeviceAddress([0xFF, 0x80, 0x12, 0x00])));

        let failed = Esp3Packet::new(PacketType::Response, vec![0x02], Vec::new());
        assert_eq!(failed.base_id(), None);
    }
}
