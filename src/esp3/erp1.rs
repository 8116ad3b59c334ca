//! RADIO_ERP1 packets to and from [`Telegram`]s.
//!
//! ```text
//! data:     RORG | user data ... | sender (4) | status
//! optional: sub-telegrams | destination (4) | dBm | security level
//! ```

use crate::constants::{ERP1_SEND_DBM, ERP1_SEND_SUBTEL};
use crate::error::EnOceanError;
use crate::esp3::{Esp3Packet, PacketType};
use crate::telegram::{DeviceAddress, Telegram};

/// RORG + sender + status
const ERP1_MIN_DATA_LEN: usize = 6;
const ERP1_OPTIONAL_LEN: usize = 7;

/// Extract the telegram carried by a RADIO_ERP1 packet.
pub fn telegram_from_erp1(packet: &Esp3Packet) -> Result<Telegram, EnOceanError> {
    if packet.packet_type != PacketType::RadioErp1 {
        return Err(EnOceanError::PacketParseError(format!(
            "expected RADIO_ERP1, got {:?}",
            packet.packet_type
        )));
    }
    let data = &packet.data;
    if data.len() < ERP1_MIN_DATA_LEN {
        return Err(EnOceanError::PacketParseError(format!(
            "RADIO_ERP1 data too short: {} bytes",
            data.len()
        )));
    }

    let status_at = data.len() - 1;
    let sender_at = status_at - 4;
    let mut sender = [0u8; 4];
    sender.copy_from_slice(&data[sender_at..status_at]);

    let mut telegram = Telegram::new(data[0], data[1..sender_at].to_vec(), DeviceAddress(sender))
        .with_status(data[status_at]);

    if packet.optional.len() >= ERP1_OPTIONAL_LEN {
        let mut destination = [0u8; 4];
        destination.copy_from_slice(&packet.optional[1..5]);
        telegram.destination = Some(DeviceAddress(destination));
        // dBm is sent as a positive magnitude
        let magnitude = packet.optional[5];
        if magnitude != ERP1_SEND_DBM {
            telegram.dbm = Some((-i16::from(magnitude)).max(i16::from(i8::MIN)) as i8);
        }
    }

    Ok(telegram)
}

/// Wrap a telegram for transmission.
///
/// Telegrams without a destination go to broadcast.
pub fn erp1_from_telegram(telegram: &Telegram) -> Esp3Packet {
    let mut data = Vec::with_capacity(telegram.payload.len() + ERP1_MIN_DATA_LEN);
    data.push(telegram.rorg);
    data.extend_from_slice(&telegram.payload);
    data.extend_from_slice(&telegram.sender.0);
    data.push(telegram.status);

    let destination = telegram.destination.unwrap_or(DeviceAddress::BROADCAST);
    let mut optional = Vec::with_capacity(ERP1_OPTIONAL_LEN);
    optional.push(ERP1_SEND_SUBTEL);
    optional.extend_from_slice(&destination.0);
    optional.push(ERP1_SEND_DBM);
    optional.push(0x00);

    Esp3Packet::new(PacketType::RadioErp1, data, optional)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::esp3::{build_packet, decode_packet};
    use crate::util::hex::decode_hex;

    #[test]
    fn test_rocker_telegram_from_wire() {
        // F6 30 from 01:82:5D:AB, status 30, 45 dBm
        let packet = Esp3Packet::new(
            PacketType::RadioErp1,
            decode_hex("F6 30 01 82 5D AB 30").unwrap(),
            decode_hex("01 FF FF FF FF 2D 00").unwrap(),
        );
        let wire = build_packet(&packet).unwrap();
        let telegram = telegram_from_erp1(&decode_packet(&wire).unwrap()).unwrap();

        assert_eq!(telegram.rorg, 0xF6);
        assert_eq!(telegram.payload, vec![0x30]);
        assert_eq!(telegram.sender, DeviceAddress([0x01, 0x82, 0x5D, 0xAB]));
        assert_eq!(telegram.status, 0x30);
        assert_eq!(telegram.dbm, Some(-45));
        assert!(telegram.is_broadcast());
    }

    #[test]
    fn test_without_optional_data() {
        let packet = Esp3Packet::new(
            PacketType::RadioErp1,
            decode_hex("A5 00 00 7F 08 01 02 03 04 00").unwrap(),
            Vec::new(),
        );
        let telegram = telegram_from_erp1(&packet).unwrap();
        assert_eq!(telegram.payload, vec![0x00, 0x00, 0x7F, 0x08]);
        assert_eq!(telegram.destination, None);
        assert_eq!(telegram.dbm, None);
    }

    #[test]
    fn test_rejects_short_and_foreign_packets() {
        let short = Esp3Packet::new(PacketType::RadioErp1, vec![0xF6, 0x30], Vec::new());
        assert!(telegram_from_erp1(&short).is_err());
        assert!(telegram_from_erp1(&Esp3Packet::reset()).is_err());
    }

    #[test]
    fn test_outbound_layout() {
        let telegram = Telegram::new(0xD2, vec![0x01, 0x1E, 0x64], DeviceAddress([0xFF, 0x80, 0x12, 0x01]))
            .with_destination(DeviceAddress([0x05, 0x06, 0x07, 0x08]));
        let packet = erp1_from_telegram(&telegram);
        assert_eq!(
            packet.data,
            vec![0xD2, 0x01, 0x1E, 0x64, 0xFF, 0x80, 0x12, 0x01, 0x00]
        );
        assert_eq!(packet.optional, vec![0x03, 0x05, 0x06, 0x07, 0x08, 0xFF, 0x00]);
        let back = telegram_from_erp1(&packet).unwrap();
        assert_eq!(back.payload, telegram.payload);
        assert_eq!(back.destination, telegram.destination);
    }
}
