//! ESP3 framing and RADIO_ERP1 conversion.

use enocean_rs::error::EnOceanError;
use enocean_rs::esp3::{
    build_packet, crc8, decode_packet, erp1_from_telegram, parse_packet, telegram_from_erp1,
};
use enocean_rs::{DeviceAddress, Esp3Decoder, Esp3Packet, PacketType, Telegram};

const SENSOR: DeviceAddress = DeviceAddress([0x01, 0x82, 0x5D, 0xAB]);

fn radio_frame(telegram: &Telegram) -> Vec<u8> {
    build_packet(&erp1_from_telegram(telegram)).unwrap().to_vec()
}

#[test]
fn test_crc8_known_values() {
    assert_eq!(crc8(&[]), 0x00);
    assert_eq!(crc8(&[0x03]), 0x09);
    assert_eq!(crc8(&[0x00, 0x01, 0x00, 0x05]), 0x70);
}

#[test]
fn test_reset_frame_golden_bytes() {
    let bytes = [0x55, 0x00, 0x01, 0x00, 0x05, 0x70, 0x02, 0x0E];
    let packet = decode_packet(&bytes).unwrap();
    assert_eq!(packet, Esp3Packet::reset());
    assert_eq!(&build_packet(&packet).unwrap()[..], &bytes);
}

#[test]
fn test_radio_packet_layout() {
    let telegram = Telegram::new(0xA5, vec![0x00, 0x00, 0x80, 0x08], SENSOR);
    let frame = radio_frame(&telegram);

    // 4BS: RORG + 4 data + sender + status, 7 optional bytes
    assert_eq!(&frame[1..5], &[0x00, 0x0A, 0x07, 0x01]);
    assert_eq!(frame[6], 0xA5);
    assert_eq!(&frame[11..15], &SENSOR.0);
    // broadcast destination, dBm placeholder
    assert_eq!(&frame[17..21], &[0xFF; 4]);
    assert_eq!(frame[21], 0xFF);
}

#[test]
fn test_received_telegram_fields() {
    let packet = Esp3Packet::new(
        PacketType::RadioErp1,
        vec![0xF6, 0x30, 0xFE, 0xF1, 0x2A, 0x01, 0x30],
        vec![0x01, 0xFF, 0x80, 0x12, 0x00, 0x4A, 0x00],
    );
    let telegram = telegram_from_erp1(&packet).unwrap();
    assert_eq!(telegram.rorg, 0xF6);
    assert_eq!(telegram.payload, vec![0x30]);
    assert_eq!(telegram.sender, DeviceAddress([0xFE, 0xF1, 0x2A, 0x01]));
    assert_eq!(telegram.status, 0x30);
    assert_eq!(telegram.destination, Some(DeviceAddress([0xFF, 0x80, 0x12, 0x00])));
    assert_eq!(telegram.dbm, Some(-74));
    assert!(!telegram.is_broadcast());
}

#[test]
fn test_short_radio_packet_rejected() {
    let packet = Esp3Packet::new(PacketType::RadioErp1, vec![0xF6, 0x30, 0x01], Vec::new());
    assert!(matches!(
        telegram_from_erp1(&packet),
        Err(EnOceanError::PacketParseError(_))
    ));
}

#[test]
fn test_data_crc_mismatch() {
    let mut frame = radio_frame(&Telegram::new(0xD5, vec![0x09], SENSOR));
    let last = frame.len() - 1;
    frame[last] ^= 0xFF;
    assert!(matches!(decode_packet(&frame), Err(EnOceanError::InvalidCrc { .. })));
    assert!(parse_packet(&frame).is_err());
}

#[test]
fn test_stream_resynchronises() {
    let first = radio_frame(&Telegram::new(0xD5, vec![0x09], SENSOR));
    let second = radio_frame(&Telegram::new(0xF6, vec![0x30], SENSOR));

    let mut decoder = Esp3Decoder::new();
    // line noise, including a stray sync byte
    decoder.extend(&[0x00, 0x55, 0x13]);
    decoder.extend(&first[..5]);
    assert!(decoder.next_packet().is_none());

    decoder.extend(&first[5..]);
    decoder.extend(&second);

    let packet = decoder.next_packet().unwrap().unwrap();
    assert_eq!(telegram_from_erp1(&packet).unwrap().rorg, 0xD5);
    let packet = decoder.next_packet().unwrap().unwrap();
    assert_eq!(telegram_from_erp1(&packet).unwrap().payload, vec![0x30]);
    assert!(decoder.next_packet().is_none());
    assert_eq!(decoder.buffered(), 0);
}

#[test]
fn test_stream_reports_corrupt_frame_once() {
    let mut corrupt = radio_frame(&Telegram::new(0xD5, vec![0x09], SENSOR));
    let last = corrupt.len() - 1;
    corrupt[last] ^= 0x01;
    let good = radio_frame(&Telegram::new(0xD5, vec![0x08], SENSOR));

    let mut decoder = Esp3Decoder::new();
    decoder.extend(&corrupt);
    decoder.extend(&good);

    assert!(matches!(decoder.next_packet(), Some(Err(EnOceanError::InvalidCrc { .. }))));
    assert!(decoder.next_packet().unwrap().is_ok());
}

#[test]
fn test_base_id_response() {
    let response = Esp3Packet::new(PacketType::Response, vec![0x00, 0xFF, 0x80, 0x12, 0x00, 0x0A], Vec::new());
    assert_eq!(response.base_id(), Some(DeviceAddress([0xFF, 0x80, 0x12, 0x00])));

    let failed = Esp3Packet::new(PacketType::Response, vec![0x02], Vec::new());
    assert_eq!(failed.base_id(), None);
}
