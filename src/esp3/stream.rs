//! Incremental ESP3 decoding over a byte stream.
//!
//! Serial reads split and merge frames arbitrarily. [`Esp3Decoder`] buffers
//! input, skips noise up to the next sync byte and resynchronises one byte
//! past a sync byte whose frame fails its CRC.

use crate::esp3::{decode_packet, Esp3Packet};
use crate::constants::{ESP3_HEADER_LEN, ESP3_SYNC_BYTE};
use crate::error::EnOceanError;
use bytes::{Buf, BytesMut};
use log::{debug, warn};

#[derive(Debug, Default)]
pub struct Esp3Decoder {
    buf: BytesMut,
}

impl Esp3Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes waiting for the rest of a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Next complete packet, `None` when more input is needed.
    ///
    /// Corrupt frames are reported once and then skipped, so calling this in
    /// a loop drains every recoverable packet.
    pub fn next_packet(&mut self) -> Option<Result<Esp3Packet, EnOceanError>> {
        loop {
            let sync = self.buf.iter().position(|&b| b == ESP3_SYNC_BYTE);
            match sync {
                Some(0) => {}
                Some(skip) => {
                    debug!("Skipping {skip} bytes before ESP3 sync");
                    self.buf.advance(skip);
                }
                None => {
                    self.buf.clear();
                    return None;
                }
            }

            if self.buf.len() < ESP3_HEADER_LEN {
                return None;
            }

            let header = &self.buf[1..5];
            if crate::esp3::crc8(header) != self.buf[5] {
                // Not a real frame start; look for the next sync byte
                self.buf.advance(1);
                continue;
            }

            let data_len = usize::from(u16::from_be_bytes([self.buf[1], self.buf[2]]));
            let optional_len = usize::from(self.buf[3]);
            let total = ESP3_HEADER_LEN + data_len + optional_len + 1;
            if self.buf.len() < total {
                return None;
            }

            let frame = self.buf.split_to(total);
            return match decode_packet(&frame) {
                Ok(packet) => Some(Ok(packet)),
                Err(e) => {
                    warn!("Dropping corrupt ESP3 frame: {e}");
                    Some(Err(e))
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::esp3::build_packet;

    #[test]
    fn test_split_frames() {
        let wire = build_packet(&Esp3Packet::reset()).unwrap();
        let mut decoder = Esp3Decoder::new();
        decoder.extend(&wire[..3]);
        assert!(decoder.next_packet().is_none());
        decoder.extend(&wire[3..]);
        assert_eq!(decoder.next_packet().unwrap().unwrap(), Esp3Packet::reset());
        assert!(decoder.next_packet().is_none());
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_skips_noise_and_merged_frames() {
        let mut wire = vec![0x00, 0x13, 0x55, 0x01];
        wire.extend_from_slice(&build_packet(&Esp3Packet::reset()).unwrap());
        wire.extend_from_slice(&build_packet(&Esp3Packet::read_base_id()).unwrap());

        let mut decoder = Esp3Decoder::new();
        decoder.extend(&wire);
        assert_eq!(decoder.next_packet().unwrap().unwrap(), Esp3Packet::reset());
        assert_eq!(
            decoder.next_packet().unwrap().unwrap(),
            Esp3Packet::read_base_id()
        );
        assert!(decoder.next_packet().is_none());
    }

    #[test]
    fn test_reports_bad_data_crc_then_recovers() {
        let mut bad = build_packet(&Esp3Packet::reset()).unwrap().to_vec();
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;

        let mut decoder = Esp3Decoder::new();
        decoder.extend(&bad);
        decoder.extend(&build_packet(&Esp3Packet::read_base_id()).unwrap());
        assert!(matches!(
            decoder.next_packet(),
            Some(Err(EnOceanError::InvalidCrc { .. }))
        ));
        assert_eq!(
            decoder.next_packet().unwrap().unwrap(),
            Esp3Packet::read_base_id()
        );
    }
}
