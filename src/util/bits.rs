//! # Bit Field Access
//!
//! EEP channels address payload bits MSB-first: bit offset 0 is the most
//! significant bit of the first data byte (DB_n in EEP notation). These
//! helpers read and write unsigned fields of up to 32 bits in that order.
//!
//! ## Usage
//!
//! ```rust
//! use enocean_rs::util::bits::{extract_bits, insert_bits};
//!
//! let payload = [0b1010_0000, 0xFF];
//! assert_eq!(extract_bits(&payload, 0, 3), Some(0b101));
//! assert_eq!(extract_bits(&payload, 8, 8), Some(0xFF));
//!
//! let mut out = [0u8; 2];
//! insert_bits(&mut out, 4, 8, 0xAB);
//! assert_eq!(out, [0x0A, 0xB0]);
//! ```

/// Largest field width supported by the decoder
pub const MAX_FIELD_BITS: u16 = 32;

/// Returns `true` when `offset..offset + size` fits into `len_bytes`.
#[inline]
pub fn fits(len_bytes: usize, offset: u16, size: u16) -> bool {
    usize::from(offset) + usize::from(size) <= len_bytes * 8
}

/// Largest raw value representable in `size` bits
#[inline]
pub fn max_raw(size: u16) -> u32 {
    if size >= 32 {
        u32::MAX
    } else {
        (1u32 << size) - 1
    }
}

/// Read an unsigned MSB-first field.
///
/// Returns `None` when the range is empty, wider than 32 bits or runs past
/// the end of `data`.
pub fn extract_bits(data: &[u8], offset: u16, size: u16) -> Option<u32> {
    if size == 0 || size > MAX_FIELD_BITS || !fits(data.len(), offset, size) {
        return None;
    }

    let mut value: u32 = 0;
    for pos in offset..offset + size {
        let byte = data[usize::from(pos / 8)];
        let bit = (byte >> (7 - (pos % 8))) & 1;
        value = (value << 1) | u32::from(bit);
    }
    Some(value)
}

/// Write an unsigned MSB-first field, leaving other bits untouched.
///
/// Bits of `value` above `size` are ignored. Returns `false` without
/// modifying `data` when the range does not fit.
pub fn insert_bits(data: &mut [u8], offset: u16, size: u16, value: u32) -> bool {
    if size == 0 || size > MAX_FIELD_BITS || !fits(data.len(), offset, size) {
        return false;
    }

    for i in 0..size {
        let pos = offset + i;
        let bit = (value >> (size - 1 - i)) & 1;
        let idx = usize::from(pos / 8);
        let mask = 1u8 << (7 - (pos % 8));
        if bit == 1 {
            data[idx] |= mask;
        } else {
            data[idx] &= !mask;
        }
    }
    true
}
