//! CRC8 as used by ESP3 headers and data blocks (polynomial 0x07, init 0).

const POLY: u8 = 0x07;

static CRC8_TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

pub fn crc8(data: &[u8]) -> u8 {
    data.iter()
        .fold(0u8, |crc, &byte| CRC8_TABLE[usize::from(crc ^ byte)])
}

/// CRC8 over several slices as if they were concatenated.
pub fn crc8_chain(parts: &[&[u8]]) -> u8 {
    parts.iter().flat_map(|p| p.iter()).fold(0u8, |crc, &byte| {
        CRC8_TABLE[usize::from(crc ^ byte)]
    })
}
