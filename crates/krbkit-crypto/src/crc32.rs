//! Kerberos mod-crc-32 (RFC 3961 section 6.1.3).
//!
//! This is NOT the ISO 3309 CRC usually called "crc32": Kerberos starts the
//! register at zero and skips the final complement, so no off-the-shelf CRC
//! parametrization matches it. The checksum bytes go out little-endian.

const POLY: u32 = 0xedb8_8320; // ISO polynomial, bit-reversed

fn crc(data: &[&[u8]]) -> u32 {
    let mut c: u32 = 0;
    for part in data {
        for &byte in *part {
            c ^= u32::from(byte);
            for _ in 0..8 {
                c = if c & 1 != 0 { (c >> 1) ^ POLY } else { c >> 1 };
            }
        }
    }
    c
}

/// Four checksum bytes, least significant first.
pub fn mod_crc32(data: &[&[u8]]) -> [u8; 4] {
    crc(data).to_le_bytes()
}
