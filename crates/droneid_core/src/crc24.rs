use crate::params::{CRC_BYTES, PAYLOAD_BYTES};

/// Generator polynomial of the 24-bit frame checksum (no reflection,
/// initial value zero, no final XOR).
pub const POLY: u32 = 0x0086_4CFB;

const MASK: u32 = 0x00FF_FFFF;

/// Table-driven 24-bit CRC over the broadcast payload. The 256-entry table
/// is expanded from [`POLY`] once at construction.
pub struct Crc24 {
    table: [u32; 256],
}

impl Crc24 {
    pub fn new() -> Self {
        let mut table = [0u32; 256];
        for (byte, entry) in table.iter_mut().enumerate() {
            let mut crc = (byte as u32) << 16;
            for _ in 0..8 {
                if crc & 0x0080_0000 != 0 {
                    crc = (crc << 1) ^ POLY;
                } else {
                    crc <<= 1;
                }
            }
            *entry = crc & MASK;
        }
        Self { table }
    }

    /// Computes the 24-bit checksum of `data`, byte at a time.
    pub fn checksum(&self, data: &[u8]) -> u32 {
        let mut crc: u32 = 0;
        for &byte in data {
            let index = (byte ^ (crc >> 16) as u8) as usize;
            crc = self.table[index] ^ (crc << 8);
        }
        crc & MASK
    }

    /// Validates a full 176-byte payload: the checksum of everything before
    /// the final 3 bytes must equal those bytes in big-endian order.
    pub fn validate_payload(&self, payload: &[u8]) -> bool {
        assert!(payload.len() == PAYLOAD_BYTES, "Payload must be {} bytes but got {}", PAYLOAD_BYTES, payload.len());
        let body = PAYLOAD_BYTES - CRC_BYTES;
        self.checksum(&payload[..body]) == stored_checksum(payload)
    }

    /// Overwrites the final 3 payload bytes with the checksum of the rest.
    pub fn seal_payload(&self, payload: &mut [u8]) {
        assert!(payload.len() == PAYLOAD_BYTES, "Payload must be {} bytes but got {}", PAYLOAD_BYTES, payload.len());
        let body = PAYLOAD_BYTES - CRC_BYTES;
        let crc = self.checksum(&payload[..body]);
        payload[body] = (crc >> 16) as u8;
        payload[body + 1] = (crc >> 8) as u8;
        payload[body + 2] = crc as u8;
    }
}

impl Default for Crc24 {
    fn default() -> Self {
        Self::new()
    }
}

fn stored_checksum(payload: &[u8]) -> u32 {
    let body = PAYLOAD_BYTES - CRC_BYTES;
    ((payload[body] as u32) << 16) | ((payload[body + 1] as u32) << 8) | payload[body + 2] as u32
}
