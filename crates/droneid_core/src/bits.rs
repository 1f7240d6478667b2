/// Unpacks bytes into bits, most significant bit first.
pub fn unpack_msb(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for byte in bytes {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1);
        }
    }
    bits
}

/// Packs bits into bytes, most significant bit first. The bit count must be
/// a multiple of eight.
pub fn pack_msb(bits: &[u8]) -> Vec<u8> {
    assert!(bits.len() % 8 == 0, "Bit count {} is not a whole number of bytes", bits.len());
    bits.chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |byte, bit| (byte << 1) | (bit & 1)))
        .collect()
}
