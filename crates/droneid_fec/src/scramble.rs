use itertools::izip;

/// XORs hard bits against the scrambling sequence. Used on the transmit
/// side; applying it twice is the identity.
pub fn scramble(bits: &[u8], sequence: &[u8]) -> Vec<u8> {
    assert!(bits.len() == sequence.len(), "Bit and sequence lengths differ: {} != {}", bits.len(), sequence.len());
    izip!(bits, sequence).map(|(bit, s)| bit ^ s).collect()
}

/// Descrambles hard bits into soft decisions: `(bit ^ s) * 2 - 1`, so a
/// positive value stands for a logical one.
pub fn descramble(bits: &[u8], sequence: &[u8]) -> Vec<i8> {
    assert!(bits.len() == sequence.len(), "Bit and sequence lengths differ: {} != {}", bits.len(), sequence.len());
    izip!(bits, sequence).map(|(bit, s)| ((bit ^ s) as i8) * 2 - 1).collect()
}
