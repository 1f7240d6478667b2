/// Length of the scrambling sequence applied to one burst.
pub const GOLD_LEN: usize = 7200;

/// Register length of the two generators.
const REG_LEN: usize = 31;

/// Near-cell alignment offset: both generators are advanced this far before
/// the first output bit is taken.
const NC: usize = 1600;

/// Initial state of the second generator, 0x12345678 in bit-reversed order.
const X2_INIT: [u8; REG_LEN] = [
    0, 0, 0, 1, 1, 1, 1, 0, 0, 1, 1, 0, 1, 0, 1, 0, 0, 0, 1, 0, 1, 1, 0, 0, 0, 1, 0, 0, 1, 0, 0,
];

/// Generates the fixed 7200-bit Gold sequence used to scramble the encoded
/// broadcast bits. Two 31-bit linear-feedback shift registers are advanced
/// for `GOLD_LEN + NC` steps; output bit i is the XOR of the generators at
/// offset `i + NC`.
///
/// The sequence is pure and deterministic, so callers may compute it once
/// and reuse it for the process lifetime.
pub fn gold_sequence() -> Vec<u8> {
    let total = GOLD_LEN + NC + REG_LEN;
    let mut x1 = vec![0u8; total];
    let mut x2 = vec![0u8; total];

    x1[0] = 1;
    x2[..REG_LEN].copy_from_slice(&X2_INIT);

    for i in 0..(GOLD_LEN + NC) {
        x1[i + REG_LEN] = x1[i + 3] ^ x1[i];
        x2[i + REG_LEN] = x2[i + 3] ^ x2[i + 2] ^ x2[i + 1] ^ x2[i];
    }

    (0..GOLD_LEN).map(|i| x1[i + NC] ^ x2[i + NC]).collect()
}
