use droneid_core::params::{CODED_LEN, ENCODED_BITS};

const COLUMNS: usize = 32;
const COLUMN_PERMUTATION: [usize; COLUMNS] = [
    0, 16, 8, 24, 4, 20, 12, 28, 2, 18, 10, 26, 6, 22, 14, 30,
    1, 17, 9, 25, 5, 21, 13, 29, 3, 19, 11, 27, 7, 23, 15, 31,
];

/// Rate matcher for the three turbo-coded streams: sub-block interleaving
/// of each stream, bit collection into a circular buffer, and selection of
/// the transmitted bits. Since the selection length exceeds the buffer, the
/// buffer repeats and the de-matcher soft-combines the repeats.
pub struct RateMatcher {
    /// For each circular buffer position: the (stream, position) it carries,
    /// or `None` for a sub-block interleaver dummy.
    buffer_map: Vec<Option<(usize, usize)>>,
    /// Number of rows in the sub-block interleaver matrix.
    rows: usize,
}

impl RateMatcher {
    pub fn new() -> Self {
        let rows = CODED_LEN.div_ceil(COLUMNS);
        let block = rows * COLUMNS;
        let dummies = block - CODED_LEN;

        // Position `i` of the padded matrix holds stream bit `i - dummies`.
        let padded = |stream: usize, index: usize| -> Option<(usize, usize)> {
            index.checked_sub(dummies).map(|position| (stream, position))
        };

        // Streams 0 and 1 read the matrix column-wise in permuted order.
        let subblock = |stream: usize| -> Vec<Option<(usize, usize)>> {
            let mut v = Vec::with_capacity(block);
            for column in COLUMN_PERMUTATION {
                for row in 0..rows {
                    v.push(padded(stream, row * COLUMNS + column));
                }
            }
            v
        };
        // Stream 2 uses the shifted index permutation.
        let subblock_shifted = || -> Vec<Option<(usize, usize)>> {
            (0..block)
                .map(|k| {
                    let pi = (COLUMN_PERMUTATION[k / rows] + COLUMNS * (k % rows) + 1) % block;
                    padded(2, pi)
                })
                .collect()
        };

        let v0 = subblock(0);
        let v1 = subblock(1);
        let v2 = subblock_shifted();

        // Bit collection: systematic sub-block first, then the two parity
        // sub-blocks interlaced.
        let mut buffer_map = Vec::with_capacity(3 * block);
        buffer_map.extend_from_slice(&v0);
        for (a, b) in v1.into_iter().zip(v2) {
            buffer_map.push(a);
            buffer_map.push(b);
        }
        Self { buffer_map, rows }
    }

    /// First circular buffer position of the selection (redundancy
    /// version 0).
    fn selection_start(&self) -> usize {
        2 * self.rows
    }

    /// Selects `ENCODED_BITS` bits from the three coded streams, skipping
    /// dummies and wrapping around the circular buffer.
    pub fn rate_match(&self, streams: &[Vec<u8>; 3]) -> Vec<u8> {
        for stream in streams {
            assert!(stream.len() == CODED_LEN, "Coded stream must have {} bits but got {}", CODED_LEN, stream.len());
        }
        let mut output = Vec::with_capacity(ENCODED_BITS);
        let mut k = self.selection_start();
        while output.len() < ENCODED_BITS {
            if let Some((stream, position)) = self.buffer_map[k] {
                output.push(streams[stream][position]);
            }
            k = (k + 1) % self.buffer_map.len();
        }
        output
    }

    /// Reverses the selection: soft decisions are accumulated back into the
    /// three coded streams, so repeated positions combine.
    pub fn rate_dematch(&self, soft: &[i8]) -> [Vec<i32>; 3] {
        assert!(soft.len() == ENCODED_BITS, "Selection must have {} soft bits but got {}", ENCODED_BITS, soft.len());
        let mut streams = [vec![0i32; CODED_LEN], vec![0i32; CODED_LEN], vec![0i32; CODED_LEN]];
        let mut k = self.selection_start();
        let mut taken = 0;
        while taken < soft.len() {
            if let Some((stream, position)) = self.buffer_map[k] {
                streams[stream][position] += soft[taken] as i32;
                taken += 1;
            }
            k = (k + 1) % self.buffer_map.len();
        }
        streams
    }
}

impl Default for RateMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn buffer_map_is_a_permutation_with_dummies() {
        let matcher = RateMatcher::new();
        assert_eq!(matcher.rows, 45);
        assert_eq!(matcher.buffer_map.len(), 3 * 1440);

        let mut seen = vec![false; 3 * CODED_LEN];
        let mut dummies = 0;
        for entry in &matcher.buffer_map {
            match entry {
                Some((stream, position)) => {
                    let flat = stream * CODED_LEN + position;
                    assert!(!seen[flat], "stream {} position {} mapped twice", stream, position);
                    seen[flat] = true;
                }
                None => dummies += 1,
            }
        }
        assert!(seen.iter().all(|s| *s));
        assert_eq!(dummies, 3 * 28);
    }

    #[test]
    fn selection_wraps_and_repeats() {
        // 7200 selected bits from 3*1412 coded bits: every position appears
        // at least once.
        let matcher = RateMatcher::new();
        let streams = [vec![1u8; CODED_LEN], vec![0u8; CODED_LEN], vec![1u8; CODED_LEN]];
        let selected = matcher.rate_match(&streams);
        assert_eq!(selected.len(), ENCODED_BITS);
    }

    #[test]
    fn dematch_recovers_signs_of_matched_bits() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let matcher = RateMatcher::new();
        let streams = [
            (0..CODED_LEN).map(|_| rng.gen_range(0..2u8)).collect::<Vec<u8>>(),
            (0..CODED_LEN).map(|_| rng.gen_range(0..2u8)).collect::<Vec<u8>>(),
            (0..CODED_LEN).map(|_| rng.gen_range(0..2u8)).collect::<Vec<u8>>(),
        ];
        let selected = matcher.rate_match(&streams);
        let soft: Vec<i8> = selected.iter().map(|bit| (*bit as i8) * 2 - 1).collect();
        let recovered = matcher.rate_dematch(&soft);
        for (stream, original) in recovered.iter().zip(&streams) {
            for (acc, bit) in stream.iter().zip(original) {
                assert!(*acc != 0, "every position is selected at least once");
                assert_eq!(*acc > 0, *bit == 1);
            }
        }
    }
}
