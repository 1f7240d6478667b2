use droneid_core::params::{CODED_LEN, PAYLOAD_BYTES};

/// Number of information bits in one code block.
pub const BLOCK_BITS: usize = PAYLOAD_BYTES * 8;
/// Quadratic permutation polynomial coefficients for a 1408-bit block.
const QPP_F1: usize = 43;
const QPP_F2: usize = 88;
/// Trellis states of one constituent encoder.
const STATES: usize = 8;
/// Tail steps driving each constituent encoder back to the zero state.
const TAIL_STEPS: usize = 3;

const NEG: f32 = -1.0e30;
/// States below this metric are treated as unreachable. Normalization can
/// shift the sentinel slightly, so the cutoff sits well above it.
const UNREACHABLE: f32 = -1.0e29;

/// One constituent recursive encoder step: feedback taps at registers 2 and
/// 3, parity taps at registers 1 and 3. Returns the next state and the
/// parity bit.
fn trellis_step(state: usize, input: u8) -> (usize, u8) {
    let r1 = (state & 1) as u8;
    let r2 = ((state >> 1) & 1) as u8;
    let r3 = ((state >> 2) & 1) as u8;
    let a = input ^ r2 ^ r3;
    let parity = a ^ r1 ^ r3;
    let next = (a as usize) | ((r1 as usize) << 1) | ((r2 as usize) << 2);
    (next, parity)
}

/// Tail input that zeroes the feedback of a state.
fn tail_input(state: usize) -> u8 {
    (((state >> 1) & 1) ^ ((state >> 2) & 1)) as u8
}

/// Decoder result: the hard information bits and the number of positions
/// where the two constituent decoders still disagreed after the final
/// iteration. Zero means a confident decode; the frame checksum remains
/// authoritative either way.
pub struct TurboDecodeOutput {
    pub bits: Vec<u8>,
    pub disagreements: usize,
}

/// Rate-1/3 parallel concatenated turbo codec over a fixed 1408-bit block:
/// two 8-state recursive systematic encoders joined by a quadratic
/// permutation interleaver, decoded with iterative max-log-MAP.
pub struct TurboCodec {
    interleaver: Vec<usize>,
    iterations: usize,
}

impl TurboCodec {
    pub fn new(iterations: usize) -> Self {
        assert!(iterations > 0, "Turbo decoding needs at least one iteration");
        let k = BLOCK_BITS as u64;
        let interleaver: Vec<usize> = (0..BLOCK_BITS as u64)
            .map(|i| ((QPP_F1 as u64 * i + QPP_F2 as u64 * i * i) % k) as usize)
            .collect();
        Self { interleaver, iterations }
    }

    /// Encodes 1408 information bits into three 1412-bit streams:
    /// systematic, first parity and second parity, with the twelve
    /// termination bits multiplexed over the last four positions of each.
    pub fn encode(&self, bits: &[u8]) -> [Vec<u8>; 3] {
        assert!(bits.len() == BLOCK_BITS, "Code block must have {} bits but got {}", BLOCK_BITS, bits.len());

        let interleaved: Vec<u8> = self.interleaver.iter().map(|&i| bits[i]).collect();
        let (parity1, tail1) = Self::constituent_encode(bits);
        let (parity2, tail2) = Self::constituent_encode(&interleaved);

        let mut d0 = bits.to_vec();
        let mut d1 = parity1;
        let mut d2 = parity2;
        // Termination multiplex: (x, z) tail pairs of both encoders spread
        // over the last four positions of the three streams.
        let [(x0, z0), (x1, z1), (x2, z2)] = tail1;
        let [(xi0, zi0), (xi1, zi1), (xi2, zi2)] = tail2;
        d0.extend_from_slice(&[x0, z1, xi0, zi1]);
        d1.extend_from_slice(&[z0, x2, zi0, xi2]);
        d2.extend_from_slice(&[x1, z2, xi1, zi2]);
        debug_assert!(d0.len() == CODED_LEN && d1.len() == CODED_LEN && d2.len() == CODED_LEN);
        [d0, d1, d2]
    }

    /// Runs one constituent encoder over a block, returning the parity bits
    /// and the three (input, parity) tail pairs of the termination.
    fn constituent_encode(bits: &[u8]) -> (Vec<u8>, [(u8, u8); TAIL_STEPS]) {
        let mut state = 0usize;
        let parity: Vec<u8> = bits
            .iter()
            .map(|&bit| {
                let (next, z) = trellis_step(state, bit);
                state = next;
                z
            })
            .collect();

        let mut tail = [(0u8, 0u8); TAIL_STEPS];
        for pair in &mut tail {
            let input = tail_input(state);
            let (next, z) = trellis_step(state, input);
            *pair = (input, z);
            state = next;
        }
        debug_assert!(state == 0, "Termination must return the encoder to the zero state");
        (parity, tail)
    }

    /// Decodes the three soft streams produced by the rate de-matcher.
    /// Positive soft values stand for a logical one.
    pub fn decode(&self, d0: &[i32], d1: &[i32], d2: &[i32]) -> TurboDecodeOutput {
        assert!(d0.len() == CODED_LEN && d1.len() == CODED_LEN && d2.len() == CODED_LEN, "Coded streams must have {} soft bits", CODED_LEN);

        let sys1: Vec<f32> = d0[..BLOCK_BITS].iter().map(|&x| x as f32).collect();
        let par1: Vec<f32> = d1[..BLOCK_BITS].iter().map(|&x| x as f32).collect();
        let sys2: Vec<f32> = self.interleaver.iter().map(|&i| d0[i] as f32).collect();
        let par2: Vec<f32> = d2[..BLOCK_BITS].iter().map(|&x| x as f32).collect();

        // Demultiplex the termination positions back into per-decoder
        // (systematic, parity) tail triples.
        let k = BLOCK_BITS;
        let tail_sys1 = [d0[k] as f32, d2[k] as f32, d1[k + 1] as f32];
        let tail_par1 = [d1[k] as f32, d0[k + 1] as f32, d2[k + 1] as f32];
        let tail_sys2 = [d0[k + 2] as f32, d2[k + 2] as f32, d1[k + 3] as f32];
        let tail_par2 = [d1[k + 2] as f32, d0[k + 3] as f32, d2[k + 3] as f32];

        let mut extrinsic1 = vec![0.0f32; BLOCK_BITS];
        let mut extrinsic2_deint = vec![0.0f32; BLOCK_BITS];
        let mut llr1 = vec![0.0f32; BLOCK_BITS];
        let mut llr2_deint = vec![0.0f32; BLOCK_BITS];

        for _ in 0..self.iterations {
            let llr = Self::max_log_map(&sys1, &par1, &tail_sys1, &tail_par1, &extrinsic2_deint);
            for i in 0..BLOCK_BITS {
                extrinsic1[i] = llr[i] - extrinsic2_deint[i] - 2.0 * sys1[i];
                llr1[i] = llr[i];
            }

            let apriori2: Vec<f32> = self.interleaver.iter().map(|&i| extrinsic1[i]).collect();
            let llr = Self::max_log_map(&sys2, &par2, &tail_sys2, &tail_par2, &apriori2);
            for (position, &i) in self.interleaver.iter().enumerate() {
                extrinsic2_deint[i] = llr[position] - apriori2[position] - 2.0 * sys2[position];
                llr2_deint[i] = llr[position];
            }
        }

        let bits: Vec<u8> = llr2_deint.iter().map(|&l| (l > 0.0) as u8).collect();
        let disagreements = llr1
            .iter()
            .zip(&llr2_deint)
            .filter(|(a, b)| (**a > 0.0) != (**b > 0.0))
            .count();
        if disagreements > 0 {
            log::debug!("constituent decoders disagree on {} of {} bits", disagreements, BLOCK_BITS);
        }
        TurboDecodeOutput { bits, disagreements }
    }

    /// Max-log-MAP over one constituent code. Returns the a posteriori
    /// log-likelihood ratio of every information bit, positive for one.
    fn max_log_map(sys: &[f32], par: &[f32], tail_sys: &[f32; TAIL_STEPS], tail_par: &[f32; TAIL_STEPS], apriori: &[f32]) -> Vec<f32> {
        let steps = BLOCK_BITS + TAIL_STEPS;

        // Branch metric of a transition with information value u and parity
        // value z (both in {-1,+1}).
        let data_gamma = |k: usize, u: f32, z: f32| u * (0.5 * apriori[k] + sys[k]) + z * par[k];
        let tail_gamma = |k: usize, u: f32, z: f32| u * tail_sys[k - BLOCK_BITS] + z * tail_par[k - BLOCK_BITS];

        // Forward recursion.
        let mut alpha = vec![[NEG; STATES]; steps + 1];
        alpha[0][0] = 0.0;
        for k in 0..steps {
            for state in 0..STATES {
                if alpha[k][state] < UNREACHABLE {
                    continue;
                }
                let inputs: &[u8] = if k < BLOCK_BITS { &[0, 1] } else { &[tail_input(state)] };
                for &input in inputs {
                    let (next, parity) = trellis_step(state, input);
                    let u = (input as f32) * 2.0 - 1.0;
                    let z = (parity as f32) * 2.0 - 1.0;
                    let gamma = if k < BLOCK_BITS { data_gamma(k, u, z) } else { tail_gamma(k, u, z) };
                    let candidate = alpha[k][state] + gamma;
                    if candidate > alpha[k + 1][next] {
                        alpha[k + 1][next] = candidate;
                    }
                }
            }
            // Normalization keeps the metrics bounded.
            let peak = alpha[k + 1].iter().cloned().fold(NEG, f32::max);
            for value in &mut alpha[k + 1] {
                *value -= peak;
            }
        }

        // Backward recursion; the trellis terminates in the zero state.
        let mut beta = vec![[NEG; STATES]; steps + 1];
        beta[steps][0] = 0.0;
        for k in (0..steps).rev() {
            for state in 0..STATES {
                let inputs: &[u8] = if k < BLOCK_BITS { &[0, 1] } else { &[tail_input(state)] };
                for &input in inputs {
                    let (next, parity) = trellis_step(state, input);
                    if beta[k + 1][next] < UNREACHABLE {
                        continue;
                    }
                    let u = (input as f32) * 2.0 - 1.0;
                    let z = (parity as f32) * 2.0 - 1.0;
                    let gamma = if k < BLOCK_BITS { data_gamma(k, u, z) } else { tail_gamma(k, u, z) };
                    let candidate = beta[k + 1][next] + gamma;
                    if candidate > beta[k][state] {
                        beta[k][state] = candidate;
                    }
                }
            }
            let peak = beta[k].iter().cloned().fold(NEG, f32::max);
            for value in &mut beta[k] {
                *value -= peak;
            }
        }

        // A posteriori LLR of the information bits.
        let mut llr = vec![0.0f32; BLOCK_BITS];
        for (k, llr_k) in llr.iter_mut().enumerate() {
            let mut best = [NEG; 2];
            for state in 0..STATES {
                if alpha[k][state] < UNREACHABLE {
                    continue;
                }
                for input in [0u8, 1] {
                    let (next, parity) = trellis_step(state, input);
                    let u = (input as f32) * 2.0 - 1.0;
                    let z = (parity as f32) * 2.0 - 1.0;
                    let metric = alpha[k][state] + data_gamma(k, u, z) + beta[k + 1][next];
                    if metric > best[input as usize] {
                        best[input as usize] = metric;
                    }
                }
            }
            *llr_k = best[1] - best[0];
        }
        llr
    }
}
