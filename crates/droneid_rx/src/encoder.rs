use droneid_core::bits::unpack_msb;
use droneid_core::crc24::Crc24;
use droneid_core::gold::gold_sequence;
use droneid_core::params::BroadcastParams;
use droneid_fec::rate_match::RateMatcher;
use droneid_fec::scramble::scramble;
use droneid_fec::turbo::TurboCodec;
use droneid_ofdm::zc;
use num::complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Forward path used to produce test vectors: seals, encodes and scrambles
/// a payload, and can synthesize the complete baseband burst the receiver
/// expects on the air.
pub struct BurstEncoder {
    params: BroadcastParams,
    scrambling: Vec<u8>,
    matcher: RateMatcher,
    codec: TurboCodec,
    crc: Crc24,
    ifft: Arc<dyn Fft<f32>>,
}

impl BurstEncoder {
    pub fn new(params: &BroadcastParams) -> Self {
        let mut planner = FftPlanner::new();
        let ifft = planner.plan_fft_inverse(params.fft_size);
        Self {
            params: params.clone(),
            scrambling: gold_sequence(),
            matcher: RateMatcher::new(),
            codec: TurboCodec::new(1),
            crc: Crc24::new(),
            ifft,
        }
    }

    /// Overwrites the final 3 payload bytes with the frame checksum.
    pub fn seal_payload(&self, payload: &mut [u8]) {
        self.crc.seal_payload(payload);
    }

    /// Encodes a sealed 176-byte payload into the 7200 scrambled bits of
    /// one burst: turbo encoding, rate matching, then scrambling.
    pub fn encoded_bits(&self, payload: &[u8]) -> Vec<u8> {
        assert!(payload.len() == self.params.payload_bytes, "Payload must be {} bytes but got {}", self.params.payload_bytes, payload.len());
        let information = unpack_msb(payload);
        let streams = self.codec.encode(&information);
        let selected = self.matcher.rate_match(&streams);
        scramble(&selected, &self.scrambling)
    }

    /// Synthesizes the full baseband burst for a sealed payload: QPSK data
    /// symbols and the two Zadoff-Chu pilots, each inverse transformed and
    /// prefixed with its cyclic prefix.
    pub fn synthesize_burst(&self, payload: &[u8]) -> Vec<Complex32> {
        let bits = self.encoded_bits(payload);
        let symbols = qpsk_map(&bits);

        let mut burst = Vec::with_capacity(self.params.burst_len());
        let mut next_symbol = 0;
        for slot in 0..self.params.symbols.len() {
            let body = if self.params.is_pilot_slot(slot) {
                let root = if slot == self.params.pilot_slots[0] {
                    self.params.pilot_roots[0]
                } else {
                    self.params.pilot_roots[1]
                };
                zc::time_sequence(root)
            } else {
                let carriers = self.params.band_size - 1;
                let body = self.data_symbol_body(&symbols[next_symbol..next_symbol + carriers]);
                next_symbol += carriers;
                body
            };
            let cp_len = self.params.symbols[slot].cyclic_prefix;
            burst.extend_from_slice(&body[body.len() - cp_len..]);
            burst.extend_from_slice(&body);
        }
        debug_assert!(next_symbol == symbols.len());
        burst
    }

    /// Inverse transforms one data symbol: constellation points placed on
    /// the usable band of the centered spectrum with the DC-adjacent bin
    /// left empty.
    fn data_symbol_body(&self, symbols: &[Complex32]) -> Vec<Complex32> {
        let fft_size = self.params.fft_size;
        let mut spectrum = vec![Complex32::default(); fft_size];
        let mut source = symbols.iter();
        for k in 0..self.params.band_size {
            if k == self.params.skipped_bin {
                continue;
            }
            // The iterator holds exactly band_size - 1 points.
            if let Some(point) = source.next() {
                spectrum[self.params.left_guard + k] = *point;
            }
        }
        spectrum.rotate_left(fft_size / 2);
        self.ifft.process(&mut spectrum);
        let scale = 1.0 / fft_size as f32;
        for value in &mut spectrum {
            *value *= scale;
        }
        spectrum
    }
}

/// Maps bit pairs onto QPSK constellation points with an amplitude of
/// `sqrt(0.5)`: a zero bit maps to the positive component.
pub fn qpsk_map(bits: &[u8]) -> Vec<Complex32> {
    assert!(bits.len() % 2 == 0, "QPSK mapping needs an even number of bits");
    let amplitude = 0.5f32.sqrt();
    bits.chunks_exact(2)
        .map(|pair| {
            let re = 1.0 - 2.0 * pair[0] as f32;
            let im = 1.0 - 2.0 * pair[1] as f32;
            Complex32::new(re, im) * amplitude
        })
        .collect()
}
