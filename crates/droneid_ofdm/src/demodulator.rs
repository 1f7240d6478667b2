use crate::channel;
use droneid_core::params::BroadcastParams;
use itertools::izip;
use num::complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DemodError {
    #[error("burst of {got} samples is shorter than the {expected} sample schedule")]
    ShortBurst { got: usize, expected: usize },
}

/// Demodulates one captured burst into hard bits: per-slot FFT with
/// centering, channel estimation from the two pilot slots, equalization and
/// QPSK demapping of the six data slots.
pub struct BurstDemodulator {
    pub params: BroadcastParams,
    fft: Arc<dyn Fft<f32>>,
    fft_buffer: Vec<Complex32>,
    spectrum_buffer: Vec<Complex32>,
    /// Equalized constellation points of the last demodulated burst, in
    /// slot then subcarrier order. Useful for plotting and diagnostics.
    pub constellation: Vec<Complex32>,
}

impl BurstDemodulator {
    pub fn new(params: &BroadcastParams) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(params.fft_size);
        Self {
            params: params.clone(),
            fft,
            fft_buffer: vec![Complex32::default(); params.fft_size],
            spectrum_buffer: vec![Complex32::default(); params.fft_size],
            constellation: Vec::with_capacity(params.encoded_bits / 2),
        }
    }

    /// Demodulates the burst into `encoded_bits` hard bits (0 or 1), two per
    /// data subcarrier, in slot then subcarrier order.
    pub fn demodulate(&mut self, burst: &[Complex32]) -> Result<Vec<u8>, DemodError> {
        let expected = self.params.burst_len();
        if burst.len() < expected {
            return Err(DemodError::ShortBurst { got: burst.len(), expected });
        }

        let [pilot_a, pilot_b] = self.params.pilot_slots;
        let [root_a, root_b] = self.params.pilot_roots;
        let estimate_a = channel::estimate(self.usable_band(burst, pilot_a), root_a);
        let estimate_b = channel::estimate(self.usable_band(burst, pilot_b), root_b);
        // The data slot between the pilots sees both reference regions, so
        // it is equalized against the sum of the two estimates.
        let estimate_sum: Vec<Complex32> = izip!(&estimate_a, &estimate_b).map(|(a, b)| a + b).collect();

        let mut bits = Vec::with_capacity(self.params.encoded_bits);
        let mut constellation = Vec::with_capacity(self.params.encoded_bits / 2);
        for slot in 0..self.params.symbols.len() {
            if self.params.is_pilot_slot(slot) {
                continue;
            }
            let estimate = if slot < pilot_a {
                &estimate_a
            } else if slot < pilot_b {
                &estimate_sum
            } else {
                &estimate_b
            };
            let skipped_bin = self.params.skipped_bin;
            let band = self.usable_band(burst, slot);
            for (k, (received, h)) in izip!(band, estimate).enumerate() {
                if k == skipped_bin {
                    continue;
                }
                let equalized = received / h;
                constellation.push(equalized);
                bits.push(demap_component(equalized.re));
                bits.push(demap_component(equalized.im));
            }
        }
        self.constellation = constellation;
        Ok(bits)
    }

    /// FFTs the body of a symbol slot, centers the spectrum and returns the
    /// usable 601-subcarrier band.
    fn usable_band(&mut self, burst: &[Complex32], slot: usize) -> &[Complex32] {
        let fft_size = self.params.fft_size;
        let body_start = self.params.symbol_body_start(slot);
        self.fft_buffer.copy_from_slice(&burst[body_start..body_start + fft_size]);
        self.fft.process(&mut self.fft_buffer);

        // Centering: bin 0 of the output is the most negative frequency.
        let half = fft_size / 2;
        for i in 0..fft_size {
            self.spectrum_buffer[i] = self.fft_buffer[(i + half) % fft_size];
        }
        let left_guard = self.params.left_guard;
        &self.spectrum_buffer[left_guard..left_guard + self.params.band_size]
    }
}

/// Maps one QPSK component to a hard bit. Positive maps to 0; zero takes
/// the negative branch.
fn demap_component(value: f32) -> u8 {
    if value > 0.0 {
        0
    } else {
        1
    }
}
