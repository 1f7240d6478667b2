use burst::sync;
use droneid_core::bits::pack_msb;
use droneid_core::crc24::Crc24;
use droneid_core::frame::BroadcastMessage;
use droneid_core::gold::gold_sequence;
use droneid_core::params::BroadcastParams;
use droneid_fec::rate_match::RateMatcher;
use droneid_fec::scramble::descramble;
use droneid_fec::turbo::TurboCodec;
use droneid_ofdm::demodulator::{BurstDemodulator, DemodError};
use droneid_ofdm::derotate::derotate;
use num::complex::Complex32;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Demod(#[from] DemodError),
}

/// Outcome of decoding one burst. A structurally complete decode is still
/// returned when the frame checksum fails, so callers can inspect what was
/// received; `checksum_valid` is the authoritative verdict.
#[derive(Debug)]
pub struct DecodeResult {
    /// The 176 decoded payload bytes.
    pub payload: Vec<u8>,
    /// Parsed message region of the payload.
    pub message: BroadcastMessage,
    /// Whether the 24-bit frame checksum matched.
    pub checksum_valid: bool,
    /// Residual disagreement between the two turbo constituent decoders.
    pub turbo_disagreements: usize,
    /// Estimated fractional frequency offset, as the phase rotation over
    /// one FFT length.
    pub frequency_offset: f32,
}

/// Full per-burst decode pipeline: frequency offset estimation and
/// correction, OFDM demodulation, descrambling, rate de-matching, turbo
/// decoding and checksum validation.
pub struct BurstDecoder {
    params: BroadcastParams,
    demodulator: BurstDemodulator,
    scrambling: Vec<u8>,
    matcher: RateMatcher,
    codec: TurboCodec,
    crc: Crc24,
}

impl BurstDecoder {
    pub fn new(params: &BroadcastParams) -> Self {
        Self {
            params: params.clone(),
            demodulator: BurstDemodulator::new(params),
            scrambling: gold_sequence(),
            matcher: RateMatcher::new(),
            codec: TurboCodec::new(params.turbo_iterations),
            crc: Crc24::new(),
        }
    }

    pub fn decode(&mut self, burst: &[Complex32]) -> Result<DecodeResult, DecodeError> {
        let expected = self.params.burst_len();
        if burst.len() < expected {
            return Err(DemodError::ShortBurst { got: burst.len(), expected }.into());
        }
        let mut samples = burst[..expected].to_vec();

        let ffo = sync::fractional_frequency_offset(
            (0..self.params.symbols.len()).map(|slot| {
                let start = self.params.symbol_start(slot);
                let span = self.params.symbols[slot];
                (&samples[start..start + span.total()], span.cyclic_prefix)
            }),
            self.params.fft_size,
        );
        log::debug!("fractional frequency offset {:.4} rad per fft length", ffo);
        derotate(&mut samples, ffo, self.params.fft_size);

        let hard_bits = self.demodulator.demodulate(&samples)?;
        let soft_bits = descramble(&hard_bits, &self.scrambling);
        let [d0, d1, d2] = self.matcher.rate_dematch(&soft_bits);
        let decoded = self.codec.decode(&d0, &d1, &d2);

        let payload = pack_msb(&decoded.bits);
        let checksum_valid = self.crc.validate_payload(&payload);
        let message = BroadcastMessage::parse(&payload);
        Ok(DecodeResult {
            payload,
            message,
            checksum_valid,
            turbo_disagreements: decoded.disagreements,
            frequency_offset: ffo,
        })
    }
}

/// Estimated signal to noise ratio of a captured burst in dB: RMS power of
/// a window inside the first pilot symbol against a window at the burst
/// head. Returns `None` when the burst is too short for both windows or the
/// head carries no measurable noise power.
pub fn burst_snr(burst: &[Complex32]) -> Option<f32> {
    const NOISE_WINDOW: usize = 100;
    const SIGNAL_OFFSET: usize = 2300;
    const SIGNAL_WINDOW: usize = 1080;
    if burst.len() < SIGNAL_OFFSET + SIGNAL_WINDOW {
        return None;
    }
    let noise = rms_power(&burst[..NOISE_WINDOW]);
    if noise <= 0.0 {
        return None;
    }
    let signal = rms_power(&burst[SIGNAL_OFFSET..SIGNAL_OFFSET + SIGNAL_WINDOW]);
    Some(20.0 * ((signal - noise) / noise).log10())
}

fn rms_power(samples: &[Complex32]) -> f32 {
    let sum: f32 = samples.iter().map(|x| x.norm_sqr()).sum();
    sum.sqrt() / samples.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snr_of_a_short_burst_is_none() {
        let burst = vec![Complex32::new(1.0, 0.0); 3000];
        assert_eq!(burst_snr(&burst), None);
    }

    #[test]
    fn snr_of_a_silent_head_is_none() {
        let burst = vec![Complex32::default(); 4000];
        assert_eq!(burst_snr(&burst), None);
    }

    #[test]
    fn snr_grows_with_signal_power() {
        let mut burst = vec![Complex32::new(0.01, 0.0); 4000];
        for value in &mut burst[2300..3380] {
            *value = Complex32::new(1.0, 0.0);
        }
        let strong = burst_snr(&burst);
        for value in &mut burst[2300..3380] {
            *value = Complex32::new(0.1, 0.0);
        }
        let weak = burst_snr(&burst);
        assert!(strong > weak);
        assert!(weak > Some(0.0));
    }
}
