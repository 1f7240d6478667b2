use droneid_core::params::{BAND_SIZE, FFT_SIZE, LEFT_GUARD};
use num::complex::Complex32;
use rustfft::FftPlanner;
use std::f64::consts::PI;

/// The per-subcarrier phases of the Zadoff-Chu pilot with the given root,
/// `exp(-j*q*pi*k*(k+1)/601)` for k in `[0, 601)`. The phase argument is
/// evaluated in f64 since `q*k*(k+1)` exceeds f32 integer precision.
pub fn reference_phases(root: u32) -> Vec<Complex32> {
    (0..BAND_SIZE)
        .map(|k| {
            let arg = -(root as f64) * PI * (k as f64) * (k as f64 + 1.0) / (BAND_SIZE as f64);
            Complex32::new(arg.cos() as f32, arg.sin() as f32)
        })
        .collect()
}

/// The 1024-sample time-domain pilot symbol body for the given root: the
/// reference phases placed into the centered spectrum at the left guard
/// offset, DC bin zeroed, shifted back to natural bin order and inverse
/// transformed (with the 1/N convention).
pub fn time_sequence(root: u32) -> Vec<Complex32> {
    let mut spectrum = vec![Complex32::default(); FFT_SIZE];
    let phases = reference_phases(root);
    spectrum[LEFT_GUARD..LEFT_GUARD + BAND_SIZE].copy_from_slice(&phases);
    spectrum[FFT_SIZE / 2] = Complex32::default();

    // Centered to natural bin order before the inverse transform.
    spectrum.rotate_left(FFT_SIZE / 2);

    let mut planner = FftPlanner::new();
    let ifft = planner.plan_fft_inverse(FFT_SIZE);
    ifft.process(&mut spectrum);
    let scale = 1.0 / (FFT_SIZE as f32);
    for value in &mut spectrum {
        *value *= scale;
    }
    spectrum
}

/// Matched filter taps for the pilot with the given root: the conjugated
/// time sequence, so correlation peaks where the pilot body begins.
pub fn matched_filter_taps(root: u32) -> Vec<Complex32> {
    time_sequence(root).iter().map(|x| x.conj()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_phases_have_unit_magnitude() {
        for root in [600u32, 147] {
            let phases = reference_phases(root);
            assert_eq!(phases.len(), 601);
            for value in &phases {
                assert!((value.norm() - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn reference_phases_start_at_unity() {
        // k = 0 always yields a zero argument.
        let phases = reference_phases(600);
        assert!((phases[0] - Complex32::new(1.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn roots_produce_distinct_sequences() {
        let a = time_sequence(600);
        let b = time_sequence(147);
        let distance: f32 = a.iter().zip(&b).map(|(x, y)| (x - y).norm()).sum();
        assert!(distance > 1.0);
    }

    #[test]
    fn time_sequence_energy_matches_spectrum() {
        // Parseval: 600 unit carriers (DC zeroed) over a 1/N inverse
        // transform leave 600/N energy in time.
        let seq = time_sequence(147);
        let energy: f32 = seq.iter().map(|x| x.norm_sqr()).sum();
        assert!((energy - 600.0 / 1024.0).abs() < 1e-3);
    }

    #[test]
    fn matched_filter_peaks_at_alignment() {
        // With 601 of 1024 carriers occupied the lag-1 sidelobe is still
        // around half of the peak; larger lags fall off sharply.
        let seq = time_sequence(600);
        let taps = matched_filter_taps(600);
        let aligned: Complex32 = seq.iter().zip(&taps).map(|(x, t)| x * t).sum();
        let lag1: Complex32 = seq[1..].iter().zip(&taps).map(|(x, t)| x * t).sum();
        let lag8: Complex32 = seq[8..].iter().zip(&taps).map(|(x, t)| x * t).sum();
        assert!(aligned.norm() > 1.5 * lag1.norm());
        assert!(aligned.norm() > 4.0 * lag8.norm());
    }
}
