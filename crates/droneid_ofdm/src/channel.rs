use crate::zc;
use droneid_core::params::BAND_SIZE;
use num::complex::Complex32;

/// Symmetric smoothing taps applied across neighbouring subcarriers,
/// normalized to unit sum so a flat channel stays flat.
const SMOOTHING_TAPS: [f32; 7] = [0.2, 0.3, 0.4, 0.5, 0.4, 0.3, 0.2];

/// Estimates the channel from the centered FFT of a pilot symbol: each of
/// the 601 usable subcarriers is divided by the known Zadoff-Chu phase of
/// the given root, then the raw estimates are smoothed.
pub fn estimate(pilot_spectrum: &[Complex32], root: u32) -> Vec<Complex32> {
    assert!(pilot_spectrum.len() == BAND_SIZE, "Pilot band must have {} subcarriers but got {}", BAND_SIZE, pilot_spectrum.len());
    let phases = zc::reference_phases(root);
    let mut h: Vec<Complex32> = pilot_spectrum
        .iter()
        .zip(&phases)
        .map(|(received, reference)| received / reference)
        .collect();
    smooth(&mut h);
    h
}

/// Smooths the interior subcarriers `[3, 597)` against an unmodified copy
/// of the raw estimates. The three estimates at each band edge are kept raw.
fn smooth(h: &mut [Complex32]) {
    let tap_sum: f32 = SMOOTHING_TAPS.iter().sum();
    let raw = h.to_vec();
    for k in 3..BAND_SIZE - 4 {
        let mut acc = Complex32::default();
        for (tap, value) in SMOOTHING_TAPS.iter().zip(&raw[k - 3..k + 4]) {
            acc += *value * (tap / tap_sum);
        }
        h[k] = acc;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_channel_stays_flat() {
        let c = Complex32::new(0.7, -1.3);
        let mut h = vec![c; BAND_SIZE];
        smooth(&mut h);
        for value in &h {
            assert!((value - c).norm() < 1e-5);
        }
    }

    #[test]
    fn edges_keep_raw_estimates() {
        let mut h = vec![Complex32::new(1.0, 0.0); BAND_SIZE];
        h[0] = Complex32::new(5.0, 0.0);
        h[600] = Complex32::new(-5.0, 0.0);
        let expected_first = h[0];
        let expected_last = h[600];
        smooth(&mut h);
        assert_eq!(h[0], expected_first);
        assert_eq!(h[600], expected_last);
        assert_eq!(h[597], Complex32::new(1.0, 0.0));
    }

    #[test]
    fn smoothing_reads_raw_neighbours() {
        // An impulse must spread symmetrically; in-place smoothing would
        // drag the impulse along the sweep direction.
        let mut h = vec![Complex32::default(); BAND_SIZE];
        h[300] = Complex32::new(2.3, 0.0);
        smooth(&mut h);
        assert!((h[297] - h[303]).norm() < 1e-6);
        assert!((h[298] - h[302]).norm() < 1e-6);
        assert!((h[300].re - 0.5).abs() < 1e-6);
    }

    #[test]
    fn ideal_pilot_estimates_unity_channel() {
        let spectrum = zc::reference_phases(147);
        let h = estimate(&spectrum, 147);
        for value in &h {
            assert!((value - Complex32::new(1.0, 0.0)).norm() < 1e-4);
        }
    }
}
