use num::complex::Complex32;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SyncError {
    /// The parabolic fit has a zero quadratic term, so the three samples do
    /// not describe a usable correlation peak.
    #[error("degenerate correlation peak, no fractional time of arrival")]
    DegeneratePeak,
}

/// Correlates the cyclic prefix of one OFDM symbol against its repeated
/// tail: the sum over the first `cp_len` samples of `s[i] * conj(s[i + fft_len])`.
/// The phase of the accumulator is proportional to the fractional frequency
/// offset of the symbol.
pub fn cyclic_prefix_correlation(symbol: &[Complex32], cp_len: usize, fft_len: usize) -> Complex32 {
    assert!(symbol.len() >= cp_len + fft_len, "Symbol of {} samples is too short for cp {} + fft {}", symbol.len(), cp_len, fft_len);
    (0..cp_len).map(|i| symbol[i] * symbol[i + fft_len].conj()).sum()
}

/// Aggregates the per-symbol cyclic prefix correlations of a whole burst and
/// returns the fractional frequency offset as the phase of the sum. The
/// returned value is the phase rotation accumulated over one FFT length;
/// divide by the FFT size for radians per sample.
pub fn fractional_frequency_offset<'a, I>(symbols: I, fft_len: usize) -> f32
where
    I: IntoIterator<Item = (&'a [Complex32], usize)>,
{
    let aggregate: Complex32 = symbols
        .into_iter()
        .map(|(symbol, cp_len)| cyclic_prefix_correlation(symbol, cp_len, fft_len))
        .sum();
    aggregate.im.atan2(aggregate.re)
}

/// Fits a parabola through three correlation magnitudes around a detected
/// peak and returns the position of the true maximum relative to the first
/// sample, in [0, 2]. A symmetric peak yields exactly 1.0; subtract 1 for
/// the offset from the centre sample.
pub fn fractional_time_of_arrival(y: [f32; 3]) -> Result<f32, SyncError> {
    let a = 0.5 * (y[0] - y[2]) + y[1] - y[0];
    let b = y[1] - y[0] + a;
    if a == 0.0 {
        return Err(SyncError::DegeneratePeak);
    }
    Ok(b / (2.0 * a))
}
