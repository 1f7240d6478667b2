use droneid_core::params::BroadcastParams;
use droneid_ofdm::zc;
use num::complex::Complex32;

/// Normalized matched-filter outputs against the two Zadoff-Chu pilots,
/// shifted so that both signals peak at the first sample of a burst. Values
/// lie in `[0, 1]`; a clean pilot alignment scores close to 1.
pub fn trigger_signals(samples: &[Complex32], params: &BroadcastParams) -> (Vec<f32>, Vec<f32>) {
    let [slot_a, slot_b] = params.pilot_slots;
    let [root_a, root_b] = params.pilot_roots;
    let a = pilot_correlation(samples, root_a, params.symbol_body_start(slot_a), params.fft_size);
    let b = pilot_correlation(samples, root_b, params.symbol_body_start(slot_b), params.fft_size);
    (a, b)
}

/// Correlates the stream against one pilot's conjugated time sequence. The
/// correlation at stream index `i + body_offset` is reported at index `i`,
/// so the output peaks at the burst start rather than at the pilot body.
fn pilot_correlation(samples: &[Complex32], root: u32, body_offset: usize, span: usize) -> Vec<f32> {
    let taps = zc::matched_filter_taps(root);
    let taps_energy: f32 = taps.iter().map(|t| t.norm_sqr()).sum();
    let taps_norm = taps_energy.sqrt();

    // Sliding window energy via prefix sums, accumulated in f64 so long
    // captures do not drift.
    let mut prefix = Vec::with_capacity(samples.len() + 1);
    prefix.push(0.0f64);
    for sample in samples {
        prefix.push(prefix.last().copied().unwrap_or(0.0) + sample.norm_sqr() as f64);
    }

    let mut output = vec![0.0f32; samples.len()];
    for (i, value) in output.iter_mut().enumerate() {
        let start = i + body_offset;
        let Some(end) = start.checked_add(span) else { break };
        if end > samples.len() {
            break;
        }
        let window_energy = (prefix[end] - prefix[start]) as f32;
        if window_energy <= 0.0 {
            continue;
        }
        let correlation: Complex32 = samples[start..end].iter().zip(&taps).map(|(x, t)| x * t).sum();
        *value = correlation.norm() / (window_energy.sqrt() * taps_norm);
    }
    output
}
