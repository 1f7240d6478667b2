use num::complex::Complex32;

// SOURCE: https://mooooo.ooo/chebyshev-sine-approximation
//         Chebyshev polynomial that approximates f(x) = sin(2*pi*x) accurately within [-0.75,+0.75]
fn fast_sine(x: f32) -> f32 {
    const A0: f32 = -25.1327419281005859375;
    const A1: f32 = 64.83582305908203125;
    const A2: f32 = -67.076629638671875;
    const A3: f32 = 38.495880126953125;
    const A4: f32 = -14.049663543701171875;
    const A5: f32 = 3.161602020263671875;

    let z = x * x;
    let b5 = A5;
    let b4 = b5 * z + A4;
    let b3 = b4 * z + A3;
    let b2 = b3 * z + A2;
    let b1 = b2 * z + A1;
    let b0 = b1 * z + A0;
    b0 * (z - 0.25) * x
}

/// Rotates each sample by `exp(+j*2*pi*i*freq_offset_normalised)`, where the
/// frequency offset is normalised to the sampling frequency.
pub fn apply_pll(x: &mut [Complex32], freq_offset_normalised: f32) {
    x.iter_mut().enumerate().for_each(|(i, x)| {
        let dt = (i as f32) * freq_offset_normalised;
        // get absolute integer offset from [-0.5,+0.5]
        // NOTE: Faster version of f32::round()
        let dt_offset = dt.abs() - 0.5;
        let dt_offset = dt_offset.ceil();
        let dt_offset = dt_offset * dt.signum();
        let dt = dt - dt_offset;
        let sin = fast_sine(dt);
        let cos = fast_sine(dt + 0.25);
        let pll = Complex32::new(cos, sin);
        *x *= pll;
    });
}

/// Removes a fractional frequency offset measured as a phase rotation over
/// one FFT length: sample i is multiplied by `exp(+j*i*ffo/fft_size)`.
pub fn derotate(samples: &mut [Complex32], ffo: f32, fft_size: usize) {
    use std::f32::consts::PI;
    let freq_offset_normalised = ffo / (2.0 * PI * fft_size as f32);
    apply_pll(samples, freq_offset_normalised);
}
