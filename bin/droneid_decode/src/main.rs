use anyhow::{ensure, Context, Result};
use burst::sync::fractional_time_of_arrival;
use burst::trigger::{BurstDetector, DetectorOutput};
use clap::Parser;
use droneid_core::params::BroadcastParams;
use droneid_rx::decoder::{burst_snr, BurstDecoder};
use droneid_rx::matched_filter::trigger_signals;
use num::complex::Complex32;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(about = "Decode drone identification bursts from a raw I/Q capture")]
struct Args {
    /// Capture file of interleaved 32bit float I/Q pairs sampled at 15.36MHz
    input: PathBuf,
    /// Detection threshold on the normalized pilot correlation, between 0 and 1
    #[arg(long, default_value_t = 0.5)]
    threshold: f32,
    /// Number of turbo decoder iterations per burst
    #[arg(long, default_value_t = 4)]
    iterations: usize,
    /// Samples fed to the burst detector per processing window
    #[arg(long, default_value_t = 65536)]
    window: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    ensure!(args.window > 0, "processing window must be nonzero");

    let mut params = BroadcastParams::new();
    params.turbo_iterations = args.iterations;

    let samples = read_capture(&args.input)?;
    log::info!("loaded {} samples from {}", samples.len(), args.input.display());

    let (trig_a, trig_b) = trigger_signals(&samples, &params);
    let mut detector = BurstDetector::new(args.threshold, params.burst_len());
    let mut decoder = BurstDecoder::new(&params);

    let mut valid = 0usize;
    let mut invalid = 0usize;
    let mut pos = 0usize;
    while pos < samples.len() {
        let end = (pos + args.window).min(samples.len());
        let mut cursor = pos;
        while cursor < end {
            let (consumed, output) = detector.process(&samples[cursor..end], &trig_a[cursor..end], &trig_b[cursor..end]);
            cursor += consumed;
            if output == DetectorOutput::BurstReady {
                let start = cursor - params.burst_len();
                if handle_burst(&mut decoder, detector.burst(), &trig_a, start) {
                    valid += 1;
                } else {
                    invalid += 1;
                }
            }
        }
        pos = end;
    }

    log::info!("{} bursts detected: {} valid, {} invalid", detector.total_bursts, valid, invalid);
    Ok(())
}

/// Decodes one captured burst and logs the outcome. Returns whether the
/// frame checksum matched.
fn handle_burst(decoder: &mut BurstDecoder, burst: &[Complex32], trig_a: &[f32], start: usize) -> bool {
    let snr = burst_snr(burst).unwrap_or(f32::NAN);
    if start > 0 && start + 1 < trig_a.len() {
        match fractional_time_of_arrival([trig_a[start - 1], trig_a[start], trig_a[start + 1]]) {
            // The fit is anchored on the sample before the trigger, so the
            // offset from the detected start is one less than the vertex.
            Ok(frac) => log::debug!("burst at sample {} (toa {:+.3}, snr {:.1} dB)", start, frac - 1.0, snr),
            Err(err) => log::debug!("burst at sample {} (snr {:.1} dB, {})", start, snr, err),
        }
    }

    let result = match decoder.decode(burst) {
        Ok(result) => result,
        Err(err) => {
            log::warn!("burst at sample {}: {}", start, err);
            return false;
        }
    };
    if !result.checksum_valid {
        log::warn!(
            "burst at sample {}: checksum failed (snr {:.1} dB, ffo {:+.4}, turbo residual {})",
            start, snr, result.frequency_offset, result.turbo_disagreements,
        );
        return false;
    }
    let message = &result.message;
    log::info!(
        "seq {} serial {:?} product {} uav {:.6},{:.6} height {:.0}m alt {:.1}m yaw {:.1} pilot {:.6},{:.6} (snr {:.1} dB, ffo {:+.4})",
        message.sequence_num,
        message.serial,
        message.product_name().unwrap_or("unknown"),
        message.uav_latitude,
        message.uav_longitude,
        message.uav_height_m,
        message.uav_altitude_m,
        message.uav_yaw_deg,
        message.pilot_latitude,
        message.pilot_longitude,
        snr,
        result.frequency_offset,
    );
    true
}

/// Reads a flat binary capture of interleaved little-endian f32 I/Q pairs.
fn read_capture(path: &Path) -> Result<Vec<Complex32>> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    ensure!(bytes.len() % 8 == 0, "capture is not whole I/Q pairs: {} bytes", bytes.len());
    Ok(bytes
        .chunks_exact(8)
        .map(|pair| {
            let re = f32::from_le_bytes([pair[0], pair[1], pair[2], pair[3]]);
            let im = f32::from_le_bytes([pair[4], pair[5], pair[6], pair[7]]);
            Complex32::new(re, im)
        })
        .collect())
}
