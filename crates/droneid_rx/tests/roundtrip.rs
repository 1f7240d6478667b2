use burst::trigger::{BurstDetector, DetectorOutput};
use droneid_core::params::{BroadcastParams, PAYLOAD_BYTES};
use droneid_rx::decoder::BurstDecoder;
use droneid_rx::encoder::BurstEncoder;
use droneid_rx::matched_filter::trigger_signals;
use num::complex::Complex32;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn sealed_payload(encoder: &BurstEncoder) -> Vec<u8> {
    let mut payload = vec![0u8; PAYLOAD_BYTES];
    payload[0] = 88;
    payload[1] = 16;
    payload[2] = 2;
    payload[3..5].copy_from_slice(&77i16.to_le_bytes());
    payload[7..15].copy_from_slice(b"Skysense");
    let scale = 1.0e7 * std::f64::consts::PI / 180.0;
    let lon = (17.961863 * scale).round() as i32;
    let lat = (59.401961 * scale).round() as i32;
    payload[23..27].copy_from_slice(&lon.to_le_bytes());
    payload[27..31].copy_from_slice(&lat.to_le_bytes());
    payload[31..33].copy_from_slice(&120i16.to_le_bytes());
    payload[67] = 63;
    encoder.seal_payload(&mut payload);
    payload
}

#[test]
fn clean_burst_roundtrip() {
    let params = BroadcastParams::new();
    let encoder = BurstEncoder::new(&params);
    let payload = sealed_payload(&encoder);
    let burst = encoder.synthesize_burst(&payload);

    let mut decoder = BurstDecoder::new(&params);
    let result = decoder.decode(&burst).unwrap();
    assert!(result.checksum_valid);
    assert_eq!(result.payload, payload);
    assert_eq!(result.turbo_disagreements, 0);
    assert_eq!(result.message.serial, "Skysense");
    assert_eq!(result.message.product_name(), Some("Mini 2"));
    assert!((result.message.uav_latitude - 59.401961).abs() < 1e-6);
    assert!(result.frequency_offset.abs() < 0.01);
}

#[test]
fn decodes_under_gain_frequency_offset_and_noise() {
    let params = BroadcastParams::new();
    let encoder = BurstEncoder::new(&params);
    let payload = sealed_payload(&encoder);
    let burst = encoder.synthesize_burst(&payload);

    let gain = Complex32::new(-0.6, 1.1);
    let offset = 0.3f32;
    let mut rng = SmallRng::seed_from_u64(0xD30);
    let impaired: Vec<Complex32> = burst
        .iter()
        .enumerate()
        .map(|(i, x)| {
            let rotation = Complex32::cis(-offset * i as f32 / params.fft_size as f32);
            let noise = Complex32::new(rng.gen_range(-1.0e-3..1.0e-3), rng.gen_range(-1.0e-3..1.0e-3));
            x * gain * rotation + noise
        })
        .collect();

    let mut decoder = BurstDecoder::new(&params);
    let result = decoder.decode(&impaired).unwrap();
    assert!(result.checksum_valid);
    assert_eq!(result.payload, payload);
    assert!((result.frequency_offset - offset).abs() < 0.05);
}

#[test]
fn detector_and_matched_filters_extract_the_burst_from_a_stream() {
    let params = BroadcastParams::new();
    let encoder = BurstEncoder::new(&params);
    let payload = sealed_payload(&encoder);
    let burst = encoder.synthesize_burst(&payload);

    let lead_in = 3000;
    let mut stream = vec![Complex32::default(); lead_in];
    stream.extend_from_slice(&burst);
    stream.extend(std::iter::repeat(Complex32::default()).take(2000));

    let (trig_a, trig_b) = trigger_signals(&stream, &params);
    let mut detector = BurstDetector::new(0.8, params.burst_len());

    let mut captured = Vec::new();
    let window = 4096;
    let mut pos = 0;
    while pos < stream.len() {
        let end = (pos + window).min(stream.len());
        let mut cursor = pos;
        while cursor < end {
            let (consumed, output) = detector.process(&stream[cursor..end], &trig_a[cursor..end], &trig_b[cursor..end]);
            cursor += consumed;
            if output == DetectorOutput::BurstReady {
                captured.push(detector.burst().to_vec());
            }
        }
        pos = end;
    }

    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].len(), params.burst_len());
    assert_eq!(captured[0][..8], burst[..8]);

    let mut decoder = BurstDecoder::new(&params);
    let result = decoder.decode(&captured[0]).unwrap();
    assert!(result.checksum_valid);
    assert_eq!(result.payload, payload);
}
