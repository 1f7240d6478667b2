use crate::capture::CaptureBuffer;
use num::complex::Complex32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetectorState {
    /// Scanning the trigger signals for a simultaneous threshold crossing.
    Waiting,
    /// Copying samples into the burst buffer until it is full.
    Collecting,
}

/// Result of feeding one window into the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorOutput {
    /// The window was exhausted without completing a burst. Any partial
    /// collection is retained for the next call.
    NeedMore,
    /// A full burst is available through [`BurstDetector::burst`]. The
    /// returned consumed count tells the caller where to resume feeding.
    BurstReady,
}

/// Burst detector over a continuous sample stream. Two auxiliary trigger
/// signals accompany the samples; a burst starts at the first index where
/// both exceed the threshold and spans a fixed number of samples from there.
///
/// The detector never blocks: each call consumes what it can and remembers
/// partial collection state, so a trigger near the end of one window
/// continues seamlessly into the next.
pub struct BurstDetector {
    state: DetectorState,
    threshold: f32,
    buffer: CaptureBuffer<Complex32>,
    /// Chunk size to apply to the next burst if it was changed mid-collection.
    pending_chunk_size: Option<usize>,
    /// Total samples seen since construction.
    pub total_samples: u64,
    /// Total bursts emitted since construction.
    pub total_bursts: u64,
}

impl BurstDetector {
    pub fn new(threshold: f32, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "Chunk size must be nonzero");
        Self {
            state: DetectorState::Waiting,
            threshold,
            buffer: CaptureBuffer::new(chunk_size),
            pending_chunk_size: None,
            total_samples: 0,
            total_bursts: 0,
        }
    }

    /// Updates the trigger threshold. The threshold is only read while
    /// waiting, so a burst currently being collected is unaffected.
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    /// Updates the burst length. Takes effect immediately while waiting;
    /// during collection it is deferred to the next burst so the in-flight
    /// one completes at its original length.
    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        assert!(chunk_size > 0, "Chunk size must be nonzero");
        match self.state {
            DetectorState::Waiting => self.buffer = CaptureBuffer::new(chunk_size),
            DetectorState::Collecting => self.pending_chunk_size = Some(chunk_size),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.buffer.capacity()
    }

    /// The most recently completed burst. Valid after a `BurstReady` result
    /// until the next trigger fires.
    pub fn burst(&self) -> &[Complex32] {
        self.buffer.as_slice()
    }

    /// Feeds one window of (sample, trigger-A, trigger-B) triples.
    /// Returns the number of samples consumed and whether a burst completed.
    /// On `BurstReady` the caller should re-feed the unconsumed remainder.
    pub fn process(&mut self, samples: &[Complex32], trig_a: &[f32], trig_b: &[f32]) -> (usize, DetectorOutput) {
        assert!(samples.len() == trig_a.len() && samples.len() == trig_b.len(), "Sample and trigger windows must have equal lengths");

        match self.state {
            DetectorState::Waiting => self.scan_window(samples, trig_a, trig_b),
            DetectorState::Collecting => self.collect(samples, 0),
        }
    }

    fn scan_window(&mut self, samples: &[Complex32], trig_a: &[f32], trig_b: &[f32]) -> (usize, DetectorOutput) {
        for idx in 0..samples.len() {
            if trig_a[idx] > self.threshold && trig_b[idx] > self.threshold {
                log::debug!("trigger fired at offset {} of {} (a={:.3}, b={:.3})", idx, samples.len(), trig_a[idx], trig_b[idx]);
                if let Some(chunk_size) = self.pending_chunk_size.take() {
                    self.buffer = CaptureBuffer::new(chunk_size);
                }
                self.buffer.reset();
                self.state = DetectorState::Collecting;
                // Collection starts at the trigger index inclusive.
                return self.collect(samples, idx);
            }
        }
        // No trigger: the window is discarded.
        self.total_samples += samples.len() as u64;
        (samples.len(), DetectorOutput::NeedMore)
    }

    fn collect(&mut self, samples: &[Complex32], start: usize) -> (usize, DetectorOutput) {
        let copied = self.buffer.consume(&samples[start..]);
        let consumed = start + copied;
        self.total_samples += consumed as u64;

        if self.buffer.is_full() {
            self.state = DetectorState::Waiting;
            self.total_bursts += 1;
            log::debug!("burst {} complete ({} samples)", self.total_bursts, self.buffer.len());
            (consumed, DetectorOutput::BurstReady)
        } else {
            (consumed, DetectorOutput::NeedMore)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<Complex32> {
        (0..len).map(|i| Complex32::new(i as f32, -(i as f32))).collect()
    }

    fn quiet(len: usize) -> Vec<f32> {
        vec![0.0; len]
    }

    #[test]
    fn collects_chunk_from_trigger_index() {
        let mut detector = BurstDetector::new(0.5, 20);
        let samples = ramp(100);
        let mut trig = quiet(100);
        trig[5] = 1.0;

        let (consumed, output) = detector.process(&samples, &trig, &trig);
        assert_eq!(output, DetectorOutput::BurstReady);
        assert_eq!(consumed, 25);
        assert_eq!(detector.burst(), &samples[5..25]);
        assert_eq!(detector.total_bursts, 1);

        // The remainder of the window is a new idle period.
        let (consumed, output) = detector.process(&samples[25..], &trig[25..], &trig[25..]);
        assert_eq!(output, DetectorOutput::NeedMore);
        assert_eq!(consumed, 75);
        assert_eq!(detector.total_bursts, 1);
    }

    #[test]
    fn trigger_in_last_sample_continues_across_windows() {
        let mut detector = BurstDetector::new(0.5, 20);
        let first = ramp(100);
        let mut trig = quiet(100);
        trig[99] = 1.0;

        let (consumed, output) = detector.process(&first, &trig, &trig);
        assert_eq!(output, DetectorOutput::NeedMore);
        assert_eq!(consumed, 100);

        // Trigger signals are ignored while collecting.
        let second = ramp(50);
        let (consumed, output) = detector.process(&second, &quiet(50), &quiet(50));
        assert_eq!(output, DetectorOutput::BurstReady);
        assert_eq!(consumed, 19);

        let mut expected = vec![first[99]];
        expected.extend_from_slice(&second[..19]);
        assert_eq!(detector.burst(), &expected[..]);
    }

    #[test]
    fn both_triggers_must_fire_simultaneously() {
        let mut detector = BurstDetector::new(0.5, 4);
        let samples = ramp(10);
        let mut trig_a = quiet(10);
        let mut trig_b = quiet(10);
        trig_a[2] = 1.0;
        trig_b[7] = 1.0;

        let (consumed, output) = detector.process(&samples, &trig_a, &trig_b);
        assert_eq!(output, DetectorOutput::NeedMore);
        assert_eq!(consumed, 10);
        assert_eq!(detector.total_bursts, 0);
    }

    #[test]
    fn threshold_change_does_not_disturb_collection() {
        let mut detector = BurstDetector::new(0.5, 10);
        let samples = ramp(8);
        let mut trig = quiet(8);
        trig[0] = 1.0;

        let (_, output) = detector.process(&samples, &trig, &trig);
        assert_eq!(output, DetectorOutput::NeedMore);

        detector.set_threshold(100.0);
        detector.set_chunk_size(50);

        let tail = ramp(8);
        let (consumed, output) = detector.process(&tail, &quiet(8), &quiet(8));
        assert_eq!(output, DetectorOutput::BurstReady);
        assert_eq!(consumed, 2);
        assert_eq!(detector.burst().len(), 10);
        // The deferred chunk size applies from the next burst on.
        assert_eq!(detector.chunk_size(), 10);
        let mut trig = quiet(8);
        trig[0] = 1000.0;
        detector.process(&tail, &trig, &trig);
        assert_eq!(detector.chunk_size(), 50);
    }
}
