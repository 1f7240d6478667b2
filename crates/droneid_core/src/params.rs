/// Describes one OFDM symbol slot within a broadcast burst.
/// The burst is a fixed schedule of 8 slots; every slot carries a cyclic
/// prefix followed by the FFT-sized symbol body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolSpan {
    /// Duration of the cyclic prefix in samples.
    pub cyclic_prefix: usize,
    /// Duration of the symbol body in samples (equals the FFT size).
    pub fft_size: usize,
}

impl SymbolSpan {
    pub fn total(&self) -> usize {
        self.cyclic_prefix + self.fft_size
    }
}

/// Static numerology of the drone identification broadcast at a sampling
/// frequency of 15.36MHz. All derived lengths are checked once at
/// construction; a malformed table is a programming error, not a per-burst
/// condition.
#[derive(Debug, Clone)]
pub struct BroadcastParams {
    /// FFT size of one OFDM symbol body.
    pub fft_size: usize,
    /// Per-slot cyclic prefix and body durations. Slot 7 carries the long
    /// cyclic prefix, slots 0 through 6 the short one.
    pub symbols: [SymbolSpan; 8],
    /// Width of the usable subcarrier band, including the skipped bin.
    pub band_size: usize,
    /// Number of guard bins below the usable band in the centered FFT.
    pub left_guard: usize,
    /// Band index that is never demapped (adjacent to the DC bin).
    pub skipped_bin: usize,
    /// Slots that carry the two Zadoff-Chu pilot symbols.
    pub pilot_slots: [usize; 2],
    /// Zadoff-Chu roots of the two pilot symbols.
    pub pilot_roots: [u32; 2],
    /// Number of scrambled bits carried by one burst.
    pub encoded_bits: usize,
    /// Length of each of the three rate-de-matched coded streams.
    pub coded_len: usize,
    /// Total payload size after turbo decoding.
    pub payload_bytes: usize,
    /// Leading message region of the payload.
    pub message_bytes: usize,
    /// Reserved region between the message and the frame checksum.
    pub reserved_bytes: usize,
    /// Default number of turbo decoder iterations.
    pub turbo_iterations: usize,
}

pub const SHORT_CP: usize = 72;
pub const LONG_CP: usize = 80;
pub const FFT_SIZE: usize = 1024;
pub const BAND_SIZE: usize = 601;
pub const LEFT_GUARD: usize = 212;
pub const ENCODED_BITS: usize = 7200;
pub const CODED_LEN: usize = 1412;
pub const PAYLOAD_BYTES: usize = 176;
pub const MESSAGE_BYTES: usize = 91;
pub const RESERVED_BYTES: usize = 82;
pub const CRC_BYTES: usize = 3;

impl BroadcastParams {
    pub fn new() -> Self {
        let short = SymbolSpan { cyclic_prefix: SHORT_CP, fft_size: FFT_SIZE };
        let long = SymbolSpan { cyclic_prefix: LONG_CP, fft_size: FFT_SIZE };
        let params = Self {
            fft_size: FFT_SIZE,
            symbols: [short, short, short, short, short, short, short, long],
            band_size: BAND_SIZE,
            left_guard: LEFT_GUARD,
            skipped_bin: BAND_SIZE / 2,
            pilot_slots: [2, 4],
            pilot_roots: [600, 147],
            encoded_bits: ENCODED_BITS,
            coded_len: CODED_LEN,
            payload_bytes: PAYLOAD_BYTES,
            message_bytes: MESSAGE_BYTES,
            reserved_bytes: RESERVED_BYTES,
            turbo_iterations: 4,
        };
        params.validate();
        params
    }

    fn validate(&self) {
        let data_carriers = self.band_size - 1;
        let data_symbols = self.symbols.len() - self.pilot_slots.len();
        assert!(self.left_guard + self.band_size <= self.fft_size, "Usable band must fit inside the FFT output");
        assert!(self.skipped_bin < self.band_size, "Skipped bin must lie inside the usable band");
        assert!(self.encoded_bits == data_symbols * data_carriers * 2, "Encoded bit count {} does not match {} data symbols of {} carriers", self.encoded_bits, data_symbols, data_carriers);
        assert!(self.payload_bytes == self.message_bytes + self.reserved_bytes + CRC_BYTES, "Payload layout does not add up to {} bytes", self.payload_bytes);
        assert!(self.coded_len == self.payload_bytes * 8 + 4, "Coded stream length must be the payload bit count plus 4 tail positions");
        for span in &self.symbols {
            assert!(span.fft_size == self.fft_size, "Mismatching FFT size in symbol table");
        }
        for slot in &self.pilot_slots {
            assert!(*slot < self.symbols.len(), "Pilot slot {} outside symbol table", slot);
        }
    }

    /// First sample index of a symbol slot, cyclic prefix included.
    pub fn symbol_start(&self, slot: usize) -> usize {
        self.symbols[..slot].iter().map(|s| s.total()).sum()
    }

    /// First sample index of a symbol body, cyclic prefix excluded.
    pub fn symbol_body_start(&self, slot: usize) -> usize {
        self.symbol_start(slot) + self.symbols[slot].cyclic_prefix
    }

    /// Total burst duration in samples.
    pub fn burst_len(&self) -> usize {
        self.symbols.iter().map(|s| s.total()).sum()
    }

    pub fn is_pilot_slot(&self, slot: usize) -> bool {
        self.pilot_slots.contains(&slot)
    }
}

impl Default for BroadcastParams {
    fn default() -> Self {
        Self::new()
    }
}
