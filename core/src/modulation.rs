//! Carrier modulation: bits to a sampled sinusoid and back.
//!
//! ASK and FSK key one bit per period on a sine carrier. The phase/amplitude
//! schemes (BPSK, QPSK, 8PSK, 16-QAM) map fixed-width bit groups through a
//! static [`SymbolTable`] onto `A·cos(2π·f·t + φ)` and are detected by I/Q
//! projection followed by a nearest-constellation-point decision.

use crate::line_coding::warn_if_desynchronized;
use crate::{ASK_THRESHOLD, CARRIER_AMPLITUDE, CARRIER_FREQUENCY, SAMPLES_PER_BIT};
use std::f32::consts::PI;

/// One constellation point: bit tuple → (relative amplitude, phase in degrees)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolEntry {
    pub bits: &'static [u8],
    pub amplitude: f32,
    pub phase_deg: f32,
}

impl SymbolEntry {
    const fn new(bits: &'static [u8], amplitude: f32, phase_deg: f32) -> Self {
        Self { bits, amplitude, phase_deg }
    }

    /// Cartesian (I, Q) coordinates of this point
    pub fn iq(&self) -> (f32, f32) {
        let phase = self.phase_deg.to_radians();
        (self.amplitude * phase.cos(), self.amplitude * phase.sin())
    }
}

/// Immutable, exhaustive mapping for one carrier scheme
#[derive(Debug, Clone, Copy)]
pub struct SymbolTable {
    bits_per_symbol: usize,
    entries: &'static [SymbolEntry],
}

const BPSK_ENTRIES: [SymbolEntry; 2] = [
    SymbolEntry::new(&[0], 1.0, 0.0),
    SymbolEntry::new(&[1], 1.0, 180.0),
];

const QPSK_ENTRIES: [SymbolEntry; 4] = [
    SymbolEntry::new(&[1, 1], 1.0, 45.0),
    SymbolEntry::new(&[1, 0], 1.0, 135.0),
    SymbolEntry::new(&[0, 0], 1.0, 225.0),
    SymbolEntry::new(&[0, 1], 1.0, 315.0),
];

const PSK8_ENTRIES: [SymbolEntry; 8] = [
    SymbolEntry::new(&[0, 0, 0], 1.0, 0.0),
    SymbolEntry::new(&[0, 0, 1], 1.0, 45.0),
    SymbolEntry::new(&[1, 0, 1], 1.0, 90.0),
    SymbolEntry::new(&[1, 1, 1], 1.0, 135.0),
    SymbolEntry::new(&[0, 1, 1], 1.0, 180.0),
    SymbolEntry::new(&[0, 1, 0], 1.0, 225.0),
    SymbolEntry::new(&[1, 1, 0], 1.0, 270.0),
    SymbolEntry::new(&[1, 0, 0], 1.0, 315.0),
];

const QAM16_ENTRIES: [SymbolEntry; 16] = [
    SymbolEntry::new(&[0, 0, 0, 0], 0.33, 225.0),
    SymbolEntry::new(&[0, 0, 0, 1], 0.75, 255.0),
    SymbolEntry::new(&[0, 0, 1, 0], 0.75, 195.0),
    SymbolEntry::new(&[0, 0, 1, 1], 1.00, 225.0),
    SymbolEntry::new(&[0, 1, 0, 0], 0.33, 135.0),
    SymbolEntry::new(&[0, 1, 0, 1], 0.75, 105.0),
    SymbolEntry::new(&[0, 1, 1, 0], 0.75, 165.0),
    SymbolEntry::new(&[0, 1, 1, 1], 1.00, 135.0),
    SymbolEntry::new(&[1, 0, 0, 0], 0.33, 315.0),
    SymbolEntry::new(&[1, 0, 0, 1], 0.75, 285.0),
    SymbolEntry::new(&[1, 0, 1, 0], 0.75, 345.0),
    SymbolEntry::new(&[1, 0, 1, 1], 1.00, 315.0),
    SymbolEntry::new(&[1, 1, 0, 0], 0.33, 45.0),
    SymbolEntry::new(&[1, 1, 0, 1], 0.75, 75.0),
    SymbolEntry::new(&[1, 1, 1, 0], 0.75, 15.0),
    SymbolEntry::new(&[1, 1, 1, 1], 1.00, 45.0),
];

impl SymbolTable {
    pub const BPSK: SymbolTable = SymbolTable { bits_per_symbol: 1, entries: &BPSK_ENTRIES };
    pub const QPSK: SymbolTable = SymbolTable { bits_per_symbol: 2, entries: &QPSK_ENTRIES };
    pub const PSK8: SymbolTable = SymbolTable { bits_per_symbol: 3, entries: &PSK8_ENTRIES };
    pub const QAM16: SymbolTable = SymbolTable { bits_per_symbol: 4, entries: &QAM16_ENTRIES };

    pub fn bits_per_symbol(&self) -> usize {
        self.bits_per_symbol
    }

    pub fn entries(&self) -> &'static [SymbolEntry] {
        self.entries
    }

    pub fn lookup(&self, group: &[u8]) -> Option<&'static SymbolEntry> {
        self.entries.iter().find(|entry| entry.bits == group)
    }

    /// Entry closest to the measured (I, Q) point; ties keep the earlier entry
    pub fn nearest(&self, i: f32, q: f32) -> &'static SymbolEntry {
        let distance = |entry: &SymbolEntry| {
            let (ref_i, ref_q) = entry.iq();
            ((ref_i - i).powi(2) + (ref_q - q).powi(2)).sqrt()
        };

        let entries = self.entries;
        let mut best = &entries[0];
        let mut best_distance = distance(best);
        for entry in &entries[1..] {
            let d = distance(entry);
            if d < best_distance {
                best = entry;
                best_distance = d;
            }
        }
        best
    }
}

/// Carrier modulation scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarrierScheme {
    Ask,
    Fsk,
    Bpsk,
    Qpsk,
    Psk8,
    Qam16,
}

impl CarrierScheme {
    pub const ALL: [CarrierScheme; 6] = [
        CarrierScheme::Ask,
        CarrierScheme::Fsk,
        CarrierScheme::Bpsk,
        CarrierScheme::Qpsk,
        CarrierScheme::Psk8,
        CarrierScheme::Qam16,
    ];

    pub fn bits_per_symbol(self) -> usize {
        self.symbol_table().map_or(1, |table| table.bits_per_symbol())
    }

    /// Constellation for the table-driven schemes; `None` for ASK and FSK
    pub fn symbol_table(self) -> Option<SymbolTable> {
        match self {
            CarrierScheme::Ask | CarrierScheme::Fsk => None,
            CarrierScheme::Bpsk => Some(SymbolTable::BPSK),
            CarrierScheme::Qpsk => Some(SymbolTable::QPSK),
            CarrierScheme::Psk8 => Some(SymbolTable::PSK8),
            CarrierScheme::Qam16 => Some(SymbolTable::QAM16),
        }
    }

    /// Modulate bits onto the carrier, `SAMPLES_PER_BIT` samples per symbol
    pub fn modulate(self, bits: &[u8]) -> Vec<f32> {
        match self {
            CarrierScheme::Ask => modulate_ask(bits),
            CarrierScheme::Fsk => modulate_fsk(bits),
            _ => match self.symbol_table() {
                Some(table) => modulate_table(bits, &table),
                None => Vec::new(),
            },
        }
    }

    /// Recover bits from a carrier signal; a trailing partial period is ignored
    pub fn demodulate(self, signal: &[f32]) -> Vec<u8> {
        warn_if_desynchronized(signal.len());
        match self {
            CarrierScheme::Ask => demodulate_ask(signal),
            CarrierScheme::Fsk => demodulate_fsk(signal),
            _ => match self.symbol_table() {
                Some(table) => demodulate_table(signal, &table),
                None => Vec::new(),
            },
        }
    }
}

/// Normalised time of sample `index` within its symbol period, in [0, 1)
pub(crate) fn symbol_time(index: usize) -> f32 {
    (index % SAMPLES_PER_BIT) as f32 / SAMPLES_PER_BIT as f32
}

/// Reference carrier `sin(2π·f·t)` at sample `index`
pub(crate) fn carrier_sin(frequency: f32, index: usize) -> f32 {
    (2.0 * PI * frequency * symbol_time(index)).sin()
}

/// Split bits into `width`-bit groups, zero-padding the last one
pub fn group_bits(bits: &[u8], width: usize) -> Vec<Vec<u8>> {
    bits.chunks(width)
        .map(|chunk| {
            let mut group = chunk.to_vec();
            group.resize(width, 0);
            group
        })
        .collect()
}

fn modulate_ask(bits: &[u8]) -> Vec<f32> {
    let mut signal = Vec::with_capacity(bits.len() * SAMPLES_PER_BIT);
    for &bit in bits {
        let amplitude = if bit == 1 { CARRIER_AMPLITUDE } else { 0.0 };
        signal.extend((0..SAMPLES_PER_BIT).map(|i| amplitude * carrier_sin(CARRIER_FREQUENCY, i)));
    }
    signal
}

fn fsk_frequency(bit: u8) -> f32 {
    if bit == 1 {
        2.0 * CARRIER_FREQUENCY
    } else {
        CARRIER_FREQUENCY
    }
}

fn modulate_fsk(bits: &[u8]) -> Vec<f32> {
    let mut signal = Vec::with_capacity(bits.len() * SAMPLES_PER_BIT);
    for &bit in bits {
        let frequency = fsk_frequency(bit);
        signal.extend((0..SAMPLES_PER_BIT).map(|i| CARRIER_AMPLITUDE * carrier_sin(frequency, i)));
    }
    signal
}

fn modulate_table(bits: &[u8], table: &SymbolTable) -> Vec<f32> {
    let groups = group_bits(bits, table.bits_per_symbol());
    let mut signal = Vec::with_capacity(groups.len() * SAMPLES_PER_BIT);

    for group in groups {
        let (amplitude, phase_deg) = table
            .lookup(&group)
            .map_or((1.0, 0.0), |entry| (entry.amplitude, entry.phase_deg));
        let amplitude = CARRIER_AMPLITUDE * amplitude;
        let phase = phase_deg.to_radians();

        signal.extend((0..SAMPLES_PER_BIT).map(|i| {
            amplitude * (2.0 * PI * CARRIER_FREQUENCY * symbol_time(i) + phase).cos()
        }));
    }

    signal
}

fn demodulate_ask(signal: &[f32]) -> Vec<u8> {
    signal
        .chunks_exact(SAMPLES_PER_BIT)
        .map(|block| {
            let energy = block.iter().map(|s| s.abs()).sum::<f32>() / block.len() as f32;
            (energy > ASK_THRESHOLD) as u8
        })
        .collect()
}

fn demodulate_fsk(signal: &[f32]) -> Vec<u8> {
    signal
        .chunks_exact(SAMPLES_PER_BIT)
        .map(|block| {
            let correlate = |frequency: f32| {
                block
                    .iter()
                    .enumerate()
                    .map(|(i, &s)| s * carrier_sin(frequency, i))
                    .sum::<f32>()
            };
            let mark = correlate(fsk_frequency(1));
            let space = correlate(fsk_frequency(0));
            (mark.abs() > space.abs()) as u8
        })
        .collect()
}

/// Amplitude and phase (degrees in [0, 360)) of one symbol period, measured
/// by projecting onto `cos` (I) and `−sin` (Q) and scaling by `2 / N`.
pub fn measure_symbol(block: &[f32]) -> (f32, f32) {
    let (sum_i, sum_q) = block.iter().enumerate().fold((0.0f32, 0.0f32), |(i_acc, q_acc), (j, &s)| {
        let angle = 2.0 * PI * CARRIER_FREQUENCY * symbol_time(j);
        (i_acc + s * angle.cos(), q_acc - s * angle.sin())
    });

    let amplitude = (2.0 / SAMPLES_PER_BIT as f32) * (sum_i * sum_i + sum_q * sum_q).sqrt();
    let mut phase_deg = sum_q.atan2(sum_i).to_degrees();
    if phase_deg < 0.0 {
        phase_deg += 360.0;
    }
    (amplitude, phase_deg)
}

fn demodulate_table(signal: &[f32], table: &SymbolTable) -> Vec<u8> {
    let mut bits = Vec::with_capacity(signal.len() / SAMPLES_PER_BIT * table.bits_per_symbol());

    for block in signal.chunks_exact(SAMPLES_PER_BIT) {
        let (amplitude, phase_deg) = measure_symbol(block);
        let amplitude = amplitude / CARRIER_AMPLITUDE;
        let phase = phase_deg.to_radians();
        let entry = table.nearest(amplitude * phase.cos(), amplitude * phase.sin());
        bits.extend_from_slice(entry.bits);
    }

    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_groups(width: usize) -> Vec<Vec<u8>> {
        (0..1usize << width)
            .map(|value| (0..width).rev().map(|i| ((value >> i) & 1) as u8).collect())
            .collect()
    }

    #[test]
    fn test_tables_are_exhaustive() {
        for scheme in CarrierScheme::ALL {
            let Some(table) = scheme.symbol_table() else { continue };
            let width = table.bits_per_symbol();
            assert_eq!(table.entries().len(), 1 << width, "{:?}", scheme);
            for group in all_groups(width) {
                assert!(table.lookup(&group).is_some(), "{:?} missing {:?}", scheme, group);
            }
        }
    }

    #[test]
    fn test_group_bits_pads_last_group() {
        let groups = group_bits(&[1, 0, 1, 1, 1], 3);
        assert_eq!(groups, vec![vec![1, 0, 1], vec![1, 1, 0]]);
        assert!(group_bits(&[], 2).is_empty());
    }

    #[test]
    fn test_every_symbol_round_trips() {
        for scheme in CarrierScheme::ALL {
            for group in all_groups(scheme.bits_per_symbol()) {
                let signal = scheme.modulate(&group);
                assert_eq!(signal.len(), SAMPLES_PER_BIT);
                assert_eq!(scheme.demodulate(&signal), group, "{:?}", scheme);
            }
        }
    }

    #[test]
    fn test_bit_stream_round_trips() {
        let bits: Vec<u8> = b"QAM!"
            .iter()
            .flat_map(|byte| (0..8).rev().map(move |i| (byte >> i) & 1))
            .collect();
        for scheme in CarrierScheme::ALL {
            let signal = scheme.modulate(&bits);
            assert_eq!(signal.len(), bits.len().div_ceil(scheme.bits_per_symbol()) * SAMPLES_PER_BIT);
            let recovered = scheme.demodulate(&signal);
            assert_eq!(&recovered[..bits.len()], &bits[..], "{:?}", scheme);
        }
    }

    #[test]
    fn test_measure_symbol_recovers_amplitude_and_phase() {
        for entry in SymbolTable::QAM16.entries() {
            let signal = modulate_table(entry.bits, &SymbolTable::QAM16);
            let (amplitude, phase) = measure_symbol(&signal);
            assert!((amplitude - entry.amplitude).abs() < 1e-3, "amplitude {} vs {}", amplitude, entry.amplitude);
            assert!((phase - entry.phase_deg).abs() < 0.1, "phase {} vs {}", phase, entry.phase_deg);
        }
    }

    #[test]
    fn test_nearest_prefers_first_on_tie() {
        // equidistant from 0° and 180°
        let entry = SymbolTable::BPSK.nearest(0.0, 0.5);
        assert_eq!(entry.bits, &[0]);
    }

    #[test]
    fn test_ask_keys_sine_amplitude() {
        let signal = CarrierScheme::Ask.modulate(&[0, 1]);
        assert!(signal[..SAMPLES_PER_BIT].iter().all(|&s| s == 0.0));
        // sine carrier starts at zero
        assert!(signal[SAMPLES_PER_BIT].abs() < 1e-6);
        assert!(signal[SAMPLES_PER_BIT..].iter().any(|&s| s > 0.9));
    }

    #[test]
    fn test_demodulate_ignores_partial_symbol() {
        let mut signal = CarrierScheme::Qpsk.modulate(&[1, 0]);
        signal.extend_from_slice(&[0.5; 13]);
        assert_eq!(CarrierScheme::Qpsk.demodulate(&signal), vec![1, 0]);
    }
}
