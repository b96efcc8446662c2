//! Bridge between a line-coded baseband voltage signal and a carrier signal.
//!
//! ASK and BPSK act directly on the voltage (multiplying by the carrier sine)
//! and are recovered by synchronous detection plus a moving-average low-pass
//! filter. The remaining schemes re-derive bits from the baseband and reuse
//! the symbol logic in [`crate::modulation`].

use crate::line_coding::LineCoding;
use crate::modulation::{carrier_sin, CarrierScheme};
use crate::{CARRIER_FREQUENCY, LINE_VOLTAGE, SAMPLES_PER_BIT};

/// Low-pass window used after synchronous detection: half a bit period
pub const LOW_PASS_WINDOW: usize = SAMPLES_PER_BIT / 2;

/// Put an already line-coded baseband signal onto the carrier
pub fn modulate_baseband(baseband: &[f32], line_coding: LineCoding, scheme: CarrierScheme) -> Vec<f32> {
    match scheme {
        // only positive voltage drives the carrier
        CarrierScheme::Ask => baseband
            .iter()
            .enumerate()
            .map(|(i, &v)| v.max(0.0) * carrier_sin(CARRIER_FREQUENCY, i))
            .collect(),
        CarrierScheme::Bpsk => baseband
            .iter()
            .enumerate()
            .map(|(i, &v)| v * carrier_sin(CARRIER_FREQUENCY, i))
            .collect(),
        _ => {
            let bits = line_coding.decode(baseband);
            log::debug!("Re-modulating {} baseband bits as {:?}", bits.len(), scheme);
            scheme.modulate(&bits)
        }
    }
}

/// Recover a baseband signal that `line_coding` can decode
pub fn demodulate_to_baseband(signal: &[f32], line_coding: LineCoding, scheme: CarrierScheme) -> Vec<f32> {
    match scheme {
        CarrierScheme::Ask | CarrierScheme::Bpsk => {
            // sin² averages to 1/2, hence the factor 2
            let mixed: Vec<f32> = signal
                .iter()
                .enumerate()
                .map(|(i, &s)| 2.0 * s * carrier_sin(CARRIER_FREQUENCY, i))
                .collect();
            let filtered = moving_average(&mixed, LOW_PASS_WINDOW);

            if scheme == CarrierScheme::Ask {
                // regenerate a polar level so NRZ/Manchester decoders see ±V
                filtered
                    .into_iter()
                    .map(|v| if v > LINE_VOLTAGE / 2.0 { LINE_VOLTAGE } else { -LINE_VOLTAGE })
                    .collect()
            } else {
                filtered
            }
        }
        _ => {
            let bits = scheme.demodulate(signal);
            line_coding.encode(&bits)
        }
    }
}

/// Centered moving average: sample `i` becomes the mean of
/// `[i - window/2, i + window/2)`, clipped to the signal bounds.
pub fn moving_average(samples: &[f32], window: usize) -> Vec<f32> {
    let half = (window / 2).max(1);
    let len = samples.len();

    let mut prefix = Vec::with_capacity(len + 1);
    prefix.push(0.0f64);
    for &s in samples {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + s as f64);
    }

    (0..len)
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half).min(len);
            ((prefix[end] - prefix[start]) / (end - start) as f64) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BITS: [u8; 12] = [0, 1, 0, 1, 1, 1, 0, 0, 1, 0, 1, 1];

    #[test]
    fn test_moving_average_window() {
        let averaged = moving_average(&[0.0, 0.0, 4.0, 0.0, 0.0], 4);
        // sample 2 averages indices 0..4
        assert_eq!(averaged[2], 1.0);
        // edges shrink the window: sample 4 averages indices 2..5
        assert_eq!(averaged[0], 0.0);
        assert!((averaged[4] - 4.0 / 3.0).abs() < 1e-6);
        assert!(moving_average(&[], 10).is_empty());
    }

    #[test]
    fn test_ask_silences_negative_voltage() {
        let baseband = LineCoding::NrzPolar.encode(&[0, 1]);
        let signal = modulate_baseband(&baseband, LineCoding::NrzPolar, CarrierScheme::Ask);
        assert_eq!(signal.len(), baseband.len());
        assert!(signal[..SAMPLES_PER_BIT].iter().all(|&s| s == 0.0));
        assert!(signal[SAMPLES_PER_BIT..].iter().any(|&s| s > 0.9));
    }

    #[test]
    fn test_bpsk_flips_phase_with_voltage() {
        let baseband = LineCoding::NrzPolar.encode(&[1, 0]);
        let signal = modulate_baseband(&baseband, LineCoding::NrzPolar, CarrierScheme::Bpsk);
        for i in 0..SAMPLES_PER_BIT {
            assert!((signal[i] + signal[i + SAMPLES_PER_BIT]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_linear_paths_round_trip() {
        let cases = [
            (LineCoding::NrzPolar, CarrierScheme::Ask),
            (LineCoding::Manchester, CarrierScheme::Ask),
            (LineCoding::NrzPolar, CarrierScheme::Bpsk),
            (LineCoding::Manchester, CarrierScheme::Bpsk),
            (LineCoding::Bipolar, CarrierScheme::Bpsk),
        ];
        for (line_coding, scheme) in cases {
            let baseband = line_coding.encode(&BITS);
            let carrier = modulate_baseband(&baseband, line_coding, scheme);
            let recovered = demodulate_to_baseband(&carrier, line_coding, scheme);
            assert_eq!(recovered.len(), baseband.len());
            assert_eq!(line_coding.decode(&recovered), BITS.to_vec(), "{:?} over {:?}", line_coding, scheme);
        }
    }

    #[test]
    fn test_ask_regenerates_polar_levels() {
        let baseband = LineCoding::NrzPolar.encode(&BITS);
        let carrier = modulate_baseband(&baseband, LineCoding::NrzPolar, CarrierScheme::Ask);
        let recovered = demodulate_to_baseband(&carrier, LineCoding::NrzPolar, CarrierScheme::Ask);
        assert!(recovered.iter().all(|&v| v == LINE_VOLTAGE || v == -LINE_VOLTAGE));
    }

    #[test]
    fn test_symbol_paths_round_trip() {
        for scheme in [CarrierScheme::Fsk, CarrierScheme::Qpsk, CarrierScheme::Psk8, CarrierScheme::Qam16] {
            for line_coding in LineCoding::ALL {
                let baseband = line_coding.encode(&BITS);
                let carrier = modulate_baseband(&baseband, line_coding, scheme);
                let recovered = demodulate_to_baseband(&carrier, line_coding, scheme);
                let bits = line_coding.decode(&recovered);
                // 12 bits divide evenly into every symbol width
                assert_eq!(bits, BITS.to_vec(), "{:?} over {:?}", line_coding, scheme);
            }
        }
    }
}
