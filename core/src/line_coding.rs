use crate::{LINE_VOLTAGE, SAMPLES_PER_BIT};

/// Baseband line code: one bit becomes `SAMPLES_PER_BIT` voltage samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineCoding {
    /// 1 → +V, 0 → −V
    NrzPolar,
    /// 1 → +V then −V, 0 → −V then +V
    Manchester,
    /// 0 → 0 V, successive ones alternate +V / −V (AMI)
    Bipolar,
}

impl LineCoding {
    pub const ALL: [LineCoding; 3] = [LineCoding::NrzPolar, LineCoding::Manchester, LineCoding::Bipolar];

    pub fn encode(self, bits: &[u8]) -> Vec<f32> {
        let mut signal = Vec::with_capacity(bits.len() * SAMPLES_PER_BIT);
        let half = SAMPLES_PER_BIT / 2;
        let mut last_mark_positive = false;

        for &bit in bits {
            match self {
                LineCoding::NrzPolar => {
                    let level = if bit == 1 { LINE_VOLTAGE } else { -LINE_VOLTAGE };
                    signal.extend(std::iter::repeat(level).take(SAMPLES_PER_BIT));
                }
                LineCoding::Manchester => {
                    let first = if bit == 1 { LINE_VOLTAGE } else { -LINE_VOLTAGE };
                    signal.extend(std::iter::repeat(first).take(half));
                    signal.extend(std::iter::repeat(-first).take(SAMPLES_PER_BIT - half));
                }
                LineCoding::Bipolar => {
                    let level = if bit == 0 {
                        0.0
                    } else {
                        last_mark_positive = !last_mark_positive;
                        if last_mark_positive {
                            LINE_VOLTAGE
                        } else {
                            -LINE_VOLTAGE
                        }
                    };
                    signal.extend(std::iter::repeat(level).take(SAMPLES_PER_BIT));
                }
            }
        }

        signal
    }

    /// Threshold each bit period back to a bit.
    ///
    /// Samples past the last whole bit period are ignored with a warning.
    pub fn decode(self, signal: &[f32]) -> Vec<u8> {
        warn_if_desynchronized(signal.len());
        let half = SAMPLES_PER_BIT / 2;

        signal
            .chunks_exact(SAMPLES_PER_BIT)
            .map(|block| {
                let one = match self {
                    LineCoding::NrzPolar => mean(block) > 0.0,
                    LineCoding::Manchester => mean(&block[..half]) > mean(&block[half..]),
                    // amplitude only; the alternation rule is not checked
                    LineCoding::Bipolar => mean(block).abs() > LINE_VOLTAGE / 2.0,
                };
                one as u8
            })
            .collect()
    }
}

pub(crate) fn mean(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f32>() / samples.len() as f32
}

pub(crate) fn warn_if_desynchronized(len: usize) {
    if len % SAMPLES_PER_BIT != 0 {
        log::warn!(
            "Signal of {} samples is not a whole number of {}-sample bit periods; it may be truncated or desynchronized",
            len,
            SAMPLES_PER_BIT
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nrz_polar_levels() {
        let signal = LineCoding::NrzPolar.encode(&[1, 0]);
        assert_eq!(signal.len(), 2 * SAMPLES_PER_BIT);
        assert!(signal[..SAMPLES_PER_BIT].iter().all(|&v| v == LINE_VOLTAGE));
        assert!(signal[SAMPLES_PER_BIT..].iter().all(|&v| v == -LINE_VOLTAGE));
    }

    #[test]
    fn test_manchester_transitions() {
        let signal = LineCoding::Manchester.encode(&[1, 0]);
        let half = SAMPLES_PER_BIT / 2;
        assert_eq!(signal[0], LINE_VOLTAGE);
        assert_eq!(signal[half], -LINE_VOLTAGE);
        assert_eq!(signal[SAMPLES_PER_BIT], -LINE_VOLTAGE);
        assert_eq!(signal[SAMPLES_PER_BIT + half], LINE_VOLTAGE);
    }

    #[test]
    fn test_bipolar_marks_alternate() {
        let signal = LineCoding::Bipolar.encode(&[1, 0, 1, 1]);
        let level = |bit: usize| signal[bit * SAMPLES_PER_BIT];
        assert_eq!(level(0), LINE_VOLTAGE);
        assert_eq!(level(1), 0.0);
        assert_eq!(level(2), -LINE_VOLTAGE);
        assert_eq!(level(3), LINE_VOLTAGE);
    }

    #[test]
    fn test_round_trip_all_codes() {
        let bits = vec![0, 0, 0, 1, 1, 0, 1, 1, 0, 0, 1, 0, 1, 1, 1, 1];
        for code in LineCoding::ALL {
            assert_eq!(code.decode(&code.encode(&bits)), bits, "{:?}", code);
        }
    }

    #[test]
    fn test_partial_block_is_dropped() {
        let mut signal = LineCoding::NrzPolar.encode(&[1, 0, 1]);
        signal.extend_from_slice(&[LINE_VOLTAGE; 7]);
        assert_eq!(LineCoding::NrzPolar.decode(&signal), vec![1, 0, 1]);
        assert!(LineCoding::Manchester.decode(&[1.0; 10]).is_empty());
    }

    #[test]
    fn test_decode_tolerates_mild_noise() {
        let bits = vec![1, 0, 1, 1, 0, 0, 1, 0];
        for code in LineCoding::ALL {
            let noisy: Vec<f32> = code
                .encode(&bits)
                .iter()
                .enumerate()
                .map(|(i, v)| v + if i % 2 == 0 { 0.3 } else { -0.3 })
                .collect();
            assert_eq!(code.decode(&noisy), bits, "{:?}", code);
        }
    }
}
