//! Synchronous transmit and receive chains.
//!
//! TX: bits → error control → framing → line code → (carrier)
//! RX: (carrier) → line decode → deframe → verify/correct → text

use crate::analog::{demodulate_to_baseband, modulate_baseband};
use crate::bits::{bits_to_text, text_to_bits};
use crate::channel::add_noise;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::error_control::LinkStatus;

/// Everything one transmission produced, kept for inspection until the next one
#[derive(Debug, Clone)]
pub struct TransmissionResult {
    pub text: String,
    pub status: LinkStatus,
    pub config: PipelineConfig,
    /// Length of the transmitted frame in bits
    pub frame_bits: usize,
    /// Line-coded signal before the carrier
    pub baseband_tx: Vec<f32>,
    /// Signal handed to the channel
    pub transmitted: Vec<f32>,
    /// Channel output, noise included
    pub received: Vec<f32>,
    /// Baseband signal recovered from the received signal
    pub recovered_baseband: Vec<f32>,
}

pub struct TransmitOutput {
    pub frame_bits: usize,
    pub baseband: Vec<f32>,
    pub transmitted: Vec<f32>,
}

pub struct ReceiveOutput {
    pub recovered_baseband: Vec<f32>,
    pub text: String,
    pub status: LinkStatus,
}

pub fn transmit_chain(config: &PipelineConfig, data_bits: &[u8]) -> TransmitOutput {
    let protected = config.error_control.encode(data_bits);
    let frame = config.framing.encode(&protected);
    log::debug!(
        "TX link: {} data bits, {} after {}, {} framed ({})",
        data_bits.len(),
        protected.len(),
        config.error_control,
        frame.len(),
        config.framing
    );

    let baseband = config.line_coding.encode(&frame);
    let transmitted = match config.carrier {
        Some(scheme) => modulate_baseband(&baseband, config.line_coding, scheme),
        None => baseband.clone(),
    };
    log::debug!("TX physical: {} baseband samples, {} transmitted", baseband.len(), transmitted.len());

    TransmitOutput {
        frame_bits: frame.len(),
        baseband,
        transmitted,
    }
}

pub fn receive_chain(config: &PipelineConfig, received: &[f32]) -> ReceiveOutput {
    let recovered_baseband = match config.carrier {
        Some(scheme) => demodulate_to_baseband(received, config.line_coding, scheme),
        None => received.to_vec(),
    };

    let frame = config.line_coding.decode(&recovered_baseband);
    let protected = config.framing.decode(&frame);
    let (data_bits, status) = config.error_control.decode(&protected);
    log::debug!(
        "RX link: {} frame bits, {} deframed, {} data bits ({})",
        frame.len(),
        protected.len(),
        data_bits.len(),
        status
    );

    ReceiveOutput {
        recovered_baseband,
        text: bits_to_text(&data_bits),
        status,
    }
}

/// Pass a signal through the configured noisy channel
pub fn channel(config: &PipelineConfig, transmitted: &[f32]) -> Vec<f32> {
    add_noise(transmitted, config.noise_sigma, config.noise_seed)
}

impl TransmissionResult {
    pub(crate) fn assemble(
        config: PipelineConfig,
        tx: TransmitOutput,
        received: Vec<f32>,
        rx: ReceiveOutput,
    ) -> Self {
        Self {
            text: rx.text,
            status: rx.status,
            config,
            frame_bits: tx.frame_bits,
            baseband_tx: tx.baseband,
            transmitted: tx.transmitted,
            received,
            recovered_baseband: rx.recovered_baseband,
        }
    }
}

/// Run one complete transmission on the calling thread, without delay
pub fn run(config: &PipelineConfig, text: &str) -> Result<TransmissionResult> {
    config.validate()?;
    let bits = text_to_bits(text)?;

    let tx = transmit_chain(config, &bits);
    let received = channel(config, &tx.transmitted);
    let rx = receive_chain(config, &received);

    Ok(TransmissionResult::assemble(*config, tx, received, rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_control::ErrorControl;
    use crate::framing::Framing;
    use crate::line_coding::LineCoding;
    use crate::modulation::CarrierScheme;
    use crate::SAMPLES_PER_BIT;

    fn config(
        line_coding: LineCoding,
        carrier: Option<CarrierScheme>,
        framing: Framing,
        error_control: ErrorControl,
    ) -> PipelineConfig {
        PipelineConfig {
            line_coding,
            carrier,
            framing,
            error_control,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_manchester_baseband_scenario() {
        let config = config(LineCoding::Manchester, None, Framing::CharacterCount, ErrorControl::None);
        let result = run(&config, "U").unwrap();

        assert_eq!(result.text, "U");
        assert_eq!(result.status, LinkStatus::NoVerification);
        assert_eq!(result.frame_bits, 16);
        assert_eq!(result.baseband_tx.len(), 16 * SAMPLES_PER_BIT);
        assert_eq!(result.transmitted, result.baseband_tx);
        assert_eq!(result.received, result.transmitted);
        assert_eq!(result.recovered_baseband, result.received);
    }

    #[test]
    fn test_every_error_control_through_baseband() {
        for error_control in ErrorControl::ALL {
            let config = config(LineCoding::NrzPolar, None, Framing::BitStuffing, error_control);
            let result = run(&config, "Link~").unwrap();
            assert_eq!(result.text, "Link~", "{:?}", error_control);
            assert!(!result.status.is_integrity_failure(), "{:?}", error_control);
        }
    }

    #[test]
    fn test_rejects_invalid_input() {
        let config = PipelineConfig::default();
        assert!(run(&config, "€").is_err());

        let noisy = PipelineConfig { noise_sigma: -1.0, ..config };
        assert!(run(&noisy, "a").is_err());
    }
}
