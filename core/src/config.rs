use crate::error::{Result, SimulatorError};
use crate::error_control::ErrorControl;
use crate::framing::Framing;
use crate::line_coding::LineCoding;
use crate::modulation::CarrierScheme;
use std::fmt;
use std::str::FromStr;

/// Scheme selection for one transmission.
///
/// A transmission captures a copy of this value when it starts, so changing
/// the simulator's configuration never affects a run in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub line_coding: LineCoding,
    /// `None` sends the baseband signal straight into the channel
    pub carrier: Option<CarrierScheme>,
    pub framing: Framing,
    pub error_control: ErrorControl,
    /// Standard deviation of the channel noise
    pub noise_sigma: f32,
    /// Fixed channel seed for reproducible noise
    pub noise_seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            line_coding: LineCoding::NrzPolar,
            carrier: Some(CarrierScheme::Ask),
            framing: Framing::CharacterCount,
            error_control: ErrorControl::None,
            noise_sigma: 0.0,
            noise_seed: None,
        }
    }
}

impl PipelineConfig {
    pub fn carrier_enabled(&self) -> bool {
        self.carrier.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.noise_sigma.is_finite() || self.noise_sigma < 0.0 {
            return Err(SimulatorError::InvalidConfig(format!(
                "noise sigma must be a non-negative number, got {}",
                self.noise_sigma
            )));
        }
        Ok(())
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} / {} / {} / sigma={}",
            self.line_coding,
            CarrierName(self.carrier),
            self.framing,
            self.error_control,
            self.noise_sigma
        )
    }
}

/// Parse a carrier name where `none` disables the carrier
pub fn parse_carrier(name: &str) -> Result<Option<CarrierScheme>> {
    match normalize(name).as_str() {
        "none" | "off" | "baseband" => Ok(None),
        _ => name.parse().map(Some),
    }
}

/// Display helper for an optional carrier
pub struct CarrierName(pub Option<CarrierScheme>);

impl fmt::Display for CarrierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(scheme) => fmt::Display::fmt(&scheme, f),
            None => f.write_str("none"),
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace(['_', ' '], "-")
}

fn unknown(kind: &'static str, name: &str) -> SimulatorError {
    SimulatorError::UnknownScheme { kind, name: name.to_string() }
}

impl FromStr for LineCoding {
    type Err = SimulatorError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize(s).as_str() {
            "nrz-polar" | "nrz" | "polar" => Ok(LineCoding::NrzPolar),
            "manchester" => Ok(LineCoding::Manchester),
            "bipolar" | "ami" | "bipolar-ami" => Ok(LineCoding::Bipolar),
            _ => Err(unknown("line coding", s)),
        }
    }
}

impl fmt::Display for LineCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LineCoding::NrzPolar => "nrz-polar",
            LineCoding::Manchester => "manchester",
            LineCoding::Bipolar => "bipolar",
        })
    }
}

impl FromStr for CarrierScheme {
    type Err = SimulatorError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize(s).as_str() {
            "ask" => Ok(CarrierScheme::Ask),
            "fsk" => Ok(CarrierScheme::Fsk),
            "bpsk" => Ok(CarrierScheme::Bpsk),
            "qpsk" => Ok(CarrierScheme::Qpsk),
            "8psk" | "8-psk" | "psk8" => Ok(CarrierScheme::Psk8),
            "16-qam" | "16qam" | "qam16" => Ok(CarrierScheme::Qam16),
            _ => Err(unknown("carrier", s)),
        }
    }
}

impl fmt::Display for CarrierScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CarrierScheme::Ask => "ask",
            CarrierScheme::Fsk => "fsk",
            CarrierScheme::Bpsk => "bpsk",
            CarrierScheme::Qpsk => "qpsk",
            CarrierScheme::Psk8 => "8psk",
            CarrierScheme::Qam16 => "16-qam",
        })
    }
}

impl FromStr for Framing {
    type Err = SimulatorError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize(s).as_str() {
            "character-count" | "char-count" | "count" => Ok(Framing::CharacterCount),
            "byte-stuffing" | "byte" => Ok(Framing::ByteStuffing),
            "bit-stuffing" | "bit" => Ok(Framing::BitStuffing),
            _ => Err(unknown("framing", s)),
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Framing::CharacterCount => "character-count",
            Framing::ByteStuffing => "byte-stuffing",
            Framing::BitStuffing => "bit-stuffing",
        })
    }
}

impl FromStr for ErrorControl {
    type Err = SimulatorError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize(s).as_str() {
            "none" => Ok(ErrorControl::None),
            "parity" | "even-parity" => Ok(ErrorControl::EvenParity),
            "checksum" => Ok(ErrorControl::Checksum),
            "crc" | "crc32" | "crc-32" => Ok(ErrorControl::Crc32),
            "hamming" => Ok(ErrorControl::Hamming),
            _ => Err(unknown("error control", s)),
        }
    }
}

impl fmt::Display for ErrorControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorControl::None => "none",
            ErrorControl::EvenParity => "parity",
            ErrorControl::Checksum => "checksum",
            ErrorControl::Crc32 => "crc",
            ErrorControl::Hamming => "hamming",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_display() {
        for code in LineCoding::ALL {
            assert_eq!(code.to_string().parse::<LineCoding>().unwrap(), code);
        }
        for scheme in CarrierScheme::ALL {
            assert_eq!(scheme.to_string().parse::<CarrierScheme>().unwrap(), scheme);
        }
        for framing in Framing::ALL {
            assert_eq!(framing.to_string().parse::<Framing>().unwrap(), framing);
        }
        for control in ErrorControl::ALL {
            assert_eq!(control.to_string().parse::<ErrorControl>().unwrap(), control);
        }
    }

    #[test]
    fn test_parsing_is_case_insensitive() {
        assert_eq!("NRZ-POLAR".parse::<LineCoding>().unwrap(), LineCoding::NrzPolar);
        assert_eq!("16-QAM".parse::<CarrierScheme>().unwrap(), CarrierScheme::Qam16);
        assert_eq!("Bit Stuffing".parse::<Framing>().unwrap(), Framing::BitStuffing);
        assert_eq!("CRC".parse::<ErrorControl>().unwrap(), ErrorControl::Crc32);
    }

    #[test]
    fn test_unknown_scheme_is_rejected() {
        match "64-QAM".parse::<CarrierScheme>() {
            Err(SimulatorError::UnknownScheme { kind, name }) => {
                assert_eq!(kind, "carrier");
                assert_eq!(name, "64-QAM");
            }
            other => panic!("Expected UnknownScheme, got {:?}", other),
        }
        assert!("4b5b".parse::<LineCoding>().is_err());
        assert!("hdlc".parse::<Framing>().is_err());
        assert!("reed-solomon".parse::<ErrorControl>().is_err());
    }

    #[test]
    fn test_carrier_none() {
        assert_eq!(parse_carrier("None").unwrap(), None);
        assert_eq!(parse_carrier("bpsk").unwrap(), Some(CarrierScheme::Bpsk));
        assert!(parse_carrier("am").is_err());
        assert_eq!(CarrierName(None).to_string(), "none");
    }

    #[test]
    fn test_validate_sigma() {
        let mut config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        config.noise_sigma = -0.1;
        assert!(matches!(config.validate(), Err(SimulatorError::InvalidConfig(_))));
        config.noise_sigma = f32::INFINITY;
        assert!(config.validate().is_err());
    }
}
