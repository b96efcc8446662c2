//! Two-layer communication link simulator
//!
//! Text is carried through a data link layer (error control and framing) and a
//! physical layer (line coding and optional carrier modulation) over an AWGN
//! channel, then recovered on the receive side.

pub mod analog;
pub mod bits;
pub mod channel;
pub mod config;
pub mod error;
pub mod error_control;
pub mod framing;
pub mod line_coding;
pub mod modulation;
pub mod pipeline;
pub mod simulator;

pub use config::PipelineConfig;
pub use error::{Result, SimulatorError};
pub use error_control::{ErrorControl, LinkStatus};
pub use framing::Framing;
pub use line_coding::LineCoding;
pub use modulation::CarrierScheme;
pub use pipeline::TransmissionResult;
pub use simulator::{Simulator, SimulatorState};

// Physical layer configuration
pub const SAMPLES_PER_BIT: usize = 100;
pub const LINE_VOLTAGE: f32 = 1.0; // V
pub const CARRIER_FREQUENCY: f32 = 2.0; // cycles per bit period
pub const CARRIER_AMPLITUDE: f32 = 1.0;
pub const ASK_THRESHOLD: f32 = 0.3;

// Channel configuration
pub const PROPAGATION_DELAY_MS: u64 = 500;

// Framing configuration
pub const FLAG_BYTE: u8 = 0x7E;
pub const ESCAPE_BYTE: u8 = 0x1B;
