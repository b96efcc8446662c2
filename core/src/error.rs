use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("Unknown {kind} scheme: {name:?}")]
    UnknownScheme { kind: &'static str, name: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Simulator busy: a transmission is already in flight")]
    Busy,

    #[error("Character {0:?} does not fit in a single byte")]
    UnsupportedCharacter(char),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimulatorError>;
