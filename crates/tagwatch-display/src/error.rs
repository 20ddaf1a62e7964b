use tagwatch_hardware::HardwareError;
use thiserror::Error;

use crate::state::DisplayState;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Display transport error: {0}")]
    Transport(#[from] HardwareError),

    #[error("Invalid display transition from {from} to {to}")]
    InvalidTransition { from: DisplayState, to: DisplayState },

    #[error("Invalid panel geometry: {0}")]
    Geometry(String),
}

pub type Result<T> = std::result::Result<T, DisplayError>;
