//! Bootstrap errors of the terminal.
//!
//! Only startup can fail. Once events flow, failures are logged per
//! detection and never stop the pipeline.

use tagwatch_cloud::{AuthError, TransportError};
use tagwatch_display::DisplayError;
use tagwatch_hardware::HardwareError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerminalError {
    #[error("Configuration error: {0}")]
    Config(#[from] tagwatch_core::Error),

    #[error("Display error: {0}")]
    Display(#[from] DisplayError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, TerminalError>;
