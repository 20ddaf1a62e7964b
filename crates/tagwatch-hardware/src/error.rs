//! Device errors.
//!
//! A reader or display either loses its connection, which ends the device,
//! or reports a recoverable problem (bad input, a rejected transfer) and
//! keeps working.

/// Result type alias for device operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The device is gone, or its input has ended.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Bus-level failure while talking to the device.
    #[error("Communication error: {message}")]
    Communication { message: String },

    /// The reader produced something that is not a UID.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// A single pixel transfer exceeded the transport limit.
    #[error("Transfer of {len} pixels exceeds limit of {max}")]
    TransferTooLarge { len: usize, max: usize },

    /// A window off the panel, or pixel data that does not fit the open one.
    #[error("Window error: {message}")]
    Window { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::Communication {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn window(message: impl Into<String>) -> Self {
        Self::Window {
            message: message.into(),
        }
    }

    /// Returns `true` when the device cannot produce anything further.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Disconnected { .. } | Self::Io(_))
    }
}

impl From<tagwatch_core::Error> for HardwareError {
    fn from(err: tagwatch_core::Error) -> Self {
        Self::invalid_data(err.to_string())
    }
}
