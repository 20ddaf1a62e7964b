pub mod classify;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod timezone;
pub mod types;

pub use classify::{ReferenceIds, classify};
pub use clock::{FixedClock, SystemClock, TimestampFormatter, WallClock, is_synchronized};
pub use config::{CloudConfig, DisplayConfig, ReferenceConfig, TerminalConfig};
pub use error::{Error, Result};
pub use timezone::PosixTz;
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
