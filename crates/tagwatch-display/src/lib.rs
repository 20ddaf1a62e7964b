//! Display feedback for the tagwatch access terminal.
//!
//! Maps classification outcomes to full-screen colors, paints them through a
//! [`DisplayTransport`](tagwatch_hardware::DisplayTransport) in bounded
//! transfers, and reverts to idle after the dwell.

pub mod controller;
pub mod error;
pub mod painter;
pub mod state;
pub mod timer;

pub use controller::{FeedbackController, MAX_HISTORY_SIZE, PendingRevert};
pub use error::{DisplayError, Result};
pub use painter::{PaintStats, PanelGeometry};
pub use state::{DisplayState, DisplayTransition};
pub use timer::{Timer, TokioTimer};
