//! The tagwatch access terminal.
//!
//! Wires the reader, the feedback display, the wall clock and the remote
//! log into one detection pipeline. The `tagwatch` binary bootstraps it;
//! the library is what the tests drive.

pub mod clock_sync;
pub mod error;
pub mod orchestrator;

pub use clock_sync::{wait_for_clock_sync, wait_for_clock_sync_default};
pub use error::{Result, TerminalError};
pub use orchestrator::{
    DetectionOutcome, DisplayOutcome, EventOrchestrator, PipelineStats, ProcessedDetection,
};
