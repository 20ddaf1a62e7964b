//! Device abstraction layer for the tagwatch access terminal.
//!
//! The terminal has two peripherals: an RFID reader that reports tags
//! entering and leaving its field, and a small RGB565 panel used for
//! access feedback. This crate defines the traits the pipeline uses to talk
//! to them, plus devices that need no hardware:
//!
//! - [`mock`]: programmable reader and recording display for tests
//! - [`line`]: reader fed by text lines (stdin)
//! - [`console`]: display that logs what it would draw
//!
//! The [`listener`] runs the reader in its own task and delivers detections
//! through a bounded channel.
//!
//! # Design
//!
//! - **Async-first**: all I/O uses native `async fn` in traits (Rust 1.90 +
//!   Edition 2024 RPITIT).
//! - **Enum dispatch**: [`devices::AnyTagReader`] and [`devices::AnyDisplay`]
//!   stand in for trait objects.
//! - **Error-aware**: operations return [`Result<T>`] with [`HardwareError`].

pub mod console;
pub mod devices;
pub mod error;
pub mod line;
pub mod listener;
pub mod mock;
pub mod traits;
pub mod types;

pub use error::{HardwareError, Result};
pub use traits::{DetectionEvent, DisplayTransport, TagReader, TagState};
pub use types::{DeviceInfo, Window};

pub use devices::{AnyDisplay, AnyTagReader};
pub use listener::{DetectionListener, ListenerEvent, ListenerHandle};
