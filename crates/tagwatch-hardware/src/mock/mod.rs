//! Mock device implementations for testing and development.
//!
//! These devices are controlled programmatically through a handle and need
//! no physical hardware.

pub mod display;
pub mod reader;

pub use display::{DisplayOp, MockDisplay, MockDisplayHandle};
pub use reader::{MockTagReader, MockTagReaderHandle};
