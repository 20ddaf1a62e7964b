//! Enum wrappers for device dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn TagReader>`
//! is unavailable. These enums give concrete dispatch over every supported
//! device instead, which also keeps the futures `Send` for `tokio::spawn`.
//!
//! # Examples
//!
//! ```
//! use tagwatch_hardware::devices::AnyTagReader;
//! use tagwatch_hardware::mock::MockTagReader;
//!
//! let (reader, _handle) = MockTagReader::new();
//! let any_reader = AnyTagReader::Mock(reader);
//! ```

use crate::console::ConsoleDisplay;
use crate::line::LineTagReader;
use crate::mock::{MockDisplay, MockTagReader};
use crate::traits::{DetectionEvent, DisplayTransport, TagReader};
use crate::types::{DeviceInfo, Window};
use crate::Result;

/// Enum wrapper for tag reader dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTagReader {
    /// Mock reader for development and testing.
    Mock(MockTagReader),
    /// Text-line reader (stdin).
    Line(LineTagReader),
}

impl TagReader for AnyTagReader {
    async fn next_detection(&mut self) -> Result<DetectionEvent> {
        match self {
            Self::Mock(device) => device.next_detection().await,
            Self::Line(device) => device.next_detection().await,
        }
    }

    fn info(&self) -> DeviceInfo {
        match self {
            Self::Mock(device) => device.info(),
            Self::Line(device) => device.info(),
        }
    }
}

/// Enum wrapper for display transport dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyDisplay {
    /// Recording display for development and testing.
    Mock(MockDisplay),
    /// Logging display for running without a panel.
    Console(ConsoleDisplay),
}

impl DisplayTransport for AnyDisplay {
    async fn set_window(&mut self, window: Window) -> Result<()> {
        match self {
            Self::Mock(device) => device.set_window(window).await,
            Self::Console(device) => device.set_window(window).await,
        }
    }

    async fn write_pixels(&mut self, pixels: &[u16]) -> Result<()> {
        match self {
            Self::Mock(device) => device.write_pixels(pixels).await,
            Self::Console(device) => device.write_pixels(pixels).await,
        }
    }

    fn max_transfer_pixels(&self) -> usize {
        match self {
            Self::Mock(device) => device.max_transfer_pixels(),
            Self::Console(device) => device.max_transfer_pixels(),
        }
    }

    fn info(&self) -> DeviceInfo {
        match self {
            Self::Mock(device) => device.info(),
            Self::Console(device) => device.info(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagwatch_core::CredentialId;

    #[tokio::test]
    async fn test_any_tag_reader_mock() {
        let (reader, handle) = MockTagReader::new();
        let mut any_reader = AnyTagReader::Mock(reader);

        handle
            .present(CredentialId::new(vec![1, 2, 3, 4]).unwrap())
            .await
            .unwrap();
        let event = any_reader.next_detection().await.unwrap();
        assert_eq!(event.uid.as_bytes(), &[1, 2, 3, 4]);
        assert_eq!(any_reader.info().name, "Mock Tag Reader");
    }

    #[tokio::test]
    async fn test_any_tag_reader_line() {
        let mut any_reader = AnyTagReader::Line(LineTagReader::new(&b"0A0B0C0D\n"[..], "test"));
        let event = any_reader.next_detection().await.unwrap();
        assert_eq!(event.uid.to_text(), "0A 0B 0C 0D");
    }

    #[tokio::test]
    async fn test_any_display() {
        let (display, handle) = MockDisplay::new();
        let mut any_display = AnyDisplay::Mock(display);

        any_display.set_window(Window::new(0, 0, 2, 1)).await.unwrap();
        any_display.write_pixels(&[0xF800, 0xF800]).await.unwrap();

        assert_eq!(any_display.max_transfer_pixels(), 1024);
        assert_eq!(handle.last_color(), Some(0xF800));

        let console = AnyDisplay::Console(ConsoleDisplay::new());
        assert_eq!(console.info().name, "Console Display");
    }
}
