//! Console display transport.
//!
//! Stands in for the ST7735 panel when none is attached: it checks the same
//! window and transfer limits and logs what would have been drawn. A line is
//! logged at `info` each time the panel has been completely covered with one
//! color, which is what an operator watching the terminal needs to see.

use tracing::{info, trace};

use tagwatch_core::constants::{
    DEFAULT_DISPLAY_HEIGHT, DEFAULT_DISPLAY_WIDTH, DEFAULT_MAX_TRANSFER_PIXELS,
};

use crate::{
    HardwareError, Result,
    traits::DisplayTransport,
    types::{DeviceInfo, Window},
};

/// Display transport that logs instead of drawing.
#[derive(Debug)]
pub struct ConsoleDisplay {
    width: u16,
    height: u16,
    max_transfer: usize,
    window: Option<Window>,
    remaining: usize,
    frame_pixels: usize,
    frame_color: Option<u16>,
    mixed: bool,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self::with_geometry(
            DEFAULT_DISPLAY_WIDTH,
            DEFAULT_DISPLAY_HEIGHT,
            DEFAULT_MAX_TRANSFER_PIXELS,
        )
    }

    pub fn with_geometry(width: u16, height: u16, max_transfer: usize) -> Self {
        Self {
            width,
            height,
            max_transfer,
            window: None,
            remaining: 0,
            frame_pixels: 0,
            frame_color: None,
            mixed: false,
        }
    }

    fn panel_pixels(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    fn track_frame(&mut self, pixels: &[u16]) {
        for &pixel in pixels {
            match self.frame_color {
                None => self.frame_color = Some(pixel),
                Some(color) if color != pixel => self.mixed = true,
                Some(_) => {}
            }
        }
        self.frame_pixels += pixels.len();

        if self.frame_pixels >= self.panel_pixels() {
            match (self.frame_color, self.mixed) {
                (Some(color), false) => info!("Display filled with color 0x{:04X}", color),
                _ => info!("Display frame completed"),
            }
            self.frame_pixels = 0;
            self.frame_color = None;
            self.mixed = false;
        }
    }
}

impl Default for ConsoleDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayTransport for ConsoleDisplay {
    async fn set_window(&mut self, window: Window) -> Result<()> {
        if window.is_empty() || window.x_end() >= self.width || window.y_end() >= self.height {
            return Err(HardwareError::window(format!(
                "{window} outside {}x{} panel",
                self.width, self.height
            )));
        }
        trace!("Window {}", window);
        self.window = Some(window);
        self.remaining = window.pixel_count();
        Ok(())
    }

    async fn write_pixels(&mut self, pixels: &[u16]) -> Result<()> {
        if pixels.len() > self.max_transfer {
            return Err(HardwareError::TransferTooLarge {
                len: pixels.len(),
                max: self.max_transfer,
            });
        }
        if self.window.is_none() || pixels.len() > self.remaining {
            return Err(HardwareError::window(format!(
                "{} pixels do not fit the open window",
                pixels.len()
            )));
        }
        trace!("Transfer of {} pixels", pixels.len());
        self.remaining -= pixels.len();
        self.track_frame(pixels);
        Ok(())
    }

    fn max_transfer_pixels(&self) -> usize {
        self.max_transfer
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new("Console Display", format!("{}x{} RGB565", self.width, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accepts_full_frame() {
        let mut display = ConsoleDisplay::with_geometry(4, 4, 8);
        for y in [0, 2] {
            display.set_window(Window::new(0, y, 4, 2)).await.unwrap();
            display.write_pixels(&[0x07E0; 8]).await.unwrap();
        }
        assert_eq!(display.frame_pixels, 0);
        assert_eq!(display.frame_color, None);
    }

    #[tokio::test]
    async fn test_enforces_limits() {
        let mut display = ConsoleDisplay::new();
        assert!(display.write_pixels(&[0; 4]).await.is_err());

        display.set_window(Window::new(0, 0, 128, 40)).await.unwrap();
        assert!(matches!(
            display.write_pixels(&[0; 2048]).await,
            Err(HardwareError::TransferTooLarge { .. })
        ));
        assert!(display.set_window(Window::new(0, 0, 129, 1)).await.is_err());
    }
}
