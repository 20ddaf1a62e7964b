//! Value types shared by the reader and display implementations.

use serde::{Deserialize, Serialize};

/// Name and short description of a device, for logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    /// Free-form description, e.g. `"128x160 RGB565"`.
    pub model: String,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// Addressable rectangle of the display, in pixels.
///
/// A transport receives a window before each run of pixel data; pixels fill
/// the window row by row starting at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Window {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Last column, inclusive (the controller's column address end).
    pub fn x_end(&self) -> u16 {
        (self.x + self.width).saturating_sub(1)
    }

    /// Last row, inclusive (the controller's row address end).
    pub fn y_end(&self) -> u16 {
        (self.y + self.height).saturating_sub(1)
    }

    /// Number of pixels covered.
    pub fn pixel_count(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cols {}..={} rows {}..={}",
            self.x,
            self.x_end(),
            self.y,
            self.y_end()
        )
    }
}
