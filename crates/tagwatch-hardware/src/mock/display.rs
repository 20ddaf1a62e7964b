//! Mock display transport.
//!
//! Records every window and pixel transfer and enforces the same limits a
//! real SPI-attached controller does: windows must lie on the panel, a
//! single transfer may not exceed the transfer limit, and pixel data may not
//! overrun the open window.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tagwatch_core::constants::{
    DEFAULT_DISPLAY_HEIGHT, DEFAULT_DISPLAY_WIDTH, DEFAULT_MAX_TRANSFER_PIXELS,
};

use crate::{
    HardwareError, Result,
    traits::DisplayTransport,
    types::{DeviceInfo, Window},
};

/// One recorded transport operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayOp {
    SetWindow(Window),
    WritePixels(Vec<u16>),
}

#[derive(Debug, Default)]
struct Recorder {
    ops: Vec<DisplayOp>,
    window: Option<Window>,
    remaining: usize,
}

/// Mock display for testing and development.
///
/// # Examples
///
/// ```
/// use tagwatch_hardware::mock::MockDisplay;
/// use tagwatch_hardware::traits::DisplayTransport;
/// use tagwatch_hardware::types::Window;
///
/// #[tokio::main]
/// async fn main() -> tagwatch_hardware::Result<()> {
///     let (mut display, handle) = MockDisplay::new();
///
///     display.set_window(Window::new(0, 0, 128, 1)).await?;
///     display.write_pixels(&[0x07E0; 128]).await?;
///
///     assert_eq!(handle.transfer_sizes(), vec![128]);
///     assert_eq!(handle.last_color(), Some(0x07E0));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockDisplay {
    width: u16,
    height: u16,
    max_transfer: usize,
    recorder: Arc<Mutex<Recorder>>,
    fail_writes: Arc<AtomicBool>,
}

impl MockDisplay {
    /// A 128x160 panel with a 1024-pixel transfer limit.
    pub fn new() -> (Self, MockDisplayHandle) {
        Self::with_geometry(
            DEFAULT_DISPLAY_WIDTH,
            DEFAULT_DISPLAY_HEIGHT,
            DEFAULT_MAX_TRANSFER_PIXELS,
        )
    }

    /// A panel with explicit size and transfer limit.
    pub fn with_geometry(width: u16, height: u16, max_transfer: usize) -> (Self, MockDisplayHandle) {
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        let fail_writes = Arc::new(AtomicBool::new(false));

        let display = Self {
            width,
            height,
            max_transfer,
            recorder: Arc::clone(&recorder),
            fail_writes: Arc::clone(&fail_writes),
        };
        let handle = MockDisplayHandle {
            recorder,
            fail_writes,
        };
        (display, handle)
    }

    fn recorder(&self) -> Result<MutexGuard<'_, Recorder>> {
        self.recorder
            .lock()
            .map_err(|_| HardwareError::communication("Mock display recorder poisoned"))
    }
}

impl DisplayTransport for MockDisplay {
    async fn set_window(&mut self, window: Window) -> Result<()> {
        if window.is_empty()
            || window.x_end() >= self.width
            || window.y_end() >= self.height
        {
            return Err(HardwareError::window(format!(
                "{window} outside {}x{} panel",
                self.width, self.height
            )));
        }

        let mut recorder = self.recorder()?;
        recorder.window = Some(window);
        recorder.remaining = window.pixel_count();
        recorder.ops.push(DisplayOp::SetWindow(window));
        Ok(())
    }

    async fn write_pixels(&mut self, pixels: &[u16]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(HardwareError::communication("SPI transfer failed"));
        }
        if pixels.len() > self.max_transfer {
            return Err(HardwareError::TransferTooLarge {
                len: pixels.len(),
                max: self.max_transfer,
            });
        }

        let mut recorder = self.recorder()?;
        if recorder.window.is_none() {
            return Err(HardwareError::window("pixel data before any window"));
        }
        if pixels.len() > recorder.remaining {
            return Err(HardwareError::window(format!(
                "{} pixels overrun window with {} remaining",
                pixels.len(),
                recorder.remaining
            )));
        }

        recorder.remaining -= pixels.len();
        recorder.ops.push(DisplayOp::WritePixels(pixels.to_vec()));
        Ok(())
    }

    fn max_transfer_pixels(&self) -> usize {
        self.max_transfer
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new("Mock Display", format!("{}x{} RGB565", self.width, self.height))
    }
}

/// Inspection and fault-injection handle for a [`MockDisplay`].
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    recorder: Arc<Mutex<Recorder>>,
    fail_writes: Arc<AtomicBool>,
}

impl MockDisplayHandle {
    fn with_recorder<T>(&self, f: impl FnOnce(&Recorder) -> T) -> T {
        match self.recorder.lock() {
            Ok(recorder) => f(&recorder),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    /// All operations recorded so far.
    pub fn ops(&self) -> Vec<DisplayOp> {
        self.with_recorder(|r| r.ops.clone())
    }

    /// Windows opened, in order.
    pub fn windows(&self) -> Vec<Window> {
        self.with_recorder(|r| {
            r.ops
                .iter()
                .filter_map(|op| match op {
                    DisplayOp::SetWindow(w) => Some(*w),
                    DisplayOp::WritePixels(_) => None,
                })
                .collect()
        })
    }

    /// Size of every pixel transfer, in order.
    pub fn transfer_sizes(&self) -> Vec<usize> {
        self.with_recorder(|r| {
            r.ops
                .iter()
                .filter_map(|op| match op {
                    DisplayOp::WritePixels(p) => Some(p.len()),
                    DisplayOp::SetWindow(_) => None,
                })
                .collect()
        })
    }

    /// Total pixels written.
    pub fn pixels_written(&self) -> usize {
        self.transfer_sizes().iter().sum()
    }

    /// Color of the most recently written pixel.
    pub fn last_color(&self) -> Option<u16> {
        self.with_recorder(|r| {
            r.ops.iter().rev().find_map(|op| match op {
                DisplayOp::WritePixels(p) => p.last().copied(),
                DisplayOp::SetWindow(_) => None,
            })
        })
    }

    /// Forget recorded operations.
    pub fn clear(&self) {
        if let Ok(mut recorder) = self.recorder.lock() {
            recorder.ops.clear();
        }
    }

    /// Make subsequent pixel writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}
