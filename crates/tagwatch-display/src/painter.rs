//! Full-screen fill in bounded transfers.
//!
//! A frame is larger than the transport's largest transfer (128x160 pixels
//! against 1024), so the panel is painted as horizontal bands. Each band
//! opens its own window and is written in chunks no larger than the
//! transport limit.

use tagwatch_core::DisplayConfig;
use tagwatch_hardware::{DisplayTransport, Window};
use tracing::trace;

use crate::error::{DisplayError, Result};

/// Panel size and band height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelGeometry {
    pub width: u16,
    pub height: u16,
    pub band_height: u16,
}

impl PanelGeometry {
    /// Validated geometry.
    ///
    /// # Errors
    /// Returns `DisplayError::Geometry` for a zero dimension or a band taller
    /// than the panel.
    pub fn new(width: u16, height: u16, band_height: u16) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(DisplayError::Geometry(format!(
                "panel must be non-empty, got {width}x{height}"
            )));
        }
        if band_height == 0 || band_height > height {
            return Err(DisplayError::Geometry(format!(
                "band height must be in 1..={height}, got {band_height}"
            )));
        }
        Ok(Self {
            width,
            height,
            band_height,
        })
    }

    /// Geometry from the display section of the terminal configuration.
    ///
    /// # Errors
    /// See [`PanelGeometry::new`].
    pub fn from_config(config: &DisplayConfig) -> Result<Self> {
        Self::new(config.width, config.height, config.band_height)
    }

    /// Band windows covering the panel top to bottom. The last band is
    /// shorter when the height is not a multiple of the band height.
    pub fn bands(&self) -> impl Iterator<Item = Window> + '_ {
        (0..self.height)
            .step_by(usize::from(self.band_height))
            .map(move |y| {
                let rows = self.band_height.min(self.height - y);
                Window::new(0, y, self.width, rows)
            })
    }
}

/// Pixel and transfer counts of one fill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintStats {
    pub bands: usize,
    pub transfers: usize,
    pub pixels: usize,
}

/// Cover the whole panel with `color`.
///
/// Returns once every transfer has completed.
///
/// # Errors
/// Returns the first transport error; the panel is then partly painted.
pub async fn fill<D: DisplayTransport>(
    display: &mut D,
    geometry: &PanelGeometry,
    color: u16,
) -> Result<PaintStats> {
    let max_chunk = display.max_transfer_pixels();
    if max_chunk == 0 {
        return Err(DisplayError::Geometry(
            "transport accepts no pixels per transfer".to_string(),
        ));
    }

    let band_pixels = usize::from(geometry.width) * usize::from(geometry.band_height);
    let buffer = vec![color; band_pixels.min(max_chunk)];
    let mut stats = PaintStats::default();

    for band in geometry.bands() {
        display.set_window(band).await?;
        stats.bands += 1;

        let mut remaining = band.pixel_count();
        while remaining > 0 {
            let chunk = remaining.min(buffer.len());
            display.write_pixels(&buffer[..chunk]).await?;
            remaining -= chunk;
            stats.transfers += 1;
            stats.pixels += chunk;
        }
        trace!("Painted band {}", band);
    }

    Ok(stats)
}
