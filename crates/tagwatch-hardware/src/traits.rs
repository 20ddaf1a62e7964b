//! Device trait definitions.
//!
//! These traits are the contract between the terminal pipeline and the
//! attached peripherals: a tag reader that produces detection events and a
//! display transport that accepts window and pixel writes.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! so they are not object-safe. Use generics, or the enum wrappers in
//! [`devices`](crate::devices) for concrete dispatch.

#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tagwatch_core::CredentialId;

use crate::error::Result;
use crate::types::{DeviceInfo, Window};

/// Lifecycle state of a tag in the reader's field.
///
/// Mirrors the PICC states of ISO 14443-3. Only [`TagState::Active`] means a
/// tag has been selected and its UID is complete; the other states are
/// emitted while a tag enters, leaves or is halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagState {
    Idle,
    Ready,
    Active,
    Halt,
}

impl TagState {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for TagState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "IDLE",
            Self::Ready => "READY",
            Self::Active => "ACTIVE",
            Self::Halt => "HALT",
        };
        write!(f, "{name}")
    }
}

/// A state change reported by the tag reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionEvent {
    /// UID of the tag in the field.
    pub uid: CredentialId,

    /// New state of the tag.
    pub state: TagState,

    /// When the reader observed the change.
    pub detected_at: DateTime<Utc>,
}

impl DetectionEvent {
    /// Create an event stamped with the current time.
    pub fn new(uid: CredentialId, state: TagState) -> Self {
        Self {
            uid,
            state,
            detected_at: Utc::now(),
        }
    }

    /// Shorthand for a tag becoming active.
    pub fn active(uid: CredentialId) -> Self {
        Self::new(uid, TagState::Active)
    }

    /// Override the observation time (replay and tests).
    pub fn at(mut self, detected_at: DateTime<Utc>) -> Self {
        self.detected_at = detected_at;
        self
    }
}

/// Source of tag detection events.
///
/// # Examples
///
/// ```no_run
/// use tagwatch_hardware::traits::TagReader;
/// use tagwatch_hardware::Result;
///
/// async fn wait_for_tag<R: TagReader>(reader: &mut R) -> Result<String> {
///     loop {
///         let event = reader.next_detection().await?;
///         if event.state.is_active() {
///             return Ok(event.uid.to_text());
///         }
///     }
/// }
/// ```
pub trait TagReader: Send {
    /// Wait for the next state change of a tag in the field.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected or delivers data that
    /// is not a valid UID. [`HardwareError::is_fatal`] tells the caller
    /// whether to keep reading.
    ///
    /// [`HardwareError::is_fatal`]: crate::HardwareError::is_fatal
    async fn next_detection(&mut self) -> Result<DetectionEvent>;

    /// Get device information.
    fn info(&self) -> DeviceInfo;
}

/// Pixel sink of an RGB565 display controller.
///
/// Painting is a sequence of `set_window` followed by one or more
/// `write_pixels` calls that together fill the window. A single
/// `write_pixels` call must not exceed [`max_transfer_pixels`].
///
/// [`max_transfer_pixels`]: DisplayTransport::max_transfer_pixels
pub trait DisplayTransport: Send {
    /// Select the rectangle subsequent pixel writes fill.
    ///
    /// # Errors
    ///
    /// Returns an error if the window lies outside the panel or the
    /// transport fails.
    async fn set_window(&mut self, window: Window) -> Result<()>;

    /// Write RGB565 pixels into the current window.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::TransferTooLarge` if `pixels` exceeds the
    /// transfer limit, or a communication error.
    async fn write_pixels(&mut self, pixels: &[u16]) -> Result<()>;

    /// Largest pixel count accepted by one `write_pixels` call.
    fn max_transfer_pixels(&self) -> usize;

    /// Get device information.
    fn info(&self) -> DeviceInfo;
}
