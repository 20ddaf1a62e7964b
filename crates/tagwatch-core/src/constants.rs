//! Core constants for the tagwatch access terminal.
//!
//! These values are the fixed configuration of the terminal: the reference
//! credentials of the allow-list, the display geometry of the attached
//! ST7735 panel, the feedback dwell, the time-zone rule and the remote
//! endpoints. [`TerminalConfig`](crate::config::TerminalConfig) uses them as
//! defaults; nothing here changes at runtime.
//!
//! # Usage
//!
//! ```
//! use tagwatch_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(REFERENCE_UID_LENGTH, 4);
//! let dwell = Duration::from_millis(DEFAULT_DWELL_MS);
//! assert_eq!(dwell.as_secs(), 3);
//! ```

// ============================================================================
// Credentials
// ============================================================================

/// Length in bytes of the allow-list reference identifiers.
///
/// Identifiers of any other length never match a reference.
pub const REFERENCE_UID_LENGTH: usize = 4;

/// Minimum credential identifier length accepted from a reader.
pub const MIN_UID_LENGTH: usize = 1;

/// Maximum credential identifier length (ISO 14443 triple-size UID).
pub const MAX_UID_LENGTH: usize = 10;

/// Default reference identifier for [`IdentityCategory::CategoryA`](crate::IdentityCategory::CategoryA).
pub const DEFAULT_CATEGORY_A_UID: [u8; REFERENCE_UID_LENGTH] = [0x99, 0xB6, 0xB3, 0x02];

/// Default reference identifier for [`IdentityCategory::CategoryB`](crate::IdentityCategory::CategoryB).
pub const DEFAULT_CATEGORY_B_UID: [u8; REFERENCE_UID_LENGTH] = [0x25, 0x0F, 0xC5, 0x01];

// ============================================================================
// Display
// ============================================================================

/// Default time a non-idle feedback state stays on screen (milliseconds).
pub const DEFAULT_DWELL_MS: u64 = 3000;

/// Horizontal resolution of the panel in pixels.
pub const DEFAULT_DISPLAY_WIDTH: u16 = 128;

/// Vertical resolution of the panel in pixels.
pub const DEFAULT_DISPLAY_HEIGHT: u16 = 160;

/// Height in rows of one painted band.
pub const DEFAULT_BAND_HEIGHT: u16 = 40;

/// Largest number of pixels the transport accepts in one transfer.
pub const DEFAULT_MAX_TRANSFER_PIXELS: usize = 1024;

// ============================================================================
// Time
// ============================================================================

/// Output format of access log timestamps.
///
/// The trailing `Z` is literal: the value is local time in the configured
/// zone, not UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Default POSIX time-zone rule (Israel, with daylight saving).
pub const DEFAULT_TIMEZONE_RULE: &str = "IST-2IDT,M3.4.4/26,M10.5.0";

/// Earliest year considered evidence of a synchronized wall clock.
pub const MIN_SYNCHRONIZED_YEAR: i32 = 2016;

/// Attempts made by the startup clock-sync wait.
pub const CLOCK_SYNC_ATTEMPTS: u32 = 10;

/// Delay between clock-sync checks (milliseconds).
pub const CLOCK_SYNC_INTERVAL_MS: u64 = 2000;

// ============================================================================
// Remote endpoints
// ============================================================================

/// Identity provider password sign-in endpoint (API key is appended as `?key=`).
pub const DEFAULT_IDENTITY_URL: &str =
    "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword";

/// Realtime database host suffix; the project id is prepended as `{project}-default-rtdb`.
pub const DATABASE_HOST_SUFFIX: &str = "firebaseio.com";

/// Path of the access log collection below the database root.
pub const LOG_COLLECTION_PATH: &str = "rfid_logs.json";

/// Default timeout for a single HTTP exchange (milliseconds).
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
