//! Display states and their transitions.
//!
//! The panel shows exactly one of three full-screen colors at a time:
//!
//! | State       | Color (RGB565) |
//! |-------------|----------------|
//! | `Idle`      | gray `0x8410`  |
//! | `CategoryA` | green `0x07E0` |
//! | `CategoryB` | red `0xF800`   |
//!
//! # Valid Transitions
//!
//! - Idle → CategoryA | CategoryB (classified detection)
//! - CategoryA | CategoryB → Idle (after the dwell)
//! - Idle → Idle (repaint, e.g. at startup)

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tagwatch_core::IdentityCategory;
use tokio::time::Instant;

/// Gray (RGB565).
pub const IDLE_COLOR: u16 = 0x8410;

/// Green (RGB565).
pub const CATEGORY_A_COLOR: u16 = 0x07E0;

/// Red (RGB565).
pub const CATEGORY_B_COLOR: u16 = 0xF800;

/// What the panel currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayState {
    Idle,
    CategoryA,
    CategoryB,
}

impl DisplayState {
    /// Fill color of this state.
    pub fn color(self) -> u16 {
        match self {
            DisplayState::Idle => IDLE_COLOR,
            DisplayState::CategoryA => CATEGORY_A_COLOR,
            DisplayState::CategoryB => CATEGORY_B_COLOR,
        }
    }

    /// Feedback state for a classification; `None` for `Unknown`.
    ///
    /// ```
    /// use tagwatch_core::IdentityCategory;
    /// use tagwatch_display::DisplayState;
    ///
    /// assert_eq!(
    ///     DisplayState::for_category(IdentityCategory::CategoryB),
    ///     Some(DisplayState::CategoryB)
    /// );
    /// assert_eq!(DisplayState::for_category(IdentityCategory::Unknown), None);
    /// ```
    pub fn for_category(category: IdentityCategory) -> Option<Self> {
        match category {
            IdentityCategory::CategoryA => Some(DisplayState::CategoryA),
            IdentityCategory::CategoryB => Some(DisplayState::CategoryB),
            IdentityCategory::Unknown => None,
        }
    }

    pub fn is_idle(self) -> bool {
        matches!(self, DisplayState::Idle)
    }

    /// Check whether moving to `target` is allowed.
    pub fn can_transition_to(self, target: DisplayState) -> bool {
        matches!(
            (self, target),
            (DisplayState::Idle, _)
                | (DisplayState::CategoryA | DisplayState::CategoryB, DisplayState::Idle)
        )
    }
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayState::Idle => write!(f, "Idle"),
            DisplayState::CategoryA => write!(f, "CategoryA"),
            DisplayState::CategoryB => write!(f, "CategoryB"),
        }
    }
}

/// A completed paint from one state to another.
///
/// `at` is taken from the tokio clock so paused-time tests observe the
/// dwell exactly. It is not serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayTransition {
    pub from: DisplayState,
    pub to: DisplayState,

    #[serde(skip, default = "Instant::now")]
    pub at: Instant,
}

impl DisplayTransition {
    pub fn new(from: DisplayState, to: DisplayState) -> Self {
        Self {
            from,
            to,
            at: Instant::now(),
        }
    }

    /// Time since the transition completed.
    pub fn elapsed(&self) -> Duration {
        self.at.elapsed()
    }
}
