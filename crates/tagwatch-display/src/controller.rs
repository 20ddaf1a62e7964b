//! Display Feedback Controller.
//!
//! Owns the display transport and paints one of three full-screen states.
//! A non-idle state is held for the dwell and then replaced by `Idle`:
//!
//! ```text
//! Idle ──show(A|B)──► CategoryA|CategoryB ──dwell──► Idle
//! ```
//!
//! The revert is an explicit second phase. [`FeedbackController::show`] runs
//! both phases back to back, waiting on the [`Timer`] in between, and
//! returns only after the panel is idle again. Callers that want to do
//! other work during the dwell use [`begin`](FeedbackController::begin) and
//! [`complete_revert`](FeedbackController::complete_revert) directly.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use tagwatch_display::{DisplayState, FeedbackController, PanelGeometry};
//! use tagwatch_hardware::mock::MockDisplay;
//!
//! #[tokio::main(flavor = "current_thread", start_paused = true)]
//! async fn main() -> tagwatch_display::Result<()> {
//!     let (display, handle) = MockDisplay::new();
//!     let geometry = PanelGeometry::new(128, 160, 40)?;
//!     let mut controller = FeedbackController::new(display, geometry, Duration::from_secs(3));
//!
//!     controller.show(DisplayState::CategoryA).await?;
//!
//!     assert_eq!(controller.current_state(), DisplayState::Idle);
//!     assert_eq!(handle.last_color(), Some(0x8410));
//!     Ok(())
//! }
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use tagwatch_core::DisplayConfig;
use tagwatch_hardware::{AnyDisplay, DisplayTransport};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{DisplayError, Result};
use crate::painter::{self, PanelGeometry};
use crate::state::{DisplayState, DisplayTransition};
use crate::timer::{Timer, TokioTimer};

/// Maximum number of transitions kept in history.
///
/// One feedback cycle records two transitions, so this covers the last 50
/// recognized presentations.
pub const MAX_HISTORY_SIZE: usize = 100;

/// A shown state waiting to be reverted to `Idle`.
#[derive(Debug)]
#[must_use = "a shown state must be reverted with complete_revert"]
pub struct PendingRevert {
    shown: DisplayState,
    due: Instant,
}

impl PendingRevert {
    /// The state currently on screen.
    pub fn shown(&self) -> DisplayState {
        self.shown
    }

    /// Earliest instant the revert may happen.
    pub fn due(&self) -> Instant {
        self.due
    }

    /// Dwell left before `due`.
    pub fn remaining(&self) -> Duration {
        self.due.saturating_duration_since(Instant::now())
    }
}

/// Paints feedback states and reverts them after the dwell.
pub struct FeedbackController<D = AnyDisplay, T = TokioTimer> {
    display: D,
    timer: T,
    geometry: PanelGeometry,
    dwell: Duration,
    state: DisplayState,
    history: VecDeque<DisplayTransition>,
}

impl<D: DisplayTransport> FeedbackController<D, TokioTimer> {
    /// Controller using the tokio timer.
    ///
    /// The controller starts in `Idle` without painting; call
    /// [`paint_idle`](Self::paint_idle) to clear whatever the panel shows at
    /// power-up.
    pub fn new(display: D, geometry: PanelGeometry, dwell: Duration) -> Self {
        Self::with_timer(display, TokioTimer, geometry, dwell)
    }

    /// Controller configured from the display section of the terminal
    /// configuration.
    ///
    /// # Errors
    /// Returns `DisplayError::Geometry` for unusable panel dimensions.
    pub fn from_config(display: D, config: &DisplayConfig) -> Result<Self> {
        let geometry = PanelGeometry::from_config(config)?;
        Ok(Self::new(display, geometry, config.dwell()))
    }
}

impl<D: DisplayTransport, T: Timer> FeedbackController<D, T> {
    /// Controller with an explicit timer.
    pub fn with_timer(display: D, timer: T, geometry: PanelGeometry, dwell: Duration) -> Self {
        Self {
            display,
            timer,
            geometry,
            dwell,
            state: DisplayState::Idle,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// State currently on screen.
    pub fn current_state(&self) -> DisplayState {
        self.state
    }

    /// How long a non-idle state is held.
    pub fn dwell(&self) -> Duration {
        self.dwell
    }

    /// The transport.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Completed transitions, oldest first.
    pub fn history(&self) -> &VecDeque<DisplayTransition> {
        &self.history
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<DisplayTransition> {
        self.history
            .iter()
            .skip(self.history.len().saturating_sub(count))
            .cloned()
            .collect()
    }

    /// Paint `state`; for a non-idle state hold it for the dwell and then
    /// paint `Idle`.
    ///
    /// Returns after the last transfer of the final paint.
    ///
    /// # Errors
    /// - `DisplayError::InvalidTransition` if a non-idle state is already shown
    /// - `DisplayError::Transport` if a paint fails; a failed feedback paint
    ///   skips the dwell, a failed revert still leaves the controller `Idle`
    pub async fn show(&mut self, state: DisplayState) -> Result<()> {
        if state.is_idle() {
            return self.paint_idle().await;
        }

        let pending = self.begin(state).await?;
        self.complete_revert(pending).await
    }

    /// Paint `Idle`.
    ///
    /// # Errors
    /// Returns `DisplayError::Transport` if the paint fails.
    pub async fn paint_idle(&mut self) -> Result<()> {
        self.paint(DisplayState::Idle).await.map(|_| ())
    }

    /// First phase: paint a non-idle state and return its pending revert.
    ///
    /// [`complete_revert`](Self::complete_revert) holds the state until
    /// [`PendingRevert::due`] if called earlier.
    ///
    /// # Errors
    /// Returns `DisplayError::InvalidTransition` for `Idle` or when a
    /// non-idle state is already shown, and `DisplayError::Transport` if the
    /// paint fails.
    pub async fn begin(&mut self, state: DisplayState) -> Result<PendingRevert> {
        if state.is_idle() {
            return Err(DisplayError::InvalidTransition {
                from: self.state,
                to: state,
            });
        }

        let transition = self.paint(state).await?;
        info!("Display showing {} for {}ms", state, self.dwell.as_millis());

        Ok(PendingRevert {
            shown: state,
            due: transition.at + self.dwell,
        })
    }

    /// Second phase: wait out whatever is left of the dwell, then paint
    /// `Idle`.
    ///
    /// # Errors
    /// Returns `DisplayError::Transport` if the paint fails. The controller
    /// is `Idle` afterwards either way.
    pub async fn complete_revert(&mut self, pending: PendingRevert) -> Result<()> {
        let remaining = pending.remaining();
        if !remaining.is_zero() {
            debug!("Holding {} for another {}ms", pending.shown, remaining.as_millis());
            self.timer.sleep(remaining).await;
        }
        self.paint_idle().await?;
        debug!("Display reverted from {}", pending.shown);
        Ok(())
    }

    async fn paint(&mut self, target: DisplayState) -> Result<DisplayTransition> {
        if !self.state.can_transition_to(target) {
            return Err(DisplayError::InvalidTransition {
                from: self.state,
                to: target,
            });
        }

        match painter::fill(&mut self.display, &self.geometry, target.color()).await {
            Ok(stats) => debug!(
                "Painted {} in {} bands, {} transfers",
                target, stats.bands, stats.transfers
            ),
            Err(e) => {
                warn!("Failed to paint {}: {}", target, e);
                if target.is_idle() {
                    self.state = DisplayState::Idle;
                }
                return Err(e);
            }
        }

        let transition = DisplayTransition::new(self.state, target);
        self.state = target;
        self.add_to_history(transition.clone());
        Ok(transition)
    }

    fn add_to_history(&mut self, transition: DisplayTransition) {
        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tagwatch_hardware::mock::{MockDisplay, MockDisplayHandle};

    const DWELL: Duration = Duration::from_millis(3000);

    /// Timer that records requests and returns at once.
    #[derive(Clone, Default)]
    struct RecordingTimer {
        requests: Arc<Mutex<Vec<Duration>>>,
    }

    impl Timer for RecordingTimer {
        async fn sleep(&self, duration: Duration) {
            self.requests.lock().unwrap().push(duration);
        }
    }

    fn controller() -> (FeedbackController<MockDisplay>, MockDisplayHandle) {
        let (display, handle) = MockDisplay::new();
        let geometry = PanelGeometry::new(128, 160, 40).unwrap();
        (FeedbackController::new(display, geometry, DWELL), handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_paints_then_reverts_after_dwell() {
        let (mut controller, handle) = controller();
        let start = Instant::now();

        controller.show(DisplayState::CategoryA).await.unwrap();

        assert!(start.elapsed() >= DWELL);
        assert_eq!(controller.current_state(), DisplayState::Idle);

        let history = controller.last_transitions(2);
        assert_eq!(history[0].to, DisplayState::CategoryA);
        assert_eq!(history[1].from, DisplayState::CategoryA);
        assert_eq!(history[1].to, DisplayState::Idle);
        assert!(history[1].at - history[0].at >= DWELL);

        // Two full frames: green, then gray
        assert_eq!(handle.pixels_written(), 2 * 128 * 160);
        assert_eq!(handle.last_color(), Some(0x8410));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_is_painted_without_dwell() {
        let (mut controller, handle) = controller();
        let start = Instant::now();

        controller.show(DisplayState::Idle).await.unwrap();

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(controller.history().len(), 1);
        assert_eq!(handle.last_color(), Some(0x8410));
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_asks_timer_for_dwell() {
        let (display, _handle) = MockDisplay::new();
        let timer = RecordingTimer::default();
        let geometry = PanelGeometry::new(128, 160, 40).unwrap();
        let mut controller =
            FeedbackController::with_timer(display, timer.clone(), geometry, DWELL);

        controller.show(DisplayState::CategoryB).await.unwrap();

        assert_eq!(*timer.requests.lock().unwrap(), vec![DWELL]);
        assert_eq!(controller.current_state(), DisplayState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_phase_api() {
        let (mut controller, handle) = controller();

        let pending = controller.begin(DisplayState::CategoryB).await.unwrap();
        assert_eq!(pending.shown(), DisplayState::CategoryB);
        assert_eq!(pending.remaining(), DWELL);
        assert_eq!(controller.current_state(), DisplayState::CategoryB);
        assert_eq!(handle.last_color(), Some(0xF800));

        // A second feedback state cannot start while one is shown
        let err = controller.begin(DisplayState::CategoryA).await.unwrap_err();
        assert!(matches!(err, DisplayError::InvalidTransition { .. }));

        tokio::time::sleep_until(pending.due()).await;
        controller.complete_revert(pending).await.unwrap();
        assert_eq!(controller.current_state(), DisplayState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_revert_still_holds_dwell() {
        let (mut controller, handle) = controller();
        let start = Instant::now();

        let pending = controller.begin(DisplayState::CategoryB).await.unwrap();
        controller.complete_revert(pending).await.unwrap();

        assert!(start.elapsed() >= DWELL);
        assert_eq!(controller.current_state(), DisplayState::Idle);
        assert_eq!(handle.last_color(), Some(0x8410));

        let history = controller.last_transitions(2);
        assert_eq!(history[0].to, DisplayState::CategoryB);
        assert!(history[1].at - history[0].at >= DWELL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revert_after_partial_wait_sleeps_only_the_rest() {
        let (display, _handle) = MockDisplay::new();
        let timer = RecordingTimer::default();
        let geometry = PanelGeometry::new(128, 160, 40).unwrap();
        let mut controller =
            FeedbackController::with_timer(display, timer.clone(), geometry, DWELL);

        let pending = controller.begin(DisplayState::CategoryA).await.unwrap();
        tokio::time::advance(Duration::from_millis(1000)).await;
        controller.complete_revert(pending).await.unwrap();

        assert_eq!(*timer.requests.lock().unwrap(), vec![Duration::from_millis(2000)]);
    }

    #[tokio::test]
    async fn test_begin_rejects_idle() {
        let (mut controller, _handle) = controller();
        assert!(controller.begin(DisplayState::Idle).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_feedback_paint_skips_dwell() {
        let (mut controller, handle) = controller();
        handle.set_fail_writes(true);
        let start = Instant::now();

        let err = controller.show(DisplayState::CategoryA).await.unwrap_err();

        assert!(matches!(err, DisplayError::Transport(_)));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(controller.current_state(), DisplayState::Idle);
        assert!(controller.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_revert_leaves_controller_idle() {
        let (mut controller, handle) = controller();

        let pending = controller.begin(DisplayState::CategoryA).await.unwrap();
        handle.set_fail_writes(true);
        tokio::time::advance(DWELL).await;

        assert!(controller.complete_revert(pending).await.is_err());
        assert_eq!(controller.current_state(), DisplayState::Idle);

        handle.set_fail_writes(false);
        controller.show(DisplayState::CategoryB).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_is_bounded() {
        let (mut controller, _handle) = controller();

        for _ in 0..60 {
            controller.show(DisplayState::CategoryA).await.unwrap();
        }

        assert_eq!(controller.history().len(), MAX_HISTORY_SIZE);
        assert_eq!(controller.last_transitions(1)[0].to, DisplayState::Idle);
    }

    #[tokio::test]
    async fn test_from_config() {
        let (display, _handle) = MockDisplay::new();
        let config = DisplayConfig {
            dwell_ms: 1500,
            ..DisplayConfig::default()
        };
        let controller = FeedbackController::from_config(display, &config).unwrap();
        assert_eq!(controller.dwell(), Duration::from_millis(1500));
    }
}
