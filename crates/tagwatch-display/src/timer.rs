//! Dwell timer abstraction.
//!
//! The controller never sleeps directly; it asks a [`Timer`]. Production
//! code uses [`TokioTimer`], which honours tokio's paused clock, so tests can
//! advance through a dwell without waiting for it.

#![allow(async_fn_in_trait)]

use std::time::Duration;

/// Waits for a duration.
pub trait Timer: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Timer backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
