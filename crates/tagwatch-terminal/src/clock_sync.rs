//! Startup wait for network time.

use std::time::Duration;

use tagwatch_core::constants::{CLOCK_SYNC_ATTEMPTS, CLOCK_SYNC_INTERVAL_MS};
use tagwatch_core::{WallClock, is_synchronized};
use tracing::{info, warn};

/// Poll `clock` until it reads a plausible date.
///
/// Checks up to `attempts` times, `interval` apart. Returns whether the
/// clock is synchronized; an unsynchronized clock is only reported, and
/// timestamps produced afterwards will sit near the epoch.
pub async fn wait_for_clock_sync<C: WallClock>(
    clock: &C,
    attempts: u32,
    interval: Duration,
) -> bool {
    for attempt in 1..=attempts {
        let now = clock.now();
        if is_synchronized(&now) {
            info!("System clock synchronized: {}", now);
            return true;
        }
        info!("Waiting for system time to be set ({}/{})", attempt, attempts);
        tokio::time::sleep(interval).await;
    }

    let now = clock.now();
    if is_synchronized(&now) {
        info!("System clock synchronized: {}", now);
        return true;
    }
    warn!(
        "System clock not synchronized after {} attempts, still at {}",
        attempts, now
    );
    false
}

/// [`wait_for_clock_sync`] with the default 10 attempts, 2 s apart.
pub async fn wait_for_clock_sync_default<C: WallClock>(clock: &C) -> bool {
    wait_for_clock_sync(
        clock,
        CLOCK_SYNC_ATTEMPTS,
        Duration::from_millis(CLOCK_SYNC_INTERVAL_MS),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tagwatch_core::FixedClock;
    use tokio::time::Instant;

    /// Reads the epoch for the first `until` calls, then 2024.
    struct LateClock {
        calls: AtomicU32,
        until: u32,
    }

    impl WallClock for LateClock {
        fn now(&self) -> DateTime<Utc> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.until {
                DateTime::<Utc>::UNIX_EPOCH
            } else {
                Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_synchronized_clock_returns_immediately() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        let start = Instant::now();

        assert!(wait_for_clock_sync_default(&clock).await);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_all_attempts() {
        let clock = FixedClock(DateTime::<Utc>::UNIX_EPOCH);
        let start = Instant::now();

        assert!(!wait_for_clock_sync_default(&clock).await);
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_until_clock_is_set() {
        let clock = LateClock {
            calls: AtomicU32::new(0),
            until: 3,
        };
        let start = Instant::now();

        assert!(wait_for_clock_sync_default(&clock).await);
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }
}
