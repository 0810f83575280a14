//! Retry ceilings and backoff policy.
//!
//! The foreground queue and the background worker intentionally carry
//! different retry ceilings (5 vs 3). Both are named, overridable
//! configuration rather than constants buried at the call sites.

use std::time::Duration;

/// Default retry ceiling for the foreground request queue.
pub const FOREGROUND_MAX_RETRIES: i32 = 5;

/// Default retry ceiling for the background sync worker.
pub const BACKGROUND_MAX_RETRIES: i32 = 3;

/// Liveness probe cadence for the network monitor.
pub const LIVENESS_PROBE_INTERVAL_SECS: u64 = 30;

/// Background re-drain cadence while offline or on slow-2g.
pub const QUEUE_SYNC_INTERVAL_SECS: u64 = 30;

/// How long a "back online" banner stays visible before auto-dismissing.
/// Presentation concern; not a monitor invariant.
pub const ONLINE_BANNER_GRACE: Duration = Duration::from_secs(3);

/// Exponential backoff used by the API facade's own retry layer:
/// 1000ms * 2^attempt, capped to avoid overflow on absurd attempt counts.
pub fn facade_backoff(attempt: u32) -> Duration {
    const BASE_DELAY_MS: u64 = 1_000;
    const MAX_EXPONENT: u32 = 10;
    Duration::from_millis(BASE_DELAY_MS.saturating_mul(1_u64 << attempt.min(MAX_EXPONENT)))
}
