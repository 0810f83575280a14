//! Tier-driven scheduling policy tables.
//!
//! One place for every tier-keyed constant so the queue, facade and worker
//! cannot drift apart.

use std::time::Duration;

use super::ConnectionTier;

/// How many queued requests one drain cycle sends concurrently.
pub fn batch_size(tier: ConnectionTier) -> usize {
    match tier {
        ConnectionTier::Slow2g => 1,
        ConnectionTier::TwoG => 2,
        ConnectionTier::ThreeG => 5,
        _ => 10,
    }
}

/// Per-request timeout used by the queue drain path.
pub fn queue_timeout(tier: ConnectionTier) -> Duration {
    match tier {
        ConnectionTier::Slow2g => Duration::from_secs(30),
        ConnectionTier::TwoG => Duration::from_secs(20),
        ConnectionTier::ThreeG => Duration::from_secs(15),
        _ => Duration::from_secs(10),
    }
}

/// Delay between drain cycles while items remain. A backoff floor, not
/// exponential backoff; the facade carries its own exponential layer.
pub fn drain_delay(tier: ConnectionTier) -> Duration {
    match tier {
        ConnectionTier::Slow2g => Duration::from_secs(10),
        ConnectionTier::TwoG => Duration::from_secs(5),
        _ => Duration::from_secs(1),
    }
}

/// Default facade retry budget per call.
pub fn facade_retries(tier: ConnectionTier) -> u32 {
    match tier {
        ConnectionTier::Slow2g => 5,
        ConnectionTier::TwoG => 4,
        ConnectionTier::ThreeG => 3,
        _ => 2,
    }
}

/// Per-request timeout used by the facade's direct network path.
pub fn facade_timeout(tier: ConnectionTier) -> Duration {
    match tier {
        ConnectionTier::Slow2g => Duration::from_secs(30),
        ConnectionTier::TwoG => Duration::from_secs(20),
        ConnectionTier::ThreeG => Duration::from_secs(10),
        _ => Duration::from_secs(5),
    }
}
