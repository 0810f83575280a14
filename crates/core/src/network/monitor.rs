//! Connectivity monitor: a single explicitly-constructed subject.
//!
//! The platform layer feeds readings in through the setters; dependents
//! subscribe through a watch channel and unsubscribe by dropping the
//! receiver. No global state, so tests drive the monitor directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{derive_status, ConnectionStatus, ConnectionTier, NetworkSnapshot};
use crate::sync::LIVENESS_PROBE_INTERVAL_SECS;

/// Reachability probe the monitor runs on a 30s cadence. Distinguishes
/// "radio up, server unreachable" from true online.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// True when the server answered the probe.
    async fn ping(&self) -> bool;
}

pub struct NetworkMonitor {
    state: watch::Sender<NetworkSnapshot>,
    probe_ok: AtomicBool,
}

impl NetworkMonitor {
    /// Create a monitor from a best-effort initial platform reading.
    pub fn new(is_online: bool, tier: ConnectionTier) -> Self {
        let (state, _) = watch::channel(NetworkSnapshot::initial(is_online, tier));
        Self {
            state,
            probe_ok: AtomicBool::new(true),
        }
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        self.state.borrow().clone()
    }

    pub fn is_online(&self) -> bool {
        self.state.borrow().is_online
    }

    pub fn tier(&self) -> ConnectionTier {
        self.state.borrow().tier
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.borrow().status
    }

    /// Subscribe to connectivity changes. Dropping the receiver
    /// unsubscribes; there is nothing else to clean up.
    pub fn subscribe(&self) -> watch::Receiver<NetworkSnapshot> {
        self.state.subscribe()
    }

    /// Platform online/offline transition. Offline fires immediately and
    /// unconditionally; coming back online presumes the server reachable
    /// until the next probe says otherwise.
    pub fn set_online(&self, is_online: bool) {
        if is_online {
            self.probe_ok.store(true, Ordering::Relaxed);
        }
        self.apply(|snapshot| snapshot.is_online = is_online);
    }

    /// Platform tier change (network-information capability).
    pub fn set_tier(&self, tier: ConnectionTier) {
        self.apply(|snapshot| snapshot.tier = tier);
    }

    /// Optional platform metrics accompanying a tier change.
    pub fn set_metrics(&self, downlink_mbps: Option<f64>, rtt_ms: Option<u32>, save_data: bool) {
        self.apply(|snapshot| {
            snapshot.downlink_mbps = downlink_mbps;
            snapshot.rtt_ms = rtt_ms;
            snapshot.save_data = save_data;
        });
    }

    /// Record a liveness probe outcome. A failure while nominally online
    /// degrades the status to `Limited`.
    pub fn record_probe_result(&self, ok: bool) {
        self.probe_ok.store(ok, Ordering::Relaxed);
        self.apply(|_| {});
    }

    fn apply(&self, mutate: impl FnOnce(&mut NetworkSnapshot)) {
        let probe_ok = self.probe_ok.load(Ordering::Relaxed);
        self.state.send_if_modified(|snapshot| {
            let before = snapshot.clone();
            mutate(snapshot);
            snapshot.status = derive_status(snapshot.is_online, snapshot.tier, probe_ok);
            if *snapshot != before {
                debug!(
                    "[NetworkMonitor] online={} tier={} status={:?}",
                    snapshot.is_online, snapshot.tier, snapshot.status
                );
                true
            } else {
                false
            }
        });
    }
}

/// Spawn the periodic liveness loop. Probes only while nominally online;
/// the task lives for the page/worker lifetime and is aborted on teardown.
pub fn spawn_liveness_loop(
    monitor: Arc<NetworkMonitor>,
    probe: Arc<dyn LivenessProbe>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(LIVENESS_PROBE_INTERVAL_SECS));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if !monitor.is_online() {
                continue;
            }
            let ok = probe.ping().await;
            if !ok {
                warn!("[NetworkMonitor] Liveness probe failed while platform reports online");
            }
            monitor.record_probe_result(ok);
        }
    })
}
