//! Connection tier and status models.

use serde::{Deserialize, Serialize};

/// Discrete network-quality classification driving batch size, timeout and
/// retry policy. Reported as `Unknown` when the platform exposes no
/// network-information capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionTier {
    #[serde(rename = "slow-2g")]
    Slow2g,
    #[serde(rename = "2g")]
    TwoG,
    #[serde(rename = "3g")]
    ThreeG,
    #[serde(rename = "4g")]
    FourG,
    #[serde(rename = "unknown")]
    Unknown,
}

impl ConnectionTier {
    /// True for the tiers where aggressive sending is counterproductive.
    pub fn is_slow(&self) -> bool {
        matches!(self, ConnectionTier::Slow2g | ConnectionTier::TwoG)
    }
}

impl std::fmt::Display for ConnectionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionTier::Slow2g => "slow-2g",
            ConnectionTier::TwoG => "2g",
            ConnectionTier::ThreeG => "3g",
            ConnectionTier::FourG => "4g",
            ConnectionTier::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Derived status shown to dependents. `Limited` means nominally online but
/// effectively unusable: slow-2g/2g tier, or a failed liveness probe while
/// the platform still reports online.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Online,
    Offline,
    Limited,
}

/// A point-in-time reading of connectivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSnapshot {
    pub is_online: bool,
    pub tier: ConnectionTier,
    pub status: ConnectionStatus,
    /// Downlink estimate in Mbps, when the platform exposes it.
    pub downlink_mbps: Option<f64>,
    /// Round-trip-time estimate in ms, when the platform exposes it.
    pub rtt_ms: Option<u32>,
    pub save_data: bool,
}

impl NetworkSnapshot {
    /// Best-effort initial reading before any platform data arrives.
    pub fn initial(is_online: bool, tier: ConnectionTier) -> Self {
        Self {
            is_online,
            tier,
            status: derive_status(is_online, tier, true),
            downlink_mbps: None,
            rtt_ms: None,
            save_data: false,
        }
    }
}

/// Status derivation rule. `probe_ok` is the most recent liveness probe
/// outcome; it only matters while nominally online.
pub fn derive_status(is_online: bool, tier: ConnectionTier, probe_ok: bool) -> ConnectionStatus {
    if !is_online {
        return ConnectionStatus::Offline;
    }
    if !probe_ok || tier.is_slow() {
        return ConnectionStatus::Limited;
    }
    ConnectionStatus::Online
}
