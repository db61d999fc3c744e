//! Persistent record of topology recoveries.
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use super::AnalysisEntry;
use super::InstanceKey;

/// Identity of an orchestrator process within the fleet of peers.
///
/// The token is unique per process lifetime so operators can tell apart
/// restarts of the same host when inspecting recovery records.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub hostname: String,
    pub token: String,
}

impl NodeIdentity {
    pub fn new<S>(hostname: S) -> NodeIdentity
    where
        S: Into<String>,
    {
        NodeIdentity {
            hostname: hostname.into(),
            token: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Persistent record of one recovery attempt for a failed instance.
///
/// Created active when a peer claims the recovery, flipped inactive once the
/// recovery resolves, immutable afterwards. The store guarantees at most one
/// active record per analyzed key across the whole fleet.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TopologyRecovery {
    /// Monotonically assigned identifier of the recovery.
    pub recovery_id: u64,

    /// The analysis finding that triggered the recovery.
    pub entry: AnalysisEntry,

    /// Instance promoted in place of the failed one, once known.
    #[serde(default)]
    pub successor_key: Option<InstanceKey>,

    pub active: bool,

    #[serde(with = "time::serde::rfc3339")]
    pub started: OffsetDateTime,

    #[serde(default, with = "time::serde::rfc3339::option")]
    pub ended: Option<OffsetDateTime>,

    /// The orchestrator process that claimed this recovery.
    pub processing_node: NodeIdentity,
}
