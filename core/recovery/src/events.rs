//! Audit event codes and payloads emitted by the recovery core.
use serde::Deserialize;
use serde::Serialize;

use replimend_models::AnalysisVerdict;
use replimend_models::InstanceKey;
use replimend_models::NodeIdentity;

/// A recovery claim was granted to this process.
pub const RECOVERY_REGISTERED: &str = "RECOVERY_REGISTERED";

/// A recovery claim was declined (held by a peer or cluster in cooldown).
pub const RECOVERY_DECLINED: &str = "RECOVERY_DECLINED";

/// An active recovery completed and recorded its successor.
pub const RECOVERY_RESOLVED: &str = "RECOVERY_RESOLVED";

/// A promotion completed with per-replica errors.
pub const PROMOTION_PARTIAL_ERRORS: &str = "PROMOTION_PARTIAL_ERRORS";

/// An operator registered candidate replaced the promoted instance.
pub const CANDIDATE_PROMOTED: &str = "CANDIDATE_PROMOTED";

/// An urgent out-of-band read of an instance was scheduled.
pub const EMERGENT_READ: &str = "EMERGENT_READ";

/// Payload for [`RECOVERY_REGISTERED`] events.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RecoveryRegistered {
    pub recovery_id: u64,
    pub verdict: AnalysisVerdict,
    pub failed: InstanceKey,
    pub cluster_name: String,
    pub node: NodeIdentity,
}

/// Payload for [`RECOVERY_DECLINED`] events.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RecoveryDeclined {
    pub verdict: AnalysisVerdict,
    pub failed: InstanceKey,
    pub cluster_name: String,
}

/// Payload for [`RECOVERY_RESOLVED`] events.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RecoveryResolved {
    pub failed: InstanceKey,
    pub successor: Option<InstanceKey>,
}

/// Payload for [`PROMOTION_PARTIAL_ERRORS`] events.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PromotionPartialErrors {
    pub failed: InstanceKey,
    pub errors: Vec<String>,
}

/// Payload for [`CANDIDATE_PROMOTED`] events.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CandidatePromoted {
    pub failed: InstanceKey,
    pub previous: InstanceKey,
    pub successor: InstanceKey,
}

/// Payload for [`EMERGENT_READ`] events.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EmergentRead {
    pub key: InstanceKey,
    pub verdict: AnalysisVerdict,
}
