//! Verdicts produced by the replication analyzer.
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::InstanceKey;

/// Classification of a replication failure detected by the analyzer.
///
/// The recovery core only acts on the verdicts listed here; verdicts it does
/// not recognise deserialise to [`AnalysisVerdict::NoProblem`] and no-op.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum AnalysisVerdict {
    DeadPrimary,
    DeadPrimaryAndSomeReplicas,
    DeadIntermediatePrimary,
    DeadIntermediatePrimaryAndSomeReplicas,
    DeadCoPrimary,
    UnreachablePrimary,
    AllPrimaryReplicasNotReplicating,
    FirstTierReplicaFailingToConnectToPrimary,
    #[serde(other)]
    NoProblem,
}

impl AnalysisVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisVerdict::DeadPrimary => "DeadPrimary",
            AnalysisVerdict::DeadPrimaryAndSomeReplicas => "DeadPrimaryAndSomeReplicas",
            AnalysisVerdict::DeadIntermediatePrimary => "DeadIntermediatePrimary",
            AnalysisVerdict::DeadIntermediatePrimaryAndSomeReplicas => {
                "DeadIntermediatePrimaryAndSomeReplicas"
            }
            AnalysisVerdict::DeadCoPrimary => "DeadCoPrimary",
            AnalysisVerdict::UnreachablePrimary => "UnreachablePrimary",
            AnalysisVerdict::AllPrimaryReplicasNotReplicating => {
                "AllPrimaryReplicasNotReplicating"
            }
            AnalysisVerdict::FirstTierReplicaFailingToConnectToPrimary => {
                "FirstTierReplicaFailingToConnectToPrimary"
            }
            AnalysisVerdict::NoProblem => "NoProblem",
        }
    }
}

impl fmt::Display for AnalysisVerdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One analyzer finding: a verdict about an instance and its surroundings.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEntry {
    pub verdict: AnalysisVerdict,

    /// The instance the verdict is about.
    pub analyzed_key: InstanceKey,

    /// Upstream of the analyzed instance at analysis time, if any.
    #[serde(default)]
    pub analyzed_upstream_key: Option<InstanceKey>,

    pub cluster_name: String,
    pub cluster_alias: String,

    /// Number of replicas of the analyzed instance.
    pub count_replicas: u64,

    /// Addresses of the replicas of the analyzed instance.
    #[serde(default)]
    pub replica_hosts: Vec<InstanceKey>,

    /// Human readable description of the finding.
    pub description: String,

    /// The analyzed instance is under operator-declared downtime.
    pub downtimed: bool,
}

#[cfg(test)]
mod tests {
    use super::AnalysisVerdict;

    #[test]
    fn unknown_verdicts_decode_to_no_problem() {
        let verdict: AnalysisVerdict =
            serde_json::from_str("\"LockedSemiSyncPrimary\"").expect("verdict to decode");
        assert_eq!(verdict, AnalysisVerdict::NoProblem);
    }

    #[test]
    fn verdicts_round_trip_by_name() {
        let verdict: AnalysisVerdict =
            serde_json::from_str("\"DeadIntermediatePrimary\"").expect("verdict to decode");
        assert_eq!(verdict, AnalysisVerdict::DeadIntermediatePrimary);
        assert_eq!(verdict.to_string(), "DeadIntermediatePrimary");
    }
}
