//! Results of the topology re-parenting primitives.
use replimend_models::Instance;
use replimend_models::InstanceKey;

/// Result of re-parenting the replicas of a failed instance under the most
/// advanced one of them.
///
/// The operation counts as having taken action whenever it returns, even when
/// `errors` reports per-replica failures.
#[derive(Clone, Debug, Default)]
pub struct RegroupOutcome {
    /// The replica promoted as the new parent of the group, if any.
    pub promoted: Option<Instance>,

    /// Replicas that could not be re-parented and were left behind.
    pub lost: Vec<InstanceKey>,

    /// Replicas whose coordinates equalled the promoted one's.
    pub equal: Vec<InstanceKey>,

    /// Replicas that were ahead of the promoted one.
    pub ahead: Vec<InstanceKey>,

    /// Per-replica failures observed while re-parenting.
    pub errors: Vec<String>,
}

/// Result of re-parenting every replica of an instance onto a designated target.
#[derive(Clone, Debug, Default)]
pub struct MultiMatchOutcome {
    /// Replicas now replicating from the target.
    pub matched: Vec<InstanceKey>,

    /// Refreshed snapshot of the target instance.
    pub target: Option<Instance>,

    /// Per-replica failures observed while re-parenting.
    pub errors: Vec<String>,
}

/// Result of re-parenting every replica of an instance onto that instance's
/// own upstream.
#[derive(Clone, Debug, Default)]
pub struct MatchUpOutcome {
    /// Replicas now replicating from the upstream.
    pub matched: Vec<InstanceKey>,

    /// Refreshed snapshot of the upstream the replicas were moved under.
    pub target: Option<Instance>,

    /// Per-replica failures observed while re-parenting.
    pub errors: Vec<String>,
}
