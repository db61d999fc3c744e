//! Store interfaces for the Replimend recovery core.
//!
//! The core never probes databases itself: it reads instance snapshots and
//! performs re-parenting through the [`Topology`] interface, and serialises
//! recovery claims across the fleet through the [`Recoveries`] interface.
//! Both are thin wrappers over runtime configured backends so production can
//! plug a SQL backed implementation while unit tests use in-memory fixtures.
use std::sync::Arc;

use anyhow::Result;

use replimend_context::Context;
use replimend_models::Instance;
use replimend_models::InstanceKey;

mod errors;
mod outcomes;
mod recoveries;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::RecoveriesFixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::TopologyFixture;


pub use self::errors::InstanceNotFound;
pub use self::errors::RecoveryNotActive;
pub use self::outcomes::MatchUpOutcome;
pub use self::outcomes::MultiMatchOutcome;
pub use self::outcomes::RegroupOutcome;
pub use self::recoveries::Recoveries;
pub use self::recoveries::RecoveriesBackend;

/// Read instance state and rearrange replication topologies.
#[derive(Clone)]
pub struct Topology(Arc<dyn TopologyBackend>);

impl Topology {
    /// Fetch the last known snapshot of an instance, if the store has one.
    pub async fn instance(&self, context: &Context, key: &InstanceKey) -> Result<Option<Instance>> {
        self.0.instance(context, key).await
    }

    /// Fetch the direct replicas of an instance.
    pub async fn replicas(&self, context: &Context, key: &InstanceKey) -> Result<Vec<Instance>> {
        self.0.replicas(context, key).await
    }

    /// Fetch the operator registered promotion candidates of a cluster.
    pub async fn cluster_candidates(
        &self,
        context: &Context,
        cluster_name: &str,
    ) -> Result<Vec<Instance>> {
        self.0.cluster_candidates(context, cluster_name).await
    }

    /// Re-parent the direct replicas of `key` under the most advanced one of them.
    pub async fn regroup_replicas(
        &self,
        context: &Context,
        key: &InstanceKey,
    ) -> Result<RegroupOutcome> {
        self.0.regroup_replicas(context, key).await
    }

    /// Re-parent every replica of `from` onto `to`.
    pub async fn multi_match_replicas(
        &self,
        context: &Context,
        from: &InstanceKey,
        to: &InstanceKey,
        pattern: &str,
    ) -> Result<MultiMatchOutcome> {
        self.0.multi_match_replicas(context, from, to, pattern).await
    }

    /// Re-parent every replica of `key` onto `key`'s own upstream.
    pub async fn match_up_replicas(
        &self,
        context: &Context,
        key: &InstanceKey,
        pattern: &str,
    ) -> Result<MatchUpOutcome> {
        self.0.match_up_replicas(context, key, pattern).await
    }

    /// Swap parent and child between `key` and its current upstream.
    ///
    /// Returns the refreshed snapshot of `key` once it took its upstream's
    /// place in the topology.
    pub async fn swap_with_upstream(
        &self,
        context: &Context,
        key: &InstanceKey,
    ) -> Result<Instance> {
        self.0.swap_with_upstream(context, key).await
    }
}

impl<T> From<T> for Topology
where
    T: TopologyBackend + 'static,
{
    fn from(value: T) -> Self {
        Topology(Arc::new(value))
    }
}

/// Operations implemented by topology stores supported by the recovery core.
#[async_trait::async_trait]
pub trait TopologyBackend: Send + Sync {
    /// Fetch the last known snapshot of an instance, if the store has one.
    async fn instance(&self, context: &Context, key: &InstanceKey) -> Result<Option<Instance>>;

    /// Fetch the direct replicas of an instance.
    async fn replicas(&self, context: &Context, key: &InstanceKey) -> Result<Vec<Instance>>;

    /// Fetch the operator registered promotion candidates of a cluster.
    async fn cluster_candidates(
        &self,
        context: &Context,
        cluster_name: &str,
    ) -> Result<Vec<Instance>>;

    /// Re-parent the direct replicas of `key` under the most advanced one of them.
    async fn regroup_replicas(
        &self,
        context: &Context,
        key: &InstanceKey,
    ) -> Result<RegroupOutcome>;

    /// Re-parent every replica of `from` onto `to`.
    async fn multi_match_replicas(
        &self,
        context: &Context,
        from: &InstanceKey,
        to: &InstanceKey,
        pattern: &str,
    ) -> Result<MultiMatchOutcome>;

    /// Re-parent every replica of `key` onto `key`'s own upstream.
    async fn match_up_replicas(
        &self,
        context: &Context,
        key: &InstanceKey,
        pattern: &str,
    ) -> Result<MatchUpOutcome>;

    /// Swap parent and child between `key` and its current upstream.
    async fn swap_with_upstream(&self, context: &Context, key: &InstanceKey) -> Result<Instance>;
}

#[cfg(any(test, feature = "test-fixture"))]
impl Topology {
    /// Initialise a new topology backend fixture for unit tests.
    pub fn fixture() -> (Topology, TopologyFixture) {
        let fixture = TopologyFixture::default();
        (Topology::from(fixture.clone()), fixture)
    }
}

#[cfg(any(test, feature = "test-fixture"))]
impl Recoveries {
    /// Initialise a new recoveries backend fixture for unit tests.
    pub fn fixture() -> (Recoveries, RecoveriesFixture) {
        let fixture = RecoveriesFixture::default();
        (Recoveries::from(fixture.clone()), fixture)
    }
}
