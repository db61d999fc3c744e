//! Persistent registration of recovery attempts across the fleet of peers.
use std::sync::Arc;

use anyhow::Result;
use time::Duration;

use replimend_context::Context;
use replimend_models::AnalysisEntry;
use replimend_models::InstanceKey;
use replimend_models::TopologyRecovery;

/// Claim and resolve recovery registrations backed by the persistent store.
///
/// The backend is the fleet-wide serialisation point: claims are conditional
/// inserts, with at most one active record per analyzed key enforced by the
/// store (a partial unique constraint in SQL backends).
#[derive(Clone)]
pub struct Recoveries(Arc<dyn RecoveriesBackend>);

impl Recoveries {
    /// Attempt to claim the recovery for the instance named by the entry.
    ///
    /// Returns the newly inserted active record on success. Returns `None`
    /// when another peer already holds the claim or when any recovery for the
    /// same cluster completed within the last `block_window`.
    pub async fn claim(
        &self,
        context: &Context,
        entry: &AnalysisEntry,
        block_window: Duration,
    ) -> Result<Option<TopologyRecovery>> {
        self.0.claim(context, entry, block_window).await
    }

    /// Mark the active recovery for `failed_key` as resolved.
    ///
    /// Records the successor and the end timestamp; the record is immutable
    /// afterwards.
    pub async fn resolve(
        &self,
        context: &Context,
        failed_key: &InstanceKey,
        successor: Option<InstanceKey>,
    ) -> Result<()> {
        self.0.resolve(context, failed_key, successor).await
    }
}

impl<T> From<T> for Recoveries
where
    T: RecoveriesBackend + 'static,
{
    fn from(value: T) -> Self {
        Recoveries(Arc::new(value))
    }
}

/// Operations implemented by recovery registration backends.
#[async_trait::async_trait]
pub trait RecoveriesBackend: Send + Sync {
    /// Atomically claim the recovery for the instance named by the entry.
    async fn claim(
        &self,
        context: &Context,
        entry: &AnalysisEntry,
        block_window: Duration,
    ) -> Result<Option<TopologyRecovery>>;

    /// Mark the active recovery for `failed_key` as resolved.
    async fn resolve(
        &self,
        context: &Context,
        failed_key: &InstanceKey,
        successor: Option<InstanceKey>,
    ) -> Result<()>;
}
