//! Urgent out-of-band reads of suspect instances.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::Result;
use slog::debug;
use slog::error;
use time::Duration;
use time::OffsetDateTime;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use replimend_context::Context;
use replimend_events::Audit;
use replimend_events::Event;
use replimend_models::AnalysisVerdict;
use replimend_models::InstanceKey;
use replimend_store::Topology;

use crate::conf::RecoveryConf;
use crate::events;
use crate::metrics;

/// Schedule urgent re-reads of instances suspected to have failed.
///
/// Reads for the same instance are deduplicated for a TTL window so a noisy
/// analysis round does not hammer the store, and in-flight reads are capped
/// by a shared semaphore.
pub struct EmergentRefresher {
    audit: Audit,
    dedup: Mutex<HashMap<InstanceKey, OffsetDateTime>>,
    pool: Arc<Semaphore>,
    topology: Topology,
    ttl: Duration,
}

impl EmergentRefresher {
    pub fn new(topology: Topology, audit: Audit, conf: &RecoveryConf) -> EmergentRefresher {
        EmergentRefresher {
            audit,
            dedup: Mutex::new(HashMap::new()),
            pool: Arc::new(Semaphore::new(conf.emergent_read_concurrency)),
            topology,
            ttl: Duration::seconds(conf.discovery_poll_seconds as i64),
        }
    }

    /// Schedule an urgent read of one instance, unless one is still fresh.
    ///
    /// Returns the handle of the scheduled read so callers that care (tests,
    /// shutdown paths) can await it; the dispatcher drops it.
    pub fn read_instance(
        &self,
        context: &Context,
        key: &InstanceKey,
        verdict: AnalysisVerdict,
    ) -> Option<JoinHandle<()>> {
        let now = context.clock.now_utc();
        {
            let mut dedup = self.dedup.lock().expect("emergent read dedup lock poisoned");
            dedup.retain(|_, expires| *expires > now);
            if dedup.contains_key(key) {
                metrics::EMERGENT_READ_DEDUPED.inc();
                debug!(
                    context.logger, "Emergent read suppressed by dedup window";
                    "instance" => %key,
                );
                return None;
            }
            dedup.insert(key.clone(), now + self.ttl);
        }

        metrics::EMERGENT_READ_SCHEDULED.inc();
        let audit = self.audit.clone();
        let context = context.clone();
        let key = key.clone();
        let pool = Arc::clone(&self.pool);
        let topology = self.topology.clone();
        Some(tokio::spawn(async move {
            let _permit = match pool.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            if let Err(error) = topology.instance(&context, &key).await {
                error!(
                    context.logger, "Emergent read of instance failed";
                    "instance" => %key, "error" => %error,
                );
                return;
            }
            let event = events::EmergentRead {
                key: key.clone(),
                verdict,
            };
            let outcome = match Event::new_with_payload(events::EMERGENT_READ, event) {
                Ok(event) => audit.audit(&context, event).await,
                Err(error) => Err(error),
            };
            if let Err(error) = outcome {
                error!(
                    context.logger, "Failed to audit emergent read";
                    "instance" => %key, "error" => %error,
                );
            }
        }))
    }

    /// Schedule urgent reads of every replica of an instance.
    pub async fn read_instance_replicas(
        &self,
        context: &Context,
        key: &InstanceKey,
        verdict: AnalysisVerdict,
    ) -> Result<Vec<JoinHandle<()>>> {
        let replicas = self.topology.replicas(context, key).await?;
        Ok(replicas
            .iter()
            .filter_map(|replica| self.read_instance(context, &replica.key, verdict))
            .collect())
    }
}
