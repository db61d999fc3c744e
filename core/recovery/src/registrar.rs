//! Fleet-wide registration of recovery attempts.
use anyhow::Result;
use slog::debug;
use slog::info;
use time::Duration;

use replimend_context::Context;
use replimend_events::Audit;
use replimend_events::Event;
use replimend_models::AnalysisEntry;
use replimend_models::InstanceKey;
use replimend_models::TopologyRecovery;
use replimend_store::Recoveries;

use crate::conf::RecoveryConf;
use crate::events;
use crate::metrics;

/// Claim and resolve exclusive recovery registrations.
///
/// Exclusivity is a store guarantee: claims are atomic conditional inserts,
/// so at most one peer wins a claim for a failed instance and clusters in
/// their cooldown window decline new claims. The registrar layers auditing
/// and telemetry on top.
#[derive(Clone)]
pub struct Registrar {
    audit: Audit,
    block_window: Duration,
    recoveries: Recoveries,
}

impl Registrar {
    pub fn new(recoveries: Recoveries, audit: Audit, conf: &RecoveryConf) -> Registrar {
        Registrar {
            audit,
            block_window: Duration::minutes(conf.recovery_period_block_minutes as i64),
            recoveries,
        }
    }

    /// Attempt to claim the recovery described by the analysis entry.
    ///
    /// Returns `None` without error when the claim is declined: another peer
    /// already owns the recovery or the cluster recovered too recently. A
    /// forced recovery (`skip_filters`) ignores the cluster cooldown but can
    /// never displace a claim a peer still holds.
    pub async fn attempt(
        &self,
        context: &Context,
        entry: &AnalysisEntry,
        skip_filters: bool,
    ) -> Result<Option<TopologyRecovery>> {
        let block_window = if skip_filters {
            Duration::ZERO
        } else {
            self.block_window
        };
        let claimed = self
            .recoveries
            .claim(context, entry, block_window)
            .await?;
        match claimed {
            Some(recovery) => {
                metrics::RECOVERY_REGISTERED.inc();
                info!(
                    context.logger, "Registered recovery for failed instance";
                    "failed" => %entry.analyzed_key,
                    "verdict" => entry.verdict.as_str(),
                    "recovery_id" => recovery.recovery_id,
                );
                let event = Event::new_with_payload(
                    events::RECOVERY_REGISTERED,
                    events::RecoveryRegistered {
                        recovery_id: recovery.recovery_id,
                        verdict: entry.verdict,
                        failed: entry.analyzed_key.clone(),
                        cluster_name: entry.cluster_name.clone(),
                        node: context.node.clone(),
                    },
                )?;
                self.audit.audit(context, event).await?;
                Ok(Some(recovery))
            }
            None => {
                metrics::RECOVERY_DECLINED.inc();
                debug!(
                    context.logger, "Will not recover: claim declined";
                    "failed" => %entry.analyzed_key,
                    "cluster" => &entry.cluster_name,
                );
                let event = Event::new_with_payload(
                    events::RECOVERY_DECLINED,
                    events::RecoveryDeclined {
                        verdict: entry.verdict,
                        failed: entry.analyzed_key.clone(),
                        cluster_name: entry.cluster_name.clone(),
                    },
                )?;
                self.audit.audit(context, event).await?;
                Ok(None)
            }
        }
    }

    /// Resolve the active recovery for a failed instance.
    pub async fn resolve(
        &self,
        context: &Context,
        failed_key: &InstanceKey,
        successor: Option<InstanceKey>,
    ) -> Result<()> {
        self.recoveries
            .resolve(context, failed_key, successor.clone())
            .await?;
        info!(
            context.logger, "Resolved recovery for failed instance";
            "failed" => %failed_key,
        );
        let event = Event::new_with_payload(
            events::RECOVERY_RESOLVED,
            events::RecoveryResolved {
                failed: failed_key.clone(),
                successor,
            },
        )?;
        self.audit.audit(context, event).await?;
        Ok(())
    }
}
