//! Top level dispatch of analysis findings to recovery handlers.
use std::sync::Arc;

use anyhow::Result;
use slog::debug;
use slog::error;
use slog::warn;

use replimend_context::Context;
use replimend_events::Audit;
use replimend_hooks::run_processes;
use replimend_hooks::ProcessRunner;
use replimend_models::AnalysisEntry;
use replimend_models::AnalysisVerdict;
use replimend_models::Instance;
use replimend_models::InstanceKey;
use replimend_store::Recoveries;
use replimend_store::Topology;

use crate::analysis::Analyzer;
use crate::conf::RecoveryConf;
use crate::filters::filters_match;
use crate::metrics;
use crate::planner;
use crate::refresher::EmergentRefresher;
use crate::registrar::Registrar;

/// What a `check_and_recover` call did, if anything.
#[derive(Clone, Debug, Default)]
pub struct RecoveryOutcome {
    /// A recovery changed the topology.
    pub action_taken: bool,

    /// The instance promoted in place of the failed one.
    pub successor: Option<Instance>,
}

impl RecoveryOutcome {
    /// Nothing was recovered.
    pub(crate) fn none() -> RecoveryOutcome {
        RecoveryOutcome::default()
    }

    /// A recovery took action and promoted the given successor.
    pub(crate) fn taken(successor: Instance) -> RecoveryOutcome {
        RecoveryOutcome {
            action_taken: true,
            successor: Some(successor),
        }
    }
}

/// Shared dependencies of the recovery pipeline.
pub(crate) struct RecoveryCore {
    pub analyzer: Analyzer,
    pub audit: Audit,
    pub conf: RecoveryConf,
    pub refresher: EmergentRefresher,
    pub registrar: Registrar,
    pub runner: ProcessRunner,
    pub topology: Topology,
}

/// Entry point of the failure detection and recovery pipeline.
///
/// The controller fetches analysis findings, filters them, and routes each to
/// its handler: promotion planners for dead (intermediate) primaries and
/// emergent reads for verdicts that only warrant a closer look. Handlers run
/// asynchronously unless an operator forces a synchronous recovery of one
/// specific instance.
#[derive(Clone)]
pub struct RecoveryController {
    core: Arc<RecoveryCore>,
}

impl RecoveryController {
    pub fn new(
        analyzer: Analyzer,
        topology: Topology,
        recoveries: Recoveries,
        audit: Audit,
        runner: ProcessRunner,
        conf: RecoveryConf,
    ) -> RecoveryController {
        let refresher = EmergentRefresher::new(topology.clone(), audit.clone(), &conf);
        let registrar = Registrar::new(recoveries, audit.clone(), &conf);
        let core = RecoveryCore {
            analyzer,
            audit,
            conf,
            refresher,
            registrar,
            runner,
            topology,
        };
        RecoveryController {
            core: Arc::new(core),
        }
    }

    /// Inspect current analysis findings and recover what policy permits.
    ///
    /// With `specific` only findings about that instance are considered; its
    /// downtime is ignored since an operator asked for it explicitly. With
    /// `specific` and `skip_filters` together the recovery runs synchronously
    /// and its outcome is returned; everything else is dispatched in the
    /// background and contributes nothing to the returned outcome.
    pub async fn check_and_recover(
        &self,
        context: &Context,
        specific: Option<&InstanceKey>,
        candidate: Option<&InstanceKey>,
        skip_filters: bool,
    ) -> Result<RecoveryOutcome> {
        let analyses = self
            .core
            .analyzer
            .replication_analysis(context, true)
            .await?;
        let mut outcome = RecoveryOutcome::none();
        for entry in analyses {
            if let Some(specific) = specific {
                if entry.analyzed_key != *specific {
                    continue;
                }
            } else if entry.downtimed {
                debug!(
                    context.logger, "Skipping downtimed analysis entry";
                    "failed" => %entry.analyzed_key,
                    "verdict" => entry.verdict.as_str(),
                );
                continue;
            }

            let force = specific.is_some() && skip_filters;
            if force {
                outcome = self
                    .handle_entry(context, &entry, candidate, skip_filters)
                    .await?;
                continue;
            }
            let controller = self.clone();
            let context = context.clone();
            let candidate = candidate.cloned();
            tokio::spawn(async move {
                let handled = controller
                    .handle_entry(&context, &entry, candidate.as_ref(), skip_filters)
                    .await;
                if let Err(error) = handled {
                    error!(
                        context.logger, "Recovery handler failed";
                        "failed" => %entry.analyzed_key,
                        "verdict" => entry.verdict.as_str(),
                        "error" => %error,
                    );
                }
            });
        }
        Ok(outcome)
    }

    /// Route one analysis entry to the handler for its verdict.
    async fn handle_entry(
        &self,
        context: &Context,
        entry: &AnalysisEntry,
        candidate: Option<&InstanceKey>,
        skip_filters: bool,
    ) -> Result<RecoveryOutcome> {
        metrics::ANALYSIS_SEEN
            .with_label_values(&[entry.verdict.as_str()])
            .inc();
        match entry.verdict {
            AnalysisVerdict::DeadPrimary | AnalysisVerdict::DeadPrimaryAndSomeReplicas => {
                self.recover_primary(context, entry, candidate, skip_filters)
                    .await
            }
            AnalysisVerdict::DeadIntermediatePrimary
            | AnalysisVerdict::DeadIntermediatePrimaryAndSomeReplicas
            | AnalysisVerdict::DeadCoPrimary => {
                self.recover_intermediate(context, entry, skip_filters).await
            }
            AnalysisVerdict::UnreachablePrimary => {
                self.core
                    .refresher
                    .read_instance_replicas(context, &entry.analyzed_key, entry.verdict)
                    .await?;
                Ok(RecoveryOutcome::none())
            }
            AnalysisVerdict::AllPrimaryReplicasNotReplicating => {
                self.core
                    .refresher
                    .read_instance(context, &entry.analyzed_key, entry.verdict);
                Ok(RecoveryOutcome::none())
            }
            AnalysisVerdict::FirstTierReplicaFailingToConnectToPrimary => {
                if let Some(upstream) = &entry.analyzed_upstream_key {
                    self.core
                        .refresher
                        .read_instance(context, upstream, entry.verdict);
                }
                Ok(RecoveryOutcome::none())
            }
            AnalysisVerdict::NoProblem => {
                debug!(
                    context.logger, "No recovery handler for verdict";
                    "verdict" => entry.verdict.as_str(),
                );
                Ok(RecoveryOutcome::none())
            }
        }
    }

    async fn recover_primary(
        &self,
        context: &Context,
        entry: &AnalysisEntry,
        candidate: Option<&InstanceKey>,
        skip_filters: bool,
    ) -> Result<RecoveryOutcome> {
        let allowed = filters_match(
            entry,
            &self.core.conf.recover_primary_cluster_filters,
            skip_filters,
        );
        if !allowed {
            debug!(
                context.logger, "Cluster filters do not allow primary recovery";
                "cluster" => &entry.cluster_name,
            );
            return Ok(RecoveryOutcome::none());
        }
        self.detection_hooks(context, entry).await?;
        let outcome =
            planner::primary::recover(context, &self.core, entry, candidate, skip_filters).await;
        self.finish_recovery(context, entry, outcome).await
    }

    async fn recover_intermediate(
        &self,
        context: &Context,
        entry: &AnalysisEntry,
        skip_filters: bool,
    ) -> Result<RecoveryOutcome> {
        let allowed = filters_match(
            entry,
            &self.core.conf.recover_intermediate_primary_cluster_filters,
            skip_filters,
        );
        if !allowed {
            debug!(
                context.logger,
                "Cluster filters do not allow intermediate primary recovery";
                "cluster" => &entry.cluster_name,
            );
            return Ok(RecoveryOutcome::none());
        }
        self.detection_hooks(context, entry).await?;
        let outcome =
            planner::intermediate::recover(context, &self.core, entry, skip_filters).await;
        self.finish_recovery(context, entry, outcome).await
    }

    /// Notify operators a failure was detected, before recovery begins.
    async fn detection_hooks(&self, context: &Context, entry: &AnalysisEntry) -> Result<()> {
        run_processes(
            context,
            &self.core.runner,
            &self.core.conf.on_failure_detection_processes,
            "on-failure-detection",
            entry,
            None,
            true,
        )
        .await
    }

    /// Record telemetry and run the generic post-failover hooks.
    async fn finish_recovery(
        &self,
        context: &Context,
        entry: &AnalysisEntry,
        outcome: Result<RecoveryOutcome>,
    ) -> Result<RecoveryOutcome> {
        let verdict = entry.verdict.as_str();
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(error) => {
                metrics::RECOVERY_FAILED.with_label_values(&[verdict]).inc();
                return Err(error);
            }
        };
        if !outcome.action_taken {
            return Ok(outcome);
        }
        metrics::RECOVERY_SUCCESS.with_label_values(&[verdict]).inc();
        if let Err(error) = run_processes(
            context,
            &self.core.runner,
            &self.core.conf.post_failover_processes,
            "post-failover",
            entry,
            outcome.successor.as_ref(),
            false,
        )
        .await
        {
            warn!(
                context.logger, "Post failover hooks reported failures";
                "failed" => %entry.analyzed_key, "error" => %error,
            );
        }
        Ok(outcome)
    }
}
