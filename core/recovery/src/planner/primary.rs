//! Recovery of dead primaries.
use anyhow::Result;
use slog::debug;
use slog::info;
use slog::warn;

use replimend_context::Context;
use replimend_events::Event;
use replimend_hooks::run_processes;
use replimend_models::AnalysisEntry;
use replimend_models::Instance;
use replimend_models::InstanceKey;

use crate::dispatcher::RecoveryCore;
use crate::dispatcher::RecoveryOutcome;
use crate::errors::PromotionFailure;
use crate::events;

/// Recover a dead primary by promoting its most advanced replica.
///
/// The regrouped replica becomes the successor unless an operator registered
/// candidate can take its place. Orphaned replicas end up replicating from
/// the successor.
pub(crate) async fn recover(
    context: &Context,
    core: &RecoveryCore,
    entry: &AnalysisEntry,
    candidate_key: Option<&InstanceKey>,
    skip_filters: bool,
) -> Result<RecoveryOutcome> {
    let recovery = match core.registrar.attempt(context, entry, skip_filters).await? {
        Some(recovery) => recovery,
        None => return Ok(RecoveryOutcome::none()),
    };
    info!(
        context.logger, "Dead primary: will recover";
        "failed" => %entry.analyzed_key, "recovery_id" => recovery.recovery_id,
    );
    run_processes(
        context,
        &core.runner,
        &core.conf.pre_failover_processes,
        "pre-failover",
        entry,
        None,
        true,
    )
    .await?;

    let regrouped = core
        .topology
        .regroup_replicas(context, &entry.analyzed_key)
        .await?;
    let promoted = match regrouped.promoted {
        Some(promoted) => promoted,
        None => {
            return Err(PromotionFailure::new(
                entry.analyzed_key.clone(),
                "regroup promoted no replica",
            )
            .into())
        }
    };
    if !regrouped.errors.is_empty() {
        warn!(
            context.logger, "Regroup completed with partial errors";
            "failed" => %entry.analyzed_key, "errors" => regrouped.errors.len(),
        );
        super::audit_partial_errors(context, &core.audit, &entry.analyzed_key, &regrouped.errors)
            .await?;
    }
    core.registrar
        .resolve(context, &entry.analyzed_key, Some(promoted.key.clone()))
        .await?;

    let successor = replace_promoted_with_candidate(context, core, entry, promoted, candidate_key)
        .await;
    info!(
        context.logger, "Dead primary recovered";
        "failed" => %entry.analyzed_key, "successor" => %successor.key,
    );

    if let Err(error) = run_processes(
        context,
        &core.runner,
        &core.conf.post_primary_failover_processes,
        "post-primary-failover",
        entry,
        Some(&successor),
        false,
    )
    .await
    {
        warn!(
            context.logger, "Post primary failover hooks reported failures";
            "failed" => %entry.analyzed_key, "error" => %error,
        );
    }
    Ok(RecoveryOutcome::taken(successor))
}

/// Swap an operator registered candidate into the promoted position.
///
/// Keeps the original promotion whenever no candidate improves on it or the
/// swap fails for any reason.
async fn replace_promoted_with_candidate(
    context: &Context,
    core: &RecoveryCore,
    entry: &AnalysisEntry,
    promoted: Instance,
    candidate_key: Option<&InstanceKey>,
) -> Instance {
    let candidate = match pick_candidate(context, core, entry, &promoted, candidate_key).await {
        Ok(Some(candidate)) => candidate,
        Ok(None) => return promoted,
        Err(error) => {
            warn!(
                context.logger, "Keeping promoted instance: candidate lookup failed";
                "promoted" => %promoted.key, "error" => %error,
            );
            return promoted;
        }
    };
    if candidate.key == promoted.key {
        return promoted;
    }
    if candidate.upstream_key.as_ref() != Some(&promoted.key) {
        debug!(
            context.logger,
            "Keeping promoted instance: candidate is not a replica of it";
            "promoted" => %promoted.key, "candidate" => %candidate.key,
        );
        return promoted;
    }
    match swap_in_candidate(context, core, entry, &promoted, &candidate).await {
        Ok(swapped) => swapped,
        Err(error) => {
            warn!(
                context.logger, "Keeping promoted instance: candidate swap failed";
                "promoted" => %promoted.key, "candidate" => %candidate.key,
                "error" => %error,
            );
            promoted
        }
    }
}

/// Choose which candidate, if any, should replace the promoted instance.
async fn pick_candidate(
    context: &Context,
    core: &RecoveryCore,
    entry: &AnalysisEntry,
    promoted: &Instance,
    candidate_key: Option<&InstanceKey>,
) -> Result<Option<Instance>> {
    if let Some(key) = candidate_key {
        if *key == promoted.key {
            return Ok(None);
        }
        return core.topology.instance(context, key).await;
    }

    let candidates = core
        .topology
        .cluster_candidates(context, &entry.cluster_name)
        .await?;
    if candidates.iter().any(|candidate| candidate.key == promoted.key) {
        return Ok(None);
    }

    let failed = core.topology.instance(context, &entry.analyzed_key).await?;
    let replica_of_promoted =
        |candidate: &&Instance| candidate.upstream_key.as_ref() == Some(&promoted.key);
    let candidate = candidates
        .iter()
        .filter(replica_of_promoted)
        .find(|candidate| {
            failed.as_ref().map_or(false, |failed| {
                candidate.data_center == failed.data_center
                    && candidate.physical_environment == failed.physical_environment
            })
        })
        .or_else(|| {
            candidates.iter().filter(replica_of_promoted).find(|candidate| {
                candidate.data_center == promoted.data_center
                    && candidate.physical_environment == promoted.physical_environment
            })
        });
    Ok(candidate.cloned())
}

/// Swap the candidate with the promoted instance it replicates from.
async fn swap_in_candidate(
    context: &Context,
    core: &RecoveryCore,
    entry: &AnalysisEntry,
    promoted: &Instance,
    candidate: &Instance,
) -> Result<Instance> {
    let swapped = core
        .topology
        .swap_with_upstream(context, &candidate.key)
        .await?;
    info!(
        context.logger, "Promoted candidate over regrouped replica";
        "failed" => %entry.analyzed_key,
        "previous" => %promoted.key,
        "successor" => %swapped.key,
    );
    let event = Event::new_with_payload(
        events::CANDIDATE_PROMOTED,
        events::CandidatePromoted {
            failed: entry.analyzed_key.clone(),
            previous: promoted.key.clone(),
            successor: swapped.key.clone(),
        },
    )?;
    core.audit.audit(context, event).await?;
    Ok(swapped)
}
