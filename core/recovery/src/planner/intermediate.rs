//! Recovery of dead intermediate primaries and co-primaries.
use anyhow::Result;
use slog::info;
use slog::warn;

use replimend_context::Context;
use replimend_hooks::run_processes;
use replimend_models::AnalysisEntry;
use replimend_models::Instance;
use replimend_models::InstanceKey;

use crate::dispatcher::RecoveryCore;
use crate::dispatcher::RecoveryOutcome;
use crate::errors::PromotionFailure;

/// Recover a dead intermediate primary.
///
/// Plan A moves the orphaned replicas under a healthy sibling of the failed
/// instance. When no sibling qualifies (or the move fails) plan B regroups
/// the orphans and matches them up to the failed instance's own upstream.
pub(crate) async fn recover(
    context: &Context,
    core: &RecoveryCore,
    entry: &AnalysisEntry,
    skip_filters: bool,
) -> Result<RecoveryOutcome> {
    let recovery = match core.registrar.attempt(context, entry, skip_filters).await? {
        Some(recovery) => recovery,
        None => return Ok(RecoveryOutcome::none()),
    };
    info!(
        context.logger, "Dead intermediate primary: will recover";
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

    let mut successor = None;
    if let Some(sibling) = candidate_sibling(context, core, &entry.analyzed_key).await? {
        successor = takeover_by_sibling(context, core, entry, sibling).await?;
    }
    if successor.is_none() {
        successor = Some(regroup_and_match_up(context, core, entry).await?);
    }

    if let Err(error) = run_processes(
        context,
        &core.runner,
        &core.conf.post_intermediate_primary_failover_processes,
        "post-intermediate-primary-failover",
        entry,
        successor.as_ref(),
        false,
    )
    .await
    {
        warn!(
            context.logger, "Post intermediate primary failover hooks reported failures";
            "failed" => %entry.analyzed_key, "error" => %error,
        );
    }
    Ok(RecoveryOutcome {
        action_taken: true,
        successor,
    })
}

/// Plan A: move the orphaned replicas under the chosen sibling.
///
/// A failed move is not fatal; the caller falls back to plan B.
async fn takeover_by_sibling(
    context: &Context,
    core: &RecoveryCore,
    entry: &AnalysisEntry,
    sibling: Instance,
) -> Result<Option<Instance>> {
    info!(
        context.logger, "Found candidate sibling for dead intermediate primary";
        "failed" => %entry.analyzed_key, "sibling" => %sibling.key,
    );
    let moved = core
        .topology
        .multi_match_replicas(context, &entry.analyzed_key, &sibling.key, "")
        .await;
    let moved = match moved {
        Ok(moved) => moved,
        Err(error) => {
            warn!(
                context.logger, "Sibling takeover failed, will regroup and match up instead";
                "failed" => %entry.analyzed_key, "sibling" => %sibling.key,
                "error" => %error,
            );
            return Ok(None);
        }
    };
    if !moved.errors.is_empty() {
        super::audit_partial_errors(context, &core.audit, &entry.analyzed_key, &moved.errors)
            .await?;
    }
    core.registrar
        .resolve(context, &entry.analyzed_key, Some(sibling.key.clone()))
        .await?;
    info!(
        context.logger, "Dead intermediate primary recovered onto sibling";
        "failed" => %entry.analyzed_key, "successor" => %sibling.key,
        "matched" => moved.matched.len(),
    );
    Ok(Some(moved.target.unwrap_or(sibling)))
}

/// Plan B: regroup the orphans, then match them up to the failed instance's
/// own upstream.
async fn regroup_and_match_up(
    context: &Context,
    core: &RecoveryCore,
    entry: &AnalysisEntry,
) -> Result<Instance> {
    if let Err(error) = core
        .topology
        .regroup_replicas(context, &entry.analyzed_key)
        .await
    {
        warn!(
            context.logger, "Regroup before match-up failed";
            "failed" => %entry.analyzed_key, "error" => %error,
        );
    }
    let matched = core
        .topology
        .match_up_replicas(context, &entry.analyzed_key, "")
        .await?;
    if matched.matched.is_empty() {
        return Err(PromotionFailure::new(
            entry.analyzed_key.clone(),
            "no replica could be matched up",
        )
        .into());
    }
    if !matched.errors.is_empty() {
        super::audit_partial_errors(context, &core.audit, &entry.analyzed_key, &matched.errors)
            .await?;
    }
    let successor_key = matched.target.as_ref().map(|target| target.key.clone());
    core.registrar
        .resolve(context, &entry.analyzed_key, successor_key)
        .await?;
    let successor = match matched.target {
        Some(successor) => successor,
        None => {
            return Err(PromotionFailure::new(
                entry.analyzed_key.clone(),
                "match-up reported no target",
            )
            .into())
        }
    };
    info!(
        context.logger, "Dead intermediate primary recovered by match-up";
        "failed" => %entry.analyzed_key, "successor" => %successor.key,
        "matched" => matched.matched.len(),
    );
    Ok(successor)
}

/// Choose the best healthy sibling to take over a failed intermediate
/// primary's replicas.
///
/// Siblings with the most downstream replicas are preferred, breaking ties by
/// the most advanced execution coordinates; the first sibling in that order
/// passing every suitability check wins.
pub(crate) async fn candidate_sibling(
    context: &Context,
    core: &RecoveryCore,
    failed_key: &InstanceKey,
) -> Result<Option<Instance>> {
    let failed = match core.topology.instance(context, failed_key).await? {
        Some(failed) => failed,
        None => return Ok(None),
    };
    let upstream_key = match &failed.upstream_key {
        Some(upstream_key) => upstream_key.clone(),
        None => return Ok(None),
    };
    let mut siblings = core.topology.replicas(context, &upstream_key).await?;
    if siblings.len() < 2 {
        return Ok(None);
    }
    siblings.sort_by(|a, b| {
        b.downstream_keys
            .len()
            .cmp(&a.downstream_keys.len())
            .then_with(|| b.exec_coordinates.cmp(&a.exec_coordinates))
    });
    Ok(siblings
        .into_iter()
        .find(|sibling| is_valid_sibling(&failed, sibling)))
}

/// Whether a sibling is suitable to take over the failed instance's replicas.
pub(crate) fn is_valid_sibling(failed: &Instance, sibling: &Instance) -> bool {
    sibling.key != failed.key
        && sibling.binlog_enabled
        && sibling.log_replica_updates
        && sibling.replica_running
        && sibling.last_check_valid
        && sibling.data_center == failed.data_center
        && sibling.physical_environment == failed.physical_environment
        && sibling.has_replication_filters == failed.has_replication_filters
        && !sibling.is_max_scale
        && !failed.is_max_scale
        && sibling.exec_coordinates >= failed.exec_coordinates
}
