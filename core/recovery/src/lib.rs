//! Failure detection and recovery core for replicated database clusters.
//!
//! The crate ties the recovery pipeline together: analysis entries produced
//! by the replication [`Analyzer`] flow into the [`RecoveryController`],
//! which gates them through cluster filters, registers exclusive recovery
//! claims across the fleet, promotes successors and re-parents orphaned
//! replicas, and notifies operators through hook commands at each phase.
//!
//! Verdicts that do not warrant a topology change (unreachable primaries,
//! stalled replication) instead trigger deduplicated emergent reads to
//! sharpen the next analysis round.
pub mod events;

mod analysis;
mod conf;
mod dispatcher;
mod errors;
mod filters;
mod metrics;
mod planner;
mod refresher;
mod registrar;

#[cfg(test)]
mod tests;

pub use self::analysis::Analyzer;
pub use self::analysis::AnalyzerBackend;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::analysis::AnalyzerFixture;
pub use self::conf::RecoveryConf;
pub use self::dispatcher::RecoveryController;
pub use self::dispatcher::RecoveryOutcome;
pub use self::errors::PromotionFailure;
pub use self::filters::filters_match;
pub use self::metrics::register_metrics;
pub use self::refresher::EmergentRefresher;
pub use self::registrar::Registrar;
