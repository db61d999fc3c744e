//! Telemetry for the recovery core.
use once_cell::sync::Lazy;
use prometheus::Counter;
use prometheus::CounterVec;
use prometheus::Opts;
use prometheus::Registry;
use slog::debug;
use slog::Logger;

/// Total number of analysis entries inspected by the dispatcher.
pub static ANALYSIS_SEEN: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "replimend_recovery_analysis_seen",
            "Total number of analysis entries inspected by the dispatcher",
        ),
        &["verdict"],
    )
    .expect("failed to initialise ANALYSIS_SEEN counter")
});

/// Total number of recovery claims granted to this process.
pub static RECOVERY_REGISTERED: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "replimend_recovery_registered",
        "Total number of recovery claims granted to this process",
    )
    .expect("failed to initialise RECOVERY_REGISTERED counter")
});

/// Total number of recovery claims declined (peer held or cooldown).
pub static RECOVERY_DECLINED: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "replimend_recovery_declined",
        "Total number of recovery claims declined",
    )
    .expect("failed to initialise RECOVERY_DECLINED counter")
});

/// Number of recoveries that completed having taken action.
pub static RECOVERY_SUCCESS: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "replimend_recovery_success",
            "Number of recoveries that completed having taken action",
        ),
        &["verdict"],
    )
    .expect("failed to initialise RECOVERY_SUCCESS counter")
});

/// Number of recoveries that failed before taking action.
pub static RECOVERY_FAILED: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "replimend_recovery_failed",
            "Number of recoveries that failed before taking action",
        ),
        &["verdict"],
    )
    .expect("failed to initialise RECOVERY_FAILED counter")
});

/// Number of emergent reads scheduled.
pub static EMERGENT_READ_SCHEDULED: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "replimend_recovery_emergent_read_scheduled",
        "Number of emergent reads scheduled",
    )
    .expect("failed to initialise EMERGENT_READ_SCHEDULED counter")
});

/// Number of emergent reads suppressed by the dedup window.
pub static EMERGENT_READ_DEDUPED: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "replimend_recovery_emergent_read_deduped",
        "Number of emergent reads suppressed by the dedup window",
    )
    .expect("failed to initialise EMERGENT_READ_DEDUPED counter")
});

/// Attempt to register metrics with the Registry.
///
/// Metrics that fail to register are logged and ignored.
pub fn register_metrics(logger: &Logger, registry: &Registry) {
    if let Err(error) = registry.register(Box::new(ANALYSIS_SEEN.clone())) {
        debug!(logger, "Failed to register ANALYSIS_SEEN"; "error" => ?error);
    }
    if let Err(error) = registry.register(Box::new(RECOVERY_REGISTERED.clone())) {
        debug!(logger, "Failed to register RECOVERY_REGISTERED"; "error" => ?error);
    }
    if let Err(error) = registry.register(Box::new(RECOVERY_DECLINED.clone())) {
        debug!(logger, "Failed to register RECOVERY_DECLINED"; "error" => ?error);
    }
    if let Err(error) = registry.register(Box::new(RECOVERY_SUCCESS.clone())) {
        debug!(logger, "Failed to register RECOVERY_SUCCESS"; "error" => ?error);
    }
    if let Err(error) = registry.register(Box::new(RECOVERY_FAILED.clone())) {
        debug!(logger, "Failed to register RECOVERY_FAILED"; "error" => ?error);
    }
    if let Err(error) = registry.register(Box::new(EMERGENT_READ_SCHEDULED.clone())) {
        debug!(logger, "Failed to register EMERGENT_READ_SCHEDULED"; "error" => ?error);
    }
    if let Err(error) = registry.register(Box::new(EMERGENT_READ_DEDUPED.clone())) {
        debug!(logger, "Failed to register EMERGENT_READ_DEDUPED"; "error" => ?error);
    }
}
