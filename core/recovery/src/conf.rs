//! Recovery core configuration options.
use serde::Deserialize;
use serde::Serialize;

/// Configuration for the failure detection and recovery core.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConf {
    /// Minutes during which a cluster that completed a recovery rejects new ones.
    #[serde(default = "RecoveryConf::default_recovery_period_block_minutes")]
    pub recovery_period_block_minutes: u64,

    /// Seconds an emergent read of an instance suppresses duplicate reads.
    #[serde(default = "RecoveryConf::default_discovery_poll_seconds")]
    pub discovery_poll_seconds: u64,

    /// Maximum number of emergent reads in flight at any time.
    #[serde(default = "RecoveryConf::default_emergent_read_concurrency")]
    pub emergent_read_concurrency: usize,

    /// Clusters allowed to auto-recover dead primaries.
    ///
    /// Filters match the cluster alias exactly (`alias=` prefix), the alias
    /// by regex (`alias~=` prefix) or the cluster name by regex (no prefix).
    #[serde(default)]
    pub recover_primary_cluster_filters: Vec<String>,

    /// Clusters allowed to auto-recover dead intermediate primaries.
    #[serde(default)]
    pub recover_intermediate_primary_cluster_filters: Vec<String>,

    /// Commands run once a recovery is registered, before any promotion.
    ///
    /// Failures abort the recovery.
    #[serde(default)]
    pub pre_failover_processes: Vec<String>,

    /// Commands run when a failure is detected, before recovery starts.
    ///
    /// Failures abort the recovery.
    #[serde(default)]
    pub on_failure_detection_processes: Vec<String>,

    /// Commands run after any recovery that took action. Best effort.
    #[serde(default)]
    pub post_failover_processes: Vec<String>,

    /// Commands run after a dead primary recovery. Best effort.
    #[serde(default)]
    pub post_primary_failover_processes: Vec<String>,

    /// Commands run after a dead intermediate primary recovery. Best effort.
    #[serde(default)]
    pub post_intermediate_primary_failover_processes: Vec<String>,
}

impl Default for RecoveryConf {
    fn default() -> RecoveryConf {
        RecoveryConf {
            recovery_period_block_minutes:
                RecoveryConf::default_recovery_period_block_minutes(),
            discovery_poll_seconds: RecoveryConf::default_discovery_poll_seconds(),
            emergent_read_concurrency: RecoveryConf::default_emergent_read_concurrency(),
            recover_primary_cluster_filters: Vec::new(),
            recover_intermediate_primary_cluster_filters: Vec::new(),
            pre_failover_processes: Vec::new(),
            on_failure_detection_processes: Vec::new(),
            post_failover_processes: Vec::new(),
            post_primary_failover_processes: Vec::new(),
            post_intermediate_primary_failover_processes: Vec::new(),
        }
    }
}

impl RecoveryConf {
    fn default_recovery_period_block_minutes() -> u64 {
        60
    }

    fn default_discovery_poll_seconds() -> u64 {
        5
    }

    fn default_emergent_read_concurrency() -> usize {
        5
    }
}
