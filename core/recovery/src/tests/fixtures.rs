//! Fixtures for a fictional primary/replica cluster under recovery.
use std::collections::BTreeSet;
use std::time::Duration;

use replimend_context::ClockFixture;
use replimend_context::Context;
use replimend_events::AuditFixture;
use replimend_events::Event;
use replimend_hooks::RunnerFixture;
use replimend_models::AnalysisEntry;
use replimend_models::AnalysisVerdict;
use replimend_models::BinlogCoordinates;
use replimend_models::Instance;
use replimend_models::InstanceKey;
use replimend_store::Recoveries;
use replimend_store::RecoveriesFixture;
use replimend_store::Topology;
use replimend_store::TopologyFixture;

use crate::Analyzer;
use crate::AnalyzerFixture;
use crate::RecoveryConf;
use crate::RecoveryController;

pub const CLUSTER: &str = "c1";
pub const ALIAS: &str = "main";

/// A recovery controller wired entirely to in-memory fixtures.
pub struct Harness {
    pub analyzer: AnalyzerFixture,
    pub audit: AuditFixture,
    pub clock: ClockFixture,
    pub context: Context,
    pub controller: RecoveryController,
    pub recoveries: Recoveries,
    pub recoveries_fixture: RecoveriesFixture,
    pub runner: RunnerFixture,
    pub topology: TopologyFixture,
}

pub fn harness(conf: RecoveryConf) -> Harness {
    let (analyzer, analyzer_fixture) = Analyzer::fixture();
    let (topology, topology_fixture) = Topology::fixture();
    let (recoveries, recoveries_fixture) = Recoveries::fixture();
    let audit = AuditFixture::new();
    let runner = RunnerFixture::new();
    let clock = ClockFixture::new();
    let context = Context::fixture_with_clock(clock.clock());
    let controller = RecoveryController::new(
        analyzer,
        topology,
        recoveries.clone(),
        audit.audit(),
        runner.runner(),
        conf,
    );
    Harness {
        analyzer: analyzer_fixture,
        audit,
        clock,
        context,
        controller,
        recoveries,
        recoveries_fixture,
        runner,
        topology: topology_fixture,
    }
}

/// Configuration with one command per hook phase, to observe ordering.
pub fn conf_with_hooks() -> RecoveryConf {
    RecoveryConf {
        on_failure_detection_processes: vec!["detect {failedHost}".into()],
        pre_failover_processes: vec!["pre {failedHost}".into()],
        post_failover_processes: vec!["post {successorHost}".into()],
        post_primary_failover_processes: vec![
            "post-primary {failedHost} -> {successorHost}:{successorPort}".into(),
        ],
        post_intermediate_primary_failover_processes: vec![
            "post-intermediate {failedHost} -> {successorHost}".into(),
        ],
        ..RecoveryConf::default()
    }
}

pub fn key(host: &str) -> InstanceKey {
    InstanceKey::new(host, 3306)
}

/// A topology head with the given execution position.
pub fn primary(host: &str, log_pos: u64) -> Instance {
    Instance {
        key: key(host),
        upstream_key: None,
        downstream_keys: BTreeSet::new(),
        exec_coordinates: BinlogCoordinates::new("mysql-bin.000010", log_pos),
        read_coordinates: BinlogCoordinates::new("mysql-bin.000010", log_pos),
        binlog_enabled: true,
        log_replica_updates: true,
        replica_running: false,
        last_check_valid: true,
        has_replication_filters: false,
        is_max_scale: false,
        cluster_name: CLUSTER.into(),
        cluster_alias: ALIAS.into(),
        data_center: "dc1".into(),
        physical_environment: "prod".into(),
    }
}

/// A healthy replica of `upstream` at the given execution position.
pub fn replica(host: &str, upstream: &str, log_pos: u64) -> Instance {
    let mut instance = primary(host, log_pos);
    instance.upstream_key = Some(key(upstream));
    instance.replica_running = true;
    instance
}

pub fn entry(verdict: AnalysisVerdict, host: &str) -> AnalysisEntry {
    AnalysisEntry {
        verdict,
        analyzed_key: key(host),
        analyzed_upstream_key: None,
        cluster_name: CLUSTER.into(),
        cluster_alias: ALIAS.into(),
        count_replicas: 0,
        replica_hosts: Vec::new(),
        description: format!("{} failed", host),
        downtimed: false,
    }
}

/// Pop audit events until one with the wanted code shows up.
pub async fn await_event(audit: &mut AuditFixture, code: &str) -> Event {
    loop {
        let event = audit
            .pop_timeout(Duration::from_secs(1))
            .await
            .unwrap_or_else(|_| panic!("no '{}' audit event arrived", code));
        if event.code == code {
            return event;
        }
    }
}
