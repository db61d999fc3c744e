//! Emergent read deduplication and fan-out.
use replimend_events::AuditFixture;
use replimend_models::AnalysisVerdict;
use replimend_store::Topology;
use time::Duration;

use super::fixtures::key;
use super::fixtures::primary;
use super::fixtures::replica;
use crate::events;
use crate::EmergentRefresher;
use crate::RecoveryConf;

fn refresher() -> (
    EmergentRefresher,
    replimend_store::TopologyFixture,
    AuditFixture,
) {
    let (topology, topology_fixture) = Topology::fixture();
    let audit = AuditFixture::new();
    let refresher = EmergentRefresher::new(topology, audit.audit(), &RecoveryConf::default());
    (refresher, topology_fixture, audit)
}

#[tokio::test]
async fn reads_are_deduplicated_within_the_ttl() {
    let (refresher, topology, mut audit) = refresher();
    topology.instance(primary("p", 900));
    let clock = replimend_context::ClockFixture::new();
    let context = replimend_context::Context::fixture_with_clock(clock.clock());

    let first = refresher.read_instance(&context, &key("p"), AnalysisVerdict::UnreachablePrimary);
    let handle = first.expect("first read to be scheduled");
    handle.await.expect("read task to run");
    let event = audit
        .pop_timeout(std::time::Duration::from_secs(1))
        .await
        .expect("read to be audited");
    assert_eq!(event.code, events::EMERGENT_READ);

    // Still inside the dedup window: nothing new is scheduled.
    clock.advance(Duration::seconds(4));
    let second = refresher.read_instance(&context, &key("p"), AnalysisVerdict::UnreachablePrimary);
    assert!(second.is_none());

    // Past the window the instance can be read again.
    clock.advance(Duration::seconds(2));
    let third = refresher.read_instance(&context, &key("p"), AnalysisVerdict::UnreachablePrimary);
    let handle = third.expect("third read to be scheduled");
    handle.await.expect("read task to run");
}

#[tokio::test]
async fn replica_reads_fan_out_to_every_replica() {
    let (refresher, topology, mut audit) = refresher();
    topology
        .instance(primary("p", 900))
        .instance(replica("r1", "p", 500))
        .instance(replica("r2", "p", 700));
    let context = replimend_context::Context::fixture();

    let handles = refresher
        .read_instance_replicas(&context, &key("p"), AnalysisVerdict::UnreachablePrimary)
        .await
        .expect("replica reads to be scheduled");
    assert_eq!(handles.len(), 2);
    for handle in handles {
        handle.await.expect("read task to run");
    }
    let mut read = Vec::new();
    for _ in 0..2 {
        let event = audit
            .pop_timeout(std::time::Duration::from_secs(1))
            .await
            .expect("read to be audited");
        let payload: events::EmergentRead = event.decode().expect("payload to decode");
        read.push(payload.key);
    }
    read.sort();
    assert_eq!(read, vec![key("r1"), key("r2")]);
}

#[tokio::test]
async fn distinct_instances_do_not_share_dedup_entries() {
    let (refresher, topology, _audit) = refresher();
    topology
        .instance(primary("p", 900))
        .instance(primary("q", 900));
    let context = replimend_context::Context::fixture();

    let first = refresher.read_instance(&context, &key("p"), AnalysisVerdict::UnreachablePrimary);
    let second = refresher.read_instance(&context, &key("q"), AnalysisVerdict::UnreachablePrimary);
    assert!(first.is_some());
    assert!(second.is_some());
    for handle in [first, second].into_iter().flatten() {
        handle.await.expect("read task to run");
    }
}
