//! Dead intermediate primary recovery scenarios.
use replimend_models::AnalysisVerdict;

use super::fixtures;
use super::fixtures::conf_with_hooks;
use super::fixtures::entry;
use super::fixtures::key;
use super::fixtures::primary;
use super::fixtures::replica;
use crate::planner::intermediate::is_valid_sibling;
use crate::PromotionFailure;

/// The standard fixture: `im` and `sib` replicate from `p`; `s1` and `s2`
/// replicate from the (now dead) `im`.
fn intermediate_harness() -> fixtures::Harness {
    let harness = fixtures::harness(conf_with_hooks());
    harness
        .topology
        .instance(primary("p", 900))
        .instance(replica("im", "p", 800))
        .instance(replica("sib", "p", 850))
        .instance(replica("s1", "im", 500))
        .instance(replica("s2", "im", 700));
    harness
        .analyzer
        .entry(entry(AnalysisVerdict::DeadIntermediatePrimary, "im"));
    harness
}

#[tokio::test]
async fn valid_sibling_takes_over_the_orphans() {
    let harness = intermediate_harness();
    let failed = harness.topology.get(&key("im")).unwrap();

    let outcome = harness
        .controller
        .check_and_recover(&harness.context, Some(&key("im")), None, true)
        .await
        .expect("recovery to run");

    assert!(outcome.action_taken);
    let successor = outcome.successor.unwrap();
    assert_eq!(successor.key, key("sib"));
    assert!(is_valid_sibling(&failed, &successor));
    assert_eq!(
        harness.topology.get(&key("s1")).unwrap().upstream_key,
        Some(key("sib"))
    );
    assert_eq!(
        harness.topology.get(&key("s2")).unwrap().upstream_key,
        Some(key("sib"))
    );

    let rows = harness.recoveries_fixture.rows();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].active);
    assert_eq!(rows[0].successor_key, Some(key("sib")));
    assert_eq!(
        harness.runner.commands(),
        vec![
            "detect im",
            "pre im",
            "post-intermediate im -> sib",
            "post sib",
        ],
    );
}

#[tokio::test]
async fn sibling_in_another_data_center_is_rejected() {
    let harness = intermediate_harness();
    let mut sibling = harness.topology.get(&key("sib")).unwrap();
    sibling.data_center = "dc2".into();
    harness.topology.instance(sibling);

    let outcome = harness
        .controller
        .check_and_recover(&harness.context, Some(&key("im")), None, true)
        .await
        .expect("recovery to run");

    // Plan B: the orphans regroup under s2 which then matches up to p.
    assert!(outcome.action_taken);
    assert_eq!(outcome.successor.unwrap().key, key("p"));
    assert_eq!(
        harness.topology.get(&key("s1")).unwrap().upstream_key,
        Some(key("s2"))
    );
    assert_eq!(
        harness.topology.get(&key("s2")).unwrap().upstream_key,
        Some(key("p"))
    );
}

#[tokio::test]
async fn sibling_behind_the_failed_instance_is_rejected() {
    let harness = intermediate_harness();
    let mut sibling = harness.topology.get(&key("sib")).unwrap();
    sibling.exec_coordinates.log_pos = 750;
    harness.topology.instance(sibling);

    let outcome = harness
        .controller
        .check_and_recover(&harness.context, Some(&key("im")), None, true)
        .await
        .expect("recovery to run");

    assert!(outcome.action_taken);
    assert_eq!(outcome.successor.unwrap().key, key("p"));
}

#[tokio::test]
async fn failed_sibling_takeover_falls_back_to_match_up() {
    let harness = intermediate_harness();
    harness.topology.fail_multi_match();

    let outcome = harness
        .controller
        .check_and_recover(&harness.context, Some(&key("im")), None, true)
        .await
        .expect("recovery to run");

    assert!(outcome.action_taken);
    assert_eq!(outcome.successor.unwrap().key, key("p"));
    assert_eq!(
        harness.topology.get(&key("s2")).unwrap().upstream_key,
        Some(key("p"))
    );
}

#[tokio::test]
async fn nothing_to_match_up_reports_failure() {
    let harness = fixtures::harness(conf_with_hooks());
    // No replicas under the failed intermediate, and no usable sibling.
    harness
        .topology
        .instance(primary("p", 900))
        .instance(replica("im", "p", 800));
    harness
        .analyzer
        .entry(entry(AnalysisVerdict::DeadIntermediatePrimary, "im"));

    let error = harness
        .controller
        .check_and_recover(&harness.context, Some(&key("im")), None, true)
        .await
        .expect_err("recovery to fail");
    assert!(error.downcast_ref::<PromotionFailure>().is_some());
    // No post hooks ran after the failure.
    assert_eq!(harness.runner.commands(), vec!["detect im", "pre im"]);
}

#[tokio::test]
async fn siblings_with_more_downstreams_are_preferred() {
    let harness = fixtures::harness(conf_with_hooks());
    harness
        .topology
        .instance(primary("p", 900))
        .instance(replica("im", "p", 800))
        // Most advanced sibling, but no downstream replicas of its own.
        .instance(replica("lone", "p", 890))
        // Less advanced sibling backing two replicas.
        .instance(replica("busy", "p", 850))
        .instance(replica("b1", "busy", 840))
        .instance(replica("b2", "busy", 840))
        .instance(replica("s1", "im", 500));
    harness
        .analyzer
        .entry(entry(AnalysisVerdict::DeadIntermediatePrimary, "im"));

    let outcome = harness
        .controller
        .check_and_recover(&harness.context, Some(&key("im")), None, true)
        .await
        .expect("recovery to run");

    assert_eq!(outcome.successor.unwrap().key, key("busy"));
}

#[tokio::test]
async fn dead_co_primary_recovers_like_an_intermediate() {
    let harness = fixtures::harness(conf_with_hooks());
    harness
        .topology
        .instance(primary("p", 900))
        .instance(replica("im", "p", 800))
        .instance(replica("sib", "p", 850))
        .instance(replica("s1", "im", 500));
    harness
        .analyzer
        .entry(entry(AnalysisVerdict::DeadCoPrimary, "im"));

    let outcome = harness
        .controller
        .check_and_recover(&harness.context, Some(&key("im")), None, true)
        .await
        .expect("recovery to run");

    assert!(outcome.action_taken);
    assert_eq!(outcome.successor.unwrap().key, key("sib"));
}
