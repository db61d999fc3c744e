//! Registrar claim, decline and cooldown behaviour.
use replimend_events::AuditFixture;
use replimend_models::AnalysisVerdict;
use replimend_store::Recoveries;
use time::Duration;

use super::fixtures::entry;
use super::fixtures::key;
use crate::events;
use crate::RecoveryConf;
use crate::Registrar;

fn registrar() -> (
    Registrar,
    replimend_store::RecoveriesFixture,
    AuditFixture,
) {
    let (recoveries, recoveries_fixture) = Recoveries::fixture();
    let audit = AuditFixture::new();
    let registrar = Registrar::new(recoveries, audit.audit(), &RecoveryConf::default());
    (registrar, recoveries_fixture, audit)
}

#[tokio::test]
async fn registration_is_audited_with_the_processing_node() {
    let (registrar, _, mut audit) = registrar();
    let context = replimend_context::Context::fixture();

    let recovery = registrar
        .attempt(&context, &entry(AnalysisVerdict::DeadPrimary, "p"), false)
        .await
        .expect("attempt to run")
        .expect("claim to be granted");

    let event = audit
        .pop_timeout(std::time::Duration::from_secs(1))
        .await
        .expect("registration to be audited");
    assert_eq!(event.code, events::RECOVERY_REGISTERED);
    let payload: events::RecoveryRegistered = event.decode().expect("payload to decode");
    assert_eq!(payload.recovery_id, recovery.recovery_id);
    assert_eq!(payload.failed, key("p"));
    assert_eq!(payload.node, context.node);
}

#[tokio::test]
async fn duplicate_attempts_decline_without_error() {
    let (registrar, _, mut audit) = registrar();
    let context = replimend_context::Context::fixture();
    let entry = entry(AnalysisVerdict::DeadPrimary, "p");

    registrar
        .attempt(&context, &entry, false)
        .await
        .expect("attempt to run")
        .expect("claim to be granted");
    let declined = registrar
        .attempt(&context, &entry, false)
        .await
        .expect("attempt to run");
    assert!(declined.is_none());

    // First event is the registration, second the decline.
    audit
        .pop_timeout(std::time::Duration::from_secs(1))
        .await
        .expect("registration to be audited");
    let event = audit
        .pop_timeout(std::time::Duration::from_secs(1))
        .await
        .expect("decline to be audited");
    assert_eq!(event.code, events::RECOVERY_DECLINED);
}

#[tokio::test]
async fn cooldown_applies_unless_forced() {
    let (registrar, _, _audit) = registrar();
    let clock = replimend_context::ClockFixture::new();
    let context = replimend_context::Context::fixture_with_clock(clock.clock());

    registrar
        .attempt(&context, &entry(AnalysisVerdict::DeadPrimary, "p"), false)
        .await
        .expect("attempt to run")
        .expect("claim to be granted");
    registrar
        .resolve(&context, &key("p"), Some(key("r2")))
        .await
        .expect("resolve to run");

    clock.advance(Duration::minutes(30));
    let declined = registrar
        .attempt(&context, &entry(AnalysisVerdict::DeadPrimary, "q"), false)
        .await
        .expect("attempt to run");
    assert!(declined.is_none());

    let forced = registrar
        .attempt(&context, &entry(AnalysisVerdict::DeadPrimary, "q"), true)
        .await
        .expect("attempt to run");
    assert!(forced.is_some());
}
