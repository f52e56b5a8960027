//! Observability tests for check-run lifecycle tracing.

use std::path::Path;

use apiguard_core::{
    emit_check_finished, emit_check_started, emit_stale_entry, emit_violation,
    AcceptedChange, AcceptedChangeRegistry, ApiDiff, ChangeKind, CheckOptions, CheckRun,
    CheckSpan, CheckSummary, MemberKind, Violation,
};
use tracing_test::traced_test;
use uuid::Uuid;

fn removed_bar() -> AcceptedChange {
    AcceptedChange::new("Foo", "void bar()", [ChangeKind::MethodRemoved])
}

#[traced_test]
#[test]
fn test_emit_check_started_logs_entry_count() {
    emit_check_started("core", &Uuid::new_v4(), 3);
    assert!(logs_contain("check.started"));
    assert!(logs_contain("accepted_entries=3"));
}

#[traced_test]
#[test]
fn test_emit_violation_logs_unresolved_member() {
    let v = Violation::unresolved(MemberKind::Method, &removed_bar(), Path::new("a.json"))
        .expect("violation");
    emit_violation("core", &v);
    assert!(logs_contain("check.violation"));
    assert!(logs_contain("void bar()"));
}

#[traced_test]
#[test]
fn test_emit_violation_logs_accepted_justification() {
    let v = Violation::accepted(MemberKind::Method, &removed_bar(), "removed in 8.0");
    emit_violation("core", &v);
    assert!(logs_contain("check.accepted"));
    assert!(logs_contain("removed in 8.0"));
}

#[traced_test]
#[test]
fn test_emit_stale_entry_logs_entry() {
    emit_stale_entry("core", &removed_bar());
    assert!(logs_contain("check.stale_entry"));
    assert!(logs_contain("METHOD_REMOVED"));
}

#[traced_test]
#[test]
fn test_emit_check_finished_logs_verdict() {
    emit_check_finished("core", &CheckSummary::default(), true);
    assert!(logs_contain("check.finished"));
    assert!(logs_contain("passed=true"));
}

#[traced_test]
#[test]
fn test_full_run_emits_lifecycle_events() {
    let registry = AcceptedChangeRegistry::from_json_str(
        r#"{ "removed in 8.0": [ { "type": "Foo", "member": "void bar()", "changes": ["METHOD_REMOVED"] } ] }"#,
    )
    .expect("registry");
    let diff = ApiDiff::from_json_str(
        r#"{ "old_version": "1", "new_version": "2", "classes": [] }"#,
    )
    .expect("diff");

    let mut run = CheckRun::new(CheckOptions::new("core", "a.json"));
    let _span = CheckSpan::enter("core", &run.run_id());
    run.setup_with_registry(registry).expect("setup");
    run.evaluate_all(&diff).expect("evaluate");
    let report = run.finalize().expect("finalize");

    assert!(!report.passed());
    assert!(logs_contain("check.started"));
    assert!(logs_contain("check.stale_entry"));
    assert!(logs_contain("passed=false"));
}
