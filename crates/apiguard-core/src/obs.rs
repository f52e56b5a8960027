//! Structured observability hooks for check-run lifecycle events.
//!
//! This module provides:
//! - Check-scoped tracing spans via the `CheckSpan` RAII guard
//! - Emission functions for start, per-violation, stale entry, and finish
//!
//! Filtering follows `RUST_LOG`; see [`crate::telemetry::init_tracing`].

use tracing::{info, warn};
use uuid::Uuid;

use crate::accepted::AcceptedChange;
use crate::report::{CheckSummary, Violation};

/// RAII guard that enters a check-scoped tracing span.
///
/// # Example
///
/// ```ignore
/// let _span = CheckSpan::enter("core", &run_id);
/// // every event below carries check = "core" and the run id
/// ```
pub struct CheckSpan {
    _span: tracing::span::EnteredSpan,
}

impl CheckSpan {
    pub fn enter(check: &str, run_id: &Uuid) -> Self {
        let span = tracing::info_span!("apiguard.check", check = %check, run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: setup finished, comparison begins.
pub fn emit_check_started(check: &str, run_id: &Uuid, accepted_entries: usize) {
    info!(
        event = "check.started",
        check = %check,
        run_id = %run_id,
        accepted_entries = accepted_entries,
    );
}

/// Emit event: one reported member. Unresolved ones at `warn!`.
pub fn emit_violation(check: &str, violation: &Violation) {
    if violation.is_error() {
        warn!(
            event = "check.violation",
            check = %check,
            type_name = %violation.type_name,
            member = %violation.member,
            changes = violation.changes.len(),
        );
    } else {
        info!(
            event = "check.accepted",
            check = %check,
            type_name = %violation.type_name,
            member = %violation.member,
            justification = violation.justification.as_deref().unwrap_or_default(),
        );
    }
}

/// Emit event: an acceptance entry nothing matched (warning level).
pub fn emit_stale_entry(check: &str, change: &AcceptedChange) {
    warn!(event = "check.stale_entry", check = %check, entry = %change);
}

/// Emit event: run settled.
pub fn emit_check_finished(check: &str, summary: &CheckSummary, passed: bool) {
    info!(
        event = "check.finished",
        check = %check,
        members_evaluated = summary.members_evaluated,
        accepted = summary.accepted,
        errors = summary.errors,
        stale = summary.stale,
        passed = passed,
    );
}
