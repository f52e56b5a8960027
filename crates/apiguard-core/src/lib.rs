//! apiguard core library
//!
//! Gates a build on binary API compatibility: each member reported by the
//! diff engine is checked against a JSON file of reviewed, justified breaks,
//! and any unresolved break or stale acceptance entry fails the run.

pub mod accepted;
pub mod config;
pub mod domain;
pub mod obs;
pub mod report;
pub mod rule;
pub mod run;
pub mod telemetry;

pub use accepted::{
    AcceptanceEntry, AcceptanceFile, AcceptedChange, AcceptedChangeRegistry, SeenChanges,
};
pub use config::{
    validate_check_name, CheckConfig, VerificationConfig, DEFAULT_CONFIG_FILE, REPORT_DIR_ENV,
};
pub use domain::{
    AcceptanceError, ApiDiff, ApiGuardError, ChangeKind, ClassDiff, MemberDiff, MemberKind,
    NestedDiff, Result,
};
pub use obs::{
    emit_check_finished, emit_check_started, emit_stale_entry, emit_violation, CheckSpan,
};
pub use report::{
    render_acceptance_snippet, render_report_md, write_report_json, write_report_md, CheckReport,
    CheckSummary, Severity, StaleEntry, Violation, PLACEHOLDER_JUSTIFICATION,
};
pub use rule::{BinaryCompatRule, Evaluation, RuleContext, Suppression, DEFAULT_IGNORED_CHANGES};
pub use run::{run_check, CheckOptions, CheckRun, RunState};
pub use telemetry::init_tracing;

/// apiguard version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
