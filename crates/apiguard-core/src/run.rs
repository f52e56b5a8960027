//! Check-run lifecycle: setup hook, per-member comparison, post-process hook.
//!
//! ```text
//! NotStarted --setup--> Comparing --finalize--> Finalizing --> Passed | Failed
//! ```
//!
//! The registry and seen set are owned by the [`CheckRun`] and lent to the
//! rule on each evaluation. Violations are collected rather than raised, so a
//! single run surfaces every problem.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::accepted::{AcceptedChangeRegistry, SeenChanges};
use crate::domain::{ApiDiff, ApiGuardError, ChangeKind, MemberDiff, Result};
use crate::obs;
use crate::report::{CheckReport, CheckSummary, StaleEntry, Violation, REPORT_SCHEMA_VERSION};
use crate::rule::{BinaryCompatRule, Evaluation, RuleContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Comparing,
    Finalizing,
    Passed,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::NotStarted => "not_started",
            RunState::Comparing => "comparing",
            RunState::Finalizing => "finalizing",
            RunState::Passed => "passed",
            RunState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Inputs for one named check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOptions {
    /// Check name, e.g. the artifact (`core`, `bukkit`).
    pub name: String,
    /// Acceptance file. A missing file means nothing is accepted.
    pub accepted_path: PathBuf,
    /// Change kinds ignored on top of the defaults.
    pub extra_ignored: Vec<ChangeKind>,
}

impl CheckOptions {
    pub fn new(name: impl Into<String>, accepted_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            accepted_path: accepted_path.into(),
            extra_ignored: Vec::new(),
        }
    }
}

/// One comparison pass over a diff, with its run-scoped state.
pub struct CheckRun {
    options: CheckOptions,
    run_id: Uuid,
    state: RunState,
    rule: BinaryCompatRule,
    registry: AcceptedChangeRegistry,
    seen: SeenChanges,
    accepted_digest: Option<String>,
    diff_digest: Option<String>,
    old_version: Option<String>,
    new_version: Option<String>,
    summary: CheckSummary,
    violations: Vec<Violation>,
}

impl CheckRun {
    pub fn new(options: CheckOptions) -> Self {
        let rule = BinaryCompatRule::with_extra_ignored(options.extra_ignored.iter().cloned());
        Self {
            options,
            run_id: Uuid::new_v4(),
            state: RunState::NotStarted,
            rule,
            registry: AcceptedChangeRegistry::default(),
            seen: SeenChanges::new(),
            accepted_digest: None,
            diff_digest: None,
            old_version: None,
            new_version: None,
            summary: CheckSummary::default(),
            violations: Vec::new(),
        }
    }

    /// Setup hook: load the acceptance file and start comparing.
    pub fn setup(&mut self) -> Result<()> {
        self.expect_state(RunState::NotStarted)?;
        let path = self.options.accepted_path.clone();
        self.accepted_digest = digest_file(&path)?;
        let registry = AcceptedChangeRegistry::load_or_empty(&path)?;
        self.start(registry);
        Ok(())
    }

    /// Start comparing against an in-memory registry instead of a file.
    pub fn setup_with_registry(&mut self, registry: AcceptedChangeRegistry) -> Result<()> {
        self.expect_state(RunState::NotStarted)?;
        self.start(registry);
        Ok(())
    }

    fn start(&mut self, registry: AcceptedChangeRegistry) {
        self.registry = registry;
        self.seen = SeenChanges::new();
        self.state = RunState::Comparing;
        obs::emit_check_started(&self.options.name, &self.run_id, self.registry.len());
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn seen(&self) -> &SeenChanges {
        &self.seen
    }

    /// Record the SHA-256 of the raw diff input for the report.
    pub fn record_diff_source(&mut self, raw: &[u8]) {
        self.diff_digest = Some(hex::encode(Sha256::digest(raw)));
    }

    /// Evaluate one member; violations are collected on the run.
    pub fn evaluate(&mut self, member: &MemberDiff) -> Result<Evaluation> {
        self.expect_state(RunState::Comparing)?;
        let mut ctx = RuleContext {
            registry: &self.registry,
            seen: &mut self.seen,
            accepted_path: &self.options.accepted_path,
        };
        let outcome = self.rule.evaluate(member, &mut ctx)?;

        self.summary.members_evaluated += 1;
        match &outcome {
            Evaluation::Compatible => self.summary.compatible += 1,
            Evaluation::Suppressed(reason) => {
                self.summary.suppressed += 1;
                tracing::debug!(
                    check = %self.options.name,
                    type_name = %member.type_name,
                    member = %member.descriptor(),
                    reason = ?reason,
                    "suppressed"
                );
            }
            Evaluation::Reported(violation) => {
                if violation.is_error() {
                    self.summary.errors += 1;
                } else {
                    self.summary.accepted += 1;
                }
                obs::emit_violation(&self.options.name, violation);
                self.violations.push(violation.clone());
            }
        }
        Ok(outcome)
    }

    /// Evaluate every member of `diff`.
    pub fn evaluate_all(&mut self, diff: &ApiDiff) -> Result<()> {
        self.old_version = Some(diff.old_version.clone());
        self.new_version = Some(diff.new_version.clone());
        for member in diff.members() {
            self.evaluate(&member)?;
        }
        Ok(())
    }

    /// Post-process hook: detect stale acceptance entries and settle the run.
    pub fn finalize(mut self) -> Result<CheckReport> {
        self.expect_state(RunState::Comparing)?;
        self.state = RunState::Finalizing;

        let stale: Vec<StaleEntry> = self
            .registry
            .iter()
            .filter(|(change, _)| !self.seen.contains(change))
            .map(|(change, justification)| StaleEntry {
                change: change.clone(),
                justification: justification.to_string(),
            })
            .collect();
        for entry in &stale {
            obs::emit_stale_entry(&self.options.name, &entry.change);
        }
        self.summary.stale = stale.len();

        self.state = if self.summary.errors == 0 && stale.is_empty() {
            RunState::Passed
        } else {
            RunState::Failed
        };
        obs::emit_check_finished(&self.options.name, &self.summary, self.state == RunState::Passed);

        Ok(CheckReport {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            check: self.options.name,
            run_id: self.run_id,
            generated_at: Utc::now(),
            old_version: self.old_version,
            new_version: self.new_version,
            accepted_file: self.options.accepted_path,
            accepted_digest: self.accepted_digest,
            diff_digest: self.diff_digest,
            state: self.state,
            summary: self.summary,
            violations: self.violations,
            stale,
        })
    }

    fn expect_state(&self, expected: RunState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ApiGuardError::Lifecycle {
                expected: expected.to_string(),
                actual: self.state.to_string(),
            })
        }
    }
}

fn digest_file(path: &Path) -> Result<Option<String>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(hex::encode(Sha256::digest(&bytes)))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ApiGuardError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Run a full check: load the diff from `diff_path`, compare, finalize.
///
/// Returns the report whether or not the check passed; use
/// [`CheckReport::into_result`] to turn failure into an error.
pub fn run_check(options: CheckOptions, diff_path: &Path) -> Result<CheckReport> {
    let raw = std::fs::read(diff_path).map_err(|source| ApiGuardError::Io {
        path: diff_path.to_path_buf(),
        source,
    })?;
    let diff: ApiDiff = serde_json::from_slice(&raw).map_err(|source| ApiGuardError::Parse {
        origin: diff_path.display().to_string(),
        source,
    })?;

    let mut run = CheckRun::new(options);
    let _span = obs::CheckSpan::enter(&run.options.name, &run.run_id);
    run.setup()?;
    run.record_diff_source(&raw);
    run.evaluate_all(&diff)?;
    run.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MemberKind;

    fn registry() -> AcceptedChangeRegistry {
        AcceptedChangeRegistry::from_json_str(
            r#"{ "removed in 8.0": [ { "type": "Foo", "member": "void bar()", "changes": ["METHOD_REMOVED"] } ] }"#,
        )
        .expect("registry")
    }

    fn removed_bar() -> MemberDiff {
        MemberDiff {
            kind: MemberKind::Method,
            type_name: "Foo".to_string(),
            old_signature: Some("void bar()".to_string()),
            new_signature: None,
            binary_compatible: false,
            changes: vec![ChangeKind::MethodRemoved],
        }
    }

    #[test]
    fn evaluate_before_setup_is_rejected() {
        let mut run = CheckRun::new(CheckOptions::new("core", "accepted.json"));
        assert_eq!(run.state(), RunState::NotStarted);
        let err = run.evaluate(&removed_bar()).expect_err("not started");
        assert!(matches!(err, ApiGuardError::Lifecycle { .. }));
    }

    #[test]
    fn setup_twice_is_rejected() {
        let mut run = CheckRun::new(CheckOptions::new("core", "accepted.json"));
        run.setup_with_registry(registry()).expect("setup");
        assert_eq!(run.state(), RunState::Comparing);
        assert!(run.setup_with_registry(registry()).is_err());
    }

    #[test]
    fn matched_entry_passes() {
        let mut run = CheckRun::new(CheckOptions::new("core", "accepted.json"));
        run.setup_with_registry(registry()).expect("setup");
        run.evaluate(&removed_bar()).expect("evaluate");
        assert_eq!(run.seen().len(), 1);

        let report = run.finalize().expect("finalize");
        assert_eq!(report.state, RunState::Passed);
        assert_eq!(report.summary.accepted, 1);
        assert!(report.stale.is_empty());
    }

    #[test]
    fn unmatched_entry_is_stale() {
        let mut run = CheckRun::new(CheckOptions::new("core", "accepted.json"));
        run.setup_with_registry(registry()).expect("setup");
        let report = run.finalize().expect("finalize");
        assert_eq!(report.state, RunState::Failed);
        assert_eq!(report.stale.len(), 1);
        assert_eq!(report.stale[0].justification, "removed in 8.0");
    }

    #[test]
    fn missing_acceptance_file_is_empty_registry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut run = CheckRun::new(CheckOptions::new("core", dir.path().join("none.json")));
        run.setup().expect("setup");
        let report = run.finalize().expect("finalize");
        assert!(report.passed());
        assert!(report.accepted_digest.is_none());
    }

    #[test]
    fn malformed_acceptance_file_aborts_setup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("accepted.json");
        std::fs::write(&path, "{ not json").expect("write");
        let mut run = CheckRun::new(CheckOptions::new("core", &path));
        let err = run.setup().expect_err("parse error");
        assert!(matches!(err, ApiGuardError::Parse { .. }));
        assert_eq!(run.state(), RunState::NotStarted);
    }
}
