//! Violation messages and report artifacts.
//!
//! Unresolved incompatibilities carry the exact JSON a maintainer pastes into
//! the acceptance file. Finished runs are persisted as `<check>-report.json`
//! and `<check>-report.md` for CI and PR output.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accepted::{AcceptanceEntry, AcceptedChange};
use crate::domain::{ApiGuardError, ChangeKind, MemberKind};
use crate::run::RunState;

/// Justification key used in generated acceptance snippets.
pub const PLACEHOLDER_JUSTIFICATION: &str = "Reason for accepting this change";

/// Report schema version written into JSON artifacts.
pub const REPORT_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Unresolved incompatibility; fails the run.
    Error,
    /// Incompatibility covered by an acceptance entry; informational.
    Accepted,
}

/// One reported binary-incompatible member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub severity: Severity,
    pub member_kind: MemberKind,
    pub type_name: String,
    pub member: String,
    pub changes: Vec<ChangeKind>,
    /// Set for accepted violations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    pub message: String,
}

impl Violation {
    /// Hard violation embedding the acceptance snippet for `key`.
    pub fn unresolved(
        member_kind: MemberKind,
        key: &AcceptedChange,
        accepted_path: &Path,
    ) -> crate::domain::Result<Self> {
        let message = format!(
            "{}: {}\n\nIn order to accept this change add the following to {}:\n{}",
            headline(member_kind, key),
            key.change_names(),
            accepted_path.display(),
            render_acceptance_snippet(key)?,
        );
        Ok(Self {
            severity: Severity::Error,
            member_kind,
            type_name: key.type_name.clone(),
            member: key.member.clone(),
            changes: key.changes.iter().cloned().collect(),
            justification: None,
            message,
        })
    }

    /// Informational note for an incompatibility matching an acceptance entry.
    pub fn accepted(member_kind: MemberKind, key: &AcceptedChange, justification: &str) -> Self {
        let message = format!(
            "{}: {}. Reason for accepting this: {}",
            headline(member_kind, key),
            key.change_names(),
            justification,
        );
        Self {
            severity: Severity::Accepted,
            member_kind,
            type_name: key.type_name.clone(),
            member: key.member.clone(),
            changes: key.changes.iter().cloned().collect(),
            justification: Some(justification.to_string()),
            message,
        }
    }

    pub fn key(&self) -> AcceptedChange {
        AcceptedChange::new(
            self.type_name.clone(),
            self.member.clone(),
            self.changes.iter().cloned(),
        )
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

fn headline(member_kind: MemberKind, key: &AcceptedChange) -> String {
    if member_kind == MemberKind::Class {
        format!("Binary-incompatible class {}", key.type_name)
    } else {
        format!(
            "Binary-incompatible {} {} in {}",
            member_kind, key.member, key.type_name
        )
    }
}

/// JSON object accepting `key` under the placeholder justification.
///
/// The output is a complete acceptance document; its entry can be pasted
/// into an existing file as-is.
pub fn render_acceptance_snippet(key: &AcceptedChange) -> crate::domain::Result<String> {
    let mut doc = serde_json::Map::new();
    let entry = serde_json::to_value(AcceptanceEntry::from(key.clone()))?;
    doc.insert(
        PLACEHOLDER_JUSTIFICATION.to_string(),
        serde_json::Value::Array(vec![entry]),
    );
    Ok(serde_json::to_string_pretty(&serde_json::Value::Object(doc))?)
}

/// An acceptance entry no incompatibility matched during the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleEntry {
    pub change: AcceptedChange,
    pub justification: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub members_evaluated: usize,
    pub compatible: usize,
    pub suppressed: usize,
    pub accepted: usize,
    pub errors: usize,
    pub stale: usize,
}

/// Outcome of one finished check run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub schema_version: String,
    pub check: String,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub old_version: Option<String>,
    pub new_version: Option<String>,
    pub accepted_file: PathBuf,
    /// SHA-256 of the acceptance file, absent when the file does not exist.
    pub accepted_digest: Option<String>,
    /// SHA-256 of the diff input, when it was read from disk.
    pub diff_digest: Option<String>,
    pub state: RunState,
    pub summary: CheckSummary,
    pub violations: Vec<Violation>,
    pub stale: Vec<StaleEntry>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.state == RunState::Passed
    }

    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_error())
    }

    pub fn accepted(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.is_error())
    }

    /// Keys of every unresolved violation, for the acceptance helper.
    pub fn unresolved_keys(&self) -> Vec<AcceptedChange> {
        self.errors().map(Violation::key).collect()
    }

    /// `Ok(self)` when passed, otherwise [`ApiGuardError::CheckFailed`].
    pub fn into_result(self) -> crate::domain::Result<Self> {
        if self.passed() {
            return Ok(self);
        }
        Err(ApiGuardError::CheckFailed {
            check: self.check.clone(),
            unresolved: self.summary.errors,
            stale: self.stale.iter().map(|s| s.change.to_string()).collect(),
        })
    }
}

/// Render the Markdown summary for PR/comment/check output.
pub fn render_report_md(report: &CheckReport) -> crate::domain::Result<String> {
    let mut out = String::new();
    out.push_str(&format!("# API Compatibility: {}\n\n", report.check));

    let verdict = if report.passed() { "PASSED" } else { "FAILED" };
    out.push_str(&format!("**{}**", verdict));
    if let (Some(old), Some(new)) = (&report.old_version, &report.new_version) {
        out.push_str(&format!(" ({} -> {})", old, new));
    }
    out.push_str("\n\n");

    let s = &report.summary;
    out.push_str(&format!(
        "- members evaluated: {}\n- compatible: {}\n- suppressed: {}\n- accepted: {}\n- unresolved: {}\n- stale acceptance entries: {}\n\n",
        s.members_evaluated, s.compatible, s.suppressed, s.accepted, s.errors, s.stale
    ));

    let errors: Vec<&Violation> = report.errors().collect();
    if !errors.is_empty() {
        out.push_str("## Unresolved\n\n");
        for v in errors {
            out.push_str(&format!(
                "### `{}` {}\n\n- {}\n\n```json\n{}\n```\n\n",
                v.type_name,
                v.member,
                join_changes(&v.changes),
                render_acceptance_snippet(&v.key())?,
            ));
        }
    }

    let accepted: Vec<&Violation> = report.accepted().collect();
    if !accepted.is_empty() {
        out.push_str("## Accepted\n\n");
        for v in accepted {
            out.push_str(&format!(
                "- `{}` {} ({}): {}\n",
                v.type_name,
                v.member,
                join_changes(&v.changes),
                v.justification.as_deref().unwrap_or_default(),
            ));
        }
        out.push('\n');
    }

    if !report.stale.is_empty() {
        out.push_str(&format!(
            "## Stale acceptance entries\n\nRemove these from `{}`:\n\n",
            report.accepted_file.display()
        ));
        for entry in &report.stale {
            out.push_str(&format!(
                "- `{}` {} ({}): {}\n",
                entry.change.type_name,
                entry.change.member,
                entry.change.change_names(),
                entry.justification,
            ));
        }
        out.push('\n');
    }

    Ok(out)
}

fn join_changes(changes: &[ChangeKind]) -> String {
    changes
        .iter()
        .map(ChangeKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Write `<check>-report.json` into `dir`, returning its path.
pub fn write_report_json(dir: &Path, report: &CheckReport) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {:?}", dir))?;
    let path = dir.join(format!("{}-report.json", report.check));
    let content = serde_json::to_string_pretty(report).context("serialize check report")?;
    std::fs::write(&path, content).with_context(|| format!("write {:?}", path))?;
    Ok(path)
}

/// Write `<check>-report.md` into `dir`, returning its path.
pub fn write_report_md(dir: &Path, report: &CheckReport) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {:?}", dir))?;
    let path = dir.join(format!("{}-report.md", report.check));
    let content = render_report_md(report).context("render check report")?;
    std::fs::write(&path, content).with_context(|| format!("write {:?}", path))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accepted::AcceptanceFile;

    fn key() -> AcceptedChange {
        AcceptedChange::new("Foo", "void bar()", [ChangeKind::MethodRemoved])
    }

    fn sample_report(violations: Vec<Violation>, stale: Vec<StaleEntry>) -> CheckReport {
        let errors = violations.iter().filter(|v| v.is_error()).count();
        let accepted = violations.len() - errors;
        let state = if errors == 0 && stale.is_empty() {
            RunState::Passed
        } else {
            RunState::Failed
        };
        CheckReport {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            check: "core".to_string(),
            run_id: Uuid::parse_str("11111111-1111-1111-1111-111111111111").expect("uuid"),
            generated_at: DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .expect("parse RFC3339")
                .with_timezone(&Utc),
            old_version: Some("7.3.0".to_string()),
            new_version: Some("8.0.0".to_string()),
            accepted_file: PathBuf::from("accepted-core-public-api-changes.json"),
            accepted_digest: None,
            diff_digest: None,
            state,
            summary: CheckSummary {
                members_evaluated: 4,
                compatible: 2,
                suppressed: 2 - violations.len().min(2),
                accepted,
                errors,
                stale: stale.len(),
            },
            violations,
            stale,
        }
    }

    #[test]
    fn snippet_parses_as_acceptance_file() {
        let snippet = render_acceptance_snippet(&key()).expect("render snippet");
        let file = AcceptanceFile::from_json_str(&snippet).expect("snippet is valid JSON");
        let registry = file.to_registry().expect("snippet is a valid acceptance file");
        assert_eq!(
            registry.justification(&key()),
            Some(PLACEHOLDER_JUSTIFICATION)
        );
    }

    #[test]
    fn unresolved_message_embeds_snippet_and_path() {
        let v = Violation::unresolved(
            MemberKind::Method,
            &key(),
            Path::new("verification/accepted.json"),
        )
        .expect("unresolved violation");
        assert!(v.is_error());
        assert!(v.message.contains("verification/accepted.json"));
        assert!(v.message.contains(r#""member": "void bar()""#));
        assert!(v.message.contains(r#""METHOD_REMOVED""#));
        assert!(v.message.contains(PLACEHOLDER_JUSTIFICATION));
    }

    #[test]
    fn accepted_message_embeds_justification() {
        let v = Violation::accepted(MemberKind::Method, &key(), "removed in 8.0");
        assert_eq!(v.severity, Severity::Accepted);
        assert!(v.message.contains("removed in 8.0"));
        assert_eq!(v.key(), key());
    }

    #[test]
    fn into_result_fails_on_stale_entries() {
        let stale = StaleEntry {
            change: key(),
            justification: "removed in 8.0".to_string(),
        };
        let err = sample_report(Vec::new(), vec![stale])
            .into_result()
            .expect_err("stale entry fails the run");
        let msg = err.to_string();
        assert!(msg.contains("Foo / void bar() [METHOD_REMOVED]"));
    }

    #[test]
    fn markdown_render_is_stable() {
        let report = sample_report(
            vec![Violation::accepted(MemberKind::Method, &key(), "removed in 8.0")],
            Vec::new(),
        );
        let actual = render_report_md(&report).expect("render");
        let expected = "# API Compatibility: core\n\n**PASSED** (7.3.0 -> 8.0.0)\n\n- members evaluated: 4\n- compatible: 2\n- suppressed: 1\n- accepted: 1\n- unresolved: 0\n- stale acceptance entries: 0\n\n## Accepted\n\n- `Foo` void bar() (METHOD_REMOVED): removed in 8.0\n\n";
        assert_eq!(actual, expected);
    }

    #[test]
    fn report_json_has_expected_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = sample_report(
            vec![Violation::unresolved(
                MemberKind::Method,
                &key(),
                Path::new("accepted.json"),
            )
            .expect("unresolved violation")],
            Vec::new(),
        );
        let path = write_report_json(dir.path(), &report).expect("write");
        assert!(path.ends_with("core-report.json"));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        for key in [
            "schema_version",
            "check",
            "run_id",
            "generated_at",
            "state",
            "summary",
            "violations",
            "stale",
        ] {
            assert!(raw.get(key).is_some(), "missing key: {}", key);
        }
        assert_eq!(raw["state"], "failed");
        assert_eq!(raw["violations"][0]["severity"], "error");
    }
}
