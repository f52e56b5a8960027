//! Verification config: which artifacts to check and where their inputs live.
//!
//! ```toml
//! report_dir = "build/reports/apiguard"
//!
//! [[check]]
//! name = "core"
//! diff = "build/japicmp/core-diff.json"
//! accepted = "verification/src/changes/accepted-core-public-api-changes.json"
//! ```
//!
//! Relative paths resolve against the config file's directory.
//! `APIGUARD_REPORT_DIR` overrides `report_dir`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::{ApiGuardError, ChangeKind, Result};
use crate::run::CheckOptions;

pub const DEFAULT_CONFIG_FILE: &str = "apiguard.toml";
pub const DEFAULT_REPORT_DIR: &str = "build/reports/apiguard";
pub const REPORT_DIR_ENV: &str = "APIGUARD_REPORT_DIR";

/// One artifact to verify.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    pub name: String,
    /// Diff-engine output for this artifact.
    pub diff: PathBuf,
    /// Acceptance file for this artifact.
    pub accepted: PathBuf,
    #[serde(default)]
    pub extra_ignored_changes: Vec<ChangeKind>,
}

impl CheckConfig {
    pub fn options(&self) -> CheckOptions {
        CheckOptions {
            name: self.name.clone(),
            accepted_path: self.accepted.clone(),
            extra_ignored: self.extra_ignored_changes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationConfig {
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
    #[serde(rename = "check", default)]
    pub checks: Vec<CheckConfig>,
}

impl VerificationConfig {
    /// Parse `raw` as if it were read from `path`.
    pub fn parse(raw: &str, path: &Path) -> Result<Self> {
        let mut config: Self = toml::from_str(raw).map_err(|source| ApiGuardError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.report_dir = config.report_dir.map(|p| base.join(p));
        for check in &mut config.checks {
            check.diff = base.join(&check.diff);
            check.accepted = base.join(&check.accepted);
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ApiGuardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&raw, path)?;
        tracing::debug!(path = %path.display(), checks = config.checks.len(), "loaded config");
        Ok(config)
    }

    /// Apply environment overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides using `lookup` for variable access.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(REPORT_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.report_dir = Some(PathBuf::from(dir));
        }
        self
    }

    pub fn report_dir(&self) -> PathBuf {
        self.report_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR))
    }

    pub fn check(&self, name: &str) -> Option<&CheckConfig> {
        self.checks.iter().find(|c| c.name == name)
    }

    fn validate(&self) -> Result<()> {
        if self.checks.is_empty() {
            return Err(ApiGuardError::Config(
                "at least one [[check]] is required".to_string(),
            ));
        }
        let mut names = BTreeSet::new();
        for check in &self.checks {
            validate_check_name(&check.name)?;
            if !names.insert(check.name.as_str()) {
                return Err(ApiGuardError::Config(format!(
                    "duplicate check name: {}",
                    check.name
                )));
            }
        }
        Ok(())
    }
}

/// Check names become report file names, so they must be a single path
/// component.
pub fn validate_check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ApiGuardError::Config("check name must not be empty".to_string()));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(ApiGuardError::Config(format!(
            "check name must not contain path separators: {}",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
report_dir = "out/reports"

[[check]]
name = "core"
diff = "build/core-diff.json"
accepted = "verification/accepted-core.json"

[[check]]
name = "bukkit"
diff = "build/bukkit-diff.json"
accepted = "verification/accepted-bukkit.json"
extra_ignored_changes = ["METHOD_NOW_FINAL"]
"#;

    #[test]
    fn resolves_paths_against_config_dir() {
        let config =
            VerificationConfig::parse(SAMPLE, Path::new("/repo/apiguard.toml")).expect("parse");
        assert_eq!(config.checks.len(), 2);
        assert_eq!(config.report_dir(), PathBuf::from("/repo/out/reports"));

        let core = config.check("core").expect("core check");
        assert_eq!(core.diff, PathBuf::from("/repo/build/core-diff.json"));
        assert_eq!(
            core.accepted,
            PathBuf::from("/repo/verification/accepted-core.json")
        );

        let bukkit = config.check("bukkit").expect("bukkit check");
        assert_eq!(bukkit.options().extra_ignored, vec![ChangeKind::MethodNowFinal]);
    }

    #[test]
    fn absolute_paths_are_kept() {
        let raw = r#"
[[check]]
name = "core"
diff = "/abs/diff.json"
accepted = "/abs/accepted.json"
"#;
        let config = VerificationConfig::parse(raw, Path::new("/repo/apiguard.toml")).expect("parse");
        assert_eq!(config.checks[0].diff, PathBuf::from("/abs/diff.json"));
        assert_eq!(config.report_dir(), PathBuf::from(DEFAULT_REPORT_DIR));
    }

    #[test]
    fn env_overrides_report_dir() {
        let config = VerificationConfig::parse(SAMPLE, Path::new("apiguard.toml"))
            .expect("parse")
            .with_env_from(|key| (key == REPORT_DIR_ENV).then(|| "/tmp/reports".to_string()));
        assert_eq!(config.report_dir(), PathBuf::from("/tmp/reports"));
    }

    #[test]
    fn rejects_empty_and_duplicate_checks() {
        let err = VerificationConfig::parse("", Path::new("apiguard.toml")).expect_err("empty");
        assert!(matches!(err, ApiGuardError::Config(_)));

        let raw = r#"
[[check]]
name = "core"
diff = "a.json"
accepted = "b.json"

[[check]]
name = "core"
diff = "c.json"
accepted = "d.json"
"#;
        let err = VerificationConfig::parse(raw, Path::new("apiguard.toml")).expect_err("dup");
        assert!(err.to_string().contains("duplicate check name: core"));
    }

    #[test]
    fn rejects_check_names_that_are_paths() {
        let raw = r#"
[[check]]
name = "core/api"
diff = "a.json"
accepted = "b.json"
"#;
        let err = VerificationConfig::parse(raw, Path::new("apiguard.toml")).expect_err("slash");
        assert!(err.to_string().contains("path separators: core/api"));

        for name in ["..", "a\\b", " "] {
            assert!(validate_check_name(name).is_err(), "accepted {:?}", name);
        }
        assert!(validate_check_name("core-api").is_ok());
    }

    #[test]
    fn rejects_unknown_keys() {
        let raw = r#"
[[check]]
name = "core"
diff = "a.json"
acepted = "b.json"
"#;
        let err = VerificationConfig::parse(raw, Path::new("apiguard.toml")).expect_err("typo");
        assert!(matches!(err, ApiGuardError::ConfigParse { .. }));
    }
}
