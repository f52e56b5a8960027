//! Error taxonomy for apiguard.

use std::path::PathBuf;

/// Problems found while validating a syntactically valid acceptance file.
#[derive(Debug, thiserror::Error)]
pub enum AcceptanceError {
    #[error("entry {type_name} / {member} under \"{justification}\" lists no changes")]
    EmptyChanges {
        justification: String,
        type_name: String,
        member: String,
    },

    #[error(
        "entry {type_name} / {member} [{changes}] is accepted twice: \"{first}\" and \"{second}\""
    )]
    Duplicate {
        type_name: String,
        member: String,
        changes: String,
        first: String,
        second: String,
    },
}

/// apiguard errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiGuardError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid acceptance file: {0}")]
    InvalidAcceptance(#[from] AcceptanceError),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(
        "api check '{check}' failed: {unresolved} unresolved incompatibilities, {} stale acceptance entries{}",
        .stale.len(),
        list_stale(.stale)
    )]
    CheckFailed {
        check: String,
        unresolved: usize,
        stale: Vec<String>,
    },

    #[error("check run is {actual}, expected {expected}")]
    Lifecycle { expected: String, actual: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn list_stale(stale: &[String]) -> String {
    stale.iter().map(|s| format!("\n  - {s}")).collect()
}

/// Result type for apiguard operations.
pub type Result<T> = std::result::Result<T, ApiGuardError>;
