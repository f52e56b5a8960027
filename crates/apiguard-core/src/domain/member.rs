//! Diff-engine output: per-member comparison results between a released
//! artifact and a freshly built one.
//!
//! The engine emits one [`ClassDiff`] per public type, with its own changes
//! plus the nested members that differ. [`ApiDiff::members`] flattens that
//! tree into the per-member sequence the compatibility rule consumes.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::change_kind::ChangeKind;
use crate::domain::error::{ApiGuardError, Result};

/// What kind of API element a [`MemberDiff`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Class,
    Superclass,
    ImplementedInterface,
    Constructor,
    Method,
    Field,
}

impl MemberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Class => "class",
            MemberKind::Superclass => "superclass",
            MemberKind::ImplementedInterface => "implemented_interface",
            MemberKind::Constructor => "constructor",
            MemberKind::Method => "method",
            MemberKind::Field => "field",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One compared API member, as handed to the compatibility rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberDiff {
    pub kind: MemberKind,
    /// Fully qualified name of the containing type.
    pub type_name: String,
    /// Signature in the released artifact (absent for added members).
    pub old_signature: Option<String>,
    /// Signature in the new artifact (absent for removed members).
    pub new_signature: Option<String>,
    pub binary_compatible: bool,
    pub changes: Vec<ChangeKind>,
}

impl MemberDiff {
    /// Human-readable member descriptor used in acceptance keys.
    ///
    /// Class entries use the type name. Other members prefer the released
    /// signature so removed and changed members keep a stable identity.
    pub fn descriptor(&self) -> &str {
        if self.kind == MemberKind::Class {
            return &self.type_name;
        }
        self.old_signature
            .as_deref()
            .or(self.new_signature.as_deref())
            .unwrap_or(&self.type_name)
    }
}

/// A nested member entry inside a [`ClassDiff`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NestedDiff {
    #[serde(default)]
    pub old_signature: Option<String>,
    #[serde(default)]
    pub new_signature: Option<String>,
    pub binary_compatible: bool,
    #[serde(default)]
    pub changes: Vec<ChangeKind>,
}

/// Comparison result for one type and the members beneath it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClassDiff {
    pub name: String,
    pub binary_compatible: bool,
    /// Changes to the type itself, excluding nested members.
    #[serde(default)]
    pub changes: Vec<ChangeKind>,
    #[serde(default)]
    pub superclass: Option<NestedDiff>,
    #[serde(default)]
    pub interfaces: Vec<NestedDiff>,
    #[serde(default)]
    pub constructors: Vec<NestedDiff>,
    #[serde(default)]
    pub methods: Vec<NestedDiff>,
    #[serde(default)]
    pub fields: Vec<NestedDiff>,
}

impl ClassDiff {
    /// The class entry followed by its nested members, in evaluation order:
    /// superclass, interfaces, constructors, methods, fields.
    pub fn members(&self) -> Vec<MemberDiff> {
        let mut out = vec![MemberDiff {
            kind: MemberKind::Class,
            type_name: self.name.clone(),
            old_signature: Some(self.name.clone()),
            new_signature: Some(self.name.clone()),
            binary_compatible: self.binary_compatible,
            changes: self.changes.clone(),
        }];

        let nested = self
            .superclass
            .iter()
            .map(|d| (MemberKind::Superclass, d))
            .chain(
                self.interfaces
                    .iter()
                    .map(|d| (MemberKind::ImplementedInterface, d)),
            )
            .chain(self.constructors.iter().map(|d| (MemberKind::Constructor, d)))
            .chain(self.methods.iter().map(|d| (MemberKind::Method, d)))
            .chain(self.fields.iter().map(|d| (MemberKind::Field, d)));

        for (kind, diff) in nested {
            out.push(MemberDiff {
                kind,
                type_name: self.name.clone(),
                old_signature: diff.old_signature.clone(),
                new_signature: diff.new_signature.clone(),
                binary_compatible: diff.binary_compatible,
                changes: diff.changes.clone(),
            });
        }
        out
    }
}

/// The full diff-engine document for one artifact pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ApiDiff {
    /// Version of the released (baseline) artifact.
    pub old_version: String,
    /// Version of the artifact under test.
    pub new_version: String,
    #[serde(default)]
    pub classes: Vec<ClassDiff>,
}

impl ApiDiff {
    /// Parse a diff document from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|source| ApiGuardError::Parse {
            origin: "diff input".to_string(),
            source,
        })
    }

    /// Load a diff document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ApiGuardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ApiGuardError::Parse {
            origin: path.display().to_string(),
            source,
        })
    }

    /// Every compared member, class by class.
    pub fn members(&self) -> Vec<MemberDiff> {
        self.classes.iter().flat_map(ClassDiff::members).collect()
    }
}
