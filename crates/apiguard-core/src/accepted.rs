//! Accepted-change store.
//!
//! Maintainers record reviewed API breaks in a JSON acceptance file whose
//! top-level keys are justifications:
//!
//! ```json
//! {
//!   "Removed deprecated API for 8.0": [
//!     { "type": "com.sk89q.worldedit.Foo", "member": "void bar()", "changes": ["METHOD_REMOVED"] }
//!   ]
//! }
//! ```
//!
//! [`AcceptedChangeRegistry`] is the validated, read-only view used during a
//! run; [`AcceptanceFile`] is the editable document used to add entries.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::change_kind::ChangeKind;
use crate::domain::error::{AcceptanceError, ApiGuardError, Result};

/// Identity of one reviewed API break: containing type, member descriptor,
/// and the full set of change kinds. Matching is all-or-nothing on the set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AcceptedChange {
    #[serde(rename = "type")]
    pub type_name: String,
    pub member: String,
    pub changes: BTreeSet<ChangeKind>,
}

impl AcceptedChange {
    pub fn new(
        type_name: impl Into<String>,
        member: impl Into<String>,
        changes: impl IntoIterator<Item = ChangeKind>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            member: member.into(),
            changes: changes.into_iter().collect(),
        }
    }

    /// Change kind names joined with `", "`.
    pub fn change_names(&self) -> String {
        self.changes
            .iter()
            .map(ChangeKind::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for AcceptedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} [{}]",
            self.type_name,
            self.member,
            self.change_names()
        )
    }
}

/// One `{type, member, changes}` object in the acceptance file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AcceptanceEntry {
    #[serde(rename = "type")]
    pub type_name: String,
    pub member: String,
    pub changes: Vec<ChangeKind>,
}

impl AcceptanceEntry {
    pub fn key(&self) -> AcceptedChange {
        AcceptedChange::new(
            self.type_name.clone(),
            self.member.clone(),
            self.changes.iter().cloned(),
        )
    }
}

impl From<AcceptedChange> for AcceptanceEntry {
    fn from(change: AcceptedChange) -> Self {
        Self {
            type_name: change.type_name,
            member: change.member,
            changes: change.changes.into_iter().collect(),
        }
    }
}

/// The editable acceptance document, justification → entries.
///
/// Keys are kept in sorted order, so saving is deterministic. A
/// justification that appears twice at the top level is a parse error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AcceptanceFile {
    pub justifications: BTreeMap<String, Vec<AcceptanceEntry>>,
}

impl<'de> Deserialize<'de> for AcceptanceFile {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(JustificationsVisitor)
    }
}

struct JustificationsVisitor;

impl<'de> Visitor<'de> for JustificationsVisitor {
    type Value = AcceptanceFile;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map from justification to acceptance entries")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut justifications = BTreeMap::new();
        while let Some(justification) = map.next_key::<String>()? {
            if justifications.contains_key(&justification) {
                return Err(de::Error::custom(format_args!(
                    "duplicate justification \"{}\"",
                    justification
                )));
            }
            let entries: Vec<AcceptanceEntry> = map.next_value()?;
            justifications.insert(justification, entries);
        }
        Ok(AcceptanceFile { justifications })
    }
}

impl AcceptanceFile {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        parse(raw, "acceptance file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ApiGuardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&raw, &path.display().to_string())
    }

    /// Load the file, or start an empty document if it does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the document as pretty JSON with a trailing newline.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut raw = serde_json::to_string_pretty(self)?;
        raw.push('\n');
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ApiGuardError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, raw).map_err(|source| ApiGuardError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Total number of entries across all justifications.
    pub fn entry_count(&self) -> usize {
        self.justifications.values().map(Vec::len).sum()
    }

    /// Append `unresolved` changes under `justification`, skipping any that
    /// are already accepted anywhere in the file. Returns how many were added.
    pub fn merge_unresolved(
        &mut self,
        justification: &str,
        unresolved: impl IntoIterator<Item = AcceptedChange>,
    ) -> usize {
        let mut known: BTreeSet<AcceptedChange> = self
            .justifications
            .values()
            .flatten()
            .map(AcceptanceEntry::key)
            .collect();

        let mut added = Vec::new();
        for change in unresolved {
            if known.insert(change.clone()) {
                added.push(AcceptanceEntry::from(change));
            }
        }

        let count = added.len();
        if count > 0 {
            self.justifications
                .entry(justification.to_string())
                .or_default()
                .extend(added);
        }
        count
    }

    /// Validate the document and build the lookup registry.
    pub fn to_registry(&self) -> Result<AcceptedChangeRegistry> {
        let mut entries: BTreeMap<AcceptedChange, String> = BTreeMap::new();
        for (justification, list) in &self.justifications {
            for entry in list {
                if entry.changes.is_empty() {
                    return Err(AcceptanceError::EmptyChanges {
                        justification: justification.clone(),
                        type_name: entry.type_name.clone(),
                        member: entry.member.clone(),
                    }
                    .into());
                }
                let key = entry.key();
                if let Some(first) = entries.get(&key) {
                    return Err(AcceptanceError::Duplicate {
                        type_name: key.type_name.clone(),
                        member: key.member.clone(),
                        changes: key.change_names(),
                        first: first.clone(),
                        second: justification.clone(),
                    }
                    .into());
                }
                entries.insert(key, justification.clone());
            }
        }
        Ok(AcceptedChangeRegistry { entries })
    }
}

fn parse(raw: &str, origin: &str) -> Result<AcceptanceFile> {
    serde_json::from_str(raw).map_err(|source| ApiGuardError::Parse {
        origin: origin.to_string(),
        source,
    })
}

/// Read-only map from accepted change to its justification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcceptedChangeRegistry {
    entries: BTreeMap<AcceptedChange, String>,
}

impl AcceptedChangeRegistry {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        AcceptanceFile::from_json_str(raw)?.to_registry()
    }

    pub fn load(path: &Path) -> Result<Self> {
        AcceptanceFile::load(path)?.to_registry()
    }

    /// Like [`load`](Self::load), but a missing file yields an empty registry.
    pub fn load_or_empty(path: &Path) -> Result<Self> {
        AcceptanceFile::load_or_default(path)?.to_registry()
    }

    /// Justification recorded for `change`, if it was accepted.
    pub fn justification(&self, change: &AcceptedChange) -> Option<&str> {
        self.entries.get(change).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AcceptedChange, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Registry entries matched by a real incompatibility during the current run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeenChanges {
    seen: BTreeSet<AcceptedChange>,
}

impl SeenChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a match. Returns `false` if it was already recorded.
    pub fn mark(&mut self, change: AcceptedChange) -> bool {
        self.seen.insert(change)
    }

    pub fn contains(&self, change: &AcceptedChange) -> bool {
        self.seen.contains(change)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
