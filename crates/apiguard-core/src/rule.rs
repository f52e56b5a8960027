//! Per-member binary-compatibility rule.
//!
//! Decides whether one [`MemberDiff`] is a reportable incompatibility and,
//! if so, whether an acceptance entry covers it. Run-scoped state (registry
//! and seen set) is passed in through [`RuleContext`] on every call.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::accepted::{AcceptedChange, AcceptedChangeRegistry, SeenChanges};
use crate::domain::{ChangeKind, MemberDiff, MemberKind, Result};
use crate::report::Violation;

/// Change kinds never reported on their own.
pub const DEFAULT_IGNORED_CHANGES: [ChangeKind; 5] = [
    // The removed method itself is reported.
    ChangeKind::MethodRemovedInSuperclass,
    // Interface edges: the affected methods are reported.
    ChangeKind::InterfaceRemoved,
    ChangeKind::InterfaceAdded,
    // Looks like a bug in the diff engine rather than a real break.
    ChangeKind::FieldStaticAndOverridesStatic,
    // Deprecation detection in the engine is unreliable.
    ChangeKind::AnnotationDeprecatedAdded,
];

/// Why a binary-incompatible member produced no violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suppression {
    /// Class entry with no own changes; its members are reported instead.
    ClassWithoutOwnChanges,
    /// Implements-edge; the interface methods are reported instead.
    ImplementedInterface,
    /// Every change kind was on the ignore list.
    OnlyIgnoredChanges,
}

/// Result of evaluating one member.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Compatible,
    Suppressed(Suppression),
    Reported(Violation),
}

/// Run-scoped state borrowed by the rule for one evaluation.
pub struct RuleContext<'a> {
    pub registry: &'a AcceptedChangeRegistry,
    pub seen: &'a mut SeenChanges,
    /// Where unresolved changes should be accepted; quoted in messages.
    pub accepted_path: &'a Path,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryCompatRule {
    ignored: BTreeSet<ChangeKind>,
}

impl Default for BinaryCompatRule {
    fn default() -> Self {
        Self {
            ignored: DEFAULT_IGNORED_CHANGES.into_iter().collect(),
        }
    }
}

impl BinaryCompatRule {
    /// The default ignore list extended with `extra`.
    pub fn with_extra_ignored(extra: impl IntoIterator<Item = ChangeKind>) -> Self {
        let mut rule = Self::default();
        rule.ignored.extend(extra);
        rule
    }

    pub fn ignores(&self, kind: &ChangeKind) -> bool {
        self.ignored.contains(kind)
    }

    pub fn evaluate(
        &self,
        member: &MemberDiff,
        ctx: &mut RuleContext<'_>,
    ) -> Result<Evaluation> {
        if member.binary_compatible {
            return Ok(Evaluation::Compatible);
        }
        if member.kind == MemberKind::Class && member.changes.is_empty() {
            return Ok(Evaluation::Suppressed(Suppression::ClassWithoutOwnChanges));
        }
        if member.kind == MemberKind::ImplementedInterface {
            return Ok(Evaluation::Suppressed(Suppression::ImplementedInterface));
        }

        let remaining: Vec<ChangeKind> = member
            .changes
            .iter()
            .filter(|kind| !self.ignores(kind))
            .cloned()
            .collect();
        if remaining.is_empty() {
            return Ok(Evaluation::Suppressed(Suppression::OnlyIgnoredChanges));
        }

        let key = AcceptedChange::new(member.type_name.clone(), member.descriptor(), remaining);
        let violation = match ctx.registry.justification(&key) {
            Some(justification) => {
                let violation = Violation::accepted(member.kind, &key, justification);
                ctx.seen.mark(key);
                violation
            }
            None => Violation::unresolved(member.kind, &key, ctx.accepted_path)?,
        };
        Ok(Evaluation::Reported(violation))
    }
}
