//! Domain model: change kinds, diff-engine members, and errors.

pub mod change_kind;
pub mod error;
pub mod member;

pub use change_kind::ChangeKind;
pub use error::{AcceptanceError, ApiGuardError, Result};
pub use member::{ApiDiff, ClassDiff, MemberDiff, MemberKind, NestedDiff};
