//! Compatibility-change categories reported by the binary-diff engine.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! change_kinds {
    ($($(#[$doc:meta])* $variant:ident => $name:literal,)*) => {
        /// A named category of API difference, e.g. `METHOD_REMOVED`.
        ///
        /// Serialised as the engine's SCREAMING_SNAKE name. Names this crate
        /// does not know are kept verbatim in [`ChangeKind::Other`], so newer
        /// engine output still loads and still matches acceptance entries.
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum ChangeKind {
            $($(#[$doc])* $variant,)*
            /// A change kind not enumerated above.
            Other(String),
        }

        impl ChangeKind {
            /// The engine's name for this change kind.
            pub fn as_str(&self) -> &str {
                match self {
                    $(ChangeKind::$variant => $name,)*
                    ChangeKind::Other(name) => name.as_str(),
                }
            }
        }

        impl From<&str> for ChangeKind {
            fn from(name: &str) -> Self {
                match name {
                    $($name => ChangeKind::$variant,)*
                    other => ChangeKind::Other(other.to_string()),
                }
            }
        }
    };
}

change_kinds! {
    AnnotationDeprecatedAdded => "ANNOTATION_DEPRECATED_ADDED",
    ClassRemoved => "CLASS_REMOVED",
    ClassNowAbstract => "CLASS_NOW_ABSTRACT",
    ClassNowFinal => "CLASS_NOW_FINAL",
    ClassNoLongerPublic => "CLASS_NO_LONGER_PUBLIC",
    ClassTypeChanged => "CLASS_TYPE_CHANGED",
    ClassNowCheckedException => "CLASS_NOW_CHECKED_EXCEPTION",
    ClassLessAccessible => "CLASS_LESS_ACCESSIBLE",
    ClassGenericTemplateChanged => "CLASS_GENERIC_TEMPLATE_CHANGED",
    ClassGenericTemplateGenericsChanged => "CLASS_GENERIC_TEMPLATE_GENERICS_CHANGED",
    SuperclassRemoved => "SUPERCLASS_REMOVED",
    SuperclassAdded => "SUPERCLASS_ADDED",
    SuperclassModifiedIncompatible => "SUPERCLASS_MODIFIED_INCOMPATIBLE",
    InterfaceAdded => "INTERFACE_ADDED",
    InterfaceRemoved => "INTERFACE_REMOVED",
    MethodRemoved => "METHOD_REMOVED",
    MethodRemovedInSuperclass => "METHOD_REMOVED_IN_SUPERCLASS",
    MethodLessAccessible => "METHOD_LESS_ACCESSIBLE",
    MethodLessAccessibleThanInSuperclass => "METHOD_LESS_ACCESSIBLE_THAN_IN_SUPERCLASS",
    MethodIsStaticAndOverridesNotStatic => "METHOD_IS_STATIC_AND_OVERRIDES_NOT_STATIC",
    MethodReturnTypeChanged => "METHOD_RETURN_TYPE_CHANGED",
    MethodReturnTypeGenericsChanged => "METHOD_RETURN_TYPE_GENERICS_CHANGED",
    MethodParameterGenericsChanged => "METHOD_PARAMETER_GENERICS_CHANGED",
    MethodNowAbstract => "METHOD_NOW_ABSTRACT",
    MethodNowFinal => "METHOD_NOW_FINAL",
    MethodNowStatic => "METHOD_NOW_STATIC",
    MethodNoLongerStatic => "METHOD_NO_LONGER_STATIC",
    MethodNowVarargs => "METHOD_NOW_VARARGS",
    MethodNoLongerVarargs => "METHOD_NO_LONGER_VARARGS",
    MethodAddedToInterface => "METHOD_ADDED_TO_INTERFACE",
    MethodAddedToPublicClass => "METHOD_ADDED_TO_PUBLIC_CLASS",
    MethodNowThrowsCheckedException => "METHOD_NOW_THROWS_CHECKED_EXCEPTION",
    MethodNoLongerThrowsCheckedException => "METHOD_NO_LONGER_THROWS_CHECKED_EXCEPTION",
    MethodAbstractAddedToClass => "METHOD_ABSTRACT_ADDED_TO_CLASS",
    MethodAbstractAddedInSuperclass => "METHOD_ABSTRACT_ADDED_IN_SUPERCLASS",
    MethodAbstractAddedInImplementedInterface => "METHOD_ABSTRACT_ADDED_IN_IMPLEMENTED_INTERFACE",
    MethodDefaultAddedInImplementedInterface => "METHOD_DEFAULT_ADDED_IN_IMPLEMENTED_INTERFACE",
    MethodNewDefault => "METHOD_NEW_DEFAULT",
    MethodNewStaticAddedToInterface => "METHOD_NEW_STATIC_ADDED_TO_INTERFACE",
    MethodMovedToSuperclass => "METHOD_MOVED_TO_SUPERCLASS",
    MethodAbstractNowDefault => "METHOD_ABSTRACT_NOW_DEFAULT",
    MethodNonStaticInInterfaceNowStatic => "METHOD_NON_STATIC_IN_INTERFACE_NOW_STATIC",
    MethodStaticInInterfaceNoLongerStatic => "METHOD_STATIC_IN_INTERFACE_NO_LONGER_STATIC",
    FieldStaticAndOverridesStatic => "FIELD_STATIC_AND_OVERRIDES_STATIC",
    FieldLessAccessibleThanInSuperclass => "FIELD_LESS_ACCESSIBLE_THAN_IN_SUPERCLASS",
    FieldNowFinal => "FIELD_NOW_FINAL",
    FieldNowTransient => "FIELD_NOW_TRANSIENT",
    FieldNowVolatile => "FIELD_NOW_VOLATILE",
    FieldNowStatic => "FIELD_NOW_STATIC",
    FieldNoLongerTransient => "FIELD_NO_LONGER_TRANSIENT",
    FieldNoLongerVolatile => "FIELD_NO_LONGER_VOLATILE",
    FieldNoLongerStatic => "FIELD_NO_LONGER_STATIC",
    FieldTypeChanged => "FIELD_TYPE_CHANGED",
    FieldRemoved => "FIELD_REMOVED",
    FieldRemovedInSuperclass => "FIELD_REMOVED_IN_SUPERCLASS",
    FieldLessAccessible => "FIELD_LESS_ACCESSIBLE",
    FieldGenericsChanged => "FIELD_GENERICS_CHANGED",
    ConstructorRemoved => "CONSTRUCTOR_REMOVED",
    ConstructorLessAccessible => "CONSTRUCTOR_LESS_ACCESSIBLE",
}

impl From<String> for ChangeKind {
    fn from(name: String) -> Self {
        ChangeKind::from(name.as_str())
    }
}

impl From<ChangeKind> for String {
    fn from(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
