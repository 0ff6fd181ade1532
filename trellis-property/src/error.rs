use thiserror::Error;

/// Errors returned by property declaration and writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    /// A value (or a re-declaration) does not match the declared value type.
    #[error("property `{property}` expects a value of type {expected}, got {found}")]
    TypeMismatch {
        /// Property name.
        property: String,
        /// Declared value type.
        expected: &'static str,
        /// Type that was supplied.
        found: &'static str,
    },
    /// The property's validator rejected the value.
    #[error("value rejected by the validator of property `{property}`")]
    ValidationFailed {
        /// Property name.
        property: String,
    },
}
