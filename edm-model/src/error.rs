//! Error types for the element model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Coarse classification shared by every error in the workspace.
///
/// Callers use it to tell bad input apart from contract violations without
/// matching on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad data supplied by the caller: missing or empty required values,
    /// out-of-range scalars, references to elements the store does not hold.
    Validation,
    /// A programming-contract violation: closed store, missing transaction,
    /// conflicting translation-table entries.
    State,
    /// A presumed duplicate that disagrees with the candidate.
    Inconsistent,
}

/// Errors raised while declaring or populating elements.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("unknown property `{property}` on `{element}`")]
    UnknownProperty {
        element: &'static str,
        property: String,
    },

    #[error("`{element}.{property}` expects {expected}, got {found}")]
    TypeMismatch {
        element: &'static str,
        property: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("value {value} of `{element}.{property}` is outside {min}..={max}")]
    OutOfRange {
        element: &'static str,
        property: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("required property `{element}.{property}` is empty")]
    Empty {
        element: &'static str,
        property: &'static str,
    },

    #[error("`{element}.{property}` may only reference elements of its own store")]
    ForeignReference {
        element: &'static str,
        property: &'static str,
    },

    #[error("invalid flags on `{element}.{property}`: {reason}")]
    InvalidFlags {
        element: &'static str,
        property: &'static str,
        reason: &'static str,
    },

    #[error("duplicate property `{property}` on `{element}`")]
    DuplicateProperty {
        element: &'static str,
        property: &'static str,
    },

    #[error("selector `{selector}` of `{element}` is invalid: {reason}")]
    InvalidSelector {
        element: &'static str,
        selector: &'static str,
        reason: String,
    },

    #[error("`{element}` rejected: {reason}")]
    Rejected {
        element: &'static str,
        reason: String,
    },
}

impl ModelError {
    /// All model errors describe bad input or bad declarations.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}
