//! Error types for the sync layer.

use edm_model::{ErrorKind, ModelError};
use edm_storage::StorageError;
use edm_types::ElementKey;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while building or copying elements.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// Storage error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Model validation error.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A required property has no value.
    #[error("required property `{element}.{property}` is not set")]
    MissingRequired {
        element: &'static str,
        property: &'static str,
    },

    /// A relationship target has no counterpart in the builder's store.
    #[error("`{property}` target {target} is not present in the store")]
    MissingTarget {
        property: &'static str,
        target: ElementKey,
    },

    /// A source element lacks a required relationship while being copied.
    #[error("{element} has no value for required relationship `{property}`")]
    UnsetDependency {
        element: String,
        property: &'static str,
    },

    /// A required relationship declared multi-valued.
    #[error("required relationship `{element}.{property}` is multi-valued")]
    RequiredMultiValued {
        element: &'static str,
        property: &'static str,
    },

    /// Required or mutable relationships form a cycle.
    #[error("dependency cycle through {0}")]
    DependencyCycle(ElementKey),

    /// A draft was given where a stored element is needed.
    #[error("{0} has no identity")]
    Unidentified(String),

    /// The source store does not hold a referenced element.
    #[error("source element {0} not found")]
    SourceMissing(ElementKey),

    /// The builder was loaded with an element of another definition.
    #[error("expected a `{expected}`, got a `{found}`")]
    WrongDefinition {
        expected: &'static str,
        found: &'static str,
    },
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Storage(e) => e.kind(),
            SyncError::Model(e) => e.kind(),
            SyncError::MissingRequired { .. } | SyncError::MissingTarget { .. } => ErrorKind::Validation,
            SyncError::UnsetDependency { .. }
            | SyncError::RequiredMultiValued { .. }
            | SyncError::DependencyCycle(_)
            | SyncError::Unidentified(_)
            | SyncError::SourceMissing(_)
            | SyncError::WrongDefinition { .. } => ErrorKind::State,
        }
    }
}
