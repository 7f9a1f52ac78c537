//! Error types for the storage layer.

use edm_model::{ErrorKind, ModelError};
use edm_types::ElementKey;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    /// The store has been closed.
    #[error("store is closed")]
    Closed,

    /// A write was attempted outside a transaction.
    #[error("no active transaction")]
    NoTransaction,

    /// `begin` was called while a transaction was already running.
    #[error("a transaction is already active")]
    TransactionActive,

    /// Element not found.
    #[error("element not found: {0}")]
    NotFound(ElementKey),

    /// The element's id is already used in this store.
    #[error("duplicate element id: {0}")]
    DuplicateId(ElementKey),

    /// A relationship names an element the store does not hold.
    #[error("`{property}` references {target}, which is not present in the store")]
    MissingReference {
        property: &'static str,
        target: ElementKey,
    },

    /// The element belongs to a different store.
    #[error("{0} belongs to another store")]
    ForeignElement(String),

    #[error("`{element}.{property}` is not a relationship")]
    NotARelationship {
        element: &'static str,
        property: String,
    },

    #[error("`{element}` declares no selector `{selector}`")]
    UnknownSelector {
        element: &'static str,
        selector: String,
    },

    /// A query was run before all selector values were set.
    #[error("query on `{element}` by `{selector}` is missing `{property}`")]
    IncompleteQuery {
        element: &'static str,
        selector: &'static str,
        property: &'static str,
    },

    /// A unique-key query matched more than one element.
    #[error("query on `{element}` by `{selector}` matched {count} elements")]
    NonUnique {
        element: &'static str,
        selector: &'static str,
        count: usize,
    },

    /// A presumed duplicate disagrees with the candidate.
    #[error("{found} matches {candidate} but differs on `{property}`")]
    Inconsistent {
        candidate: String,
        found: ElementKey,
        property: &'static str,
    },

    /// Two different elements of one store would share a translation class.
    #[error("translation class of {existing} already holds a member of its store; can not add {incoming}")]
    StoreCollision {
        existing: ElementKey,
        incoming: ElementKey,
    },

    /// `put` was given two distinct elements of the same store.
    #[error("can not translate {0} to {1}: same store")]
    SameStore(ElementKey, ElementKey),

    /// Model validation error.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::Closed
            | StorageError::NoTransaction
            | StorageError::TransactionActive
            | StorageError::DuplicateId(_)
            | StorageError::StoreCollision { .. }
            | StorageError::SameStore(..) => ErrorKind::State,
            StorageError::NotFound(_)
            | StorageError::MissingReference { .. }
            | StorageError::ForeignElement(_)
            | StorageError::NotARelationship { .. }
            | StorageError::UnknownSelector { .. }
            | StorageError::IncompleteQuery { .. } => ErrorKind::Validation,
            StorageError::NonUnique { .. } | StorageError::Inconsistent { .. } => ErrorKind::Inconsistent,
            StorageError::Model(e) => e.kind(),
        }
    }
}
