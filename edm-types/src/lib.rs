//! Core identifier types for the EDM synchronization core.
//!
//! This crate defines the store-agnostic identities used throughout the
//! workspace:
//! - [`ElementId`]: an opaque key, unique within its owning store
//! - [`StoreId`]: identifies one store instance (UUID v7)
//! - [`ElementKey`]: the pair of the two, unique across the process
//!
//! Everything that knows what an element *contains* lives in `edm-model`.

mod ids;

pub use ids::{ElementId, ElementKey, StoreId};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when parsing identifiers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid element id: {0}")]
    InvalidElementId(#[from] std::num::ParseIntError),

    #[error("invalid element key `{0}`: expected <store>/<id>")]
    InvalidElementKey(String),
}
