//! Building and copying elements for EDM.
//!
//! # Components
//!
//! - **Builder**: [`ElementBuilder`] collects values for one element and
//!   produces it in a store, adopting an equivalent element when one exists
//! - **Entity**: [`Entity`] is what the copy machinery needs from a record
//! - **Insert**: [`InsertProcessor`] copies elements into another store,
//!   building their dependencies first and linking optional associations
//!   once both ends exist
//! - **Synchronizer**: [`Synchronizer`] copies a closed set of elements in
//!   batches, evicting what is no longer needed so memory stays bounded
//!
//! # Copy Process
//!
//! 1. **Collect**: gather everything reachable from the given elements
//! 2. **Order**: sort by definition rank so dependencies come first
//! 3. **Build**: load each element into a builder bound to the destination
//! 4. **Record**: register source and destination in the translation table
//! 5. **Evict**: after each committed batch, release finished elements

mod builder;
mod entity;
mod error;
mod insert;
mod links;
mod synchronizer;

pub use builder::{DeferredLink, ElementBuilder, Outcome};
pub use entity::Entity;
pub use error::{SyncError, SyncResult};
pub use insert::InsertProcessor;
pub use links::PendingLinks;
pub use synchronizer::{EVICT_FACTOR, EVICT_MIN, SyncConfig, SyncReport, Synchronizer};
