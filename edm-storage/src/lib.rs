//! Storage layer for EDM.
//!
//! Provides the contracts a back-end has to honour ([`Store`],
//! [`Transaction`]), an in-memory implementation ([`MemStore`]), and the
//! pieces that relate elements across stores:
//!
//! - [`TranslationTable`] records which elements of different stores are
//!   the same logical entity
//! - [`Retriever`]s find the counterpart of an element in a store, through
//!   the table or by querying a unique key
//! - [`Query`] looks elements up by a declared selector
//!
//! # Architecture
//!
//! - Stores hold elements keyed by [`ElementKey`](edm_types::ElementKey)
//! - Writes require an active transaction and are undone on rollback
//! - Each store keeps a working-set cache; [`Store::evict`] releases entries
//! - Identifiers come from a pluggable [`IdGenerator`]

mod change;
mod error;
mod id_generator;
mod mem_store;
mod query;
mod retriever;
mod store;
mod translation;

pub use error::{StorageError, StorageResult};
pub use id_generator::{IdGenerator, PassThruIdGenerator, RandomIdGenerator, SequentialIdGenerator};
pub use mem_store::MemStore;
pub use query::Query;
pub use retriever::{QueryRetriever, Retriever, TableRetriever, retriever_for};
pub use store::{Filter, Store, Transaction};
pub use translation::TranslationTable;
