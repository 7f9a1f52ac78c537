use crate::StorageResult;
use edm_model::{Definition, Element, Value};
use edm_types::{ElementId, ElementKey, StoreId};
use std::fmt;

/// Property/value pairs an element has to match exactly.
pub type Filter = [(&'static str, Value)];

/// Unit-of-work control for a store.
///
/// At most one transaction is active at a time. Writes made inside it
/// become durable on [`commit`](Transaction::commit) and are undone on
/// [`rollback`](Transaction::rollback).
pub trait Transaction {
    fn begin(&mut self) -> StorageResult<()>;
    fn commit(&mut self) -> StorageResult<()>;
    fn rollback(&mut self) -> StorageResult<()>;
    fn is_active(&self) -> bool;
}

/// A back-end holding elements.
///
/// Every operation except [`id`](Store::id), [`is_open`](Store::is_open)
/// and [`contains`](Store::contains) fails with `StorageError::Closed` once
/// the store is closed.
pub trait Store: Transaction {
    fn id(&self) -> StoreId;

    fn is_open(&self) -> bool;

    /// Closes the store, rolling back an active transaction.
    fn close(&mut self);

    /// True if the store holds `key`. Always false for foreign keys and
    /// closed stores.
    fn contains(&self, key: ElementKey) -> bool;

    fn get(&self, key: ElementKey) -> StorageResult<Option<Element>>;

    /// Elements of `definition` matching every pair in `filter`.
    fn find(&self, definition: &'static Definition, filter: &Filter) -> StorageResult<Vec<Element>>;

    /// Produces an unused identifier. `proposed` is honoured when the
    /// configured generator passes ids through and the id is free.
    fn generate_id(&mut self, proposed: Option<ElementId>) -> StorageResult<ElementId>;

    /// Inserts an element whose id was assigned by
    /// [`generate_id`](Store::generate_id). Every relationship target must
    /// already be present.
    fn insert(&mut self, element: Element) -> StorageResult<Element>;

    /// Replaces the stored values of an existing element.
    fn update(&mut self, element: Element) -> StorageResult<Element>;

    /// Adds `target` to a relationship of `owner`. Attaching a target that
    /// is already present is a no-op.
    fn attach(&mut self, owner: ElementKey, property: &str, target: ElementKey) -> StorageResult<()>;

    fn remove(&mut self, key: ElementKey) -> StorageResult<Element>;

    /// Releases `key` from the working-set cache. The element stays stored.
    fn evict(&mut self, key: ElementKey);

    /// Number of elements currently held in the working-set cache.
    fn cache_size(&self) -> usize;
}

impl fmt::Debug for dyn Store + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.id())
            .field("open", &self.is_open())
            .field("active", &self.is_active())
            .finish()
    }
}
