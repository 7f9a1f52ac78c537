//! In-memory store with undo-log transactions and a working-set cache.

use crate::change::Change;
use crate::{Filter, IdGenerator, SequentialIdGenerator, StorageError, StorageResult, Store, Transaction};
use edm_model::{Definition, Element, ModelError};
use edm_types::{ElementId, ElementKey, StoreId};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace, warn};

/// A [`Store`] that keeps every element in memory.
///
/// Elements written (inserted, updated or attached to) enter the working-set
/// cache and stay there until [`Store::evict`] releases them. The largest
/// size the cache ever reached is reported by
/// [`high_water_mark`](MemStore::high_water_mark).
#[derive(Debug)]
pub struct MemStore {
    id: StoreId,
    open: bool,
    records: BTreeMap<ElementId, Element>,
    cache: HashSet<ElementId>,
    high_water: usize,
    active: bool,
    undo: Vec<Change>,
    ids: Box<dyn IdGenerator>,
}

impl MemStore {
    /// Creates an empty store that assigns sequential ids.
    pub fn new() -> Self {
        Self::with_id_generator(Box::new(SequentialIdGenerator::new()))
    }

    pub fn with_id_generator(ids: Box<dyn IdGenerator>) -> Self {
        let id = StoreId::new();
        debug!("Opened memory store {}", id);
        Self {
            id,
            open: true,
            records: BTreeMap::new(),
            cache: HashSet::new(),
            high_water: 0,
            active: false,
            undo: Vec::new(),
            ids,
        }
    }

    /// Number of stored elements.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Largest cache size observed since the store was opened.
    pub fn high_water_mark(&self) -> usize {
        self.high_water
    }

    /// Stored elements in id order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.records.values()
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.open { Ok(()) } else { Err(StorageError::Closed) }
    }

    fn ensure_writable(&self) -> StorageResult<()> {
        self.ensure_open()?;
        if self.active { Ok(()) } else { Err(StorageError::NoTransaction) }
    }

    fn local_id(&self, key: ElementKey) -> StorageResult<ElementId> {
        if key.is_in(self.id) {
            Ok(key.id)
        } else {
            Err(StorageError::ForeignElement(key.to_string()))
        }
    }

    fn check_element(&self, element: &Element) -> StorageResult<ElementId> {
        if element.store() != self.id {
            return Err(StorageError::ForeignElement(element.to_string()));
        }
        for property in element.definition().relationships() {
            for target in property.targets(element) {
                if Some(target) != element.key() && !self.contains(target) {
                    return Err(StorageError::MissingReference {
                        property: property.name(),
                        target,
                    });
                }
            }
        }
        element.id().ok_or_else(|| StorageError::ForeignElement(element.to_string()))
    }

    fn touch(&mut self, id: ElementId) {
        self.cache.insert(id);
        self.high_water = self.high_water.max(self.cache.len());
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction for MemStore {
    fn begin(&mut self) -> StorageResult<()> {
        self.ensure_open()?;
        if self.active {
            return Err(StorageError::TransactionActive);
        }
        trace!("Begin transaction on {}", self.id);
        self.active = true;
        Ok(())
    }

    fn commit(&mut self) -> StorageResult<()> {
        self.ensure_writable()?;
        trace!("Commit {} changes on {}", self.undo.len(), self.id);
        self.undo.clear();
        self.active = false;
        Ok(())
    }

    fn rollback(&mut self) -> StorageResult<()> {
        self.ensure_writable()?;
        warn!("Rolling back {} changes on {}", self.undo.len(), self.id);
        while let Some(change) = self.undo.pop() {
            match change {
                Change::Inserted(key) => {
                    self.records.remove(&key.id);
                    self.cache.remove(&key.id);
                }
                Change::Updated { old, cached } | Change::Removed { old, cached } => {
                    let Some(id) = old.id() else {
                        continue;
                    };
                    self.records.insert(id, old);
                    if cached {
                        self.cache.insert(id);
                    } else {
                        self.cache.remove(&id);
                    }
                }
            }
        }
        self.active = false;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Store for MemStore {
    fn id(&self) -> StoreId {
        self.id
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        if self.active {
            // rollback only fails on a closed or idle store
            let _ = self.rollback();
        }
        debug!("Closed memory store {}", self.id);
        self.cache.clear();
        self.open = false;
    }

    fn contains(&self, key: ElementKey) -> bool {
        self.open && key.is_in(self.id) && self.records.contains_key(&key.id)
    }

    fn get(&self, key: ElementKey) -> StorageResult<Option<Element>> {
        self.ensure_open()?;
        if !key.is_in(self.id) {
            return Ok(None);
        }
        Ok(self.records.get(&key.id).cloned())
    }

    fn find(&self, definition: &'static Definition, filter: &Filter) -> StorageResult<Vec<Element>> {
        self.ensure_open()?;
        for (name, _) in filter {
            definition.require_property(name)?;
        }
        Ok(self
            .records
            .values()
            .filter(|e| e.definition().is(definition))
            .filter(|e| filter.iter().all(|(name, value)| e.get(name) == Some(value)))
            .cloned()
            .collect())
    }

    fn generate_id(&mut self, proposed: Option<ElementId>) -> StorageResult<ElementId> {
        self.ensure_open()?;
        let mut id = self.ids.next_id(proposed);
        while self.records.contains_key(&id) {
            id = self.ids.next_id(None);
        }
        Ok(id)
    }

    fn insert(&mut self, element: Element) -> StorageResult<Element> {
        self.ensure_writable()?;
        let id = self.check_element(&element)?;
        let key = ElementKey::new(self.id, id);
        if self.records.contains_key(&id) {
            return Err(StorageError::DuplicateId(key));
        }
        if let Some(&property) = element.missing_required().first() {
            return Err(ModelError::Empty {
                element: element.type_name(),
                property,
            }
            .into());
        }

        trace!("Insert {}", element);
        self.records.insert(id, element.clone());
        self.undo.push(Change::Inserted(key));
        self.touch(id);
        Ok(element)
    }

    fn update(&mut self, element: Element) -> StorageResult<Element> {
        self.ensure_writable()?;
        let id = self.check_element(&element)?;
        let key = ElementKey::new(self.id, id);
        if !self.records.contains_key(&id) {
            return Err(StorageError::NotFound(key));
        }
        trace!("Update {}", element);
        let cached = self.cache.contains(&id);
        if let Some(old) = self.records.insert(id, element.clone()) {
            self.undo.push(Change::Updated { old, cached });
        }
        self.touch(id);
        Ok(element)
    }

    fn attach(&mut self, owner: ElementKey, property: &str, target: ElementKey) -> StorageResult<()> {
        self.ensure_writable()?;
        let id = self.local_id(owner)?;
        let current = self.records.get(&id).ok_or(StorageError::NotFound(owner))?;
        let descriptor = current.definition().require_property(property)?;
        if !descriptor.is_relationship() {
            return Err(StorageError::NotARelationship {
                element: current.type_name(),
                property: property.to_string(),
            });
        }
        if !self.contains(target) {
            return Err(StorageError::MissingReference {
                property: descriptor.name(),
                target,
            });
        }
        if descriptor.targets(current).contains(&target) {
            return Ok(());
        }

        let mut updated = current.clone();
        if descriptor.is_multi_valued() {
            updated.add_reference(property, target)?;
        } else {
            updated.set(property, target)?;
        }
        debug!("Attach {} to {}.{}", target, updated, property);
        let cached = self.cache.contains(&id);
        if let Some(old) = self.records.insert(id, updated) {
            self.undo.push(Change::Updated { old, cached });
        }
        self.touch(id);
        Ok(())
    }

    fn remove(&mut self, key: ElementKey) -> StorageResult<Element> {
        self.ensure_writable()?;
        let id = self.local_id(key)?;
        let old = self.records.remove(&id).ok_or(StorageError::NotFound(key))?;
        trace!("Remove {}", old);
        let cached = self.cache.remove(&id);
        self.undo.push(Change::Removed {
            old: old.clone(),
            cached,
        });
        Ok(old)
    }

    fn evict(&mut self, key: ElementKey) {
        if key.is_in(self.id) && self.cache.remove(&key.id) {
            trace!("Evict {}", key);
        }
    }

    fn cache_size(&self) -> usize {
        self.cache.len()
    }
}
