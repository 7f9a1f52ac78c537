//! Cross-store identity of elements.
//!
//! The table partitions element keys into equivalence classes. Each class
//! holds at most one member per store; two keys in the same class are the
//! same logical entity, living in different stores.

use crate::{StorageError, StorageResult};
use edm_types::{ElementKey, StoreId};
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};
use tracing::{debug, error, trace};

type ClassId = u64;

static GLOBAL: LazyLock<Mutex<TranslationTable>> = LazyLock::new(|| Mutex::new(TranslationTable::new()));

/// Equivalence classes of elements across stores.
///
/// A class is only kept while it relates at least two elements.
#[derive(Debug, Default)]
pub struct TranslationTable {
    members: HashMap<ElementKey, ClassId>,
    classes: HashMap<ClassId, HashMap<StoreId, ElementKey>>,
    next_class: ClassId,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide table.
    pub fn global() -> &'static Mutex<TranslationTable> {
        &GLOBAL
    }

    /// True if `key` has a counterpart in `store`.
    pub fn contains(&self, key: ElementKey, store: StoreId) -> bool {
        self.get(key, store).is_some()
    }

    /// The member of `key`'s class that belongs to `store`.
    ///
    /// A key is its own counterpart in the store that owns it.
    pub fn get(&self, key: ElementKey, store: StoreId) -> Option<ElementKey> {
        if key.is_in(store) {
            return Some(key);
        }
        let class = self.members.get(&key)?;
        self.classes.get(class)?.get(&store).copied()
    }

    /// Every member of `key`'s class, including `key`. Empty when `key` is
    /// not in the table.
    pub fn members(&self, key: ElementKey) -> Vec<ElementKey> {
        let mut out: Vec<_> = self
            .members
            .get(&key)
            .and_then(|class| self.classes.get(class))
            .map(|c| c.values().copied().collect())
            .unwrap_or_default();
        out.sort();
        out
    }

    /// Records that `a` and `b` are the same entity.
    ///
    /// Classes already holding either side are merged. Fails when the
    /// result would hold two different members of one store.
    pub fn put(&mut self, a: ElementKey, b: ElementKey) -> StorageResult<()> {
        trace!("Translate {} <-> {}", a, b);
        if a == b {
            return Ok(());
        }
        if a.store == b.store {
            error!("Refusing to translate {} to {}: same store", a, b);
            return Err(StorageError::SameStore(a, b));
        }

        match (self.members.get(&a).copied(), self.members.get(&b).copied()) {
            (None, None) => {
                let class = self.next_class;
                self.next_class += 1;
                self.classes
                    .insert(class, HashMap::from([(a.store, a), (b.store, b)]));
                self.members.insert(a, class);
                self.members.insert(b, class);
                Ok(())
            }
            (Some(class), None) => self.join(class, b),
            (None, Some(class)) => self.join(class, a),
            (Some(ca), Some(cb)) if ca == cb => Ok(()),
            (Some(ca), Some(cb)) => self.merge(ca, cb),
        }
    }

    fn join(&mut self, class: ClassId, key: ElementKey) -> StorageResult<()> {
        let members = self.classes.entry(class).or_default();
        if let Some(existing) = members.get(&key.store) {
            error!("Store collision: {} already translated, can not add {}", existing, key);
            return Err(StorageError::StoreCollision {
                existing: *existing,
                incoming: key,
            });
        }
        members.insert(key.store, key);
        self.members.insert(key, class);
        Ok(())
    }

    fn merge(&mut self, into: ClassId, from: ClassId) -> StorageResult<()> {
        let (Some(target), Some(source)) = (self.classes.get(&into), self.classes.get(&from)) else {
            return Ok(());
        };
        if let Some((store, incoming)) = source.iter().find(|(store, _)| target.contains_key(*store)) {
            let existing = target[store];
            error!("Store collision merging classes: {} vs {}", existing, incoming);
            return Err(StorageError::StoreCollision {
                existing,
                incoming: *incoming,
            });
        }

        let moved = self.classes.remove(&from).unwrap_or_default();
        debug!("Merging translation classes ({} members moved)", moved.len());
        for (_, key) in &moved {
            self.members.insert(*key, into);
        }
        self.classes.entry(into).or_default().extend(moved);
        Ok(())
    }

    /// Detaches `key` from its class. The class is dropped once it no
    /// longer relates two elements.
    pub fn remove(&mut self, key: ElementKey) {
        let Some(class) = self.members.remove(&key) else {
            return;
        };
        trace!("Remove translation of {}", key);
        if let Some(members) = self.classes.get_mut(&class) {
            members.remove(&key.store);
            if members.len() < 2 {
                self.drop_class(class);
            }
        }
    }

    /// Detaches every member that belongs to `store`.
    pub fn remove_all(&mut self, store: StoreId) {
        let keys: Vec<_> = self.members.keys().filter(|k| k.is_in(store)).copied().collect();
        debug!("Removing {} translations for store {}", keys.len(), store);
        for key in keys {
            self.remove(key);
        }
    }

    fn drop_class(&mut self, class: ClassId) {
        if let Some(members) = self.classes.remove(&class) {
            for key in members.values() {
                self.members.remove(key);
            }
        }
    }

    /// Number of equivalence classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Every key that has at least one counterpart.
    pub fn elements(&self) -> impl Iterator<Item = ElementKey> + '_ {
        self.members.keys().copied()
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.classes.clear();
    }
}
