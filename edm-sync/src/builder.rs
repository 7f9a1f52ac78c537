//! The generic builder: turns a set of values into a stored element,
//! reusing an existing one where the store already holds it.

use crate::{SyncError, SyncResult};
use edm_model::{Definition, Element, Property, Value};
use edm_storage::{Retriever, StorageError, Store, TableRetriever, Transaction, TranslationTable, retriever_for};
use edm_types::ElementKey;
use tracing::{debug, trace};

/// An optional association skipped by [`ElementBuilder::load`] because its
/// target had no counterpart in the builder's store yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredLink {
    pub property: &'static str,
    /// Key of the target in the loaded element's store.
    pub target: ElementKey,
}

/// What [`ElementBuilder::build_with_outcome`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A new element was inserted.
    Inserted,
    /// The loaded element was changed in place.
    Updated,
    /// The loaded element already matched.
    Unchanged,
    /// An equivalent element already existed and was returned.
    Adopted,
}

/// Collects values for one element of a [`Definition`] and produces it in
/// the bound store.
///
/// Every setter validates eagerly; relationship targets must already be
/// present in the store.
pub struct ElementBuilder<'a> {
    definition: &'static Definition,
    store: &'a mut dyn Store,
    table: &'a mut TranslationTable,
    values: Element,
    loaded: Option<Element>,
    deferred: Vec<DeferredLink>,
}

impl<'a> ElementBuilder<'a> {
    pub fn new(
        definition: &'static Definition,
        store: &'a mut dyn Store,
        table: &'a mut TranslationTable,
    ) -> SyncResult<Self> {
        if !store.is_open() {
            return Err(StorageError::Closed.into());
        }
        let values = Element::new(definition, store.id());
        Ok(Self {
            definition,
            store,
            table,
            values,
            loaded: None,
            deferred: Vec::new(),
        })
    }

    pub fn definition(&self) -> &'static Definition {
        self.definition
    }

    /// Replaces the current values with those of `element`.
    ///
    /// Relationship targets are translated into this builder's store. A
    /// required or mutable target without a counterpart is an error; an
    /// optional one is recorded as a [`DeferredLink`].
    pub fn load(&mut self, element: &Element) -> SyncResult<&mut Self> {
        if !element.definition().is(self.definition) {
            return Err(SyncError::WrongDefinition {
                expected: self.definition.name(),
                found: element.type_name(),
            });
        }
        self.clear();
        trace!("Loading {} into builder for {}", element, self.store.id());

        for property in self.definition.properties() {
            let Some(value) = property.value(element) else {
                continue;
            };
            if !property.is_relationship() {
                self.values.set(property.name(), value.clone())?;
                continue;
            }

            let mut resolved = Vec::new();
            for target in value.targets() {
                match self.translate(*target) {
                    Some(local) => resolved.push(local),
                    None if property.is_dependency() => {
                        return Err(SyncError::MissingTarget {
                            property: property.name(),
                            target: *target,
                        });
                    }
                    None => self.deferred.push(DeferredLink {
                        property: property.name(),
                        target: *target,
                    }),
                }
            }
            if property.is_multi_valued() {
                if !resolved.is_empty() {
                    self.values.set(property.name(), resolved)?;
                }
            } else if let Some(local) = resolved.pop() {
                self.values.set(property.name(), local)?;
            }
        }

        self.loaded = Some(element.clone());
        Ok(self)
    }

    fn translate(&self, target: ElementKey) -> Option<ElementKey> {
        self.table
            .get(target, self.store.id())
            .filter(|local| self.store.contains(*local))
    }

    fn check_targets(&self, property: &Property, value: &Value) -> SyncResult<()> {
        if let Some(target) = value.targets().iter().find(|t| !self.store.contains(**t)) {
            return Err(SyncError::MissingTarget {
                property: property.name(),
                target: *target,
            });
        }
        Ok(())
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> SyncResult<&mut Self> {
        let property = self.definition.require_property(name)?;
        let value = value.into();
        self.check_targets(property, &value)?;
        self.values.set(name, value)?;
        Ok(self)
    }

    pub fn add_reference(&mut self, name: &str, target: ElementKey) -> SyncResult<&mut Self> {
        let property = self.definition.require_property(name)?;
        self.check_targets(property, &Value::Ref(target))?;
        self.values.add_reference(name, target)?;
        Ok(self)
    }

    pub fn unset(&mut self, name: &str) -> SyncResult<&mut Self> {
        self.values.unset(name)?;
        Ok(self)
    }

    /// Drops every value, the loaded element and any deferred links.
    pub fn clear(&mut self) -> &mut Self {
        self.values = Element::new(self.definition, self.store.id());
        self.loaded = None;
        self.deferred.clear();
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn loaded(&self) -> Option<&Element> {
        self.loaded.as_ref()
    }

    pub fn deferred(&self) -> &[DeferredLink] {
        &self.deferred
    }

    pub fn take_deferred(&mut self) -> Vec<DeferredLink> {
        std::mem::take(&mut self.deferred)
    }

    /// A draft holding the current values.
    pub fn create(&self) -> SyncResult<Element> {
        if let Some(&property) = self.values.missing_required().first() {
            return Err(SyncError::MissingRequired {
                element: self.definition.name(),
                property,
            });
        }
        Ok(self.values.clone())
    }

    pub fn build(&mut self) -> SyncResult<Element> {
        self.build_with_outcome().map(|(element, _)| element)
    }

    /// Produces the element in the bound store.
    ///
    /// A loaded element of this store is returned as is when nothing
    /// changed, and updated in place when only mutable properties changed.
    /// Otherwise an equivalent element is looked up and adopted, or a new
    /// one inserted. A loaded element of another store is then registered
    /// with the result in the translation table.
    pub fn build_with_outcome(&mut self) -> SyncResult<(Element, Outcome)> {
        let candidate = self.create()?;
        let store_id = self.store.id();
        let hooks = self.definition.hooks();

        if let Some(loaded) = self.loaded.as_ref().filter(|l| l.store() == store_id && !l.is_draft()) {
            let changed = candidate.changed_properties(loaded);
            if changed.is_empty() {
                hooks.post_build(loaded)?;
                return Ok((loaded.clone(), Outcome::Unchanged));
            }
            let only_mutable = changed
                .iter()
                .all(|name| self.definition.property(name).is_some_and(Property::is_mutable));
            if only_mutable {
                if !self.store.is_active() {
                    return Err(StorageError::NoTransaction.into());
                }
                let mut updated = candidate;
                if let Some(id) = loaded.id() {
                    updated.set_id(id);
                }
                debug!("Updating {} ({})", updated, changed.join(", "));
                let updated = self.store.update(updated)?;
                hooks.post_build(&updated)?;
                return Ok((updated, Outcome::Updated));
            }
        }

        let mut found = None;
        if let Some(loaded) = self.loaded.as_ref().filter(|l| l.store() != store_id) {
            found = TableRetriever.fetch(&*self.store, self.table, loaded)?;
        }
        if found.is_none() {
            found = retriever_for(self.definition).fetch(&*self.store, self.table, &candidate)?;
        }

        let (element, outcome) = match found {
            Some(existing) => {
                debug!("Adopting {}", existing);
                (existing, Outcome::Adopted)
            }
            None => {
                if !self.store.is_active() {
                    return Err(StorageError::NoTransaction.into());
                }
                let mut element = candidate;
                let proposed = self.loaded.as_ref().and_then(Element::id);
                element.set_id(self.store.generate_id(proposed)?);
                hooks.pre_insert(&mut element)?;
                let element = self.store.insert(element)?;
                hooks.post_insert(&element)?;
                debug!("Inserted {}", element);
                (element, Outcome::Inserted)
            }
        };

        if let (Some(from), Some(to)) = (self.loaded.as_ref().and_then(Element::key), element.key()) {
            if from.store != store_id && !self.table.contains(from, store_id) {
                self.table.put(from, to)?;
            }
        }

        hooks.post_build(&element)?;
        Ok((element, outcome))
    }
}
