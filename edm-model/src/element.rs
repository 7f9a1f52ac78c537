use crate::{Definition, ModelError, ModelResult, Property, Value};
use edm_types::{ElementId, ElementKey, StoreId};
use std::collections::BTreeMap;
use std::fmt;

/// A record of some [`Definition`] owned by one store.
///
/// An element without an id is a draft: a candidate produced by a builder
/// that has not been inserted yet.
#[derive(Debug, Clone)]
pub struct Element {
    definition: &'static Definition,
    store: StoreId,
    id: Option<ElementId>,
    values: BTreeMap<&'static str, Value>,
}

impl Element {
    /// Creates an empty draft owned by `store`.
    pub fn new(definition: &'static Definition, store: StoreId) -> Self {
        Self {
            definition,
            store,
            id: None,
            values: BTreeMap::new(),
        }
    }

    /// Creates an empty element with a known key.
    pub fn with_key(definition: &'static Definition, key: ElementKey) -> Self {
        Self {
            id: Some(key.id),
            ..Self::new(definition, key.store)
        }
    }

    pub fn definition(&self) -> &'static Definition {
        self.definition
    }

    pub fn type_name(&self) -> &'static str {
        self.definition.name()
    }

    pub fn store(&self) -> StoreId {
        self.store
    }

    pub fn id(&self) -> Option<ElementId> {
        self.id
    }

    /// `None` for drafts.
    pub fn key(&self) -> Option<ElementKey> {
        self.id.map(|id| ElementKey::new(self.store, id))
    }

    pub fn set_id(&mut self, id: ElementId) {
        self.id = Some(id);
    }

    pub fn is_draft(&self) -> bool {
        self.id.is_none()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_integer)
    }

    pub fn decimal(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_decimal)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn reference(&self, name: &str) -> Option<ElementKey> {
        self.get(name).and_then(Value::as_reference)
    }

    pub fn references(&self, name: &str) -> &[ElementKey] {
        self.get(name).map(Value::targets).unwrap_or(&[])
    }

    pub fn values(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Sets a property after validating it against the descriptor table.
    ///
    /// Relationship targets must belong to this element's store. Duplicate
    /// targets in a multi-valued value are dropped, keeping first positions.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> ModelResult<()> {
        let property = self.definition.require_property(name)?;
        let value = match value.into() {
            Value::Refs(keys) => {
                let mut unique = Vec::with_capacity(keys.len());
                for key in keys {
                    if !unique.contains(&key) {
                        unique.push(key);
                    }
                }
                Value::Refs(unique)
            }
            other => other,
        };

        property.check(self.definition.name(), &value)?;
        self.check_local(property, value.targets())?;
        self.values.insert(property.name(), value);
        Ok(())
    }

    /// Appends one target to a multi-valued relationship. Already present
    /// targets are ignored.
    pub fn add_reference(&mut self, name: &str, target: ElementKey) -> ModelResult<()> {
        let property = self.definition.require_property(name)?;
        if !(property.is_relationship() && property.is_multi_valued()) {
            return Err(ModelError::TypeMismatch {
                element: self.definition.name(),
                property: property.name(),
                expected: "references",
                found: "reference",
            });
        }
        self.check_local(property, std::slice::from_ref(&target))?;

        let entry = self
            .values
            .entry(property.name())
            .or_insert_with(|| Value::Refs(Vec::new()));
        if let Value::Refs(keys) = entry {
            if !keys.contains(&target) {
                keys.push(target);
            }
        }
        Ok(())
    }

    /// Clears a property, returning the previous value.
    pub fn unset(&mut self, name: &str) -> ModelResult<Option<Value>> {
        let property = self.definition.require_property(name)?;
        Ok(self.values.remove(property.name()))
    }

    fn check_local(&self, property: &Property, targets: &[ElementKey]) -> ModelResult<()> {
        if targets.iter().any(|t| !t.is_in(self.store)) {
            return Err(ModelError::ForeignReference {
                element: self.definition.name(),
                property: property.name(),
            });
        }
        Ok(())
    }

    /// Every element this one references, in property order.
    pub fn associations(&self) -> Vec<ElementKey> {
        self.collect_targets(|_| true)
    }

    /// Elements that must exist before this one can be inserted or updated:
    /// targets of `REQUIRED` and `MUTABLE` relationships.
    pub fn dependencies(&self) -> Vec<ElementKey> {
        self.collect_targets(Property::is_dependency)
    }

    fn collect_targets(&self, include: impl Fn(&Property) -> bool) -> Vec<ElementKey> {
        let mut out = Vec::new();
        for property in self.definition.relationships().filter(|p| include(p)) {
            for key in property.targets(self) {
                if !out.contains(&key) {
                    out.push(key);
                }
            }
        }
        out
    }

    /// Names of properties whose values differ from `other`'s.
    pub fn changed_properties(&self, other: &Element) -> Vec<&'static str> {
        self.definition
            .properties()
            .iter()
            .filter(|p| self.get(p.name()) != other.get(p.name()))
            .map(Property::name)
            .collect()
    }

    /// Required properties that are not set.
    pub fn missing_required(&self) -> Vec<&'static str> {
        self.definition
            .properties()
            .iter()
            .filter(|p| p.is_required() && !self.values.contains_key(p.name()))
            .map(Property::name)
            .collect()
    }

    /// Position in dependency order: rank, then type name, then key.
    pub fn sort_key(&self) -> (u32, &'static str, StoreId, Option<ElementId>) {
        (self.definition.rank(), self.definition.name(), self.store, self.id)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.definition.is(other.definition)
            && self.store == other.store
            && self.id == other.id
            && self.values == other.values
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key() {
            Some(key) => write!(f, "{}({key})", self.type_name()),
            None => write!(f, "{}(draft)", self.type_name()),
        }
    }
}
