use crate::{StorageError, StorageResult, Store};
use edm_model::{Definition, Element, ModelError, Selector, Value};

/// A lookup by one of a definition's [`Selector`]s.
///
/// Every property of the selector has to be given a value before the query
/// runs.
#[derive(Debug)]
pub struct Query<'a> {
    store: &'a dyn Store,
    definition: &'static Definition,
    selector: &'static Selector,
    values: Vec<Option<Value>>,
}

impl<'a> Query<'a> {
    pub fn new(store: &'a dyn Store, definition: &'static Definition, selector: &str) -> StorageResult<Self> {
        let selector = definition
            .selector(selector)
            .ok_or_else(|| StorageError::UnknownSelector {
                element: definition.name(),
                selector: selector.to_string(),
            })?;
        Ok(Self {
            store,
            definition,
            selector,
            values: vec![None; selector.properties.len()],
        })
    }

    pub fn selector(&self) -> &'static Selector {
        self.selector
    }

    pub fn set_value(&mut self, property: &str, value: impl Into<Value>) -> StorageResult<&mut Self> {
        let index = self
            .selector
            .properties
            .iter()
            .position(|p| *p == property)
            .ok_or_else(|| ModelError::UnknownProperty {
                element: self.definition.name(),
                property: property.to_string(),
            })?;
        let value = value.into();
        self.definition.require_property(property)?.check(self.definition.name(), &value)?;
        self.values[index] = Some(value);
        Ok(self)
    }

    /// Takes every selector value from `element`. Properties unset on the
    /// element are left as they were.
    pub fn set_all_values(&mut self, element: &Element) -> StorageResult<&mut Self> {
        for (slot, property) in self.values.iter_mut().zip(&self.selector.properties) {
            if let Some(value) = element.get(property) {
                *slot = Some(value.clone());
            }
        }
        Ok(self)
    }

    /// True once every selector property has a value.
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    fn filter(&self) -> StorageResult<Vec<(&'static str, Value)>> {
        self.selector
            .properties
            .iter()
            .zip(&self.values)
            .map(|(property, value)| match value {
                Some(v) => Ok((*property, v.clone())),
                None => Err(StorageError::IncompleteQuery {
                    element: self.definition.name(),
                    selector: self.selector.name,
                    property: *property,
                }),
            })
            .collect()
    }

    /// The single matching element, if any.
    pub fn query(&self) -> StorageResult<Option<Element>> {
        let mut found = self.query_all()?;
        match found.len() {
            0 | 1 => Ok(found.pop()),
            count => Err(StorageError::NonUnique {
                element: self.definition.name(),
                selector: self.selector.name,
                count,
            }),
        }
    }

    pub fn query_all(&self) -> StorageResult<Vec<Element>> {
        let filter = self.filter()?;
        self.store.find(self.definition, &filter)
    }
}
