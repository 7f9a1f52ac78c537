//! Locating the counterpart of an element in a store.

use crate::{Query, StorageError, StorageResult, Store, TranslationTable};
use edm_model::{Definition, Element, IdentityPolicy, Value};
use tracing::{debug, error};

/// Finds the element of `store` that is the same entity as `element`.
pub trait Retriever: Send + Sync {
    fn fetch(
        &self,
        store: &dyn Store,
        table: &mut TranslationTable,
        element: &Element,
    ) -> StorageResult<Option<Element>>;
}

/// Resolves through the translation table only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableRetriever;

impl Retriever for TableRetriever {
    fn fetch(
        &self,
        store: &dyn Store,
        table: &mut TranslationTable,
        element: &Element,
    ) -> StorageResult<Option<Element>> {
        if !store.is_open() {
            return Err(StorageError::Closed);
        }
        let Some(key) = element.key() else {
            return Ok(None);
        };
        match table.get(key, store.id()) {
            Some(counterpart) => store.get(counterpart),
            None => Ok(None),
        }
    }
}

/// Resolves through the translation table, then by querying the store with
/// the definition's identity policy.
///
/// A hit has to agree with the searched-for element on every immutable
/// property that element sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryRetriever;

impl QueryRetriever {
    fn lookup(&self, store: &dyn Store, element: &Element) -> StorageResult<Option<Element>> {
        let definition = element.definition();
        match definition.identity() {
            IdentityPolicy::Key(selector) => {
                let mut query = Query::new(store, definition, selector)?;
                query.set_all_values(element)?;
                if !query.is_complete() {
                    return Ok(None);
                }
                query.query()
            }
            IdentityPolicy::Full => {
                let filter = identity_values(element);
                if filter.is_empty() {
                    return Ok(None);
                }
                Ok(store.find(definition, &filter)?.into_iter().next())
            }
        }
    }
}

impl Retriever for QueryRetriever {
    fn fetch(
        &self,
        store: &dyn Store,
        table: &mut TranslationTable,
        element: &Element,
    ) -> StorageResult<Option<Element>> {
        if let Some(found) = TableRetriever.fetch(store, table, element)? {
            return Ok(Some(found));
        }
        let Some(found) = self.lookup(store, element)? else {
            return Ok(None);
        };

        if let Some(property) = first_difference(element, &found) {
            error!("{} matches {} but differs on `{}`", found, element, property);
            return Err(StorageError::Inconsistent {
                candidate: element.to_string(),
                found: found.key().ok_or_else(|| StorageError::ForeignElement(found.to_string()))?,
                property,
            });
        }

        if let (Some(wanted), Some(hit)) = (element.key(), found.key()) {
            if wanted.store != hit.store {
                debug!("Found {} for {} by query", hit, wanted);
                table.put(wanted, hit)?;
            }
        }
        Ok(Some(found))
    }
}

/// Single-valued, immutable properties set on `element`.
fn identity_values(element: &Element) -> Vec<(&'static str, Value)> {
    element
        .definition()
        .properties()
        .iter()
        .filter(|p| !p.is_multi_valued() && !p.is_mutable())
        .filter_map(|p| element.get(p.name()).map(|v| (p.name(), v.clone())))
        .collect()
}

/// First immutable property set on `wanted` whose value `found` does not
/// share. Relationships are only compared when both sides live in the same
/// store.
fn first_difference(wanted: &Element, found: &Element) -> Option<&'static str> {
    let same_store = wanted.store() == found.store();
    wanted
        .definition()
        .properties()
        .iter()
        .filter(|p| !p.is_mutable() && (same_store || !p.is_relationship()))
        .find(|p| matches!(wanted.get(p.name()), Some(v) if found.get(p.name()) != Some(v)))
        .map(|p| p.name())
}

static TABLE: TableRetriever = TableRetriever;
static QUERY: QueryRetriever = QueryRetriever;

/// The retriever to use for elements of `definition`.
///
/// Definitions without anything to query on can only be matched through the
/// translation table.
pub fn retriever_for(definition: &Definition) -> &'static dyn Retriever {
    let queryable = match definition.identity() {
        IdentityPolicy::Key(_) => true,
        IdentityPolicy::Full => definition
            .properties()
            .iter()
            .any(|p| !p.is_multi_valued() && !p.is_mutable()),
    };
    if queryable { &QUERY } else { &TABLE }
}
