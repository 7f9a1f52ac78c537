use crate::{ElementHooks, ModelError, ModelResult, NoHooks, Property};
use std::fmt;

/// A named unique key: the listed properties identify at most one element
/// of the definition inside a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub name: &'static str,
    pub properties: Vec<&'static str>,
}

/// How a presumed duplicate of a candidate is located in a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityPolicy {
    /// Query the named selector.
    Key(&'static str),
    /// Query every single-valued, immutable property that is set.
    Full,
}

static NO_HOOKS: NoHooks = NoHooks;

/// Static descriptor table of an element type.
///
/// `rank` encodes cross-type precedence: a type only references types of a
/// lower rank through its required relationships, so processing in rank
/// order inserts dependencies first.
pub struct Definition {
    name: &'static str,
    rank: u32,
    properties: Vec<Property>,
    selectors: Vec<Selector>,
    identity: IdentityPolicy,
    hooks: Option<&'static dyn ElementHooks>,
}

impl Definition {
    pub fn builder(name: &'static str) -> DefinitionBuilder {
        DefinitionBuilder {
            name,
            rank: 0,
            properties: Vec::new(),
            selectors: Vec::new(),
            identity: None,
            hooks: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Like [`property`](Self::property) but unknown names are an error.
    pub fn require_property(&self, name: &str) -> ModelResult<&Property> {
        self.property(name).ok_or_else(|| ModelError::UnknownProperty {
            element: self.name,
            property: name.to_string(),
        })
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| p.is_relationship())
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| !p.is_relationship())
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    pub fn selector(&self, name: &str) -> Option<&Selector> {
        self.selectors.iter().find(|s| s.name == name)
    }

    pub fn identity(&self) -> IdentityPolicy {
        self.identity
    }

    pub fn hooks(&self) -> &'static dyn ElementHooks {
        self.hooks.unwrap_or(&NO_HOOKS)
    }

    /// Definitions are singletons, so the name identifies them.
    pub fn is(&self, other: &Definition) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("name", &self.name)
            .field("rank", &self.rank)
            .field("properties", &self.properties)
            .field("selectors", &self.selectors)
            .field("identity", &self.identity)
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}

impl PartialEq for Definition {
    fn eq(&self, other: &Self) -> bool {
        self.is(other)
    }
}

impl Eq for Definition {}

pub struct DefinitionBuilder {
    name: &'static str,
    rank: u32,
    properties: Vec<Property>,
    selectors: Vec<Selector>,
    identity: Option<&'static str>,
    hooks: Option<&'static dyn ElementHooks>,
}

impl DefinitionBuilder {
    pub fn rank(mut self, rank: u32) -> Self {
        self.rank = rank;
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn selector(mut self, name: &'static str, properties: &[&'static str]) -> Self {
        self.selectors.push(Selector {
            name,
            properties: properties.to_vec(),
        });
        self
    }

    /// Locate duplicates through the named selector instead of a full match.
    pub fn identity_key(mut self, selector: &'static str) -> Self {
        self.identity = Some(selector);
        self
    }

    pub fn hooks(mut self, hooks: &'static dyn ElementHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn build(self) -> ModelResult<Definition> {
        let element = self.name;

        for (i, property) in self.properties.iter().enumerate() {
            if self.properties[..i].iter().any(|p| p.name() == property.name()) {
                return Err(ModelError::DuplicateProperty {
                    element,
                    property: property.name(),
                });
            }
            property.check_flags(element)?;
        }

        for selector in &self.selectors {
            let invalid = |reason: String| ModelError::InvalidSelector {
                element,
                selector: selector.name,
                reason,
            };
            if selector.properties.is_empty() {
                return Err(invalid("no properties".into()));
            }
            for name in &selector.properties {
                match self.properties.iter().find(|p| p.name() == *name) {
                    None => return Err(invalid(format!("unknown property `{name}`"))),
                    Some(p) if p.is_multi_valued() => {
                        return Err(invalid(format!("`{name}` is multi-valued")));
                    }
                    Some(_) => {}
                }
            }
        }

        let identity = match self.identity {
            Some(name) if self.selectors.iter().any(|s| s.name == name) => IdentityPolicy::Key(name),
            Some(name) => {
                return Err(ModelError::InvalidSelector {
                    element,
                    selector: name,
                    reason: "identity selector is not declared".into(),
                });
            }
            None => IdentityPolicy::Full,
        };

        Ok(Definition {
            name: self.name,
            rank: self.rank,
            properties: self.properties,
            selectors: self.selectors,
            identity,
            hooks: self.hooks,
        })
    }
}
