use crate::{Element, ModelError, ModelResult, Value};
use bitflags::bitflags;
use edm_types::ElementKey;

bitflags! {
    /// Behavioural flags attached to a [`Property`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PropertyFlags: u8 {
        /// The value is one or more elements rather than a scalar.
        const RELATIONSHIP = 1 << 0;
        /// Must be set (and single-valued) before the element can be inserted.
        const REQUIRED = 1 << 1;
        /// May be unset without blocking insertion, but is resolved before
        /// plain optional associations.
        const RECOMMENDED = 1 << 2;
        /// May change on an inserted element without making a new one.
        const MUTABLE = 1 << 3;
    }
}

/// The scalar type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Decimal,
    Bool,
}

impl FieldType {
    fn name(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::Bool => "bool",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldType::Text, Value::Text(_))
                | (FieldType::Integer, Value::Integer(_))
                | (FieldType::Decimal, Value::Decimal(_))
                | (FieldType::Bool, Value::Bool(_))
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    Multiple,
}

/// What a property holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Attribute(FieldType),
    /// A reference to elements of the named definition.
    Relationship { target: &'static str },
}

/// One row of a property descriptor table.
///
/// Values live in the element's value map keyed by [`Property::name`];
/// [`Property::value`] and [`Property::targets`] are the accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    name: &'static str,
    kind: PropertyKind,
    cardinality: Cardinality,
    flags: PropertyFlags,
    range: Option<(i64, i64)>,
}

impl Property {
    fn scalar(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            kind: PropertyKind::Attribute(field_type),
            cardinality: Cardinality::Single,
            flags: PropertyFlags::empty(),
            range: None,
        }
    }

    /// Shorthand for a text attribute.
    pub fn text(name: &'static str) -> Self {
        Self::scalar(name, FieldType::Text)
    }

    /// Shorthand for an integer attribute.
    pub fn integer(name: &'static str) -> Self {
        Self::scalar(name, FieldType::Integer)
    }

    /// Shorthand for a decimal attribute.
    pub fn decimal(name: &'static str) -> Self {
        Self::scalar(name, FieldType::Decimal)
    }

    /// Shorthand for a boolean attribute.
    pub fn boolean(name: &'static str) -> Self {
        Self::scalar(name, FieldType::Bool)
    }

    /// Single-valued relationship to elements of `target`.
    pub fn relationship(name: &'static str, target: &'static str) -> Self {
        Self {
            name,
            kind: PropertyKind::Relationship { target },
            cardinality: Cardinality::Single,
            flags: PropertyFlags::RELATIONSHIP,
            range: None,
        }
    }

    /// Multi-valued relationship to elements of `target`.
    pub fn relationships(name: &'static str, target: &'static str) -> Self {
        Self {
            cardinality: Cardinality::Multiple,
            ..Self::relationship(name, target)
        }
    }

    pub fn required(self) -> Self {
        self.with_flags(PropertyFlags::REQUIRED)
    }

    pub fn recommended(self) -> Self {
        self.with_flags(PropertyFlags::RECOMMENDED)
    }

    pub fn mutable(self) -> Self {
        self.with_flags(PropertyFlags::MUTABLE)
    }

    /// Adds flags. Combinations are validated when the owning
    /// [`Definition`](crate::Definition) is built.
    pub fn with_flags(mut self, flags: PropertyFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Restricts an integer attribute to `min..=max`.
    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.range = Some((min, max));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    pub fn has_flags(&self, flags: PropertyFlags) -> bool {
        self.flags.contains(flags)
    }

    pub fn is_required(&self) -> bool {
        self.flags.contains(PropertyFlags::REQUIRED)
    }

    pub fn is_recommended(&self) -> bool {
        self.flags.contains(PropertyFlags::RECOMMENDED)
    }

    pub fn is_mutable(&self) -> bool {
        self.flags.contains(PropertyFlags::MUTABLE)
    }

    pub fn is_relationship(&self) -> bool {
        self.flags.contains(PropertyFlags::RELATIONSHIP)
    }

    pub fn is_multi_valued(&self) -> bool {
        self.cardinality == Cardinality::Multiple
    }

    /// A relationship whose targets must exist before the owner is inserted.
    pub fn is_dependency(&self) -> bool {
        self.is_relationship() && self.flags.intersects(PropertyFlags::REQUIRED | PropertyFlags::MUTABLE)
    }

    /// Name of the target definition for relationships.
    pub fn target(&self) -> Option<&'static str> {
        match self.kind {
            PropertyKind::Relationship { target } => Some(target),
            PropertyKind::Attribute(_) => None,
        }
    }

    pub fn value_range(&self) -> Option<(i64, i64)> {
        self.range
    }

    /// Reads this property from `element`.
    pub fn value<'e>(&self, element: &'e Element) -> Option<&'e Value> {
        element.get(self.name)
    }

    /// Relationship targets of this property on `element`.
    pub fn targets(&self, element: &Element) -> Vec<ElementKey> {
        self.value(element)
            .map(|v| v.targets().to_vec())
            .unwrap_or_default()
    }

    pub(crate) fn check_flags(&self, element: &'static str) -> ModelResult<()> {
        let invalid = |reason| ModelError::InvalidFlags {
            element,
            property: self.name,
            reason,
        };

        if !self.is_relationship() && self.is_recommended() {
            return Err(invalid("attributes can not be RECOMMENDED"));
        }
        if self.is_multi_valued() && self.is_required() {
            return Err(invalid("multi-valued properties can not be REQUIRED"));
        }
        if self.is_relationship() && self.is_required() && (self.is_mutable() || self.is_recommended()) {
            return Err(invalid("REQUIRED relationships can not be MUTABLE or RECOMMENDED"));
        }
        if self.range.is_some() && self.kind != PropertyKind::Attribute(FieldType::Integer) {
            return Err(invalid("only integer attributes can carry a range"));
        }
        Ok(())
    }

    /// Validates `value` against this descriptor.
    pub fn check(&self, element: &'static str, value: &Value) -> ModelResult<()> {
        let expected = match (self.kind, self.cardinality) {
            (PropertyKind::Attribute(ft), _) if ft.accepts(value) => None,
            (PropertyKind::Attribute(ft), _) => Some(ft.name()),
            (PropertyKind::Relationship { .. }, Cardinality::Single) => {
                (!matches!(value, Value::Ref(_))).then_some("reference")
            }
            (PropertyKind::Relationship { .. }, Cardinality::Multiple) => {
                (!matches!(value, Value::Refs(_))).then_some("references")
            }
        };
        if let Some(expected) = expected {
            return Err(ModelError::TypeMismatch {
                element,
                property: self.name,
                expected,
                found: value.type_name(),
            });
        }

        if let (Some((min, max)), Value::Integer(v)) = (self.range, value) {
            if *v < min || *v > max {
                return Err(ModelError::OutOfRange {
                    element,
                    property: self.name,
                    value: *v,
                    min,
                    max,
                });
            }
        }

        if let Value::Text(s) = value {
            if self.is_required() && s.trim().is_empty() {
                return Err(ModelError::Empty {
                    element,
                    property: self.name,
                });
            }
        }

        Ok(())
    }
}
