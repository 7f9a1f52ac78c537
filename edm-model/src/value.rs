use edm_types::ElementKey;
use serde::{Deserialize, Serialize};

/// A property value held by an [`Element`](crate::Element).
///
/// Absence is represented by the property not being set at all, never by a
/// sentinel value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Bool(bool),
    /// A single relationship target.
    Ref(ElementKey),
    /// An ordered, duplicate-free set of relationship targets.
    Refs(Vec<ElementKey>),
}

impl Value {
    /// Short name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::Bool(_) => "bool",
            Value::Ref(_) => "reference",
            Value::Refs(_) => "references",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Value::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ElementKey> {
        match self {
            Value::Ref(k) => Some(*k),
            _ => None,
        }
    }

    /// Every relationship target carried by this value (empty for scalars).
    pub fn targets(&self) -> &[ElementKey] {
        match self {
            Value::Ref(k) => std::slice::from_ref(k),
            Value::Refs(ks) => ks,
            _ => &[],
        }
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self, Value::Ref(_) | Value::Refs(_))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Decimal(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<ElementKey> for Value {
    fn from(value: ElementKey) -> Self {
        Value::Ref(value)
    }
}

impl From<Vec<ElementKey>> for Value {
    fn from(value: Vec<ElementKey>) -> Self {
        Value::Refs(value)
    }
}
