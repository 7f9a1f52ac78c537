//! Element model for the EDM synchronization core.
//!
//! Defines the types every other layer depends on:
//! - [`Property`]: one row of a type's property descriptor table
//!   (name, kind, cardinality, [`PropertyFlags`])
//! - [`Definition`]: the static descriptor table of an element type,
//!   with its dependency rank, unique-key [`Selector`]s and identity policy
//! - [`Element`]: a stored (or draft) record: identity plus [`Value`]s
//! - [`ElementHooks`]: optional per-type steps run around an insert
//!
//! The [`education`] module declares the concrete educational domain
//! (courses, activities, enrolments, grades, ...).
//!
//! Descriptor tables are plain data built once per type; nothing here
//! touches a store.

mod definition;
pub mod education;
mod element;
mod error;
mod hooks;
mod property;
mod value;

pub use definition::{Definition, DefinitionBuilder, IdentityPolicy, Selector};
pub use element::Element;
pub use error::{ErrorKind, ModelError, ModelResult};
pub use hooks::{ElementHooks, NoHooks};
pub use property::{Cardinality, FieldType, Property, PropertyFlags, PropertyKind};
pub use value::Value;
