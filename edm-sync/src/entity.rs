use crate::{ElementBuilder, SyncError, SyncResult};
use edm_model::Element;
use edm_storage::{Store, TranslationTable};
use edm_types::ElementKey;

/// What the insert processor and synchronizer need from a stored record.
pub trait Entity {
    /// The stored identity. Drafts have none.
    fn identity(&self) -> SyncResult<ElementKey>;

    /// Everything this entity references.
    fn associations(&self) -> Vec<ElementKey>;

    /// References that must resolve before this entity can be built.
    fn dependencies(&self) -> Vec<ElementKey>;

    /// A builder bound to `target`, loaded with this entity's values.
    fn builder<'a>(&self, target: &'a mut dyn Store, table: &'a mut TranslationTable) -> SyncResult<ElementBuilder<'a>>;
}

impl Entity for Element {
    fn identity(&self) -> SyncResult<ElementKey> {
        self.key().ok_or_else(|| SyncError::Unidentified(self.to_string()))
    }

    fn associations(&self) -> Vec<ElementKey> {
        Element::associations(self)
    }

    fn dependencies(&self) -> Vec<ElementKey> {
        Element::dependencies(self)
    }

    fn builder<'a>(&self, target: &'a mut dyn Store, table: &'a mut TranslationTable) -> SyncResult<ElementBuilder<'a>> {
        let mut builder = ElementBuilder::new(self.definition(), target, table)?;
        builder.load(self)?;
        Ok(builder)
    }
}
