use edm_model::Element;
use edm_types::ElementKey;

/// A reversible write recorded in the undo log of a transaction.
///
/// `cached` is whether the element sat in the working-set cache before the
/// write; rollback restores that.
#[derive(Debug, Clone)]
pub(crate) enum Change {
    /// An element was inserted; rollback removes it.
    Inserted(ElementKey),
    /// An element was replaced; holds the previous version.
    Updated { old: Element, cached: bool },
    /// An element was removed; holds what was removed.
    Removed { old: Element, cached: bool },
}
