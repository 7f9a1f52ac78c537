use crate::{Element, ModelResult};

/// Optional per-type steps run by the builder around an insert.
///
/// Most definitions do NOT need this. The generic builder already handles
/// creation, validation, duplicate detection and identifier assignment.
///
/// Implement it when a type needs:
/// - defaults filled in just before the insert (`pre_insert`)
/// - follow-up checks once the store accepted the element (`post_insert`)
/// - a final look at whatever `build()` is about to return (`post_build`)
///
/// The hooks run in the order `pre_insert`, store insert, `post_insert`,
/// `post_build`. `post_build` also runs when an existing element is adopted.
pub trait ElementHooks: Send + Sync {
    /// Called after the identifier is assigned, before the store insert.
    /// Return `Err` to abort the build.
    fn pre_insert(&self, element: &mut Element) -> ModelResult<()> {
        let _ = element;
        Ok(())
    }

    /// Called with the element returned by the store insert.
    fn post_insert(&self, element: &Element) -> ModelResult<()> {
        let _ = element;
        Ok(())
    }

    /// Called with the element `build()` returns.
    fn post_build(&self, element: &Element) -> ModelResult<()> {
        let _ = element;
        Ok(())
    }
}

/// Hooks that do nothing; used by definitions that declare none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl ElementHooks for NoHooks {}
