use crate::{DeferredLink, SyncResult};
use edm_storage::Store;
use edm_types::ElementKey;
use std::collections::HashMap;
use tracing::debug;

/// Optional associations waiting for their target to be built.
///
/// Keyed by the target's key in the source store; each entry names the
/// destination owner and the property to attach to.
#[derive(Debug, Default)]
pub struct PendingLinks {
    by_target: HashMap<ElementKey, Vec<(ElementKey, &'static str)>>,
}

impl PendingLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, owner: ElementKey, links: impl IntoIterator<Item = DeferredLink>) {
        for link in links {
            let waiting = self.by_target.entry(link.target).or_default();
            if !waiting.contains(&(owner, link.property)) {
                waiting.push((owner, link.property));
            }
        }
    }

    pub fn is_waiting_for(&self, target: ElementKey) -> bool {
        self.by_target.contains_key(&target)
    }

    /// Attaches `built` to every owner that was waiting for `target`.
    /// Returns the owners that were attached to.
    pub fn complete(
        &mut self,
        target: ElementKey,
        built: ElementKey,
        store: &mut dyn Store,
    ) -> SyncResult<Vec<ElementKey>> {
        let Some(waiting) = self.by_target.remove(&target) else {
            return Ok(Vec::new());
        };
        let mut owners = Vec::with_capacity(waiting.len());
        for (owner, property) in waiting {
            debug!("Completing deferred link {}.{} -> {}", owner, property, built);
            store.attach(owner, property, built)?;
            owners.push(owner);
        }
        Ok(owners)
    }

    /// Number of links still waiting.
    pub fn len(&self) -> usize {
        self.by_target.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_target.clear();
    }
}
