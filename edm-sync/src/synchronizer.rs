//! Batched copy of a closed set of elements with bounded memory.
//!
//! The synchronizer collects the transitive closure of the elements it is
//! given, counts how many collected elements reference each one, and then
//! copies them in dependency order. Each batch is one destination
//! transaction. After a batch commits, elements that are built and no
//! longer referenced by anything still to come are evicted from the
//! destination's cache and from the translation table.

use crate::{Entity, InsertProcessor, SyncError, SyncResult};
use edm_model::Element;
use edm_storage::{StorageError, Store, Transaction, TranslationTable};
use edm_types::ElementKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::{debug, error, info, warn};

/// Share of the destination cache that may be awaiting eviction before a
/// batch is committed.
pub const EVICT_FACTOR: f64 = 0.2;

/// Lower bound on the eviction threshold.
pub const EVICT_MIN: usize = 100;

/// Tuning for [`Synchronizer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// A batch is committed once `max(cache_size * evict_factor, evict_min)`
    /// elements are waiting to be evicted.
    pub evict_factor: f64,
    pub evict_min: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            evict_factor: EVICT_FACTOR,
            evict_min: EVICT_MIN,
        }
    }
}

impl SyncConfig {
    /// Never below one, so every batch processes at least one element.
    pub fn eviction_threshold(&self, cache_size: usize) -> usize {
        ((cache_size as f64 * self.evict_factor) as usize)
            .max(self.evict_min)
            .max(1)
    }
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub inserted: usize,
    pub adopted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub batches: usize,
    pub evicted: usize,
    pub links_completed: usize,
}

impl SyncReport {
    /// Elements built in the destination, whatever the outcome.
    pub fn processed(&self) -> usize {
        self.inserted + self.adopted + self.updated + self.unchanged
    }
}

#[derive(Debug, Default)]
struct Member {
    /// Collected elements referencing this one that are not processed yet.
    remaining: usize,
    processed: bool,
}

/// Copies everything reachable from the added elements from `source` into
/// `destination`.
pub struct Synchronizer<'a> {
    source: &'a dyn Store,
    destination: &'a mut dyn Store,
    table: &'a mut TranslationTable,
    config: SyncConfig,
    members: HashMap<ElementKey, Member>,
    order: BTreeSet<(u32, &'static str, ElementKey)>,
}

impl<'a> Synchronizer<'a> {
    pub fn new(source: &'a dyn Store, destination: &'a mut dyn Store, table: &'a mut TranslationTable) -> Self {
        Self {
            source,
            destination,
            table,
            config: SyncConfig::default(),
            members: HashMap::new(),
            order: BTreeSet::new(),
        }
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Number of collected elements.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// How many collected elements reference `key` and are not processed.
    pub fn dependents(&self, key: ElementKey) -> Option<usize> {
        self.members.get(&key).map(|m| m.remaining)
    }

    /// Collects `element` and everything it reaches.
    pub fn add(&mut self, element: &Element) -> SyncResult<()> {
        let root = element.identity()?;
        if !root.is_in(self.source.id()) {
            return Err(StorageError::ForeignElement(element.to_string()).into());
        }
        if self.members.contains_key(&root) {
            return Ok(());
        }

        self.collect(element);
        let mut queue = VecDeque::from([element.clone()]);
        while let Some(owner) = queue.pop_front() {
            let owner_key = owner.identity()?;
            for target in Entity::associations(&owner) {
                if target == owner_key {
                    continue;
                }
                if !self.members.contains_key(&target) {
                    let fetched = self.source.get(target)?.ok_or(SyncError::SourceMissing(target))?;
                    self.collect(&fetched);
                    queue.push_back(fetched);
                }
                if let Some(member) = self.members.get_mut(&target) {
                    member.remaining += 1;
                }
            }
        }
        Ok(())
    }

    pub fn add_all<'e>(&mut self, elements: impl IntoIterator<Item = &'e Element>) -> SyncResult<()> {
        elements.into_iter().try_for_each(|e| self.add(e))
    }

    fn collect(&mut self, element: &Element) {
        if let Some(key) = element.key() {
            self.members.insert(key, Member::default());
            self.order
                .insert((element.definition().rank(), element.type_name(), key));
        }
    }

    /// Copies every collected element, batch by batch.
    ///
    /// A batch that fails to build or commit is rolled back, its
    /// translation-table entries are removed, and the error is returned. Batches committed before it stay.
    pub fn synchronize(&mut self) -> SyncResult<SyncReport> {
        let Self {
            source,
            destination,
            table,
            config,
            members,
            order,
        } = self;
        let source: &dyn Store = *source;
        let mut processor = InsertProcessor::new(source, &mut **destination, &mut **table);
        let mut evicted: HashSet<ElementKey> = HashSet::new();
        let mut report = SyncReport::default();

        info!("Synchronizing {} elements from {}", members.len(), source.id());
        while !order.is_empty() {
            processor.destination().begin()?;
            let mut waiting: Vec<ElementKey> = Vec::new();

            let result = run_batch(source, &mut processor, config, members, order, &mut waiting)
                .and_then(|()| processor.destination().commit().map_err(SyncError::from));
            if let Err(e) = result {
                warn!("Batch {} failed, rolling back: {}", report.batches + 1, e);
                let destination = processor.destination();
                if destination.is_active()
                    && let Err(rollback) = destination.rollback()
                {
                    error!("Rollback of batch {} failed: {}", report.batches + 1, rollback);
                }
                for (_, created) in processor.take_built() {
                    processor.table().remove(created);
                }
                processor.reset();
                members.clear();
                order.clear();
                return Err(e);
            }

            processor.take_built();
            processor.clear();
            report.batches += 1;

            let destination_id = processor.destination().id();
            for key in &waiting {
                if let Some(local) = processor.table().get(*key, destination_id) {
                    processor.table().remove(local);
                    processor.destination().evict(local);
                    evicted.insert(local);
                }
                members.remove(key);
            }
            for owner in processor.take_attached() {
                if evicted.contains(&owner) {
                    processor.destination().evict(owner);
                }
            }
            report.evicted += waiting.len();
            debug!(
                "Batch {} committed: {} evicted, cache holds {}",
                report.batches,
                waiting.len(),
                processor.destination().cache_size()
            );
        }

        let counts = processor.report();
        report.inserted = counts.inserted;
        report.adopted = counts.adopted;
        report.updated = counts.updated;
        report.unchanged = counts.unchanged;
        report.links_completed = counts.links_completed;
        info!(
            "Synchronized: {} inserted, {} adopted, {} batches",
            report.inserted, report.adopted, report.batches
        );
        members.clear();
        Ok(report)
    }
}

/// Processes elements in order until enough are waiting for eviction.
fn run_batch(
    source: &dyn Store,
    processor: &mut InsertProcessor<'_>,
    config: &SyncConfig,
    members: &mut HashMap<ElementKey, Member>,
    order: &mut BTreeSet<(u32, &'static str, ElementKey)>,
    waiting: &mut Vec<ElementKey>,
) -> SyncResult<()> {
    while waiting.len() < config.eviction_threshold(processor.destination().cache_size()) {
        let Some((_, _, key)) = order.pop_first() else {
            break;
        };
        let element = source.get(key)?.ok_or(SyncError::SourceMissing(key))?;
        processor.process_element(&element)?;

        for target in Entity::associations(&element) {
            if target == key {
                continue;
            }
            if let Some(member) = members.get_mut(&target) {
                member.remaining = member.remaining.saturating_sub(1);
                if member.remaining == 0 && member.processed {
                    waiting.push(target);
                }
            }
        }
        if let Some(member) = members.get_mut(&key) {
            member.processed = true;
            if member.remaining == 0 {
                waiting.push(key);
            }
        }
    }
    Ok(())
}
