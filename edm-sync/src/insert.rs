//! Dependency-aware copy of elements from one store into another.

use crate::{Entity, Outcome, PendingLinks, SyncError, SyncReport, SyncResult};
use edm_model::Element;
use edm_storage::{Store, TranslationTable};
use edm_types::ElementKey;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, trace};

enum Step {
    /// Resolve dependencies, then schedule the build.
    Visit(ElementKey),
    /// Dependencies are in place; build now.
    Build(ElementKey),
}

/// Copies elements of `source` into `destination`, inserting what they
/// depend on first.
///
/// Required and mutable relationships are followed immediately. Recommended
/// and plain optional associations are queued instead, so cycles through
/// them never block a build; [`process_queue`](Self::process_queue) works
/// through the queues later.
pub struct InsertProcessor<'a> {
    source: &'a dyn Store,
    destination: &'a mut dyn Store,
    table: &'a mut TranslationTable,
    recommended: VecDeque<ElementKey>,
    deferred: VecDeque<ElementKey>,
    links: PendingLinks,
    built: Vec<(ElementKey, ElementKey)>,
    attached: Vec<ElementKey>,
    report: SyncReport,
}

impl<'a> InsertProcessor<'a> {
    pub fn new(source: &'a dyn Store, destination: &'a mut dyn Store, table: &'a mut TranslationTable) -> Self {
        Self {
            source,
            destination,
            table,
            recommended: VecDeque::new(),
            deferred: VecDeque::new(),
            links: PendingLinks::new(),
            built: Vec::new(),
            attached: Vec::new(),
            report: SyncReport::default(),
        }
    }

    pub fn destination(&mut self) -> &mut dyn Store {
        &mut *self.destination
    }

    pub fn table(&mut self) -> &mut TranslationTable {
        &mut *self.table
    }

    /// Outcome counts so far.
    pub fn report(&self) -> &SyncReport {
        &self.report
    }

    /// Links waiting for their target.
    pub fn links(&self) -> &PendingLinks {
        &self.links
    }

    /// Number of queued associations.
    pub fn queued(&self) -> usize {
        self.recommended.len() + self.deferred.len()
    }

    /// `(source, destination)` pairs built since the last call.
    pub fn take_built(&mut self) -> Vec<(ElementKey, ElementKey)> {
        std::mem::take(&mut self.built)
    }

    /// Destination owners that had a deferred link attached since the last
    /// call.
    pub fn take_attached(&mut self) -> Vec<ElementKey> {
        std::mem::take(&mut self.attached)
    }

    fn counterpart(&self, key: ElementKey) -> Option<ElementKey> {
        self.table
            .get(key, self.destination.id())
            .filter(|k| self.destination.contains(*k))
    }

    fn resolved(&self, key: ElementKey) -> SyncResult<Element> {
        let local = self.counterpart(key).ok_or(SyncError::SourceMissing(key))?;
        self.destination.get(local)?.ok_or(SyncError::SourceMissing(key))
    }

    fn fetch(&self, key: ElementKey) -> SyncResult<Element> {
        self.source.get(key)?.ok_or(SyncError::SourceMissing(key))
    }

    /// Copies `element` and its dependencies, returning the destination
    /// counterpart. An element that already has one is not rebuilt.
    pub fn process_element(&mut self, element: &Element) -> SyncResult<Element> {
        let root = element.identity()?;
        if self.counterpart(root).is_some() {
            return self.resolved(root);
        }

        let mut pending: HashMap<ElementKey, Element> = HashMap::from([(root, element.clone())]);
        let mut in_progress = HashSet::new();
        let mut stack = vec![Step::Visit(root)];

        while let Some(step) = stack.pop() {
            match step {
                Step::Visit(key) => {
                    if self.counterpart(key).is_some() {
                        continue;
                    }
                    if !in_progress.insert(key) {
                        return Err(SyncError::DependencyCycle(key));
                    }
                    let source = match pending.get(&key) {
                        Some(e) => e.clone(),
                        None => {
                            let fetched = self.fetch(key)?;
                            pending.insert(key, fetched.clone());
                            fetched
                        }
                    };

                    stack.push(Step::Build(key));
                    let dependencies = self.schedule(&source)?;
                    trace!("{} waits for {} dependencies", source, dependencies.len());
                    stack.extend(dependencies.into_iter().rev().map(Step::Visit));
                }
                Step::Build(key) => {
                    let source = pending.remove(&key).ok_or(SyncError::SourceMissing(key))?;
                    self.build(&source)?;
                    in_progress.remove(&key);
                }
            }
        }

        self.resolved(root)
    }

    /// Sorts the relationships of `element` into dependencies to visit now
    /// and associations to queue.
    fn schedule(&mut self, element: &Element) -> SyncResult<Vec<ElementKey>> {
        let mut dependencies = Vec::new();
        for property in element.definition().relationships() {
            let targets = property.targets(element);
            if property.is_required() {
                if property.is_multi_valued() {
                    return Err(SyncError::RequiredMultiValued {
                        element: element.type_name(),
                        property: property.name(),
                    });
                }
                if targets.is_empty() {
                    return Err(SyncError::UnsetDependency {
                        element: element.to_string(),
                        property: property.name(),
                    });
                }
                dependencies.extend(targets);
            } else if property.is_mutable() {
                dependencies.extend(targets);
            } else if property.is_recommended() {
                self.recommended.extend(targets);
            } else {
                self.deferred.extend(targets);
            }
        }
        Ok(dependencies)
    }

    fn build(&mut self, source: &Element) -> SyncResult<Element> {
        let from = source.identity()?;
        let (built, outcome, deferred) = {
            let mut builder = source.builder(&mut *self.destination, &mut *self.table)?;
            let (built, outcome) = builder.build_with_outcome()?;
            (built, outcome, builder.take_deferred())
        };
        let to = built.identity()?;

        match outcome {
            Outcome::Inserted => self.report.inserted += 1,
            Outcome::Adopted => self.report.adopted += 1,
            Outcome::Updated => self.report.updated += 1,
            Outcome::Unchanged => self.report.unchanged += 1,
        }
        self.built.push((from, to));

        if !deferred.is_empty() {
            debug!("{} deferred {} associations", built, deferred.len());
            self.links.register(to, deferred);
        }
        let owners = self.links.complete(from, to, &mut *self.destination)?;
        self.report.links_completed += owners.len();
        self.attached.extend(owners);

        Ok(built)
    }

    /// Processes every element in order, returning their counterparts in
    /// the same order.
    pub fn process_elements<'e>(&mut self, elements: impl IntoIterator<Item = &'e Element>) -> SyncResult<Vec<Element>> {
        elements.into_iter().map(|e| self.process_element(e)).collect()
    }

    /// Works through the queued associations, recommended ones first.
    /// Returns how many elements were built.
    pub fn process_queue(&mut self) -> SyncResult<usize> {
        let mut processed = 0;
        while let Some(key) = self.recommended.pop_front().or_else(|| self.deferred.pop_front()) {
            if self.counterpart(key).is_some() {
                continue;
            }
            let element = self.fetch(key)?;
            self.process_element(&element)?;
            processed += 1;
        }
        Ok(processed)
    }

    /// Drops the queued associations without processing them.
    pub fn clear(&mut self) {
        self.recommended.clear();
        self.deferred.clear();
    }

    /// Drops queued associations and every link still waiting.
    pub(crate) fn reset(&mut self) {
        self.clear();
        self.links.clear();
        self.built.clear();
        self.attached.clear();
    }
}
