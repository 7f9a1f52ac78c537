//! Identifier assignment strategies.

use edm_types::ElementId;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;

/// Hands out element identifiers for a store.
///
/// Generators only promise not to repeat themselves; the store skips ids
/// that are already in use.
pub trait IdGenerator: fmt::Debug + Send {
    fn next_id(&mut self, proposed: Option<ElementId>) -> ElementId;
}

/// Counts up from 1.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    last: u64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continues after `last`.
    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self, _proposed: Option<ElementId>) -> ElementId {
        self.last += 1;
        ElementId::new(self.last)
    }
}

/// Random non-negative ids that never repeat.
#[derive(Debug, Default)]
pub struct RandomIdGenerator {
    issued: HashSet<u64>,
}

impl RandomIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for RandomIdGenerator {
    fn next_id(&mut self, _proposed: Option<ElementId>) -> ElementId {
        let mut rng = rand::thread_rng();
        loop {
            let raw = rng.gen_range(0..=i64::MAX as u64);
            if self.issued.insert(raw) {
                return ElementId::new(raw);
            }
        }
    }
}

/// Keeps the proposed id so copies share ids with their source.
///
/// Falls back to a sequential id when nothing is proposed.
#[derive(Debug, Default)]
pub struct PassThruIdGenerator {
    fallback: SequentialIdGenerator,
}

impl PassThruIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for PassThruIdGenerator {
    fn next_id(&mut self, proposed: Option<ElementId>) -> ElementId {
        match proposed {
            Some(id) => id,
            None => self.fallback.next_id(None),
        }
    }
}
