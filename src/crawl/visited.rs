// src/crawl/visited.rs
// =============================================================================
// The set of identifiers a crawl has already claimed.
//
// Many crawl tasks run at once and several of them can discover the same page
// at the same moment. `check_and_mark` is the single gate every task passes
// through before fetching: it checks and inserts in one indivisible step, so
// exactly one of the racing tasks wins and the rest back off.
//
// Rust concepts:
// - DashSet: a HashSet split into shards, each behind its own lock
// - Interior mutability: `check_and_mark` takes &self, not &mut self
// =============================================================================

use dashmap::DashSet;
use std::hash::Hash;

#[derive(Debug)]
pub struct VisitedSet<I: Eq + Hash> {
    seen: DashSet<I>,
}

impl<I: Eq + Hash + Clone> VisitedSet<I> {
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
        }
    }

    /// Returns `true` if `id` was already marked (the caller must not proceed),
    /// `false` if this call marked it (the caller owns the visit).
    ///
    /// Marks are never removed, so once this has returned `false` for an id,
    /// every later call for that id returns `true`.
    pub fn check_and_mark(&self, id: &I) -> bool {
        // insert() is insert-if-absent under the shard's write lock
        !self.seen.insert(id.clone())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl<I: Eq + Hash + Clone> Default for VisitedSet<I> {
    fn default() -> Self {
        Self::new()
    }
}
