//! Module: migration
//! Responsibility: resolve an ordered list of registered migrations between
//! two schema versions.
//! Does not own: executing scripts (see `Database::migrate`).
//!
//! Invariants:
//! - Resolution is pure and completes before any script runs.
//! - Each step moves strictly towards the target and never past it.
//! - Among qualifying edges the walk takes the longest hop.


use crate::error::MigrationResolutionError;
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

///
/// Migration
///

pub struct Migration<S> {
    start: u32,
    end: u32,
    script: S,
}

impl<S> Migration<S> {
    #[must_use]
    pub const fn new(start: u32, end: u32, script: S) -> Self {
        Self { start, end, script }
    }

    #[must_use]
    pub const fn start(&self) -> u32 {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> u32 {
        self.end
    }

    #[must_use]
    pub const fn script(&self) -> &S {
        &self.script
    }

    #[must_use]
    pub const fn is_upgrade(&self) -> bool {
        self.end > self.start
    }
}

impl<S> fmt::Debug for Migration<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Migration({} -> {})", self.start, self.end)
    }
}

///
/// MigrationIndex
///
/// Migrations keyed by start version, then by end version.
///

pub struct MigrationIndex<S> {
    edges: HashMap<u32, BTreeMap<u32, Migration<S>>>,
}

impl<S> MigrationIndex<S> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            edges: HashMap::new(),
        }
    }

    /// Register a migration. A later registration for the same
    /// (start, end) pair replaces the earlier one.
    pub fn add_migration(&mut self, start: u32, end: u32, script: S) {
        self.edges
            .entry(start)
            .or_default()
            .insert(end, Migration::new(start, end, script));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Greedy walk from `start` to `end`.
    pub fn find_path(&self, start: u32, end: u32) -> Result<Vec<&Migration<S>>, MigrationResolutionError> {
        let mut path = Vec::new();
        let mut current = start;

        while current != end {
            let next = self.edges.get(&current).and_then(|targets| {
                if end > current {
                    // largest target in (current, end]
                    targets.range(current + 1..=end).next_back()
                } else {
                    // smallest target in [end, current)
                    targets.range(end..current).next()
                }
            });

            let Some((&target, migration)) = next else {
                return Err(MigrationResolutionError {
                    start,
                    end,
                    stuck_at: current,
                });
            };

            path.push(migration);
            current = target;
        }

        Ok(path)
    }
}

impl<S> Default for MigrationIndex<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for MigrationIndex<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut edges: Vec<_> = self
            .edges
            .values()
            .flat_map(BTreeMap::values)
            .map(|m| (m.start, m.end))
            .collect();
        edges.sort_unstable();

        f.debug_struct("MigrationIndex").field("edges", &edges).finish()
    }
}
