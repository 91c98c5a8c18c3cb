//! Keyed store of live treaps for multi-session orchestration.
//!
//! The surrounding application maps opaque identifiers to trees; this
//! crate makes that mapping an explicit value owned by the caller. There
//! is no global instance: whoever drives the core constructs a
//! [`TreapStore`] and threads it through. Access is exclusive and
//! sequential, matching the engine's single-threaded design.

use std::collections::HashMap;
use std::fmt;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sort::{SortMethod, SortRun, sort_keys};
use treap::{Orientation, Treap, TreapError, TreeSnapshot, TreeStats};

/// Opaque handle for one stored tree.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeId(u64);

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("tree {0} not found")]
    TreeNotFound(TreeId),
    #[error(transparent)]
    Treap(#[from] TreapError),
}

/// Maps identifiers to live trees.
pub struct TreapStore {
    trees: HashMap<TreeId, Treap>,
    rng: StdRng,
}

impl TreapStore {
    pub fn new() -> Self {
        Self {
            trees: HashMap::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic identifier sequence, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            trees: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Creates an empty tree with the given orientation and returns its
    /// identifier.
    pub fn create(&mut self, orientation: Orientation) -> TreeId {
        let id = loop {
            let candidate = TreeId(self.rng.random());
            if !self.trees.contains_key(&candidate) {
                break candidate;
            }
        };
        self.trees.insert(id, Treap::new(orientation));
        info!("created tree {id} ({orientation:?})");
        id
    }

    /// Drops one tree and everything it owns. Returns whether it existed.
    pub fn remove_tree(&mut self, id: TreeId) -> bool {
        let removed = self.trees.remove(&id).is_some();
        if removed {
            info!("removed tree {id}");
        }
        removed
    }

    pub fn insert(&mut self, id: TreeId, key: i64, priority: f64) -> Result<bool, StoreError> {
        Ok(self.tree_mut(id)?.insert(key, priority)?)
    }

    pub fn search(&mut self, id: TreeId, key: i64) -> Result<Option<f64>, StoreError> {
        Ok(self.tree_mut(id)?.search(key))
    }

    pub fn delete(&mut self, id: TreeId, key: i64) -> Result<bool, StoreError> {
        Ok(self.tree_mut(id)?.delete(key))
    }

    pub fn stats(&self, id: TreeId) -> Result<TreeStats, StoreError> {
        Ok(self.tree(id)?.stats())
    }

    /// Read-only snapshot of the tree's operation log.
    pub fn log(&self, id: TreeId) -> Result<&[String], StoreError> {
        Ok(self.tree(id)?.log().entries())
    }

    /// Current contents as node/edge descriptors for the renderer.
    pub fn snapshot(&self, id: TreeId) -> Result<TreeSnapshot, StoreError> {
        Ok(TreeSnapshot::capture(self.tree(id)?))
    }

    /// Runs extraction sort over the tree, draining it and returning the
    /// removed keys plus one structural descriptor per deletion step.
    pub fn extraction_sort(&mut self, id: TreeId) -> Result<SortRun, StoreError> {
        Ok(sort_keys(SortMethod::RootExtraction, self.tree_mut(id)?))
    }

    fn tree(&self, id: TreeId) -> Result<&Treap, StoreError> {
        self.trees.get(&id).ok_or(StoreError::TreeNotFound(id))
    }

    fn tree_mut(&mut self, id: TreeId) -> Result<&mut Treap, StoreError> {
        self.trees.get_mut(&id).ok_or(StoreError::TreeNotFound(id))
    }
}

impl Default for TreapStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreError, TreapStore, TreeId};
    use treap::Orientation;

    fn store() -> TreapStore {
        TreapStore::with_seed(0x5EED_2026)
    }

    #[test]
    fn create_and_query_round_trip() {
        let mut store = store();
        let id = store.create(Orientation::Max);

        assert_eq!(store.insert(id, 50, 0.9).unwrap(), true);
        assert_eq!(store.insert(id, 30, 0.5).unwrap(), true);
        assert_eq!(store.insert(id, 30, 0.7).unwrap(), false);
        assert_eq!(store.search(id, 30).unwrap(), Some(0.5));
        assert_eq!(store.search(id, 99).unwrap(), None);

        let stats = store.stats(id).unwrap();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.orientation, Orientation::Max);

        assert!(store.delete(id, 30).unwrap());
        assert!(!store.delete(id, 30).unwrap());
    }

    #[test]
    fn unknown_id_is_an_error() {
        let mut store = store();
        let bogus = {
            let id = store.create(Orientation::Min);
            store.remove_tree(id);
            id
        };

        assert!(matches!(
            store.insert(bogus, 1, 0.5),
            Err(StoreError::TreeNotFound(_))
        ));
        assert!(matches!(
            store.stats(bogus),
            Err(StoreError::TreeNotFound(_))
        ));
        assert!(matches!(
            store.extraction_sort(bogus),
            Err(StoreError::TreeNotFound(_))
        ));
    }

    #[test]
    fn invalid_priority_passes_through() {
        let mut store = store();
        let id = store.create(Orientation::Max);
        assert!(matches!(
            store.insert(id, 1, 1.0),
            Err(StoreError::Treap(_))
        ));
        assert_eq!(store.stats(id).unwrap().size, 0);
    }

    #[test]
    fn trees_are_independent() {
        let mut store = store();
        let a = store.create(Orientation::Max);
        let b = store.create(Orientation::Min);
        assert_ne!(a, b);

        store.insert(a, 1, 0.5).unwrap();
        store.insert(b, 2, 0.5).unwrap();

        assert_eq!(store.search(a, 2).unwrap(), None);
        assert_eq!(store.search(b, 1).unwrap(), None);
        assert_eq!(store.stats(a).unwrap().size, 1);
        assert_eq!(store.stats(b).unwrap().size, 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn log_reflects_every_call_on_that_tree() {
        let mut store = store();
        let id = store.create(Orientation::Max);

        store.insert(id, 5, 0.4).unwrap();
        store.search(id, 5).unwrap();
        store.delete(id, 5).unwrap();

        let log = store.log(id).unwrap();
        assert_eq!(log.len(), 3);
        assert!(log[0].starts_with("insert:"));
        assert!(log[1].starts_with("search:"));
        assert!(log[2].starts_with("delete:"));
    }

    #[test]
    fn extraction_sort_drains_the_stored_tree() {
        let mut store = store();
        let id = store.create(Orientation::Max);
        for (key, priority) in [(3, 0.3), (1, 0.8), (2, 0.5)] {
            store.insert(id, key, priority).unwrap();
        }

        let run = store.extraction_sort(id).unwrap();
        assert_eq!(run.sorted_keys.len(), 3);
        assert_eq!(run.steps.len(), 3);
        assert_eq!(store.stats(id).unwrap().size, 0);

        // The tree stays registered for further use.
        assert!(store.insert(id, 7, 0.7).unwrap());
    }

    #[test]
    fn snapshot_exposes_structure_without_mutating() {
        let mut store = store();
        let id = store.create(Orientation::Max);
        store.insert(id, 50, 0.9).unwrap();
        store.insert(id, 30, 0.5).unwrap();

        let snapshot = store.snapshot(id).unwrap();
        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.nodes[0].key, 50);
        assert_eq!(snapshot.edges.len(), 1);
        assert_eq!(store.stats(id).unwrap().size, 2);
    }

    #[test]
    fn ids_render_as_hex() {
        let rendered = TreeId(0xDEAD_BEEF).to_string();
        assert_eq!(rendered, "00000000deadbeef");
    }
}
