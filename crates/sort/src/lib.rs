//! Sorting demonstrations read off a treap.
//!
//! Two methods exist. [`SortMethod::InOrder`] reads the in-order traversal
//! and is genuinely ascending by key. [`SortMethod::RootExtraction`]
//! repeatedly deletes the current root: its output is a permutation of the
//! key set in heap-dominance order, which coincides with key order only
//! when priorities were assigned in key-rank order.

use log::debug;
use rand::Rng;
use serde::Serialize;
use treap::{Orientation, Treap, TreapError, TreeSnapshot, random_priority};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum SortMethod {
    /// Read the keys off the in-order traversal.
    InOrder,
    /// Repeatedly delete the root and record it.
    RootExtraction,
}

pub const ALL_METHODS: [SortMethod; 2] = [SortMethod::InOrder, SortMethod::RootExtraction];

pub fn method_name(method: SortMethod) -> &'static str {
    match method {
        SortMethod::InOrder => "in_order",
        SortMethod::RootExtraction => "root_extraction",
    }
}

/// How insertion priorities are assigned when building a tree from keys.
#[derive(Clone, Debug)]
pub enum PriorityMode {
    /// Draw every priority at random from (0, 1).
    Auto,
    /// Use the given priorities positionally; missing ones are drawn at
    /// random, surplus ones are ignored.
    Manual(Vec<f64>),
}

/// One deletion event of an extraction run.
#[derive(Clone, Debug, Serialize)]
pub struct ExtractionStep {
    pub removed_key: i64,
    /// Contents right after the removal, for the renderer.
    pub snapshot: TreeSnapshot,
}

/// Outcome of one sorting run over a tree.
#[derive(Clone, Debug, Serialize)]
pub struct SortRun {
    pub method: SortMethod,
    /// Keys in the order the method produced them. For
    /// [`SortMethod::RootExtraction`] this is heap-dominance order, not
    /// key order.
    pub sorted_keys: Vec<i64>,
    /// Contents before the first removal.
    pub initial: TreeSnapshot,
    pub steps: Vec<ExtractionStep>,
    /// Key comparisons spent by the run itself.
    pub comparisons: u64,
    pub deletions: usize,
}

/// Builds a treap by inserting `keys` in the given order.
///
/// Duplicate keys are rejected by the engine (and logged there) without
/// failing the build. A manual priority outside (0, 1) aborts with
/// [`TreapError::InvalidPriority`].
pub fn build_treap<R: Rng + ?Sized>(
    keys: &[i64],
    mode: &PriorityMode,
    orientation: Orientation,
    rng: &mut R,
) -> Result<Treap, TreapError> {
    let mut tree = Treap::new(orientation);
    for (index, &key) in keys.iter().enumerate() {
        let priority = match mode {
            PriorityMode::Auto => random_priority(rng),
            PriorityMode::Manual(priorities) => priorities
                .get(index)
                .copied()
                .unwrap_or_else(|| random_priority(rng)),
        };
        tree.insert(key, priority)?;
    }
    Ok(tree)
}

/// Runs `method` over `tree`, resetting the comparison counter first so
/// the reported count covers only this run.
pub fn sort_keys(method: SortMethod, tree: &mut Treap) -> SortRun {
    tree.reset_comparisons();
    match method {
        SortMethod::InOrder => in_order_read(tree),
        SortMethod::RootExtraction => extraction_sort(tree),
    }
}

fn in_order_read(tree: &mut Treap) -> SortRun {
    let before = tree.comparisons();
    let sorted_keys = tree.inorder().into_iter().map(|(key, _)| key).collect();
    SortRun {
        method: SortMethod::InOrder,
        sorted_keys,
        initial: TreeSnapshot::capture(tree),
        steps: Vec::new(),
        comparisons: tree.comparisons() - before,
        deletions: 0,
    }
}

/// Repeatedly reads the current root's key, deletes it, and records the
/// key plus a post-deletion snapshot, until the tree is empty. The output
/// length equals the starting size and the keys are a permutation of the
/// original key set.
pub fn extraction_sort(tree: &mut Treap) -> SortRun {
    let before = tree.comparisons();
    let initial = TreeSnapshot::capture(tree);
    let mut sorted_keys = Vec::new();
    let mut steps = Vec::new();

    while let Some((key, _)) = tree.root_entry() {
        tree.delete(key);
        sorted_keys.push(key);
        steps.push(ExtractionStep {
            removed_key: key,
            snapshot: TreeSnapshot::capture(tree),
        });
    }

    debug!("extraction sort removed {} keys", sorted_keys.len());
    let deletions = sorted_keys.len();
    SortRun {
        method: SortMethod::RootExtraction,
        sorted_keys,
        initial,
        steps,
        comparisons: tree.comparisons() - before,
        deletions,
    }
}
