use std::cmp::Ordering;

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TreapError;
use crate::oplog::OperationLog;

/// Heap orientation of a tree, fixed at construction.
///
/// `Max` keeps higher priorities closer to the root, `Min` keeps lower
/// ones there.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Orientation {
    Max,
    Min,
}

impl Orientation {
    /// True when priority `a` is heap-dominant over `b`.
    fn beats(self, a: f64, b: f64) -> bool {
        match self {
            Orientation::Max => a > b,
            Orientation::Min => a < b,
        }
    }
}

type Link = Option<Box<Node>>;

#[derive(Clone)]
pub(crate) struct Node {
    pub(crate) key: i64,
    pub(crate) priority: f64,
    pub(crate) left: Link,
    pub(crate) right: Link,
}

impl Node {
    fn new(key: i64, priority: f64) -> Self {
        Self {
            key,
            priority,
            left: None,
            right: None,
        }
    }
}

/// Aggregate view of a tree: orientation, node count, height, and the
/// in-order (key-ascending) element list.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreeStats {
    pub orientation: Orientation,
    pub size: usize,
    pub height: usize,
    pub elements: Vec<(i64, f64)>,
}

/// Randomized balanced search tree: a BST over keys that simultaneously
/// keeps a heap ordering over per-node priorities, repaired by rotations.
///
/// Keys are unique; priorities lie strictly inside (0, 1). Recursive walks
/// are bounded by the tree height, which stays O(log n) in expectation for
/// random priorities but can reach O(n) under adversarial assignment.
#[derive(Clone)]
pub struct Treap {
    root: Link,
    orientation: Orientation,
    log: OperationLog,
    comparisons: u64,
}

impl Treap {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            root: None,
            orientation,
            log: OperationLog::default(),
            comparisons: 0,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of stored entries, counted by full traversal.
    pub fn len(&self) -> usize {
        fn count(node: &Link) -> usize {
            node.as_ref()
                .map_or(0, |n| 1 + count(&n.left) + count(&n.right))
        }
        count(&self.root)
    }

    /// Height counted in nodes: 0 for an empty tree, 1 for a single node.
    pub fn height(&self) -> usize {
        fn depth(node: &Link) -> usize {
            node.as_ref()
                .map_or(0, |n| 1 + depth(&n.left).max(depth(&n.right)))
        }
        depth(&self.root)
    }

    /// Key and priority of the current root, if any.
    pub fn root_entry(&self) -> Option<(i64, f64)> {
        self.root.as_deref().map(|n| (n.key, n.priority))
    }

    /// Inserts `key` with `priority`.
    ///
    /// Returns `Ok(true)` on success and `Ok(false)` when the key is
    /// already present (the stored priority is kept and the rejection is
    /// logged). A priority outside (0, 1) fails with
    /// [`TreapError::InvalidPriority`] before anything is touched.
    pub fn insert(&mut self, key: i64, priority: f64) -> Result<bool, TreapError> {
        if !(priority > 0.0 && priority < 1.0) {
            return Err(TreapError::InvalidPriority(priority));
        }

        let root = self.root.take();
        let (root, inserted) = self.insert_at(root, key, priority);
        self.root = root;

        debug!("insert key={key} priority={priority:.2} inserted={inserted}");
        if inserted {
            self.log
                .push(format!("insert: key={key}, priority={priority:.2} -> ok"));
        } else {
            self.log
                .push(format!("insert: key={key} -> rejected, key already present"));
        }
        debug_assert!(self.invariants_hold());
        Ok(inserted)
    }

    /// Attaches the new leaf by BST descent, then repairs the heap order on
    /// the way back up: one rotation at each ancestor whose freshly grown
    /// side beats it.
    fn insert_at(&mut self, node: Link, key: i64, priority: f64) -> (Link, bool) {
        let Some(mut node) = node else {
            return (Some(Box::new(Node::new(key, priority))), true);
        };

        self.comparisons += 1;
        match key.cmp(&node.key) {
            Ordering::Equal => (Some(node), false),
            Ordering::Less => {
                let (left, inserted) = self.insert_at(node.left.take(), key, priority);
                node.left = left;
                if inserted && self.child_beats(&node.left, node.priority) {
                    node = rotate_right(node);
                }
                (Some(node), inserted)
            }
            Ordering::Greater => {
                let (right, inserted) = self.insert_at(node.right.take(), key, priority);
                node.right = right;
                if inserted && self.child_beats(&node.right, node.priority) {
                    node = rotate_left(node);
                }
                (Some(node), inserted)
            }
        }
    }

    /// Looks up `key` and returns its priority.
    ///
    /// Never changes the structure, but does append the outcome to the
    /// operation log and advance the comparison counter, hence `&mut self`.
    pub fn search(&mut self, key: i64) -> Option<f64> {
        let mut found = None;
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            self.comparisons += 1;
            match key.cmp(&node.key) {
                Ordering::Less => cur = node.left.as_deref(),
                Ordering::Greater => cur = node.right.as_deref(),
                Ordering::Equal => {
                    found = Some(node.priority);
                    break;
                }
            }
        }

        debug!("search key={key} found={}", found.is_some());
        match found {
            Some(priority) => self
                .log
                .push(format!("search: key={key} -> found, priority={priority:.2}")),
            None => self.log.push(format!("search: key={key} -> not found")),
        }
        found
    }

    /// Removes `key`, returning whether it was present.
    pub fn delete(&mut self, key: i64) -> bool {
        let root = self.root.take();
        let (root, deleted) = self.delete_at(root, key);
        self.root = root;

        debug!("delete key={key} deleted={deleted}");
        if deleted {
            self.log.push(format!("delete: key={key} -> ok"));
        } else {
            self.log.push(format!("delete: key={key} -> not found"));
        }
        debug_assert!(self.invariants_hold());
        deleted
    }

    fn delete_at(&mut self, node: Link, key: i64) -> (Link, bool) {
        let Some(mut node) = node else {
            return (None, false);
        };

        self.comparisons += 1;
        match key.cmp(&node.key) {
            Ordering::Less => {
                let (left, deleted) = self.delete_at(node.left.take(), key);
                node.left = left;
                (Some(node), deleted)
            }
            Ordering::Greater => {
                let (right, deleted) = self.delete_at(node.right.take(), key);
                node.right = right;
                (Some(node), deleted)
            }
            Ordering::Equal => self.remove_node(node, key),
        }
    }

    /// A leaf or one-child target is spliced out directly. With two
    /// children the target is rotated one level down toward the
    /// heap-dominant child and chased into that subtree, repeating until
    /// the splice case is reached.
    fn remove_node(&mut self, mut node: Box<Node>, key: i64) -> (Link, bool) {
        let left_priority = node.left.as_ref().map(|n| n.priority);
        let right_priority = node.right.as_ref().map(|n| n.priority);
        match (left_priority, right_priority) {
            (None, _) => (node.right.take(), true),
            (_, None) => (node.left.take(), true),
            (Some(lp), Some(rp)) => {
                if self.orientation.beats(lp, rp) {
                    node = rotate_right(node);
                    let (right, deleted) = self.delete_at(node.right.take(), key);
                    node.right = right;
                    debug_assert!(self.junction_ok(&node));
                    (Some(node), deleted)
                } else {
                    node = rotate_left(node);
                    let (left, deleted) = self.delete_at(node.left.take(), key);
                    node.left = left;
                    debug_assert!(self.junction_ok(&node));
                    (Some(node), deleted)
                }
            }
        }
    }

    /// In-order traversal: all `(key, priority)` entries in ascending key
    /// order, regardless of priorities or orientation. O(size) time,
    /// O(height) call stack.
    pub fn inorder(&self) -> Vec<(i64, f64)> {
        fn walk(node: &Link, out: &mut Vec<(i64, f64)>) {
            if let Some(node) = node {
                walk(&node.left, out);
                out.push((node.key, node.priority));
                walk(&node.right, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }

    pub fn stats(&self) -> TreeStats {
        TreeStats {
            orientation: self.orientation,
            size: self.len(),
            height: self.height(),
            elements: self.inorder(),
        }
    }

    /// Audit trail of every insert/search/delete call so far.
    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    /// Key comparisons performed since construction or the last reset; one
    /// per node visited during an insert/search/delete descent.
    pub fn comparisons(&self) -> u64 {
        self.comparisons
    }

    pub fn reset_comparisons(&mut self) {
        self.comparisons = 0;
    }

    pub(crate) fn root_node(&self) -> Option<&Node> {
        self.root.as_deref()
    }

    fn child_beats(&self, child: &Link, parent_priority: f64) -> bool {
        child
            .as_ref()
            .is_some_and(|c| self.orientation.beats(c.priority, parent_priority))
    }

    /// Heap order holds locally at `node` once the deletion below it has
    /// finished.
    fn junction_ok(&self, node: &Node) -> bool {
        !self.child_beats(&node.left, node.priority)
            && !self.child_beats(&node.right, node.priority)
    }

    /// Full check of the BST order, the heap order under the configured
    /// orientation, and the priority domain.
    fn invariants_hold(&self) -> bool {
        fn check(node: &Link, lo: Option<i64>, hi: Option<i64>, orientation: Orientation) -> bool {
            let Some(node) = node else {
                return true;
            };
            if lo.is_some_and(|lo| node.key <= lo) || hi.is_some_and(|hi| node.key >= hi) {
                return false;
            }
            if !(node.priority > 0.0 && node.priority < 1.0) {
                return false;
            }
            let beaten = [&node.left, &node.right].into_iter().any(|child| {
                child
                    .as_ref()
                    .is_some_and(|c| orientation.beats(c.priority, node.priority))
            });
            if beaten {
                return false;
            }
            check(&node.left, lo, Some(node.key), orientation)
                && check(&node.right, Some(node.key), hi, orientation)
        }
        check(&self.root, None, None, self.orientation)
    }
}

/// Promotes the left child over `root`, reattaching its right subtree as
/// `root`'s new left. BST order is preserved by construction; callers pick
/// the rotation point so a single violating junction gets repaired.
fn rotate_right(mut root: Box<Node>) -> Box<Node> {
    let mut left = match root.left.take() {
        Some(node) => node,
        None => return root,
    };
    root.left = left.right.take();
    left.right = Some(root);
    left
}

/// Mirror of [`rotate_right`] for the right child.
fn rotate_left(mut root: Box<Node>) -> Box<Node> {
    let mut right = match root.right.take() {
        Some(node) => node,
        None => return root,
    };
    root.right = right.left.take();
    right.left = Some(root);
    right
}

/// Draws a priority strictly inside (0, 1).
pub fn random_priority<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let p: f64 = rng.random();
        if p > 0.0 {
            return p;
        }
    }
}
