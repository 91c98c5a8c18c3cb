use serde::Serialize;

use crate::tree::{Node, Treap};

/// One captured node: its key and priority.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SnapshotNode {
    pub key: i64,
    pub priority: f64,
}

/// A parent-to-child relation between two captured nodes, by key.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct SnapshotEdge {
    pub parent: i64,
    pub child: i64,
}

/// The logical contents of a tree at one instant, for an external renderer:
/// `(key, priority)` pairs and parent->child edges, no layout, no drawing.
///
/// Nodes are listed in pre-order, so `nodes[0]` is the root of a non-empty
/// capture.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TreeSnapshot {
    pub nodes: Vec<SnapshotNode>,
    pub edges: Vec<SnapshotEdge>,
}

impl TreeSnapshot {
    pub fn capture(tree: &Treap) -> Self {
        let mut snapshot = Self::default();
        if let Some(root) = tree.root_node() {
            snapshot.walk(root);
        }
        snapshot
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn walk(&mut self, node: &Node) {
        self.nodes.push(SnapshotNode {
            key: node.key,
            priority: node.priority,
        });
        if let Some(left) = node.left.as_deref() {
            self.edges.push(SnapshotEdge {
                parent: node.key,
                child: left.key,
            });
            self.walk(left);
        }
        if let Some(right) = node.right.as_deref() {
            self.edges.push(SnapshotEdge {
                parent: node.key,
                child: right.key,
            });
            self.walk(right);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SnapshotEdge, SnapshotNode, TreeSnapshot};
    use crate::tree::{Orientation, Treap};

    fn sample_tree() -> Treap {
        let mut tree = Treap::new(Orientation::Max);
        for &(key, priority) in &[(50, 0.9), (30, 0.5), (70, 0.7), (20, 0.3), (40, 0.4)] {
            tree.insert(key, priority).unwrap();
        }
        tree
    }

    #[test]
    fn empty_capture() {
        let tree = Treap::new(Orientation::Min);
        let snapshot = TreeSnapshot::capture(&tree);
        assert!(snapshot.is_empty());
        assert!(snapshot.edges.is_empty());
    }

    #[test]
    fn capture_lists_root_first() {
        let snapshot = TreeSnapshot::capture(&sample_tree());

        let keys: Vec<i64> = snapshot.nodes.iter().map(|n| n.key).collect();
        assert_eq!(keys, [50, 30, 20, 40, 70]);
        assert_eq!(
            snapshot.nodes[0],
            SnapshotNode {
                key: 50,
                priority: 0.9
            }
        );

        assert_eq!(
            snapshot.edges,
            [
                SnapshotEdge {
                    parent: 50,
                    child: 30
                },
                SnapshotEdge {
                    parent: 30,
                    child: 20
                },
                SnapshotEdge {
                    parent: 30,
                    child: 40
                },
                SnapshotEdge {
                    parent: 50,
                    child: 70
                },
            ]
        );
    }

    #[test]
    fn edge_count_is_size_minus_one() {
        let snapshot = TreeSnapshot::capture(&sample_tree());
        assert_eq!(snapshot.edges.len(), snapshot.nodes.len() - 1);
    }

    #[test]
    fn serializes_for_the_renderer() {
        let snapshot = TreeSnapshot::capture(&sample_tree());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["nodes"][0]["key"], 50);
        assert_eq!(json["nodes"][0]["priority"], 0.9);
        assert_eq!(json["edges"][0]["parent"], 50);
        assert_eq!(json["edges"][0]["child"], 30);
    }
}
