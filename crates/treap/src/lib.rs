mod error;
mod oplog;
mod snapshot;
mod tree;

pub use error::TreapError;
pub use oplog::OperationLog;
pub use snapshot::{SnapshotEdge, SnapshotNode, TreeSnapshot};
pub use tree::{Orientation, Treap, TreeStats, random_priority};
