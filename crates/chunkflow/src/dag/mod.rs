//! Logical and physical dataflow graphs.
//!
//! The logical graph describes tensors and operations without committing to a partitioning. The
//! physical graph holds the fragments ("chunks") and per-fragment operations produced when the
//! logical graph is expanded. Node ids come from a single process-wide counter so a logical id is
//! never confused with a physical one.

use std::sync::atomic::{AtomicU64, Ordering};

mod logical;
mod physical;

pub use logical::{LogicalDag, LogicalData, LogicalNode, LogicalNodeKind, LogicalOp};
pub use physical::{PhysicalDag, PhysicalData, PhysicalNode, PhysicalNodeKind, PhysicalOp};

/// Process-unique node identifier, immutable once assigned.
pub type NodeId = u64;

static NODE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

pub(crate) fn next_node_id() -> NodeId {
    NODE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Appends `id` to `list` unless already present, keeping insertion order.
pub(crate) fn push_unique(list: &mut Vec<NodeId>, id: NodeId) {
    if !list.contains(&id) {
        list.push(id);
    }
}
