use crate::dag::NodeId;
use crate::tensor::Scale;

/// Reference to one physical data fragment, exchanged between expansion functions and the engine.
///
/// A chunk does not own its node; the [`PhysicalDag`](crate::dag::PhysicalDag) does. The size is
/// captured when the chunk is created since fragment sizes never change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chunk {
    node_id: NodeId,
    size: Scale,
}

impl Chunk {
    pub(crate) fn new(node_id: NodeId, size: Scale) -> Self {
        Chunk { node_id, size }
    }

    /// Id of the backing physical data node.
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn size(&self) -> &Scale {
        &self.size
    }
}
