//! Partitioned realization of a logical graph.
//!
//! Physical nodes are created by data-generation and compute functions while the logical graph is
//! expanded. The graph is internally synchronized so it can be shared by reference with those
//! functions and across threads.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{ExpandError, ExpandResult};
use crate::ops::Chunk;
use crate::tensor::Scale;

use super::{next_node_id, push_unique, NodeId};

/// Payload of a physical data node: one fragment of a logical tensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalData {
    pub size: Scale,
    /// Start of this fragment inside its logical parent tensor.
    pub offset: Scale,
    /// Coordinate of this fragment inside the partition grid.
    pub offset_index: Scale,
    /// Name of the function that produced the fragment, for diagnostics.
    pub origin: Option<String>,
}

impl PhysicalData {
    pub fn new(size: Scale) -> Self {
        let num_dims = size.num_dims();
        PhysicalData {
            size,
            offset: Scale::origin(num_dims),
            offset_index: Scale::origin(num_dims),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Payload of a physical operation node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalOp {
    pub name: String,
}

impl PhysicalOp {
    pub fn new(name: impl Into<String>) -> Self {
        PhysicalOp { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhysicalNodeKind {
    Data(PhysicalData),
    Op(PhysicalOp),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalNode {
    pub id: NodeId,
    pub predecessors: Vec<NodeId>,
    pub successors: Vec<NodeId>,
    pub kind: PhysicalNodeKind,
}

#[derive(Default)]
struct PhysicalInner {
    nodes: HashMap<NodeId, PhysicalNode>,
    order: Vec<NodeId>,
}

impl PhysicalInner {
    fn insert(&mut self, kind: PhysicalNodeKind) -> NodeId {
        let id = next_node_id();
        self.nodes.insert(
            id,
            PhysicalNode {
                id,
                predecessors: Vec::new(),
                successors: Vec::new(),
                kind,
            },
        );
        self.order.push(id);
        id
    }

    fn data_mut(&mut self, id: NodeId) -> ExpandResult<&mut PhysicalData> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(ExpandError::UnknownPhysicalNode { id })?;
        match &mut node.kind {
            PhysicalNodeKind::Data(data) => Ok(data),
            PhysicalNodeKind::Op(_) => Err(ExpandError::NotADataNode { id }),
        }
    }

    fn connect(&mut self, from: NodeId, to: NodeId) {
        if let Some(node) = self.nodes.get_mut(&from) {
            push_unique(&mut node.successors, to);
        }
        if let Some(node) = self.nodes.get_mut(&to) {
            push_unique(&mut node.predecessors, from);
        }
    }
}

/// Owner of every physical node.
#[derive(Default)]
pub struct PhysicalDag {
    inner: Mutex<PhysicalInner>,
}

impl PhysicalDag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_data_node(&self, data: PhysicalData) -> NodeId {
        let mut inner = self.inner.lock().expect("physical dag poisoned");
        inner.insert(PhysicalNodeKind::Data(data))
    }

    /// Creates a data node and returns a chunk referencing it.
    pub fn new_chunk(&self, data: PhysicalData) -> Chunk {
        let size = data.size.clone();
        Chunk::new(self.new_data_node(data), size)
    }

    /// Adds an operation reading `inputs` and writing `outputs`, both existing data nodes.
    pub fn new_op_node(
        &self,
        op: PhysicalOp,
        inputs: &[NodeId],
        outputs: &[NodeId],
    ) -> ExpandResult<NodeId> {
        let mut inner = self.inner.lock().expect("physical dag poisoned");
        for &id in inputs.iter().chain(outputs) {
            inner.data_mut(id)?;
        }
        let op_id = inner.insert(PhysicalNodeKind::Op(op));
        for &input in inputs {
            inner.connect(input, op_id);
        }
        for &output in outputs {
            inner.connect(op_id, output);
        }
        Ok(op_id)
    }

    pub fn node(&self, id: NodeId) -> ExpandResult<PhysicalNode> {
        let inner = self.inner.lock().expect("physical dag poisoned");
        inner
            .nodes
            .get(&id)
            .cloned()
            .ok_or(ExpandError::UnknownPhysicalNode { id })
    }

    pub fn data(&self, id: NodeId) -> ExpandResult<PhysicalData> {
        let mut inner = self.inner.lock().expect("physical dag poisoned");
        inner.data_mut(id).map(|data| data.clone())
    }

    /// Wraps the data node `id` in a chunk.
    pub fn chunk(&self, id: NodeId) -> ExpandResult<Chunk> {
        let mut inner = self.inner.lock().expect("physical dag poisoned");
        let size = inner.data_mut(id)?.size.clone();
        Ok(Chunk::new(id, size))
    }

    /// Records where the fragment `id` sits inside its logical parent.
    pub fn set_placement(
        &self,
        id: NodeId,
        offset: Scale,
        offset_index: Scale,
    ) -> ExpandResult<()> {
        self.set_placements([(id, offset, offset_index)])
    }

    /// Records `(id, offset, offset_index)` for several fragments under one lock.
    ///
    /// Every id is checked before anything is written, so on error no fragment has moved.
    pub fn set_placements<I>(&self, placements: I) -> ExpandResult<()>
    where
        I: IntoIterator<Item = (NodeId, Scale, Scale)>,
    {
        let placements: Vec<_> = placements.into_iter().collect();
        let mut inner = self.inner.lock().expect("physical dag poisoned");
        for (id, _, _) in &placements {
            inner.data_mut(*id)?;
        }
        for (id, offset, offset_index) in placements {
            let data = inner.data_mut(id)?;
            data.offset = offset;
            data.offset_index = offset_index;
        }
        Ok(())
    }

    pub fn predecessors(&self, id: NodeId) -> ExpandResult<Vec<NodeId>> {
        Ok(self.node(id)?.predecessors)
    }

    pub fn successors(&self, id: NodeId) -> ExpandResult<Vec<NodeId>> {
        Ok(self.node(id)?.successors)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        let inner = self.inner.lock().expect("physical dag poisoned");
        inner.nodes.contains_key(&id)
    }

    /// Node ids in creation order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let inner = self.inner.lock().expect("physical dag poisoned");
        inner.order.clone()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().expect("physical dag poisoned");
        inner.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_data_nodes(&self) -> usize {
        self.count(|kind| matches!(kind, PhysicalNodeKind::Data(_)))
    }

    pub fn num_op_nodes(&self) -> usize {
        self.count(|kind| matches!(kind, PhysicalNodeKind::Op(_)))
    }

    fn count<F>(&self, pred: F) -> usize
    where
        F: Fn(&PhysicalNodeKind) -> bool,
    {
        let inner = self.inner.lock().expect("physical dag poisoned");
        inner.nodes.values().filter(|node| pred(&node.kind)).count()
    }
}
