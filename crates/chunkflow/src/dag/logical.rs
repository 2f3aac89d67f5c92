//! Partition-agnostic description of tensors and the operations between them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ExpandError, ExpandResult};
use crate::ops::{LogicalComputeFn, LogicalDataGenFn};
use crate::tensor::{partition, NVector, PartInfo, Scale};

use super::{next_node_id, push_unique, NodeId};

/// Payload of a logical data node.
#[derive(Clone)]
pub struct LogicalData {
    /// Declared size of the whole tensor.
    pub size: Scale,
    /// How the tensor is subdivided, one descriptor per grid cell.
    pub partitions: NVector<PartInfo>,
    /// Generator for nodes that are not produced by an operation.
    pub data_gen_fn: Option<Arc<dyn LogicalDataGenFn>>,
}

impl LogicalData {
    pub fn new(size: Scale, partitions: NVector<PartInfo>) -> Self {
        LogicalData {
            size,
            partitions,
            data_gen_fn: None,
        }
    }

    /// Data node kept whole (one partition).
    pub fn unpartitioned(size: Scale) -> Self {
        let partitions = partition::single(&size);
        Self::new(size, partitions)
    }

    /// Data node split evenly into `num_parts` cells per axis.
    pub fn split(size: Scale, num_parts: &Scale) -> Self {
        let partitions = partition::even(&size, num_parts);
        Self::new(size, partitions)
    }

    pub fn with_gen_fn(mut self, data_gen_fn: Arc<dyn LogicalDataGenFn>) -> Self {
        self.data_gen_fn = Some(data_gen_fn);
        self
    }

    /// Per-partition sizes requested from the generator.
    pub fn part_sizes(&self) -> NVector<Scale> {
        partition::part_sizes(&self.partitions)
    }
}

impl fmt::Debug for LogicalData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicalData")
            .field("size", &self.size)
            .field("grid", self.partitions.size())
            .field("data_gen_fn", &self.data_gen_fn.as_ref().map(|g| g.name()))
            .finish()
    }
}

/// Payload of a logical operation node.
#[derive(Clone)]
pub struct LogicalOp {
    pub compute_fn: Option<Arc<dyn LogicalComputeFn>>,
    pub inputs: Vec<NodeId>,
    pub outputs: Vec<NodeId>,
}

impl fmt::Debug for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicalOp")
            .field("compute_fn", &self.compute_fn.as_ref().map(|c| c.name()))
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum LogicalNodeKind {
    Data(LogicalData),
    Op(LogicalOp),
}

#[derive(Debug, Clone)]
pub struct LogicalNode {
    id: NodeId,
    predecessors: Vec<NodeId>,
    successors: Vec<NodeId>,
    kind: LogicalNodeKind,
}

impl LogicalNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn predecessors(&self) -> &[NodeId] {
        &self.predecessors
    }

    pub fn successors(&self) -> &[NodeId] {
        &self.successors
    }

    pub fn kind(&self) -> &LogicalNodeKind {
        &self.kind
    }
}

/// Logical graph. Built by the caller, then read-only during expansion.
#[derive(Debug, Default)]
pub struct LogicalDag {
    nodes: HashMap<NodeId, LogicalNode>,
    order: Vec<NodeId>,
}

impl LogicalDag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_data_node(&mut self, data: LogicalData) -> NodeId {
        self.insert(LogicalNodeKind::Data(data))
    }

    /// Adds an operation reading `inputs` and producing `outputs`, both existing data nodes.
    /// Records the edges `input -> op -> output`.
    pub fn new_op_node(
        &mut self,
        inputs: &[NodeId],
        outputs: &[NodeId],
        compute_fn: Option<Arc<dyn LogicalComputeFn>>,
    ) -> ExpandResult<NodeId> {
        for &id in inputs.iter().chain(outputs) {
            self.data(id)?;
        }
        let op = LogicalOp {
            compute_fn,
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
        };
        let op_id = self.insert(LogicalNodeKind::Op(op));
        for &input in inputs {
            self.connect(input, op_id);
        }
        for &output in outputs {
            self.connect(op_id, output);
        }
        Ok(op_id)
    }

    pub fn node(&self, id: NodeId) -> ExpandResult<&LogicalNode> {
        self.nodes
            .get(&id)
            .ok_or(ExpandError::UnknownLogicalNode { id })
    }

    pub fn data(&self, id: NodeId) -> ExpandResult<&LogicalData> {
        match &self.node(id)?.kind {
            LogicalNodeKind::Data(data) => Ok(data),
            LogicalNodeKind::Op(_) => Err(ExpandError::NotADataNode { id }),
        }
    }

    pub fn op(&self, id: NodeId) -> Option<&LogicalOp> {
        match &self.nodes.get(&id)?.kind {
            LogicalNodeKind::Op(op) => Some(op),
            LogicalNodeKind::Data(_) => None,
        }
    }

    pub fn predecessors(&self, id: NodeId) -> ExpandResult<&[NodeId]> {
        Ok(self.node(id)?.predecessors())
    }

    pub fn successors(&self, id: NodeId) -> ExpandResult<&[NodeId]> {
        Ok(self.node(id)?.successors())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Node ids in creation order.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn insert(&mut self, kind: LogicalNodeKind) -> NodeId {
        let id = next_node_id();
        self.nodes.insert(
            id,
            LogicalNode {
                id,
                predecessors: Vec::new(),
                successors: Vec::new(),
                kind,
            },
        );
        self.order.push(id);
        id
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
