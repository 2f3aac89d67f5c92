use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use crate::dag::{
    LogicalDag, LogicalData, LogicalNode, LogicalNodeKind, LogicalOp, NodeId, PhysicalDag,
};
use crate::error::{ExpandError, ExpandResult};
use crate::ops::Chunk;
use crate::tensor::NVector;

use super::mapping::PlannedMapping;
use super::ExpandConfig;

/// Counters describing the work an engine has performed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExpandStats {
    /// Data-generation functions invoked.
    pub data_gen_calls: usize,
    /// Compute functions invoked.
    pub compute_calls: usize,
    /// Logical data nodes whose physical mapping was recorded.
    pub mappings_recorded: usize,
}

/// Persistent engine state guarded by a mutex inside [`ExpandEngine`].
#[derive(Default)]
struct EngineState {
    /// Physical fragment ids per logical data node. Presence marks the node as expanded.
    lnode_to_pnode: HashMap<NodeId, NVector<NodeId>>,
    /// Operation nodes whose compute function already ran.
    expanded_ops: HashSet<NodeId>,
    stats: ExpandStats,
}

enum Visit {
    Enter(NodeId),
    Exit(NodeId),
}

/// Expands logical nodes on demand and memoizes the logical to physical mapping.
///
/// `process` calls are serialized, so the check-then-expand for a logical id is atomic even when
/// the engine is shared between threads. Mapping entries are inserted only once fully built.
pub struct ExpandEngine {
    config: ExpandConfig,
    expand_lock: Mutex<()>,
    state: Mutex<EngineState>,
}

impl Default for ExpandEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpandEngine {
    /// Creates an engine configured from the environment.
    pub fn new() -> Self {
        Self::with_config(ExpandConfig::from_env())
    }

    pub fn with_config(config: ExpandConfig) -> Self {
        ExpandEngine {
            config,
            expand_lock: Mutex::new(()),
            state: Mutex::new(EngineState::default()),
        }
    }

    pub fn config(&self) -> &ExpandConfig {
        &self.config
    }

    /// Ensures every id in `ids` is expanded, along with all of its transitive predecessors.
    ///
    /// Re-requesting an already expanded id is a no-op. The first failure aborts the call.
    pub fn process(
        &self,
        ldag: &LogicalDag,
        pdag: &PhysicalDag,
        ids: &[NodeId],
    ) -> ExpandResult<()> {
        let _guard = self
            .expand_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for &id in ids {
            self.expand_node(ldag, pdag, id)?;
        }
        Ok(())
    }

    /// Physical node ids realizing each partition of the logical data node `id`.
    pub fn physical_nodes(&self, id: NodeId) -> ExpandResult<NVector<NodeId>> {
        let state = self.state.lock().expect("expand engine poisoned");
        state
            .lnode_to_pnode
            .get(&id)
            .cloned()
            .ok_or(ExpandError::NotExpanded { id })
    }

    /// Whether `id` (data or operation node) has been expanded.
    pub fn is_expanded(&self, id: NodeId) -> bool {
        let state = self.state.lock().expect("expand engine poisoned");
        state.lnode_to_pnode.contains_key(&id) || state.expanded_ops.contains(&id)
    }

    /// Number of logical data nodes with a recorded mapping.
    pub fn num_expanded(&self) -> usize {
        let state = self.state.lock().expect("expand engine poisoned");
        state.lnode_to_pnode.len()
    }

    pub fn stats(&self) -> ExpandStats {
        let state = self.state.lock().expect("expand engine poisoned");
        state.stats
    }

    /// Forgets every mapping so the logical graph can be expanded into a fresh physical graph.
    pub fn clear(&self) {
        let _guard = self
            .expand_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut state = self.state.lock().expect("expand engine poisoned");
        *state = EngineState::default();
    }

    /// Post-order expansion of `root` using an explicit stack.
    fn expand_node(
        &self,
        ldag: &LogicalDag,
        pdag: &PhysicalDag,
        root: NodeId,
    ) -> ExpandResult<()> {
        let mut stack = vec![Visit::Enter(root)];
        let mut on_path = HashSet::new();
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(id) => {
                    let node = ldag.node(id)?;
                    if self.is_done(node) {
                        log::debug!("logical node {id} already expanded");
                        continue;
                    }
                    if !on_path.insert(id) {
                        return Err(ExpandError::Cycle { id });
                    }
                    stack.push(Visit::Exit(id));
                    stack.extend(
                        node.predecessors()
                            .iter()
                            .rev()
                            .map(|&pred| Visit::Enter(pred)),
                    );
                }
                Visit::Exit(id) => {
                    on_path.remove(&id);
                    self.expand_single(ldag, pdag, ldag.node(id)?)?;
                }
            }
        }
        Ok(())
    }

    fn is_done(&self, node: &LogicalNode) -> bool {
        let state = self.state.lock().expect("expand engine poisoned");
        match node.kind() {
            LogicalNodeKind::Data(_) => state.lnode_to_pnode.contains_key(&node.id()),
            LogicalNodeKind::Op(_) => state.expanded_ops.contains(&node.id()),
        }
    }

    fn expand_single(
        &self,
        ldag: &LogicalDag,
        pdag: &PhysicalDag,
        node: &LogicalNode,
    ) -> ExpandResult<()> {
        match node.kind() {
            LogicalNodeKind::Data(data) => self.expand_data(pdag, node.id(), data),
            LogicalNodeKind::Op(op) => self.expand_op(ldag, pdag, node.id(), op),
        }
    }

    /// Data nodes without a generator are mapped when their producing operation is expanded.
    fn expand_data(&self, pdag: &PhysicalDag, id: NodeId, data: &LogicalData) -> ExpandResult<()> {
        let Some(gen_fn) = &data.data_gen_fn else {
            return Ok(());
        };
        let name = gen_fn.name();
        log::info!("Expand logical datagen function: {name}");
        let part_sizes = data.part_sizes();
        let chunks = gen_fn
            .expand(pdag, &part_sizes)
            .map_err(|err| ExpandError::function(name.as_str(), err))?;
        self.with_state(|state| state.stats.data_gen_calls += 1);
        if chunks.size() != part_sizes.size() {
            return Err(ExpandError::GridShapeMismatch {
                node: id,
                expected: part_sizes.size().clone(),
                actual: chunks.size().clone(),
            });
        }
        let planned = PlannedMapping::plan(id, data, &chunks, pdag, &self.config)?;
        let pnodes = planned.apply(pdag, &self.config)?;
        self.record(id, pnodes);
        Ok(())
    }

    fn expand_op(
        &self,
        ldag: &LogicalDag,
        pdag: &PhysicalDag,
        id: NodeId,
        op: &LogicalOp,
    ) -> ExpandResult<()> {
        let compute_fn = op
            .compute_fn
            .as_ref()
            .ok_or(ExpandError::MissingComputeFn { id })?;
        let name = compute_fn.name();

        let mut in_chunks: Vec<NVector<Chunk>> = Vec::with_capacity(op.inputs.len());
        for &input in &op.inputs {
            let pnodes = self
                .physical_nodes(input)
                .map_err(|_| ExpandError::UnexpandedInput { op: id, input })?;
            in_chunks.push(pnodes.try_map(|&pid| pdag.chunk(pid))?);
        }

        log::info!("Expand logical compute function: {name}");
        let rst_chunks = compute_fn
            .expand(pdag, &in_chunks)
            .map_err(|err| ExpandError::function(name.as_str(), err))?;
        self.with_state(|state| state.stats.compute_calls += 1);
        if rst_chunks.len() != op.outputs.len() {
            return Err(ExpandError::OutputArityMismatch {
                function: name,
                node: id,
                expected: op.outputs.len(),
                actual: rst_chunks.len(),
            });
        }

        // Validate every output before touching the physical graph.
        let mut planned = Vec::with_capacity(rst_chunks.len());
        for (&output, chunks) in op.outputs.iter().zip(&rst_chunks) {
            let data = ldag.data(output)?;
            let mapping = PlannedMapping::plan(output, data, chunks, pdag, &self.config)?;
            planned.push((output, mapping));
        }
        let mut mapped = Vec::with_capacity(planned.len());
        for (output, mapping) in planned {
            mapped.push((output, mapping.apply(pdag, &self.config)?));
        }
        for (output, pnodes) in mapped {
            self.record(output, pnodes);
        }
        self.with_state(|state| {
            state.expanded_ops.insert(id);
        });
        Ok(())
    }

    fn record(&self, id: NodeId, pnodes: NVector<NodeId>) {
        log::debug!(
            "logical node {id} mapped to {} physical node(s) over grid {}",
            pnodes.len(),
            pnodes.size()
        );
        self.with_state(|state| {
            state.lnode_to_pnode.insert(id, pnodes);
            state.stats.mappings_recorded += 1;
        });
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut EngineState) -> R) -> R {
        let mut state = self.state.lock().expect("expand engine poisoned");
        f(&mut state)
    }
}
