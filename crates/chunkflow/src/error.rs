//! Failures surfaced while expanding a logical graph.
//!
//! Every variant aborts the `process` call that raised it; nothing is retried and no mapping is
//! recorded for the node being expanded when validation fails.

use thiserror::Error;

use crate::dag::NodeId;
use crate::tensor::Scale;

#[derive(Debug, Error)]
pub enum ExpandError {
    #[error("unknown logical node {id}")]
    UnknownLogicalNode { id: NodeId },

    #[error("unknown physical node {id}")]
    UnknownPhysicalNode { id: NodeId },

    #[error("node {id} is not a data node")]
    NotADataNode { id: NodeId },

    #[error("logical node {id} has not been expanded")]
    NotExpanded { id: NodeId },

    #[error("operation node {id} has no compute function")]
    MissingComputeFn { id: NodeId },

    #[error("input {input} of operation {op} has no physical mapping")]
    UnexpandedInput { op: NodeId, input: NodeId },

    #[error(
        "expand function error: #output unmatched (expected {expected}, got {actual}) for node {node}. Function name: {function}"
    )]
    OutputArityMismatch {
        function: String,
        node: NodeId,
        expected: usize,
        actual: usize,
    },

    #[error("expand function error: partition size unmatched for node {node}. Expected: {expected} Got: {actual}")]
    ShapeMismatch {
        node: NodeId,
        expected: Scale,
        actual: Scale,
    },

    #[error("expand function error: partition grid unmatched for node {node}. Expected: {expected} Got: {actual}")]
    GridShapeMismatch {
        node: NodeId,
        expected: Scale,
        actual: Scale,
    },

    #[error("irregular partition grid for node {node}: cell {coordinate} breaks axis {axis}")]
    IrregularPartition {
        node: NodeId,
        coordinate: Scale,
        axis: usize,
    },

    #[error("dependency cycle through logical node {id}")]
    Cycle { id: NodeId },

    #[error("expand function '{function}' failed: {source}")]
    Function {
        function: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ExpandError {
    pub(crate) fn function(function: impl Into<String>, source: anyhow::Error) -> Self {
        ExpandError::Function {
            function: function.into(),
            source,
        }
    }
}

/// Convenience alias for results returned by expansion routines.
pub type ExpandResult<T> = Result<T, ExpandError>;
