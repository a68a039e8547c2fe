use strum::EnumIs;
use thiserror::Error;

use crate::graph::{NodeId, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, Error)]
pub enum Error {
    /// A handle points past the end of the arena.
    #[error("Node `{id}` does not exist. The graph only holds {len} nodes.")]
    DanglingNode { id: NodeId, len: usize },

    /// A typed handle resolves to a node of another kind.
    #[error("Node `{id}` was expected to be a {expected} node, but a {found} node was found.")]
    KindMismatch {
        id: NodeId,
        expected: NodeKind,
        found: NodeKind,
    },

    /// A child slot refers to an operand position the parent does not have.
    #[error("Node `{parent}` has no value operand at position {index}.")]
    InvalidSlot { parent: NodeId, index: usize },

    /// A lookup switch whose match values and case targets differ in number.
    #[error(
        "Lookup switch `{stmt}` has {values} match values but {targets} case targets."
    )]
    MalformedSwitch {
        stmt: NodeId,
        values: usize,
        targets: usize,
    },

    /// The control-flow graph knows no owning method for the statement.
    #[error(
        "Statement `{stmt}` has no owning method. Every statement reachable from the control-flow graph must be registered with its method."
    )]
    MissingOwningMethod { stmt: NodeId },
}
