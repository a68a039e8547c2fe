//! Arena-backed intermediate representation consumed by the fact extractor.
//!
//! Every node of the program (statements, values, types, methods and fields)
//! lives in a single [`graph::IrGraph`] arena. The arena index of a node is its
//! identity: the same node reached from two different parents always resolves
//! to the same [`graph::NodeId`], while two structurally equal nodes allocated
//! separately never do.
//!
//! - [`modules`]: the closed set of node variants (statements, values, symbols).
//! - [`types`]: type nodes.
//! - [`icfg`]: statement-level control-flow graph with owning-method lookup.
//! - [`utils`]: lookup errors.

pub mod graph;
pub mod icfg;
pub mod modules;
pub mod types;
pub mod utils;
