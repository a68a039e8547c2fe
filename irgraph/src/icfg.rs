//! Control-flow provider.
//!
//! An [`Icfg`] records which statements are reachable, their direct
//! successors and the method each statement belongs to. It is built by the
//! embedder (typically from the output of a call-graph construction) and is
//! read-only for fact extraction and mutation.
use std::collections::BTreeMap;

use log::trace;
use petgraph::{
    dot::{Config, Dot},
    prelude::DiGraphMap,
};

use crate::{
    graph::{IrGraph, MethodId, StmtId},
    modules::fmt::display_stmt,
    utils::Error,
};

#[derive(Debug, Clone, Default)]
pub struct Icfg {
    graph: DiGraphMap<StmtId, ()>,
    methods: BTreeMap<StmtId, MethodId>,
}

impl Icfg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a statement. Statements are enumerated in registration order.
    pub fn insert_node(&mut self, stmt: StmtId) {
        self.graph.add_node(stmt);
    }

    /// Record a control-flow edge, registering both endpoints. Duplicate
    /// edges are collapsed.
    pub fn insert_edge(&mut self, source: StmtId, target: StmtId) {
        self.graph.add_edge(source, target, ());
    }

    pub fn set_method_of(&mut self, stmt: StmtId, method: MethodId) {
        self.methods.insert(stmt, method);
    }

    /// Register the body of `method`.
    ///
    /// Every statement is owned by `method`. A statement that may fall
    /// through gets an edge to the next statement of the body, and every
    /// statement gets an edge to each of its branch targets.
    pub fn add_body(
        &mut self,
        graph: &IrGraph,
        method: MethodId,
        body: &[StmtId],
    ) -> Result<(), Error> {
        graph.method(method)?;
        for stmt in body {
            self.insert_node(*stmt);
            self.set_method_of(*stmt, method);
        }

        for (i, id) in body.iter().enumerate() {
            let stmt = graph.stmt(*id)?;
            if stmt.falls_through() {
                if let Some(next) = body.get(i + 1) {
                    self.insert_edge(*id, *next);
                }
            }
            for target in stmt.targets() {
                self.insert_edge(*id, target);
            }
        }

        trace!(
            "Registered body of method {} with {} statements",
            method,
            body.len()
        );
        Ok(())
    }

    /// Every registered statement.
    pub fn nodes(&self) -> impl Iterator<Item = StmtId> + '_ {
        self.graph.nodes()
    }

    /// Direct successors of `stmt`, in edge insertion order.
    pub fn successors(&self, stmt: StmtId) -> impl Iterator<Item = StmtId> + '_ {
        self.graph.neighbors(stmt)
    }

    pub fn contains(&self, stmt: StmtId) -> bool {
        self.graph.contains_node(stmt)
    }

    pub fn method_of(&self, stmt: StmtId) -> Result<MethodId, Error> {
        self.methods
            .get(&stmt)
            .copied()
            .ok_or(Error::MissingOwningMethod { stmt: stmt.id() })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Render the graph in Graphviz format, labelling every statement with
    /// its textual form.
    pub fn to_dot(&self, graph: &IrGraph) -> String {
        let edge_attrs = |_: &DiGraphMap<StmtId, ()>, _: (StmtId, StmtId, &())| String::new();
        let node_attrs = |_: &DiGraphMap<StmtId, ()>, (stmt, _): (StmtId, &StmtId)| {
            format!(
                "label = \"{}: {}\"",
                stmt,
                escape_label(&display_stmt(graph, stmt).to_string())
            )
        };
        let dot = Dot::with_attr_getters(
            &self.graph,
            &[Config::NodeNoLabel, Config::EdgeNoLabel],
            &edge_attrs,
            &node_attrs,
        );
        format!("{:?}", dot)
    }
}

fn escape_label(label: &str) -> String {
    let mut escaped = String::with_capacity(label.len());
    for c in label.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\u{8}' => escaped.push_str("\\b"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\u{c}' => escaped.push_str("\\f"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(c),
        }
    }
    escaped
}
