//! Mutation search.
//!
//! [`MutationSearch::try_mutate`] walks the program in a fixed order and stops
//! at the first value position where at least one [`RewriteRule`] applies.
//! When several rules apply, one is picked uniformly with the caller's random
//! source, so a whole session is reproducible from its seed.
//!
//! Statements are visited depth first from every root of the control-flow
//! graph: first the statement's value operands in declared order, then its
//! branch targets (jump target, case targets, default target). A statement is
//! visited at most once per call. Within an operand, the value itself is
//! tested before its sub-values.
use std::collections::HashSet;

use irgraph::{
    graph::{ChildSlot, IrGraph, Node, NodeId, StmtId, ValueId},
    icfg::Icfg,
    modules::{fmt::display_value, statements::Stmt, values::Value},
};
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::utils::error::FactResult;

/// A context-sensitive program rewrite.
pub trait RewriteRule {
    fn name(&self) -> &'static str;

    /// Whether the rule applies to `node`. `ancestors` is the path of
    /// enclosing nodes from the traversal root down to the parent of `node`.
    fn matches(&self, graph: &IrGraph, node: ValueId, ancestors: &[NodeId]) -> FactResult<bool>;

    /// The value replacing `node`.
    fn rewrite(&self, graph: &IrGraph, node: ValueId) -> FactResult<Value>;
}

fn parent<'g>(graph: &'g IrGraph, ancestors: &[NodeId]) -> FactResult<Option<&'g Node>> {
    match ancestors.last() {
        Some(id) => Ok(Some(graph.node(*id)?)),
        None => Ok(None),
    }
}

/// Replaces a non-zero `int` constant by `0`, unless it is an operand of an
/// array access.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceIntConstant;

impl RewriteRule for ReplaceIntConstant {
    fn name(&self) -> &'static str {
        "REPLACE_INT_CONSTANT"
    }

    fn matches(&self, graph: &IrGraph, node: ValueId, ancestors: &[NodeId]) -> FactResult<bool> {
        let Value::IntConstant(value) = graph.value(node)? else {
            return Ok(false);
        };
        let in_array_access = matches!(
            parent(graph, ancestors)?,
            Some(Node::Value(Value::ArrayRef { .. }))
        );
        Ok(*value != 0 && !in_array_access)
    }

    fn rewrite(&self, _graph: &IrGraph, _node: ValueId) -> FactResult<Value> {
        Ok(Value::IntConstant(0))
    }
}

/// Replaces a read of an `int` field by the constant `0`. Field references
/// written by an assignment or identity statement are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceFieldReference;

impl RewriteRule for ReplaceFieldReference {
    fn name(&self) -> &'static str {
        "REPLACE_FIELD_REFERENCE"
    }

    fn matches(&self, graph: &IrGraph, node: ValueId, ancestors: &[NodeId]) -> FactResult<bool> {
        let field = match graph.value(node)? {
            Value::InstanceFieldRef { field, .. } | Value::StaticFieldRef { field } => *field,
            _ => return Ok(false),
        };
        if !graph.ty(graph.field(field)?.ty)?.is_int() {
            return Ok(false);
        }
        let written = matches!(
            parent(graph, ancestors)?,
            Some(Node::Stmt(Stmt::Assign { left, .. } | Stmt::Identity { left, .. })) if *left == node
        );
        Ok(!written)
    }

    fn rewrite(&self, _graph: &IrGraph, _node: ValueId) -> FactResult<Value> {
        Ok(Value::IntConstant(0))
    }
}

/// How a rewritten value is stored in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityPolicy {
    /// The replacement is a new node; the parent slot is rewired to it and the
    /// replaced node becomes unreachable.
    #[default]
    Fresh,
    /// The replaced node is overwritten in place and keeps its identity.
    /// A node referenced from more than one slot is never overwritten; it is
    /// handled as under [`IdentityPolicy::Fresh`] so only the chosen slot
    /// changes.
    Preserve,
}

/// One applied rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub rule: &'static str,
    /// The rewritten position.
    pub slot: ChildSlot,
    /// The value that occupied the slot before the rewrite.
    pub replaced: ValueId,
    /// The value occupying the slot after the rewrite. Equal to `replaced`
    /// when the node was overwritten in place.
    pub replacement: ValueId,
}

/// An eligible position found by the traversal.
struct Candidate {
    rule: usize,
    slot: ChildSlot,
    node: ValueId,
}

pub struct MutationSearch {
    rules: Vec<Box<dyn RewriteRule>>,
    policy: IdentityPolicy,
}

impl MutationSearch {
    /// Search with the built-in rules, in order: [`ReplaceIntConstant`],
    /// [`ReplaceFieldReference`].
    pub fn new(policy: IdentityPolicy) -> Self {
        Self::with_rules(
            vec![Box::new(ReplaceIntConstant), Box::new(ReplaceFieldReference)],
            policy,
        )
    }

    pub fn with_rules(rules: Vec<Box<dyn RewriteRule>>, policy: IdentityPolicy) -> Self {
        Self { rules, policy }
    }

    pub fn policy(&self) -> IdentityPolicy {
        self.policy
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.name())
    }

    /// Apply at most one rewrite. `None` means no position is eligible.
    pub fn try_mutate(
        &self,
        graph: &mut IrGraph,
        icfg: &Icfg,
        rng: &mut impl Rng,
    ) -> FactResult<Option<Mutation>> {
        let Some(candidate) = self.find(graph, icfg, rng)? else {
            debug!("No rewrite rule applies");
            return Ok(None);
        };

        let rule = &self.rules[candidate.rule];
        let value = rule.rewrite(graph, candidate.node)?;
        let before = display_value(graph, candidate.node).to_string();
        let in_place = match self.policy {
            IdentityPolicy::Fresh => false,
            IdentityPolicy::Preserve => {
                let shared = graph.reference_count(candidate.node) > 1;
                if shared {
                    debug!("{} is shared, allocating its replacement", candidate.node);
                }
                !shared
            }
        };
        let replacement = if in_place {
            graph.overwrite_value(candidate.node, value)?;
            candidate.node
        } else {
            let replacement = graph.alloc_value(value);
            graph.replace_child(candidate.slot, replacement)?;
            replacement
        };

        info!(
            "Rewrote `{}` ({}) into `{}` ({}) at {} operand {} with {}",
            before,
            candidate.node,
            display_value(graph, replacement),
            replacement,
            candidate.slot.parent,
            candidate.slot.index,
            rule.name()
        );
        Ok(Some(Mutation {
            rule: rule.name(),
            slot: candidate.slot,
            replaced: candidate.node,
            replacement,
        }))
    }

    fn find(
        &self,
        graph: &IrGraph,
        icfg: &Icfg,
        rng: &mut impl Rng,
    ) -> FactResult<Option<Candidate>> {
        let mut visited = HashSet::new();
        let mut path: Vec<NodeId> = Vec::new();

        for root in icfg.nodes() {
            // (statement, depth of its parent path)
            let mut stack: Vec<(StmtId, usize)> = vec![(root, 0)];
            while let Some((id, depth)) = stack.pop() {
                if !visited.insert(id) {
                    continue;
                }
                let stmt = graph.stmt(id)?;
                path.truncate(depth);
                path.push(id.id());

                for index in 0..stmt.operands().len() {
                    let slot = ChildSlot::new(id, index);
                    if let Some(candidate) = self.find_in_value(graph, slot, &mut path, rng)? {
                        return Ok(Some(candidate));
                    }
                }

                let targets: SmallVec<[StmtId; 4]> = stmt.targets().collect();
                stack.extend(targets.into_iter().rev().map(|target| (target, depth + 1)));
            }
            path.clear();
        }
        Ok(None)
    }

    fn find_in_value(
        &self,
        graph: &IrGraph,
        slot: ChildSlot,
        path: &mut Vec<NodeId>,
        rng: &mut impl Rng,
    ) -> FactResult<Option<Candidate>> {
        let node = graph.slot(slot)?;
        let value = graph.value(node)?;

        let mut applicable: SmallVec<[usize; 2]> = SmallVec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.matches(graph, node, path)? {
                applicable.push(index);
            }
        }
        if !applicable.is_empty() {
            let rule = applicable[rng.random_range(0..applicable.len())];
            return Ok(Some(Candidate { rule, slot, node }));
        }

        path.push(node.id());
        for index in 0..value.operands().len() {
            let child = ChildSlot::new(node, index);
            if let Some(candidate) = self.find_in_value(graph, child, path, rng)? {
                return Ok(Some(candidate));
            }
        }
        path.pop();
        Ok(None)
    }
}

impl Default for MutationSearch {
    fn default() -> Self {
        Self::new(IdentityPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use irgraph::{modules::symbol::Field, types::PrimType};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    fn single_body(graph: &mut IrGraph, body: &[StmtId]) -> Icfg {
        let void = graph.alloc_type(irgraph::types::Type::Void);
        let method = graph.alloc_method(irgraph::modules::symbol::Method::new(
            "run",
            "Main",
            true,
            void,
            vec![],
        ));
        let mut icfg = Icfg::new();
        icfg.add_body(graph, method, body).unwrap();
        icfg
    }

    #[test]
    fn array_index_constants_are_kept() {
        let mut graph = IrGraph::new();
        let int = graph.prim_type(PrimType::Int);
        let arr_ty = graph.alloc_type(irgraph::types::Type::Array { element: int });
        let arr = graph.local("a", arr_ty);
        let x = graph.local("x", int);
        let three = graph.int_constant(3);
        let access = graph.alloc_value(Value::ArrayRef {
            base: arr,
            index: three,
        });
        let stmt = graph.assign(x, access);
        let icfg = single_body(&mut graph, &[stmt]);

        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let search = MutationSearch::default();
        assert!(search.try_mutate(&mut graph, &icfg, &mut rng).unwrap().is_none());
    }

    #[test]
    fn written_int_field_is_kept_but_read_is_replaced() {
        let mut graph = IrGraph::new();
        let int = graph.prim_type(PrimType::Int);
        let field = graph.alloc_field(Field::new("count", "Main", int));
        let target = graph.alloc_value(Value::StaticFieldRef { field });
        let source = graph.alloc_value(Value::StaticFieldRef { field });
        let x = graph.local("x", int);
        let write = graph.assign(target, x);
        let read = graph.assign(x, source);
        let icfg = single_body(&mut graph, &[write, read]);

        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mutation = MutationSearch::default()
            .try_mutate(&mut graph, &icfg, &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(mutation.rule, "REPLACE_FIELD_REFERENCE");
        assert_eq!(mutation.slot, ChildSlot::new(read, 1));
        assert_eq!(mutation.replaced, source);
        assert_eq!(
            graph.value(mutation.replacement).unwrap(),
            &Value::IntConstant(0)
        );
    }

    #[test]
    fn preserve_does_not_overwrite_shared_nodes() {
        let mut graph = IrGraph::new();
        let int = graph.prim_type(PrimType::Int);
        let arr_ty = graph.alloc_type(irgraph::types::Type::Array { element: int });
        let arr = graph.local("a", arr_ty);
        let x = graph.local("x", int);
        let five = graph.int_constant(5);
        let access = graph.alloc_value(Value::ArrayRef {
            base: arr,
            index: five,
        });
        let init = graph.assign(x, five);
        let load = graph.assign(x, access);
        let icfg = single_body(&mut graph, &[init, load]);

        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mutation = MutationSearch::new(IdentityPolicy::Preserve)
            .try_mutate(&mut graph, &icfg, &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(mutation.slot, ChildSlot::new(init, 1));
        assert_eq!(mutation.replaced, five);
        assert_ne!(mutation.replacement, five);
        assert_eq!(graph.value(five).unwrap(), &Value::IntConstant(5));
        assert_eq!(
            graph.value(mutation.replacement).unwrap(),
            &Value::IntConstant(0)
        );
        assert_eq!(graph.slot(ChildSlot::new(access, 1)).unwrap(), five);
    }

    #[test]
    fn preserve_overwrites_unshared_nodes() {
        let mut graph = IrGraph::new();
        let int = graph.prim_type(PrimType::Int);
        let x = graph.local("x", int);
        let five = graph.int_constant(5);
        let init = graph.assign(x, five);
        let icfg = single_body(&mut graph, &[init]);

        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mutation = MutationSearch::new(IdentityPolicy::Preserve)
            .try_mutate(&mut graph, &icfg, &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(mutation.replacement, five);
        assert_eq!(graph.value(five).unwrap(), &Value::IntConstant(0));
    }

    #[test]
    fn backward_jumps_terminate() {
        let mut graph = IrGraph::new();
        let int = graph.prim_type(PrimType::Int);
        let flag = graph.local("flag", int);
        let exit = graph.return_void();
        let head = graph.if_stmt(flag, exit);
        let back = graph.goto(head);
        let icfg = single_body(&mut graph, &[head, back, exit]);

        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let search = MutationSearch::new(IdentityPolicy::Preserve);
        assert!(search.try_mutate(&mut graph, &icfg, &mut rng).unwrap().is_none());
    }
}
