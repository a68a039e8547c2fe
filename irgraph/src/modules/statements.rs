//! Statements.
//!
//! Statements reference values through [`ValueId`] and other statements
//! (branch targets) through [`StmtId`]. Branch targets may point backwards,
//! so the statement graph of a method is in general cyclic.
use auto_enums::auto_enum;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::{EnumDiscriminants, EnumIs, IntoStaticStr};

use crate::graph::{StmtId, ValueId};

/// A statement node.
///
/// The discriminant name ([`StmtKind`]) doubles as the name of the relation
/// holding the statement's fact row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, EnumDiscriminants)]
#[strum_discriminants(name(StmtKind), derive(Hash, IntoStaticStr))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Stmt {
    /// Binds a local to a parameter, `@this` or the caught exception.
    Identity { left: ValueId, right: ValueId },

    Assign { left: ValueId, right: ValueId },

    Return { op: ValueId },

    ReturnVoid,

    /// An invocation whose result is discarded.
    Invoke { expr: ValueId },

    /// Conditional jump to `target`; falls through otherwise.
    If { condition: ValueId, target: StmtId },

    Goto { target: StmtId },

    /// Dense multi-way branch: key `low + i` jumps to `targets[i]`.
    TableSwitch {
        key: ValueId,
        low: i32,
        targets: Vec<StmtId>,
        default: StmtId,
    },

    /// Sparse multi-way branch: key equal to the constant `lookup_values[i]`
    /// jumps to `targets[i]`.
    LookupSwitch {
        key: ValueId,
        lookup_values: Vec<ValueId>,
        targets: Vec<StmtId>,
        default: StmtId,
    },

    Throw { op: ValueId },

    EnterMonitor { op: ValueId },

    ExitMonitor { op: ValueId },
}

impl Stmt {
    pub fn kind(&self) -> StmtKind {
        self.into()
    }

    pub fn relation_name(&self) -> &'static str {
        self.kind().into()
    }

    /// Value operands in declared order.
    ///
    /// Switch lookup values are case labels, not operands.
    pub fn operands(&self) -> SmallVec<[ValueId; 4]> {
        let mut operands = SmallVec::new();
        match self {
            Stmt::Identity { left, right } | Stmt::Assign { left, right } => {
                operands.extend([*left, *right])
            }
            Stmt::ReturnVoid | Stmt::Goto { .. } => {}
            Stmt::Return { op }
            | Stmt::Invoke { expr: op }
            | Stmt::If { condition: op, .. }
            | Stmt::TableSwitch { key: op, .. }
            | Stmt::LookupSwitch { key: op, .. }
            | Stmt::Throw { op }
            | Stmt::EnterMonitor { op }
            | Stmt::ExitMonitor { op } => operands.push(*op),
        }
        operands
    }

    /// Mutable value slots, in the same order as [`Stmt::operands`].
    pub fn operands_mut(&mut self) -> SmallVec<[&mut ValueId; 4]> {
        let mut operands = SmallVec::new();
        match self {
            Stmt::Identity { left, right } | Stmt::Assign { left, right } => {
                operands.push(left);
                operands.push(right);
            }
            Stmt::ReturnVoid | Stmt::Goto { .. } => {}
            Stmt::Return { op }
            | Stmt::Invoke { expr: op }
            | Stmt::If { condition: op, .. }
            | Stmt::TableSwitch { key: op, .. }
            | Stmt::LookupSwitch { key: op, .. }
            | Stmt::Throw { op }
            | Stmt::EnterMonitor { op }
            | Stmt::ExitMonitor { op } => operands.push(op),
        }
        operands
    }

    /// Explicit branch targets: the jump target, then case targets, then the
    /// default target.
    #[auto_enum(Iterator)]
    pub fn targets(&self) -> impl Iterator<Item = StmtId> + '_ {
        match self {
            Stmt::If { target, .. } | Stmt::Goto { target } => std::iter::once(*target),
            Stmt::TableSwitch {
                targets, default, ..
            }
            | Stmt::LookupSwitch {
                targets, default, ..
            } => targets.iter().copied().chain(std::iter::once(*default)),
            _ => std::iter::empty(),
        }
    }

    /// Returns true if control may continue with the next statement of the
    /// method body.
    pub fn falls_through(&self) -> bool {
        !matches!(
            self,
            Stmt::Return { .. }
                | Stmt::ReturnVoid
                | Stmt::Goto { .. }
                | Stmt::TableSwitch { .. }
                | Stmt::LookupSwitch { .. }
                | Stmt::Throw { .. }
        )
    }
}
