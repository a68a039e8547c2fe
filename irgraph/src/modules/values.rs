//! Values: locals, references, invocation and arithmetic expressions, and
//! constants.
//!
//! A value references its sub-values through [`ValueId`] handles. The
//! ordered list of those handles is the value's *operand list* (see
//! [`Value::operands`]); a [`ChildSlot`](crate::graph::ChildSlot) indexes
//! into it.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::{EnumDiscriminants, EnumIs, EnumIter, IntoStaticStr};

use crate::graph::{FieldId, MethodId, TypeId, ValueId};

/// Dispatch flavour of an instance invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InvokeKind {
    Virtual,
    Special,
    Interface,
}

impl InvokeKind {
    pub fn relation_name(&self) -> &'static str {
        match self {
            InvokeKind::Virtual => "VirtualInvokeExpr",
            InvokeKind::Special => "SpecialInvokeExpr",
            InvokeKind::Interface => "InterfaceInvokeExpr",
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            InvokeKind::Virtual => "virtualinvoke",
            InvokeKind::Special => "specialinvoke",
            InvokeKind::Interface => "interfaceinvoke",
        }
    }
}

macro_rules! define_binops {
    ($($(#[$meta:meta])* $variant:ident => $relation:literal, $symbol:literal;)*) => {
        /// Binary operators.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub enum BinopKind {
            $($(#[$meta])* $variant,)*
        }

        impl BinopKind {
            /// Name of the relation holding expressions with this operator.
            pub fn relation_name(&self) -> &'static str {
                match self {
                    $(BinopKind::$variant => $relation,)*
                }
            }

            pub fn symbol(&self) -> &'static str {
                match self {
                    $(BinopKind::$variant => $symbol,)*
                }
            }
        }
    };
}

define_binops! {
    Add => "AddExpr", "+";
    Sub => "SubExpr", "-";
    Mul => "MulExpr", "*";
    Div => "DivExpr", "/";
    Rem => "RemExpr", "%";
    And => "AndExpr", "&";
    Or => "OrExpr", "|";
    Xor => "XorExpr", "^";
    Shl => "ShlExpr", "<<";
    Shr => "ShrExpr", ">>";
    Ushr => "UshrExpr", ">>>";
    /// Long comparison.
    Cmp => "CmpExpr", "cmp";
    /// Floating point comparison, `1` on NaN.
    Cmpg => "CmpgExpr", "cmpg";
    /// Floating point comparison, `-1` on NaN.
    Cmpl => "CmplExpr", "cmpl";
    Eq => "EqExpr", "==";
    Ne => "NeExpr", "!=";
    Ge => "GeExpr", ">=";
    Gt => "GtExpr", ">";
    Le => "LeExpr", "<=";
    Lt => "LtExpr", "<";
}

/// A value node.
#[derive(Debug, Clone, PartialEq, EnumIs, EnumDiscriminants)]
#[strum_discriminants(name(ValueKind), derive(Hash, IntoStaticStr))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    /// A local variable. Every read or write of the variable references the
    /// same node.
    Local { name: String, ty: TypeId },

    /// `@parameterN`, the N-th method parameter.
    ParameterRef { index: u32, ty: TypeId },

    /// `@this`.
    ThisRef { ty: TypeId },

    /// `base.field`
    InstanceFieldRef { base: ValueId, field: FieldId },

    /// `Class.field`
    StaticFieldRef { field: FieldId },

    /// Invocation with a receiver.
    InstanceInvoke {
        kind: InvokeKind,
        base: ValueId,
        method: MethodId,
        args: Vec<ValueId>,
    },

    StaticInvoke { method: MethodId, args: Vec<ValueId> },

    StringConstant(String),
    IntConstant(i32),
    LongConstant(i64),
    FloatConstant(f32),
    DoubleConstant(f64),
    NullConstant,
    /// A class literal, e.g. `java/lang/String`.
    ClassConstant(String),

    Binop {
        op: BinopKind,
        left: ValueId,
        right: ValueId,
    },

    /// Object allocation.
    New { ty: TypeId },

    /// `base[index]`
    ArrayRef { base: ValueId, index: ValueId },

    Cast { op: ValueId, ty: TypeId },

    /// `@caughtexception`
    CaughtExceptionRef,

    NewArray { base_type: TypeId, size: ValueId },

    Length { op: ValueId },

    Neg { op: ValueId },

    InstanceOf { op: ValueId, check_type: TypeId },

    NewMultiArray {
        base_type: TypeId,
        sizes: Vec<ValueId>,
    },
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        self.into()
    }

    /// Name of the relation holding the definition fact of this value.
    pub fn relation_name(&self) -> &'static str {
        match self {
            Value::InstanceInvoke { kind, .. } => kind.relation_name(),
            Value::StaticInvoke { .. } => "StaticInvokeExpr",
            Value::Binop { op, .. } => op.relation_name(),
            Value::New { .. } => "NewExpr",
            Value::Cast { .. } => "CastExpr",
            Value::NewArray { .. } => "NewArrayExpr",
            Value::Length { .. } => "LengthExpr",
            Value::Neg { .. } => "NegExpr",
            Value::InstanceOf { .. } => "InstanceOfExpr",
            Value::NewMultiArray { .. } => "NewMultiArrayExpr",
            other => other.kind().into(),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            Value::StringConstant(_)
                | Value::IntConstant(_)
                | Value::LongConstant(_)
                | Value::FloatConstant(_)
                | Value::DoubleConstant(_)
                | Value::NullConstant
                | Value::ClassConstant(_)
        )
    }

    /// Locals and constants may be referenced from many places; their
    /// definition facts are emitted once per extraction.
    pub fn is_shared_entity(&self) -> bool {
        self.is_local() || self.is_constant()
    }

    /// Sub-values in declared order.
    pub fn operands(&self) -> SmallVec<[ValueId; 4]> {
        let mut operands = SmallVec::new();
        match self {
            Value::Local { .. }
            | Value::ParameterRef { .. }
            | Value::ThisRef { .. }
            | Value::StaticFieldRef { .. }
            | Value::StringConstant(_)
            | Value::IntConstant(_)
            | Value::LongConstant(_)
            | Value::FloatConstant(_)
            | Value::DoubleConstant(_)
            | Value::NullConstant
            | Value::ClassConstant(_)
            | Value::New { .. }
            | Value::CaughtExceptionRef => {}
            Value::InstanceFieldRef { base, .. } => operands.push(*base),
            Value::InstanceInvoke { base, args, .. } => {
                operands.push(*base);
                operands.extend(args.iter().copied());
            }
            Value::StaticInvoke { args, .. } => operands.extend(args.iter().copied()),
            Value::Binop { left, right, .. } => operands.extend([*left, *right]),
            Value::ArrayRef { base, index } => operands.extend([*base, *index]),
            Value::NewArray { size: op, .. }
            | Value::Cast { op, .. }
            | Value::Length { op }
            | Value::Neg { op }
            | Value::InstanceOf { op, .. } => operands.push(*op),
            Value::NewMultiArray { sizes, .. } => operands.extend(sizes.iter().copied()),
        }
        operands
    }

    /// Mutable sub-value slots, in the same order as [`Value::operands`].
    pub fn operands_mut(&mut self) -> SmallVec<[&mut ValueId; 4]> {
        let mut operands = SmallVec::new();
        match self {
            Value::Local { .. }
            | Value::ParameterRef { .. }
            | Value::ThisRef { .. }
            | Value::StaticFieldRef { .. }
            | Value::StringConstant(_)
            | Value::IntConstant(_)
            | Value::LongConstant(_)
            | Value::FloatConstant(_)
            | Value::DoubleConstant(_)
            | Value::NullConstant
            | Value::ClassConstant(_)
            | Value::New { .. }
            | Value::CaughtExceptionRef => {}
            Value::InstanceFieldRef { base, .. } => operands.push(base),
            Value::InstanceInvoke { base, args, .. } => {
                operands.push(base);
                operands.extend(args.iter_mut());
            }
            Value::StaticInvoke { args, .. } => operands.extend(args.iter_mut()),
            Value::Binop { left, right, .. } => {
                operands.push(left);
                operands.push(right);
            }
            Value::ArrayRef { base, index } => {
                operands.push(base);
                operands.push(index);
            }
            Value::NewArray { size: op, .. }
            | Value::Cast { op, .. }
            | Value::Length { op }
            | Value::Neg { op }
            | Value::InstanceOf { op, .. } => operands.push(op),
            Value::NewMultiArray { sizes, .. } => operands.extend(sizes.iter_mut()),
        }
        operands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    fn v(n: u32) -> ValueId {
        ValueId::from_id(NodeId(n))
    }

    #[test]
    fn invoke_operands_start_with_receiver() {
        let invoke = Value::InstanceInvoke {
            kind: InvokeKind::Virtual,
            base: v(1),
            method: MethodId::from_id(NodeId(2)),
            args: vec![v(3), v(4)],
        };
        assert_eq!(invoke.operands().as_slice(), &[v(1), v(3), v(4)]);
        assert_eq!(invoke.relation_name(), "VirtualInvokeExpr");
    }

    #[test]
    fn relation_names_follow_kind() {
        assert_eq!(Value::IntConstant(3).relation_name(), "IntConstant");
        assert_eq!(Value::CaughtExceptionRef.relation_name(), "CaughtExceptionRef");
        assert_eq!(
            Value::ArrayRef { base: v(0), index: v(1) }.relation_name(),
            "ArrayRef"
        );
        let binop = Value::Binop {
            op: BinopKind::Ushr,
            left: v(0),
            right: v(1),
        };
        assert_eq!(binop.relation_name(), "UshrExpr");
    }

    #[test]
    fn operands_mut_matches_operands() {
        let mut value = Value::NewMultiArray {
            base_type: TypeId::from_id(NodeId(0)),
            sizes: vec![v(5), v(6)],
        };
        for slot in value.operands_mut() {
            *slot = v(slot.id().0 + 10);
        }
        assert_eq!(value.operands().as_slice(), &[v(15), v(16)]);
    }
}
