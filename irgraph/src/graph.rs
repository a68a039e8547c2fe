//! Arena holding every node of a program.
//!
//! Nodes never move once allocated: the arena index of a node is its identity
//! token. Two parents referencing the same [`ValueId`] reference the *same*
//! node, which is how sharing (e.g. one local read by many statements) is
//! represented. Typed handles ([`StmtId`], [`ValueId`], ...) only record the
//! kind the caller expects; every read goes through a checked accessor.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{EnumDiscriminants, EnumIs};

use crate::{
    modules::{
        statements::Stmt,
        symbol::{Field, Method},
        values::Value,
    },
    types::{PrimType, Type},
    utils::Error,
};

/// Identity token of a node: its index in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

macro_rules! define_handle {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
            #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
            pub struct $name(NodeId);

            impl $name {
                /// Untyped identity token.
                pub fn id(self) -> NodeId {
                    self.0
                }

                /// Wrap an untyped token. The kind is only checked on access.
                pub fn from_id(id: NodeId) -> Self {
                    Self(id)
                }
            }

            impl From<$name> for NodeId {
                fn from(handle: $name) -> NodeId {
                    handle.0
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    self.0.fmt(f)
                }
            }
        )*
    };
}

define_handle! {
    /// Handle to a statement node.
    StmtId,
    /// Handle to a value (expression, reference, constant, local) node.
    ValueId,
    /// Handle to a type node.
    TypeId,
    /// Handle to a method node.
    MethodId,
    /// Handle to a field node.
    FieldId,
}

/// A node of the arena.
#[derive(Debug, Clone, PartialEq, EnumIs, EnumDiscriminants)]
#[strum_discriminants(name(NodeKind), derive(Hash, strum::Display, strum::IntoStaticStr))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Node {
    Stmt(Stmt),
    Value(Value),
    Type(Type),
    Method(Method),
    Field(Field),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.into()
    }
}

/// Position of a value operand inside a parent node.
///
/// `index` follows the declared operand order of the parent (see
/// [`Stmt::operands`] and [`Value::operands`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChildSlot {
    pub parent: NodeId,
    pub index: usize,
}

impl ChildSlot {
    pub fn new(parent: impl Into<NodeId>, index: usize) -> Self {
        Self {
            parent: parent.into(),
            index,
        }
    }
}

/// Arena of IR nodes.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IrGraph {
    nodes: Vec<Node>,
}

macro_rules! define_accessors {
    ($($get:ident, $get_mut:ident, $alloc:ident => $variant:ident($ty:ty) as $handle:ident;)*) => {
        $(
            /// Resolve the handle, checking the node kind.
            pub fn $get(&self, id: $handle) -> Result<&$ty, Error> {
                match self.node(id.id())? {
                    Node::$variant(inner) => Ok(inner),
                    other => Err(Error::KindMismatch {
                        id: id.id(),
                        expected: NodeKind::$variant,
                        found: other.kind(),
                    }),
                }
            }

            pub fn $get_mut(&mut self, id: $handle) -> Result<&mut $ty, Error> {
                match self.node_mut(id.id())? {
                    Node::$variant(inner) => Ok(inner),
                    other => Err(Error::KindMismatch {
                        id: id.id(),
                        expected: NodeKind::$variant,
                        found: other.kind(),
                    }),
                }
            }

            /// Append a new node and return its handle.
            pub fn $alloc(&mut self, inner: $ty) -> $handle {
                $handle(self.push(Node::$variant(inner)))
            }
        )*
    };
}

impl IrGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, Error> {
        self.nodes.get(id.index()).ok_or(Error::DanglingNode {
            id,
            len: self.nodes.len(),
        })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, Error> {
        let len = self.nodes.len();
        self.nodes
            .get_mut(id.index())
            .ok_or(Error::DanglingNode { id, len })
    }

    /// Iterate over every node together with its identity token.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index as u32), node))
    }

    define_accessors! {
        stmt, stmt_mut, alloc_stmt => Stmt(Stmt) as StmtId;
        value, value_mut, alloc_value => Value(Value) as ValueId;
        ty, ty_mut, alloc_type => Type(Type) as TypeId;
        method, method_mut, alloc_method => Method(Method) as MethodId;
        field, field_mut, alloc_field => Field(Field) as FieldId;
    }

    /// Value currently stored in a child slot.
    pub fn slot(&self, slot: ChildSlot) -> Result<ValueId, Error> {
        let invalid = Error::InvalidSlot {
            parent: slot.parent,
            index: slot.index,
        };
        match self.node(slot.parent)? {
            Node::Stmt(stmt) => stmt.operands().get(slot.index).copied().ok_or(invalid),
            Node::Value(value) => value.operands().get(slot.index).copied().ok_or(invalid),
            _ => Err(invalid),
        }
    }

    /// Rewire a child slot to another value, returning the previous one.
    ///
    /// This is the only way a parent→child reference changes; every other
    /// node keeps its identity and content.
    pub fn replace_child(&mut self, slot: ChildSlot, value: ValueId) -> Result<ValueId, Error> {
        // Resolve before borrowing mutably so a dangling replacement is rejected.
        self.value(value)?;
        let invalid = Error::InvalidSlot {
            parent: slot.parent,
            index: slot.index,
        };
        let target = match self.node_mut(slot.parent)? {
            Node::Stmt(stmt) => stmt.operands_mut().into_iter().nth(slot.index),
            Node::Value(parent) => parent.operands_mut().into_iter().nth(slot.index),
            _ => None,
        };
        let target = target.ok_or(invalid)?;
        Ok(std::mem::replace(target, value))
    }

    /// Overwrite the content of a value node, keeping its identity token.
    pub fn overwrite_value(&mut self, id: ValueId, value: Value) -> Result<Value, Error> {
        let slot = self.value_mut(id)?;
        Ok(std::mem::replace(slot, value))
    }

    /// Number of parent slots referencing `id`, lookup-switch match values
    /// included.
    pub fn reference_count(&self, id: ValueId) -> usize {
        let count = |operands: &[ValueId]| operands.iter().filter(|v| **v == id).count();
        self.nodes
            .iter()
            .map(|node| match node {
                Node::Stmt(stmt) => {
                    let matched = match stmt {
                        Stmt::LookupSwitch { lookup_values, .. } => count(lookup_values.as_slice()),
                        _ => 0,
                    };
                    matched + count(stmt.operands().as_slice())
                }
                Node::Value(value) => count(value.operands().as_slice()),
                _ => 0,
            })
            .sum()
    }

    pub fn local(&mut self, name: impl Into<String>, ty: TypeId) -> ValueId {
        self.alloc_value(Value::Local {
            name: name.into(),
            ty,
        })
    }

    pub fn int_constant(&mut self, value: i32) -> ValueId {
        self.alloc_value(Value::IntConstant(value))
    }

    pub fn string_constant(&mut self, value: impl Into<String>) -> ValueId {
        self.alloc_value(Value::StringConstant(value.into()))
    }

    pub fn prim_type(&mut self, prim: PrimType) -> TypeId {
        self.alloc_type(Type::Prim(prim))
    }

    pub fn ref_type(&mut self, class_name: impl Into<String>) -> TypeId {
        self.alloc_type(Type::Ref {
            class_name: class_name.into(),
        })
    }

    pub fn assign(&mut self, left: ValueId, right: ValueId) -> StmtId {
        self.alloc_stmt(Stmt::Assign { left, right })
    }

    pub fn identity(&mut self, left: ValueId, right: ValueId) -> StmtId {
        self.alloc_stmt(Stmt::Identity { left, right })
    }

    pub fn goto(&mut self, target: StmtId) -> StmtId {
        self.alloc_stmt(Stmt::Goto { target })
    }

    pub fn if_stmt(&mut self, condition: ValueId, target: StmtId) -> StmtId {
        self.alloc_stmt(Stmt::If { condition, target })
    }

    pub fn return_void(&mut self) -> StmtId {
        self.alloc_stmt(Stmt::ReturnVoid)
    }
}
