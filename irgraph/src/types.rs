//! Type nodes.
//!
//! Types are ordinary arena nodes: two values declared with the *same* type
//! node share its identity, which is how type sharing shows up in the fact
//! encoding. Allocate one node per distinct type and reuse its [`TypeId`] when
//! the program should see them as the same type.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{EnumDiscriminants, EnumIs, EnumIter, IntoStaticStr};

use crate::graph::TypeId;

/// Primitive (non-reference) types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PrimType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimType {
    /// Name of the relation holding facts for this primitive type.
    pub fn relation_name(&self) -> &'static str {
        match self {
            PrimType::Boolean => "BooleanType",
            PrimType::Byte => "ByteType",
            PrimType::Char => "CharType",
            PrimType::Short => "ShortType",
            PrimType::Int => "IntType",
            PrimType::Long => "LongType",
            PrimType::Float => "FloatType",
            PrimType::Double => "DoubleType",
        }
    }

    /// Source-level keyword, used when printing.
    pub fn keyword(&self) -> &'static str {
        match self {
            PrimType::Boolean => "boolean",
            PrimType::Byte => "byte",
            PrimType::Char => "char",
            PrimType::Short => "short",
            PrimType::Int => "int",
            PrimType::Long => "long",
            PrimType::Float => "float",
            PrimType::Double => "double",
        }
    }
}

/// A type node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, EnumDiscriminants)]
#[strum_discriminants(name(TypeKind), derive(Hash, IntoStaticStr))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Type {
    /// A class or interface type, identified by its fully qualified name.
    Ref { class_name: String },

    /// A primitive type.
    Prim(PrimType),

    /// The return type of methods that return nothing.
    Void,

    /// An array whose elements are of type `element`.
    Array { element: TypeId },
}

impl Type {
    /// Return the discriminant for this type.
    pub fn kind(&self) -> TypeKind {
        self.into()
    }

    /// Name of the relation holding the definition fact of this type.
    pub fn relation_name(&self) -> &'static str {
        match self {
            Type::Ref { .. } => "RefType",
            Type::Prim(prim) => prim.relation_name(),
            Type::Void => "VoidType",
            Type::Array { .. } => "ArrayType",
        }
    }

    /// Returns true if this is the primitive `int` type.
    pub fn is_int(&self) -> bool {
        matches!(self, Type::Prim(PrimType::Int))
    }
}
