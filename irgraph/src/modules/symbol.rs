//! Method and field symbols.
//!
//! Symbols are shared: every invocation of a method references the same
//! method node, every access to a field the same field node.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::TypeId;

/// A method declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Method {
    /// Simple name (e.g. `main`, `<init>`).
    pub name: String,

    /// Fully qualified name of the declaring class.
    pub declaring_class: String,

    pub is_static: bool,

    /// Return type; methods returning nothing reference a `Void` type node.
    pub return_type: TypeId,

    /// Parameter types, in declaration order.
    pub parameter_types: Vec<TypeId>,
}

impl Method {
    pub fn new(
        name: impl Into<String>,
        declaring_class: impl Into<String>,
        is_static: bool,
        return_type: TypeId,
        parameter_types: Vec<TypeId>,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_class: declaring_class.into(),
            is_static,
            return_type,
            parameter_types,
        }
    }
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Field {
    pub name: String,
    pub declaring_class: String,
    pub ty: TypeId,
}

impl Field {
    pub fn new(name: impl Into<String>, declaring_class: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            declaring_class: declaring_class.into(),
            ty,
        }
    }
}
