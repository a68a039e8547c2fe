//! IR node variants
//!
//! The IR is a Jimple-like three-address representation. Every node kind is a
//! closed sum type so that the consumers (fact extraction, mutation) match
//! exhaustively over it. Submodules:
//!
//! - `statements`: statements (`Stmt`), the roots of the control-flow graph
//! - `values`: expressions, references, locals and constants (`Value`)
//! - `symbol`: methods and fields
//! - `fmt`: textual rendering of nodes, used in logs and graph dumps
pub mod fmt;
pub mod statements;
pub mod symbol;
pub mod values;
