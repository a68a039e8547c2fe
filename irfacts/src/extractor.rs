//! Fact extraction.
//!
//! The extractor walks every statement registered in the control-flow graph
//! and projects it, together with everything it references, into a
//! [`FactStore`]. Every node is keyed by its arena identity.
//!
//! Statements and the *occurrence* of a value inside its parent are emitted
//! every time they are reached; the insertion is idempotent since relations
//! are sets. The *definition* rows of shareable entities (locals, constants,
//! types, methods and fields) are emitted once per pass, guarded by a seen set.
//! Branch targets that were not emitted yet are queued and emitted once, so
//! backward jumps do not loop.
use std::collections::HashSet;

use irgraph::{
    graph::{FieldId, IrGraph, MethodId, NodeId, StmtId, TypeId, ValueId},
    icfg::Icfg,
    modules::{statements::Stmt, values::Value},
    types::Type,
    utils::Error as GraphError,
};
use log::{debug, trace};

use crate::{
    database::{ColumnType, FactStore, Tuple},
    tuple,
    utils::error::FactResult,
};

/// Column list of a relation. Columns are integers unless annotated.
macro_rules! columns {
    (@ty) => { ColumnType::Integer };
    (@ty $ty:ident) => { ColumnType::$ty };
    ($($name:literal $(: $ty:ident)?),* $(,)?) => {
        &[$(($name, columns!(@ty $($ty)?))),*]
    };
}

pub struct FactExtractor<'a> {
    graph: &'a IrGraph,
    icfg: &'a Icfg,
    store: FactStore,
    /// Shareable entities whose definition rows were emitted in this pass.
    seen: HashSet<NodeId>,
    /// Statements emitted in this pass.
    emitted: HashSet<StmtId>,
    /// Branch targets waiting to be emitted.
    pending: Vec<StmtId>,
}

impl<'a> FactExtractor<'a> {
    pub fn new(graph: &'a IrGraph, icfg: &'a Icfg) -> Self {
        Self {
            graph,
            icfg,
            store: FactStore::new(),
            seen: HashSet::new(),
            emitted: HashSet::new(),
            pending: Vec::new(),
        }
    }

    /// Run one extraction pass. Any node that cannot be handled aborts the
    /// pass; no partial store is returned.
    pub fn extract(mut self) -> FactResult<FactStore> {
        let icfg = self.icfg;
        for source in icfg.nodes() {
            self.emit_stmt(source)?;
            while let Some(target) = self.pending.pop() {
                if !self.emitted.contains(&target) {
                    self.emit_stmt(target)?;
                }
            }

            for target in icfg.successors(source) {
                self.emit(
                    "ControlFlowEdge",
                    columns!["source", "target"],
                    tuple![source, target],
                )?;
            }
        }

        debug!(
            "Extracted {} tuples in {} relations from {} statements",
            self.store.tuple_count(),
            self.store.len(),
            self.emitted.len()
        );
        Ok(self.store)
    }

    fn emit(&mut self, relation: &str, columns: &[(&str, ColumnType)], tuple: Tuple) -> FactResult<()> {
        self.store.emit(relation, columns, tuple)?;
        Ok(())
    }

    fn emit_target(&mut self, target: StmtId) {
        if !self.emitted.contains(&target) {
            self.pending.push(target);
        }
    }

    fn emit_stmt(&mut self, id: StmtId) -> FactResult<()> {
        let graph = self.graph;
        let stmt = graph.stmt(id)?;
        self.emitted.insert(id);
        trace!("Emitting statement {}", id);

        self.emit("Unit", columns!["id"], tuple![id])?;
        let method = self.icfg.method_of(id)?;
        self.emit(
            "MethodOfUnit",
            columns!["unit", "method"],
            tuple![id, method],
        )?;
        self.emit_method(method)?;

        let relation = stmt.relation_name();
        match stmt {
            Stmt::Identity { left, right } | Stmt::Assign { left, right } => {
                self.emit(
                    relation,
                    columns!["id", "left", "right"],
                    tuple![id, *left, *right],
                )?;
                self.emit_value(*left, id)?;
                self.emit_value(*right, id)?;
            }
            Stmt::Return { op } => {
                self.emit(
                    relation,
                    columns!["id", "op", "method"],
                    tuple![id, *op, method],
                )?;
                self.emit_value(*op, id)?;
            }
            Stmt::ReturnVoid => {
                self.emit(relation, columns!["id", "method"], tuple![id, method])?;
            }
            Stmt::Invoke { expr } => {
                self.emit(
                    relation,
                    columns!["id", "invokeExpr"],
                    tuple![id, *expr],
                )?;
                self.emit_value(*expr, id)?;
            }
            Stmt::If { condition, target } => {
                self.emit(
                    relation,
                    columns!["id", "condition", "target"],
                    tuple![id, *condition, *target],
                )?;
                self.emit_value(*condition, id)?;
                self.emit_target(*target);
            }
            Stmt::Goto { target } => {
                self.emit(relation, columns!["id", "target"], tuple![id, *target])?;
                self.emit_target(*target);
            }
            Stmt::TableSwitch {
                key,
                low,
                targets,
                default,
            } => {
                self.emit(
                    relation,
                    columns!["id", "key", "defaultCase"],
                    tuple![id, *key, *default],
                )?;
                self.emit_value(*key, id)?;
                for (i, target) in targets.iter().enumerate() {
                    self.emit(
                        "TableSwitchCases",
                        columns!["switchId", "index", "target"],
                        tuple![id, i64::from(*low) + i as i64, *target],
                    )?;
                    self.emit_target(*target);
                }
                self.emit_target(*default);
            }
            Stmt::LookupSwitch {
                key,
                lookup_values,
                targets,
                default,
            } => {
                self.emit(
                    relation,
                    columns!["id", "key", "defaultCase"],
                    tuple![id, *key, *default],
                )?;
                self.emit_value(*key, id)?;
                if lookup_values.len() != targets.len() {
                    return Err(GraphError::MalformedSwitch {
                        stmt: id.id(),
                        values: lookup_values.len(),
                        targets: targets.len(),
                    }
                    .into());
                }
                for (value, target) in lookup_values.iter().zip(targets) {
                    self.emit(
                        "LookupSwitchCases",
                        columns!["switchId", "lookupValue", "target"],
                        tuple![id, *value, *target],
                    )?;
                    self.emit_value(*value, id)?;
                    self.emit_target(*target);
                }
                self.emit_target(*default);
            }
            Stmt::Throw { op } | Stmt::EnterMonitor { op } | Stmt::ExitMonitor { op } => {
                self.emit(relation, columns!["id", "op"], tuple![id, *op])?;
                self.emit_value(*op, id)?;
            }
        }
        Ok(())
    }

    /// Emit a value occurring inside statement `unit`.
    fn emit_value(&mut self, id: ValueId, unit: StmtId) -> FactResult<()> {
        let graph = self.graph;
        let value = graph.value(id)?;
        self.emit("Value", columns!["id"], tuple![id])?;
        if value.is_shared_entity() && !self.seen.insert(id.id()) {
            return Ok(());
        }

        let relation = value.relation_name();
        match value {
            Value::Local { name, ty } => {
                let method = self.icfg.method_of(unit)?;
                self.emit(
                    "MethodOfLocal",
                    columns!["local", "method"],
                    tuple![id, method],
                )?;
                self.emit_method(method)?;
                self.emit(
                    relation,
                    columns!["id", "name": String, "type"],
                    tuple![id, name.as_str(), *ty],
                )?;
                self.emit_type(*ty)?;
            }
            Value::ParameterRef { index, ty } => {
                let method = self.icfg.method_of(unit)?;
                self.emit(
                    relation,
                    columns!["id", "index", "type", "method"],
                    tuple![id, *index, *ty, method],
                )?;
                self.emit_type(*ty)?;
                self.emit_method(method)?;
            }
            Value::ThisRef { ty } => {
                self.emit(relation, columns!["id", "type"], tuple![id, *ty])?;
                self.emit_type(*ty)?;
            }
            Value::InstanceFieldRef { base, field } => {
                self.emit(
                    relation,
                    columns!["id", "base", "fieldRef"],
                    tuple![id, *base, *field],
                )?;
                self.emit_value(*base, unit)?;
                self.emit_field(*field)?;
            }
            Value::StaticFieldRef { field } => {
                self.emit(relation, columns!["id", "fieldRef"], tuple![id, *field])?;
                self.emit_field(*field)?;
            }
            Value::InstanceInvoke {
                base, method, args, ..
            } => {
                self.emit(
                    relation,
                    columns!["id", "base", "methodRef"],
                    tuple![id, *base, *method],
                )?;
                self.emit_value(*base, unit)?;
                self.emit_method(*method)?;
                self.emit_arguments(id, args, unit)?;
            }
            Value::StaticInvoke { method, args } => {
                self.emit(relation, columns!["id", "methodRef"], tuple![id, *method])?;
                self.emit_method(*method)?;
                self.emit_arguments(id, args, unit)?;
            }
            Value::StringConstant(value) => {
                let stripped: String = value.chars().filter(|c| !c.is_whitespace()).collect();
                self.emit(
                    relation,
                    columns!["id", "value": String],
                    tuple![id, stripped],
                )?;
            }
            Value::IntConstant(value) => {
                self.emit(relation, columns!["id", "value"], tuple![id, *value])?;
            }
            Value::LongConstant(value) => {
                self.emit(relation, columns!["id", "value"], tuple![id, *value])?;
            }
            Value::FloatConstant(value) => {
                self.emit(
                    relation,
                    columns!["id", "value": String],
                    tuple![id, format!("{:?}", value)],
                )?;
            }
            Value::DoubleConstant(value) => {
                self.emit(
                    relation,
                    columns!["id", "value": String],
                    tuple![id, format!("{:?}", value)],
                )?;
            }
            Value::NullConstant | Value::CaughtExceptionRef => {
                self.emit(relation, columns!["id"], tuple![id])?;
            }
            Value::ClassConstant(value) => {
                self.emit(
                    relation,
                    columns!["id", "value": String],
                    tuple![id, value.as_str()],
                )?;
            }
            Value::Binop { left, right, .. } => {
                self.emit(
                    relation,
                    columns!["id", "left", "right"],
                    tuple![id, *left, *right],
                )?;
                self.emit_value(*left, unit)?;
                self.emit_value(*right, unit)?;
            }
            Value::New { ty } => {
                self.emit(relation, columns!["id", "type"], tuple![id, *ty])?;
                self.emit_type(*ty)?;
            }
            Value::ArrayRef { base, index } => {
                self.emit(
                    relation,
                    columns!["id", "base", "index"],
                    tuple![id, *base, *index],
                )?;
                self.emit_value(*base, unit)?;
                self.emit_value(*index, unit)?;
            }
            Value::Cast { op, ty } => {
                self.emit(
                    relation,
                    columns!["id", "op", "type"],
                    tuple![id, *op, *ty],
                )?;
                self.emit_value(*op, unit)?;
                self.emit_type(*ty)?;
            }
            Value::NewArray { base_type, size } => {
                self.emit(
                    relation,
                    columns!["id", "baseType", "size"],
                    tuple![id, *base_type, *size],
                )?;
                self.emit_type(*base_type)?;
                self.emit_value(*size, unit)?;
            }
            Value::Length { op } | Value::Neg { op } => {
                self.emit(relation, columns!["id", "op"], tuple![id, *op])?;
                self.emit_value(*op, unit)?;
            }
            Value::InstanceOf { op, check_type } => {
                self.emit(
                    relation,
                    columns!["id", "op", "type"],
                    tuple![id, *op, *check_type],
                )?;
                self.emit_value(*op, unit)?;
                self.emit_type(*check_type)?;
            }
            Value::NewMultiArray { base_type, sizes } => {
                self.emit(
                    relation,
                    columns!["id", "baseType"],
                    tuple![id, *base_type],
                )?;
                self.emit_type(*base_type)?;
                for (i, size) in sizes.iter().enumerate() {
                    self.emit(
                        "NewMultiArraySizes",
                        columns!["arrayExprId", "index", "sizeValueId"],
                        tuple![id, i, *size],
                    )?;
                    self.emit_value(*size, unit)?;
                }
            }
        }
        Ok(())
    }

    fn emit_arguments(&mut self, invoke: ValueId, args: &[ValueId], unit: StmtId) -> FactResult<()> {
        for (i, argument) in args.iter().enumerate() {
            self.emit(
                "MethodInvocationArguments",
                columns!["invokeId", "index", "argument"],
                tuple![invoke, i, *argument],
            )?;
            self.emit_value(*argument, unit)?;
        }
        Ok(())
    }

    fn emit_method(&mut self, id: MethodId) -> FactResult<()> {
        if !self.seen.insert(id.id()) {
            return Ok(());
        }
        let graph = self.graph;
        let method = graph.method(id)?;
        self.emit(
            "Method",
            columns![
                "id",
                "name": String,
                "declaringClass": String,
                "isStatic": Boolean,
                "returnType",
            ],
            tuple![
                id,
                method.name.as_str(),
                method.declaring_class.as_str(),
                method.is_static,
                method.return_type
            ],
        )?;
        self.emit_type(method.return_type)?;
        for (i, parameter) in method.parameter_types.iter().enumerate() {
            self.emit(
                "MethodParameters",
                columns!["methodId", "index", "parameterType"],
                tuple![id, i, *parameter],
            )?;
            self.emit_type(*parameter)?;
        }
        Ok(())
    }

    fn emit_field(&mut self, id: FieldId) -> FactResult<()> {
        if !self.seen.insert(id.id()) {
            return Ok(());
        }
        let graph = self.graph;
        let field = graph.field(id)?;
        self.emit(
            "Field",
            columns!["id", "name": String, "declaringClass": String, "type"],
            tuple![
                id,
                field.name.as_str(),
                field.declaring_class.as_str(),
                field.ty
            ],
        )?;
        self.emit_type(field.ty)
    }

    fn emit_type(&mut self, id: TypeId) -> FactResult<()> {
        if !self.seen.insert(id.id()) {
            return Ok(());
        }
        let graph = self.graph;
        let ty = graph.ty(id)?;
        let relation = ty.relation_name();
        match ty {
            Type::Ref { class_name } => self.emit(
                relation,
                columns!["id", "name": String],
                tuple![id, class_name.as_str()],
            ),
            Type::Prim(_) | Type::Void => self.emit(relation, columns!["id"], tuple![id]),
            Type::Array { element } => {
                self.emit(relation, columns!["id", "baseType"], tuple![id, *element])?;
                self.emit_type(*element)
            }
        }
    }
}

/// Extract the facts of every statement registered in `icfg`.
pub fn extract(graph: &IrGraph, icfg: &Icfg) -> FactResult<FactStore> {
    FactExtractor::new(graph, icfg).extract()
}
