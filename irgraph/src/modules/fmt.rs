//! Textual rendering of IR nodes.
//!
//! The format is close to Jimple: `x = 5`, `if b goto #7`,
//! `virtualinvoke r0.<Foo: int bar(int)>(x)`. Statement targets are printed
//! by identity token. A handle that does not resolve renders as
//! `<dangling #n>` rather than failing, since the output is only used for
//! diagnostics.
use std::fmt::{Display, Formatter, Result};

use crate::{
    graph::{FieldId, IrGraph, MethodId, NodeId, StmtId, TypeId, ValueId},
    modules::{statements::Stmt, values::Value},
    types::Type,
};

fn dangling(f: &mut Formatter<'_>, id: NodeId) -> Result {
    write!(f, "<dangling {}>", id)
}

fn write_list(f: &mut Formatter<'_>, graph: &IrGraph, values: &[ValueId]) -> Result {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", display_value(graph, *value))?;
    }
    Ok(())
}

/// Render a type.
pub fn display_type<'a>(graph: &'a IrGraph, id: TypeId) -> impl Display + 'a {
    struct Fmt<'a> {
        graph: &'a IrGraph,
        id: TypeId,
    }

    impl Display for Fmt<'_> {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            match self.graph.ty(self.id) {
                Ok(Type::Ref { class_name }) => write!(f, "{}", class_name),
                Ok(Type::Prim(prim)) => write!(f, "{}", prim.keyword()),
                Ok(Type::Void) => write!(f, "void"),
                Ok(Type::Array { element }) => {
                    write!(f, "{}[]", display_type(self.graph, *element))
                }
                Err(_) => dangling(f, self.id.id()),
            }
        }
    }

    Fmt { graph, id }
}

/// Render a method signature, `<Class: ret name(params)>`.
pub fn display_method<'a>(graph: &'a IrGraph, id: MethodId) -> impl Display + 'a {
    struct Fmt<'a> {
        graph: &'a IrGraph,
        id: MethodId,
    }

    impl Display for Fmt<'_> {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            let Ok(method) = self.graph.method(self.id) else {
                return dangling(f, self.id.id());
            };
            write!(
                f,
                "<{}: {} {}(",
                method.declaring_class,
                display_type(self.graph, method.return_type),
                method.name
            )?;
            for (i, param) in method.parameter_types.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", display_type(self.graph, *param))?;
            }
            write!(f, ")>")
        }
    }

    Fmt { graph, id }
}

/// Render a field signature, `<Class: type name>`.
pub fn display_field<'a>(graph: &'a IrGraph, id: FieldId) -> impl Display + 'a {
    struct Fmt<'a> {
        graph: &'a IrGraph,
        id: FieldId,
    }

    impl Display for Fmt<'_> {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            match self.graph.field(self.id) {
                Ok(field) => write!(
                    f,
                    "<{}: {} {}>",
                    field.declaring_class,
                    display_type(self.graph, field.ty),
                    field.name
                ),
                Err(_) => dangling(f, self.id.id()),
            }
        }
    }

    Fmt { graph, id }
}

/// Render a value.
pub fn display_value<'a>(graph: &'a IrGraph, id: ValueId) -> impl Display + 'a {
    struct Fmt<'a> {
        graph: &'a IrGraph,
        id: ValueId,
    }

    impl Display for Fmt<'_> {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            let graph = self.graph;
            let Ok(value) = graph.value(self.id) else {
                return dangling(f, self.id.id());
            };
            match value {
                Value::Local { name, .. } => write!(f, "{}", name),
                Value::ParameterRef { index, ty } => {
                    write!(f, "@parameter{}: {}", index, display_type(graph, *ty))
                }
                Value::ThisRef { ty } => write!(f, "@this: {}", display_type(graph, *ty)),
                Value::InstanceFieldRef { base, field } => write!(
                    f,
                    "{}.{}",
                    display_value(graph, *base),
                    display_field(graph, *field)
                ),
                Value::StaticFieldRef { field } => write!(f, "{}", display_field(graph, *field)),
                Value::InstanceInvoke {
                    kind,
                    base,
                    method,
                    args,
                } => {
                    write!(
                        f,
                        "{} {}.{}(",
                        kind.keyword(),
                        display_value(graph, *base),
                        display_method(graph, *method)
                    )?;
                    write_list(f, graph, args)?;
                    write!(f, ")")
                }
                Value::StaticInvoke { method, args } => {
                    write!(f, "staticinvoke {}(", display_method(graph, *method))?;
                    write_list(f, graph, args)?;
                    write!(f, ")")
                }
                Value::StringConstant(s) => write!(f, "{:?}", s),
                Value::IntConstant(i) => write!(f, "{}", i),
                Value::LongConstant(l) => write!(f, "{}L", l),
                Value::FloatConstant(x) => write!(f, "{}F", x),
                Value::DoubleConstant(x) => write!(f, "{}", x),
                Value::NullConstant => write!(f, "null"),
                Value::ClassConstant(name) => write!(f, "class {:?}", name),
                Value::Binop { op, left, right } => write!(
                    f,
                    "{} {} {}",
                    display_value(graph, *left),
                    op.symbol(),
                    display_value(graph, *right)
                ),
                Value::New { ty } => write!(f, "new {}", display_type(graph, *ty)),
                Value::ArrayRef { base, index } => write!(
                    f,
                    "{}[{}]",
                    display_value(graph, *base),
                    display_value(graph, *index)
                ),
                Value::Cast { op, ty } => write!(
                    f,
                    "({}) {}",
                    display_type(graph, *ty),
                    display_value(graph, *op)
                ),
                Value::CaughtExceptionRef => write!(f, "@caughtexception"),
                Value::NewArray { base_type, size } => write!(
                    f,
                    "newarray ({})[{}]",
                    display_type(graph, *base_type),
                    display_value(graph, *size)
                ),
                Value::Length { op } => write!(f, "lengthof {}", display_value(graph, *op)),
                Value::Neg { op } => write!(f, "neg {}", display_value(graph, *op)),
                Value::InstanceOf { op, check_type } => write!(
                    f,
                    "{} instanceof {}",
                    display_value(graph, *op),
                    display_type(graph, *check_type)
                ),
                Value::NewMultiArray { base_type, sizes } => {
                    write!(f, "newmultiarray ({})", display_type(graph, *base_type))?;
                    for size in sizes {
                        write!(f, "[{}]", display_value(graph, *size))?;
                    }
                    Ok(())
                }
            }
        }
    }

    Fmt { graph, id }
}

/// Render a statement.
pub fn display_stmt<'a>(graph: &'a IrGraph, id: StmtId) -> impl Display + 'a {
    struct Fmt<'a> {
        graph: &'a IrGraph,
        id: StmtId,
    }

    impl Display for Fmt<'_> {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            let graph = self.graph;
            let Ok(stmt) = graph.stmt(self.id) else {
                return dangling(f, self.id.id());
            };
            match stmt {
                Stmt::Identity { left, right } => write!(
                    f,
                    "{} := {}",
                    display_value(graph, *left),
                    display_value(graph, *right)
                ),
                Stmt::Assign { left, right } => write!(
                    f,
                    "{} = {}",
                    display_value(graph, *left),
                    display_value(graph, *right)
                ),
                Stmt::Return { op } => write!(f, "return {}", display_value(graph, *op)),
                Stmt::ReturnVoid => write!(f, "return"),
                Stmt::Invoke { expr } => write!(f, "{}", display_value(graph, *expr)),
                Stmt::If { condition, target } => write!(
                    f,
                    "if {} goto {}",
                    display_value(graph, *condition),
                    target
                ),
                Stmt::Goto { target } => write!(f, "goto {}", target),
                Stmt::TableSwitch {
                    key,
                    low,
                    targets,
                    default,
                } => {
                    write!(f, "tableswitch({}) {{", display_value(graph, *key))?;
                    for (i, target) in targets.iter().enumerate() {
                        write!(f, " case {}: goto {};", i64::from(*low) + i as i64, target)?;
                    }
                    write!(f, " default: goto {}; }}", default)
                }
                Stmt::LookupSwitch {
                    key,
                    lookup_values,
                    targets,
                    default,
                } => {
                    write!(f, "lookupswitch({}) {{", display_value(graph, *key))?;
                    for i in 0..lookup_values.len().max(targets.len()) {
                        match (lookup_values.get(i), targets.get(i)) {
                            (Some(value), Some(target)) => write!(
                                f,
                                " case {}: goto {};",
                                display_value(graph, *value),
                                target
                            )?,
                            (Some(value), None) => {
                                write!(f, " case {}: <missing>;", display_value(graph, *value))?
                            }
                            (None, Some(target)) => write!(f, " case <missing>: goto {};", target)?,
                            (None, None) => {}
                        }
                    }
                    write!(f, " default: goto {}; }}", default)
                }
                Stmt::Throw { op } => write!(f, "throw {}", display_value(graph, *op)),
                Stmt::EnterMonitor { op } => {
                    write!(f, "entermonitor {}", display_value(graph, *op))
                }
                Stmt::ExitMonitor { op } => write!(f, "exitmonitor {}", display_value(graph, *op)),
            }
        }
    }

    Fmt { graph, id }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimType;

    #[test]
    fn renders_assignment() {
        let mut graph = IrGraph::new();
        let int = graph.prim_type(PrimType::Int);
        let x = graph.local("x", int);
        let five = graph.int_constant(5);
        let stmt = graph.assign(x, five);
        assert_eq!(display_stmt(&graph, stmt).to_string(), "x = 5");
    }

    #[test]
    fn renders_unmatched_lookup_targets() {
        let mut graph = IrGraph::new();
        let int = graph.prim_type(PrimType::Int);
        let k = graph.local("k", int);
        let ten = graph.int_constant(10);
        let exit = graph.return_void();
        let other = graph.return_void();
        let stmt = graph.alloc_stmt(Stmt::LookupSwitch {
            key: k,
            lookup_values: vec![ten],
            targets: vec![exit, other],
            default: exit,
        });
        assert_eq!(
            display_stmt(&graph, stmt).to_string(),
            format!(
                "lookupswitch(k) {{ case 10: goto {}; case <missing>: goto {}; default: goto {}; }}",
                exit, other, exit
            )
        );
    }

    #[test]
    fn renders_dangling_handles() {
        let graph = IrGraph::new();
        let stmt = StmtId::from_id(NodeId(3));
        assert_eq!(display_stmt(&graph, stmt).to_string(), "<dangling #3>");
    }
}
