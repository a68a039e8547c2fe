#![allow(dead_code)]

use irgraph::{
    graph::{FieldId, IrGraph, MethodId, StmtId, ValueId},
    icfg::Icfg,
    modules::{
        statements::Stmt,
        symbol::{Field, Method},
        values::{BinopKind, InvokeKind, Value},
    },
    types::{PrimType, Type},
};

pub struct Program {
    pub graph: IrGraph,
    pub icfg: Icfg,
    pub method: MethodId,
    pub body: Vec<StmtId>,
}

/// `x = 5`, alone in `Main.main()`.
pub struct AssignConstant {
    pub program: Program,
    pub stmt: StmtId,
    pub local: ValueId,
    pub constant: ValueId,
}

pub fn assign_constant() -> AssignConstant {
    let mut graph = IrGraph::new();
    let void = graph.alloc_type(Type::Void);
    let int = graph.prim_type(PrimType::Int);
    let method = graph.alloc_method(Method::new("main", "Main", true, void, vec![]));
    let local = graph.local("x", int);
    let constant = graph.int_constant(5);
    let stmt = graph.assign(local, constant);

    let mut icfg = Icfg::new();
    icfg.add_body(&graph, method, &[stmt])
        .expect("failed to register body");

    AssignConstant {
        program: Program {
            graph,
            icfg,
            method,
            body: vec![stmt],
        },
        stmt,
        local,
        constant,
    }
}

/// A counter class exercising most statement and value kinds:
///
/// ```text
/// static int Counter.step(int, java.lang.String)
///   this := @parameter0: int
///   label := @parameter1: java.lang.String
///   i = 3
///   total = Counter.total
///   head: if i <= 0 goto done
///   total = total + i
///   i = i - 1
///   tableswitch(i) { case 1: goto head; case 2: goto head; default: goto done; }
///   done: Counter.total = total
///   staticinvoke <Log: void print(java.lang.String,int)>("total is", total)
///   grid = newmultiarray (int)[i][2]
///   return total
/// ```
pub struct Counter {
    pub program: Program,
    pub total_field: FieldId,
    pub three: ValueId,
}

pub fn counter() -> Counter {
    let mut graph = IrGraph::new();
    let int = graph.prim_type(PrimType::Int);
    let void = graph.alloc_type(Type::Void);
    let string = graph.ref_type("java.lang.String");
    let grid_row = graph.alloc_type(Type::Array { element: int });
    let grid_ty = graph.alloc_type(Type::Array { element: grid_row });

    let method = graph.alloc_method(Method::new(
        "step",
        "Counter",
        true,
        int,
        vec![int, string],
    ));
    let print = graph.alloc_method(Method::new(
        "print",
        "Log",
        true,
        void,
        vec![string, int],
    ));
    let total_field = graph.alloc_field(Field::new("total", "Counter", int));

    let start = graph.local("start", int);
    let label = graph.local("label", string);
    let i = graph.local("i", int);
    let total = graph.local("total", int);
    let grid = graph.local("grid", grid_ty);

    let param0 = graph.alloc_value(Value::ParameterRef { index: 0, ty: int });
    let param1 = graph.alloc_value(Value::ParameterRef {
        index: 1,
        ty: string,
    });
    let three = graph.int_constant(3);
    let zero = graph.int_constant(0);
    let one = graph.int_constant(1);
    let two = graph.int_constant(2);
    let read_total = graph.alloc_value(Value::StaticFieldRef { field: total_field });
    let write_total = graph.alloc_value(Value::StaticFieldRef { field: total_field });
    let cond = graph.alloc_value(Value::Binop {
        op: BinopKind::Le,
        left: i,
        right: zero,
    });
    let sum = graph.alloc_value(Value::Binop {
        op: BinopKind::Add,
        left: total,
        right: i,
    });
    let decrement = graph.alloc_value(Value::Binop {
        op: BinopKind::Sub,
        left: i,
        right: one,
    });
    let message = graph.string_constant("total is");
    let call = graph.alloc_value(Value::StaticInvoke {
        method: print,
        args: vec![message, total],
    });
    let alloc = graph.alloc_value(Value::NewMultiArray {
        base_type: int,
        sizes: vec![i, two],
    });

    let s_param0 = graph.identity(start, param0);
    let s_param1 = graph.identity(label, param1);
    let s_init = graph.assign(i, three);
    let s_load = graph.assign(total, read_total);
    let s_store = graph.assign(write_total, total);
    let s_ret = graph.alloc_stmt(Stmt::Return { op: total });
    let s_print = graph.alloc_stmt(Stmt::Invoke { expr: call });
    let s_alloc = graph.assign(grid, alloc);
    let s_head = graph.if_stmt(cond, s_store);
    let s_add = graph.assign(total, sum);
    let s_dec = graph.assign(i, decrement);
    let s_switch = graph.alloc_stmt(Stmt::TableSwitch {
        key: i,
        low: 1,
        targets: vec![s_head, s_head],
        default: s_store,
    });

    let body = vec![
        s_param0, s_param1, s_init, s_load, s_head, s_add, s_dec, s_switch, s_store, s_print,
        s_alloc, s_ret,
    ];
    let mut icfg = Icfg::new();
    icfg.add_body(&graph, method, &body)
        .expect("failed to register body");

    Counter {
        program: Program {
            graph,
            icfg,
            method,
            body,
        },
        total_field,
        three,
    }
}

/// `local = receiver.<Virtual: int get()>()` followed by a lookup switch
/// and a throw, with floating point and class constants.
pub fn dispatch() -> Program {
    let mut graph = IrGraph::new();
    let int = graph.prim_type(PrimType::Int);
    let float = graph.prim_type(PrimType::Float);
    let void = graph.alloc_type(Type::Void);
    let object = graph.ref_type("java.lang.Object");
    let error = graph.ref_type("java.lang.Error");

    let method = graph.alloc_method(Method::new("run", "Dispatch", false, void, vec![]));
    let get = graph.alloc_method(Method::new("get", "Virtual", false, int, vec![]));

    let this = graph.local("this", object);
    let value = graph.local("value", int);
    let ratio = graph.local("ratio", float);
    let kind = graph.local("kind", object);
    let failure = graph.local("failure", error);

    let this_ref = graph.alloc_value(Value::ThisRef { ty: object });
    let call = graph.alloc_value(Value::InstanceInvoke {
        kind: InvokeKind::Virtual,
        base: this,
        method: get,
        args: vec![],
    });
    let half = graph.alloc_value(Value::FloatConstant(1.5));
    let class = graph.alloc_value(Value::ClassConstant("java/lang/Object".to_string()));
    let new_error = graph.alloc_value(Value::New { ty: error });
    let ten = graph.int_constant(10);
    let twenty = graph.int_constant(20);

    let s_this = graph.identity(this, this_ref);
    let s_call = graph.assign(value, call);
    let s_ratio = graph.assign(ratio, half);
    let s_class = graph.assign(kind, class);
    let s_new = graph.assign(failure, new_error);
    let s_throw = graph.alloc_stmt(Stmt::Throw { op: failure });
    let s_exit = graph.return_void();
    let s_switch = graph.alloc_stmt(Stmt::LookupSwitch {
        key: value,
        lookup_values: vec![ten, twenty],
        targets: vec![s_ratio, s_class],
        default: s_new,
    });

    let body = vec![
        s_this, s_call, s_switch, s_ratio, s_class, s_exit, s_new, s_throw,
    ];
    let mut icfg = Icfg::new();
    icfg.add_body(&graph, method, &body)
        .expect("failed to register body");

    Program {
        graph,
        icfg,
        method,
        body,
    }
}
