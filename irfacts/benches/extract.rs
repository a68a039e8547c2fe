use criterion::{Criterion, black_box, criterion_group, criterion_main};

use irfacts::{
    diff::compute_diff,
    extractor::extract,
    mutation::MutationSearch,
};
use irgraph::{
    graph::{IrGraph, StmtId, ValueId},
    icfg::Icfg,
    modules::{
        symbol::{Field, Method},
        values::{BinopKind, Value},
    },
    types::{PrimType, Type},
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use strum::IntoEnumIterator;

/// Build `methods` method bodies of `length` statements each, mixing
/// arithmetic, field accesses and backward branches.
fn build_program(methods: usize, length: usize) -> (IrGraph, Icfg) {
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);
    let mut graph = IrGraph::new();
    let mut icfg = Icfg::new();

    let int = graph.prim_type(PrimType::Int);
    let void = graph.alloc_type(Type::Void);
    let operators: Vec<BinopKind> = BinopKind::iter().collect();
    let fields: Vec<_> = (0..4)
        .map(|i| graph.alloc_field(Field::new(format!("f{}", i), "Bench", int)))
        .collect();

    for m in 0..methods {
        let method = graph.alloc_method(Method::new(format!("m{}", m), "Bench", true, void, vec![]));
        let locals: Vec<ValueId> = (0..8)
            .map(|i| graph.local(format!("l{}", i), int))
            .collect();

        let mut body: Vec<StmtId> = Vec::with_capacity(length + 1);
        for _ in 0..length {
            let left = locals[rng.random_range(0..locals.len())];
            let stmt = match rng.random_range(0..=3) {
                0 => {
                    let constant = graph.int_constant(rng.random_range(-100..100));
                    graph.assign(left, constant)
                }
                1 => {
                    let op = operators[rng.random_range(0..operators.len())];
                    let right = locals[rng.random_range(0..locals.len())];
                    let constant = graph.int_constant(rng.random_range(1..10));
                    let binop = graph.alloc_value(Value::Binop {
                        op,
                        left: right,
                        right: constant,
                    });
                    graph.assign(left, binop)
                }
                2 => {
                    let field = fields[rng.random_range(0..fields.len())];
                    let read = graph.alloc_value(Value::StaticFieldRef { field });
                    if rng.random_bool(0.5) {
                        graph.assign(left, read)
                    } else {
                        graph.assign(read, left)
                    }
                }
                _ if !body.is_empty() => {
                    let target = body[rng.random_range(0..body.len())];
                    let zero = graph.int_constant(0);
                    let condition = graph.alloc_value(Value::Binop {
                        op: BinopKind::Lt,
                        left,
                        right: zero,
                    });
                    graph.if_stmt(condition, target)
                }
                _ => {
                    let constant = graph.int_constant(1);
                    graph.assign(left, constant)
                }
            };
            body.push(stmt);
        }
        body.push(graph.return_void());

        if let Err(error) = icfg.add_body(&graph, method, &body) {
            panic!("failed to register body: {}", error);
        }
    }

    (graph, icfg)
}

fn bench_extract(c: &mut Criterion) {
    let (small, small_icfg) = build_program(4, 32);
    let (large, large_icfg) = build_program(64, 256);

    c.bench_function("extract_small", |b| {
        b.iter(|| black_box(extract(&small, &small_icfg).unwrap()));
    });

    c.bench_function("extract_large", |b| {
        b.iter(|| black_box(extract(&large, &large_icfg).unwrap()));
    });
}

fn bench_diff(c: &mut Criterion) {
    let (mut graph, icfg) = build_program(64, 256);
    let before = extract(&graph, &icfg).unwrap();

    let search = MutationSearch::default();
    let mut rng = ChaCha20Rng::seed_from_u64(0);
    for _ in 0..16 {
        search.try_mutate(&mut graph, &icfg, &mut rng).unwrap();
    }
    let after = extract(&graph, &icfg).unwrap();

    c.bench_function("diff_large", |b| {
        b.iter(|| black_box(compute_diff(Some(&before), Some(&after))));
    });

    c.bench_function("diff_from_empty", |b| {
        b.iter(|| black_box(compute_diff(None, Some(&after))));
    });
}

fn bench_mutate(c: &mut Criterion) {
    let (graph, icfg) = build_program(64, 256);
    let search = MutationSearch::default();

    c.bench_function("try_mutate_large", |b| {
        b.iter_batched(
            || (graph.clone(), ChaCha20Rng::seed_from_u64(0)),
            |(mut graph, mut rng)| black_box(search.try_mutate(&mut graph, &icfg, &mut rng).unwrap()),
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_extract, bench_diff, bench_mutate);
criterion_main!(benches);
