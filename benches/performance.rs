use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use flowplan_core::dag::{FileSpec, FilterOp, LoadOp, LogicalOperator};
use flowplan_core::func::FuncSpec;
use flowplan_core::schema::{DataType, FieldSchema, Schema};
use flowplan_core::LogicalPlan;
use flowplan_planner::{Optimizer, Rule, TypeCastInserter};

const TYPES: [DataType; 4] = [
    DataType::Int,
    DataType::Chararray,
    DataType::Bytearray,
    DataType::Double,
];

fn wide_schema(width: usize) -> Schema {
    Schema::new(
        (0..width)
            .map(|i| FieldSchema::new(format!("f{i}"), TYPES[i % TYPES.len()]))
            .collect(),
    )
}

/// `loads` independent load -> filter chains, each load declaring `width` fields.
fn make_plan(loads: usize, width: usize) -> LogicalPlan {
    let mut plan = LogicalPlan::new();
    for n in 0..loads {
        let load = plan.add(LogicalOperator::Load(
            LoadOp::new(
                FileSpec::new(format!("in/{n}"), FuncSpec::new("PigStorage")),
                Some(wide_schema(width)),
            )
            .with_alias(format!("l{n}")),
        ));
        let filter = plan.add(LogicalOperator::Filter(FilterOp {
            alias: None,
            predicate: "f0 > 0".into(),
        }));
        plan.connect(load, filter).unwrap();
    }
    plan
}

fn bench_type_cast_apply(c: &mut Criterion) {
    let plan = make_plan(1, 256);
    let load = plan.sources()[0];
    let rule = TypeCastInserter::for_load();
    c.bench_function("type_cast_apply_256_fields", |b| {
        b.iter_batched(
            || plan.clone(),
            |mut plan| rule.apply(&mut plan, load).unwrap(),
            BatchSize::SmallInput,
        )
    });
}

fn bench_optimizer(c: &mut Criterion) {
    let plan = make_plan(32, 64);
    let optimizer = Optimizer::default();
    c.bench_function("optimize_32_loads_64_fields", |b| {
        b.iter_batched(
            || plan.clone(),
            |mut plan| optimizer.optimize(&mut plan).unwrap(),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(rewrites, bench_type_cast_apply, bench_optimizer);
criterion_main!(rewrites);
