//! Type-cast insertion below load and stream operators.

use flowplan_core::dag::{
    FileSpec, FilterOp, ForEachOp, InnerOperator, JoinOp, LoadOp, StoreOp, StreamOp,
    StreamingCommand,
};
use flowplan_core::expr::Expression;
use flowplan_core::func::FuncSpec;
use flowplan_core::schema::{DataType, FieldSchema, Schema};
use flowplan_core::{Error, LogicalOperator, LogicalPlan, OpId, OperatorKind};
use flowplan_planner::{Rule, TypeCastInserter};

fn schema(fields: &[(&str, DataType)]) -> Schema {
    Schema::new(
        fields
            .iter()
            .map(|(name, dt)| FieldSchema::new(*name, *dt))
            .collect(),
    )
}

fn filter() -> LogicalOperator {
    LogicalOperator::Filter(FilterOp {
        alias: None,
        predicate: "a > 0".into(),
    })
}

fn load(loader: &str, declared: Option<Schema>) -> LogicalOperator {
    LogicalOperator::Load(LoadOp::new(
        FileSpec::new("input.txt", FuncSpec::parse(loader).unwrap()),
        declared,
    ))
}

/// `load -> filter`, returning both ids.
fn load_then_filter(op: LogicalOperator) -> (LogicalPlan, OpId, OpId) {
    let mut plan = LogicalPlan::new();
    let src = plan.add(op);
    let dst = plan.add(filter());
    plan.connect(src, dst).unwrap();
    (plan, src, dst)
}

fn for_each(plan: &LogicalPlan, id: OpId) -> &ForEachOp {
    match plan.node(id).unwrap() {
        LogicalOperator::ForEach(f) => f,
        other => panic!("expected ForEach, got {}", other.kind()),
    }
}

fn snapshot(plan: &LogicalPlan) -> serde_json::Value {
    serde_json::to_value(plan).unwrap()
}

#[test]
fn load_without_determined_schema_casts_typed_fields() {
    let declared = schema(&[
        ("a", DataType::Int),
        ("b", DataType::Chararray),
        ("c", DataType::Bytearray),
    ]);
    let (mut plan, src, dst) = load_then_filter(load("PigStorage(',')", Some(declared.clone())));
    let rule = TypeCastInserter::for_load();

    assert!(rule.matches(&plan, src));
    let changes = rule.apply(&mut plan, src).unwrap();

    let wrapper = plan.successors(src)[0];
    assert_eq!(changes.touched(), &[src, wrapper, dst]);
    assert_eq!(plan.successors(wrapper), &[dst]);
    assert_eq!(plan.predecessors(dst), &[wrapper]);
    assert!(plan.node(src).unwrap().is_cast_inserted());

    let gen = for_each(&plan, wrapper).generate().unwrap();
    let roots: Vec<&Expression> = gen.outputs().iter().map(|p| p.root()).collect();
    let loader = FuncSpec::parse("PigStorage(',')").unwrap();
    assert_eq!(
        roots,
        vec![
            &Expression::project(0, 0).cast(declared.fields[0].clone(), Some(loader.clone())),
            &Expression::project(1, 0).cast(declared.fields[1].clone(), Some(loader)),
            &Expression::project(2, 0),
        ]
    );
    assert_eq!(gen.flatten(), &[false, false, false]);
    assert_eq!(roots[0].to_string(), "cast(project(0)) -> int [PigStorage(',')]");
}

#[test]
fn matching_determined_schema_does_not_match_but_apply_still_casts() {
    let declared = schema(&[("a", DataType::Int)]);
    let op = LoadOp::new(
        FileSpec::new("in", FuncSpec::new("BinStorage")),
        Some(declared.clone()),
    )
    .with_determined_schema(declared.clone())
    .unwrap();
    let (mut plan, src, _) = load_then_filter(LogicalOperator::Load(op));
    let rule = TypeCastInserter::for_load();

    assert!(!rule.matches(&plan, src));

    rule.apply(&mut plan, src).unwrap();
    let wrapper = plan.successors(src)[0];
    let gen = for_each(&plan, wrapper).generate().unwrap();
    assert!(gen.outputs()[0].root().is_cast());
}

#[test]
fn differing_determined_schema_matches_but_leaves_field_uncast() {
    let declared = schema(&[("a", DataType::Int), ("b", DataType::Long)]);
    let determined = schema(&[("a", DataType::Chararray), ("b", DataType::Long)]);
    let op = LoadOp::new(FileSpec::new("in", FuncSpec::new("BinStorage")), Some(declared))
        .with_determined_schema(determined)
        .unwrap();
    let (mut plan, src, _) = load_then_filter(LogicalOperator::Load(op));
    let rule = TypeCastInserter::for_load();

    assert!(rule.matches(&plan, src));
    rule.apply(&mut plan, src).unwrap();

    let wrapper = plan.successors(src)[0];
    let outputs = for_each(&plan, wrapper).generate().unwrap().outputs();
    assert!(!outputs[0].root().is_cast());
    assert!(outputs[1].root().is_cast());
}

#[test]
fn rewritten_load_no_longer_matches() {
    let (mut plan, src, _) = load_then_filter(load("PigStorage", Some(schema(&[("a", DataType::Int)]))));
    let rule = TypeCastInserter::for_load();
    rule.apply(&mut plan, src).unwrap();
    assert!(!rule.matches(&plan, src));
    assert!(!TypeCastInserter::new().matches(&plan, src));
}

#[test]
fn all_opaque_or_missing_schema_never_matches() {
    let opaque = schema(&[("x", DataType::Bytearray), ("y", DataType::Bytearray)]);
    let (plan, src, _) = load_then_filter(load("PigStorage", Some(opaque)));
    assert!(!TypeCastInserter::for_load().matches(&plan, src));

    let (plan, src, _) = load_then_filter(load("PigStorage", None));
    assert!(!TypeCastInserter::for_load().matches(&plan, src));

    let (plan, src, _) = load_then_filter(load("PigStorage", Some(Schema::default())));
    assert!(!TypeCastInserter::for_load().matches(&plan, src));
}

#[test]
fn nested_scope_has_one_inner_load_per_column() {
    let declared = schema(&[
        ("a", DataType::Int),
        ("b", DataType::Bytearray),
        ("c", DataType::Double),
        ("d", DataType::Map),
    ]);
    let (mut plan, src, _) = load_then_filter(load("PigStorage", Some(declared)));
    TypeCastInserter::for_load().apply(&mut plan, src).unwrap();

    let wrapper = plan.successors(src)[0];
    let inner = &for_each(&plan, wrapper).inner_plan;
    assert_eq!(inner.len(), 5);

    let (gen_id, gen) = inner
        .iter()
        .find_map(|(id, op)| match op {
            InnerOperator::Generate(g) => Some((id, g)),
            InnerOperator::InnerLoad(_) => None,
        })
        .unwrap();
    assert_eq!(gen.outputs().len(), 4);

    let preds = inner.predecessors(gen_id);
    assert_eq!(preds.len(), 4);
    for (i, pred) in preds.iter().enumerate() {
        match inner.node(*pred).unwrap() {
            InnerOperator::InnerLoad(l) => assert_eq!(l.column, i),
            InnerOperator::Generate(_) => panic!("generate feeds itself"),
        }
        assert_eq!(gen.outputs()[i].root().leaf(), (i, 0));
    }
}

#[test]
fn wrapper_takes_over_the_successor_input_port() {
    let mut plan = LogicalPlan::new();
    let left = plan.add(load("PigStorage", Some(schema(&[("k", DataType::Int)]))));
    let right = plan.add(load("PigStorage", Some(schema(&[("k", DataType::Long)]))));
    let join = plan.add(LogicalOperator::Join(JoinOp {
        alias: None,
        on: vec![("k".into(), "k".into())],
    }));
    plan.connect(left, join).unwrap();
    plan.connect(right, join).unwrap();

    TypeCastInserter::for_load().apply(&mut plan, right).unwrap();
    let wrapper = plan.successors(right)[0];

    assert_eq!(plan.predecessors(join), &[left, wrapper]);
    let edge = plan.edge(wrapper, join).unwrap();
    assert_eq!((edge.from_port, edge.to_port), (0, 1));
}

#[test]
fn unsupported_operator_is_a_configuration_error() {
    let mut plan = LogicalPlan::new();
    let f = plan.add(filter());
    let s = plan.add(LogicalOperator::Store(StoreOp {
        alias: None,
        file_spec: FileSpec::new("out", FuncSpec::new("PigStorage")),
    }));
    plan.connect(f, s).unwrap();
    let before = snapshot(&plan);

    let err = TypeCastInserter::new().apply(&mut plan, f).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "{err}");
    assert_eq!(snapshot(&plan), before);
}

#[test]
fn successor_count_other_than_one_leaves_plan_untouched() {
    let declared = Some(schema(&[("a", DataType::Int)]));

    let mut plan = LogicalPlan::new();
    let lonely = plan.add(load("PigStorage", declared.clone()));
    let before = snapshot(&plan);
    let err = TypeCastInserter::for_load().apply(&mut plan, lonely).unwrap_err();
    assert!(matches!(err, Error::Plan(_)), "{err}");
    assert_eq!(snapshot(&plan), before);

    let (mut plan, src, _) = load_then_filter(load("PigStorage", declared));
    let other = plan.add(filter());
    plan.connect(src, other).unwrap();
    let before = snapshot(&plan);
    let err = TypeCastInserter::for_load().apply(&mut plan, src).unwrap_err();
    assert!(matches!(err, Error::Plan(_)), "{err}");
    assert_eq!(snapshot(&plan), before);
    assert!(!plan.node(src).unwrap().is_cast_inserted());
}

#[test]
fn stream_casts_use_the_output_handle_spec() {
    let declared = schema(&[("n", DataType::Long), ("raw", DataType::Bytearray)]);
    let stream = StreamOp::new(
        StreamingCommand::new("wc -l").with_output_spec("PigStreaming('|')"),
        Some(declared),
    );
    let (mut plan, src, _) = load_then_filter(LogicalOperator::Stream(stream));
    let rule = TypeCastInserter::for_stream();

    assert!(rule.matches(&plan, src));
    assert!(!TypeCastInserter::for_load().matches(&plan, src));
    rule.apply(&mut plan, src).unwrap();

    let wrapper = plan.successors(src)[0];
    let outputs = for_each(&plan, wrapper).generate().unwrap().outputs();
    match outputs[0].root() {
        Expression::Cast { func_spec, .. } => {
            assert_eq!(func_spec.as_ref(), Some(&FuncSpec::parse("PigStreaming('|')").unwrap()));
        }
        other => panic!("expected cast, got {other}"),
    }
    assert!(!outputs[1].root().is_cast());
}

#[test]
fn malformed_stream_output_spec_fails_before_mutation() {
    let stream = StreamOp::new(
        StreamingCommand::new("cat").with_output_spec("Broken("),
        Some(schema(&[("a", DataType::Int)])),
    );
    let (mut plan, src, _) = load_then_filter(LogicalOperator::Stream(stream));
    let before = snapshot(&plan);

    let err = TypeCastInserter::for_stream().apply(&mut plan, src).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "{err}");
    assert_eq!(snapshot(&plan), before);
    assert_eq!(plan.node(src).unwrap().kind(), OperatorKind::Stream);
}
