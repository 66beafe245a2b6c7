//! Deterministic text rendering of a logical plan (EXPLAIN).
//!
//! One line per operator in id order, followed by its outgoing edges with
//! ports. For-each operators also list their generation expressions.

use std::fmt::Write as _;

use flowplan_core::func::FuncSpec;

use crate::logical::{LogicalOperator, LogicalPlan};

fn describe(op: &LogicalOperator) -> String {
    match op {
        LogicalOperator::Load(load) => {
            let mut s = format!(
                "'{}' using {}",
                load.file_spec.file_name, load.file_spec.func_spec
            );
            if let Some(schema) = &load.schema {
                let _ = write!(s, " as {schema}");
            }
            if let Some(determined) = &load.determined_schema {
                let _ = write!(s, " determined {determined}");
            }
            if load.cast_inserted {
                s.push_str(" [casts inserted]");
            }
            s
        }
        LogicalOperator::Stream(stream) => {
            let output = FuncSpec::parse(&stream.command.output_spec.spec)
                .map(|spec| spec.to_string())
                .unwrap_or_else(|_| stream.command.output_spec.spec.clone());
            let mut s = format!("through `{}` output {output}", stream.command.executable);
            if let Some(schema) = &stream.schema {
                let _ = write!(s, " as {schema}");
            }
            if stream.cast_inserted {
                s.push_str(" [casts inserted]");
            }
            s
        }
        LogicalOperator::Filter(filter) => format!("by {}", filter.predicate),
        LogicalOperator::Join(join) => {
            let keys: Vec<String> = join.on.iter().map(|(l, r)| format!("{l} = {r}")).collect();
            format!("on {}", keys.join(", "))
        }
        LogicalOperator::Store(store) => format!(
            "into '{}' using {}",
            store.file_spec.file_name, store.file_spec.func_spec
        ),
        LogicalOperator::ForEach(for_each) => {
            let width = for_each.generate().map_or(0, |g| g.outputs().len());
            format!("generate {width} column(s)")
        }
    }
}

pub fn explain(plan: &LogicalPlan) -> String {
    let mut out = String::new();
    for (id, op) in plan.iter() {
        let _ = write!(out, "{id} {}", op.kind());
        if let Some(alias) = op.alias() {
            let _ = write!(out, " {alias}");
        }
        let _ = writeln!(out, ": {}", describe(op));

        if let LogicalOperator::ForEach(for_each) = op {
            if let Some(gen) = for_each.generate() {
                for (i, expr) in gen.outputs().iter().enumerate() {
                    let _ = writeln!(out, "    [{i}] {expr}");
                }
            }
        }

        for succ in plan.successors(id) {
            if let Some(edge) = plan.edge(id, *succ) {
                let _ = writeln!(
                    out,
                    "  -> {} (out {}, in {})",
                    edge.to, edge.from_port, edge.to_port
                );
            }
        }
    }
    out
}
