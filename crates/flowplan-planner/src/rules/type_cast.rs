//! Type-cast insertion for ingestion operators.
//!
//! Loaders and stream commands hand over raw payloads. When the script
//! declares a schema for them, consumers expect typed columns, so this rule
//! puts a for-each directly below the ingestion operator whose generation node
//! casts every declared, non-opaque field:
//!
//! ```text
//!   Load a:int, b:chararray, c:bytearray        Load
//!        |                                        |
//!      Filter                          =>       ForEach { cast(project(0)) -> int,
//!                                                 |       cast(project(1)) -> chararray,
//!                                                 |       project(2) }
//!                                               Filter
//! ```
//!
//! Matching and casting use different predicates when the loader determined a
//! schema of its own:
//! - `matches` fires when some non-opaque declared field is *not* equal to the
//!   determined field;
//! - `needs_cast` casts a non-opaque field when it *is* equal to the
//!   determined field.
//!
//! Both are kept as-is; reconciling them changes which loads get rewritten.
//!
//! The rewrite is all-or-nothing: kind dispatch, function-spec resolution and
//! the single-successor precondition are checked before the plan is touched.

use flowplan_core::dag::{ForEachOp, GenerateOp, InnerLoadOp, InnerOperator, InnerPlan};
use flowplan_core::error::{Error, Result};
use flowplan_core::expr::{Expression, ExpressionPlan};
use flowplan_core::id::OpId;
use flowplan_core::schema::{FieldSchema, Schema};

use crate::logical::{LogicalOperator, LogicalPlan, OperatorKind};
use crate::pattern::Pattern;
use crate::rule::{Changes, Rule};

/// Whether the rewrite should cast field `i`, declared as `declared`.
///
/// Opaque fields are never cast. Otherwise a cast is inserted when the loader
/// determined no schema, or when the determined field at `i` is structurally
/// equal to the declared one.
pub fn needs_cast(declared: &FieldSchema, determined: Option<&Schema>, i: usize) -> bool {
    if declared.data_type.is_opaque() {
        return false;
    }
    match determined {
        None => true,
        Some(schema) => schema
            .field(i)
            .is_some_and(|field| declared.is_equal(field)),
    }
}

/// The applicability test for field `i`: non-opaque and either no determined
/// schema or a determined field that differs from the declared one.
fn needs_rewrite(declared: &FieldSchema, determined: Option<&Schema>, i: usize) -> bool {
    if declared.data_type.is_opaque() {
        return false;
    }
    match determined {
        None => true,
        Some(schema) => !schema
            .field(i)
            .is_some_and(|field| declared.is_equal(field)),
    }
}

#[derive(Debug, Clone)]
pub struct TypeCastInserter {
    name: String,
    target: Option<OperatorKind>,
}

impl TypeCastInserter {
    pub const LOAD_RULE: &'static str = "LoadTypeCastInserter";
    pub const STREAM_RULE: &'static str = "StreamTypeCastInserter";

    /// A rule over every ingestion operator.
    pub fn new() -> Self {
        Self {
            name: "TypeCastInserter".to_string(),
            target: None,
        }
    }

    /// A rule restricted to one ingestion kind.
    pub fn for_kind(name: impl Into<String>, kind: OperatorKind) -> Result<Self> {
        let name = name.into();
        if !kind.is_ingest() {
            return Err(Error::Config(format!(
                "{name} configured for {kind}, which does not ingest data"
            )));
        }
        Ok(Self {
            name,
            target: Some(kind),
        })
    }

    pub fn for_load() -> Self {
        Self {
            name: Self::LOAD_RULE.to_string(),
            target: Some(OperatorKind::Load),
        }
    }

    pub fn for_stream() -> Self {
        Self {
            name: Self::STREAM_RULE.to_string(),
            target: Some(OperatorKind::Stream),
        }
    }

    fn targets(&self, kind: OperatorKind) -> bool {
        match self.target {
            Some(target) => target == kind,
            None => kind.is_ingest(),
        }
    }

    /// Build the for-each that wraps `op`. Does not touch the plan.
    fn build_for_each(&self, node: OpId, op: &LogicalOperator) -> Result<ForEachOp> {
        let schema = op
            .schema()
            .ok_or_else(|| Error::Schema(format!("{node} has no resolved schema")))?;
        let determined = op.determined_schema();

        let casts: Vec<bool> = schema
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| needs_cast(field, determined, i))
            .collect();
        let func_spec = if casts.contains(&true) {
            Some(op.output_func_spec()?)
        } else {
            None
        };

        let mut outputs = Vec::with_capacity(schema.size());
        for (i, field) in schema.fields.iter().enumerate() {
            let project = Expression::project(i, 0);
            let root = if casts[i] {
                project.cast(field.clone(), func_spec.clone())
            } else {
                project
            };
            #[cfg(feature = "tracing")]
            tracing::trace!(rule = %self.name, %node, field = i, cast = casts[i], "cast decision");
            outputs.push(ExpressionPlan::new(root));
        }

        let mut inner = InnerPlan::new();
        let gen = inner.add(InnerOperator::Generate(GenerateOp::new(
            outputs,
            vec![false; schema.size()],
        )?));
        for column in 0..schema.size() {
            let load = inner.add(InnerOperator::InnerLoad(InnerLoadOp { column }));
            inner.connect(load, gen)?;
        }

        Ok(ForEachOp::new(op.alias().map(str::to_string), inner))
    }
}

impl Default for TypeCastInserter {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for TypeCastInserter {
    fn name(&self) -> &str {
        &self.name
    }

    fn build_pattern(&self) -> Pattern {
        match self.target {
            Some(kind) => Pattern::kind(kind),
            None => Pattern::ingest(),
        }
    }

    fn matches(&self, plan: &LogicalPlan, node: OpId) -> bool {
        let Some(op) = plan.get(node) else {
            return false;
        };
        if !self.targets(op.kind()) {
            return false;
        }
        let Some(schema) = op.schema() else {
            return false;
        };
        if op.is_cast_inserted() {
            return false;
        }

        let determined = op.determined_schema();
        schema
            .fields
            .iter()
            .enumerate()
            .any(|(i, field)| needs_rewrite(field, determined, i))
    }

    fn apply(&self, plan: &mut LogicalPlan, node: OpId) -> Result<Changes> {
        let op = plan.node(node)?;
        if !op.kind().is_ingest() {
            return Err(Error::Config(format!(
                "{} invoked on {node}, an unsupported {} operator",
                self.name,
                op.kind()
            )));
        }

        let successor = match plan.successors(node) {
            &[successor] => successor,
            other => {
                return Err(Error::Plan(format!(
                    "{} requires {node} to have exactly one successor, found {}",
                    self.name,
                    other.len()
                )))
            }
        };

        let for_each = self.build_for_each(node, op)?;
        #[cfg(feature = "tracing")]
        let fields = for_each.generate().map_or(0, |g| g.outputs().len());

        let wrapper = plan.add(LogicalOperator::ForEach(for_each));
        let (from_port, to_port) = plan.disconnect(node, successor)?;
        plan.connect_at(node, from_port, wrapper, 0)?;
        plan.connect_at(wrapper, 0, successor, to_port)?;
        plan.node_mut(node)?.set_cast_inserted()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            rule = %self.name,
            %node,
            %wrapper,
            %successor,
            fields,
            "inserted type casts"
        );

        Ok(Changes::new(vec![node, wrapper, successor]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowplan_core::dag::{FileSpec, FilterOp, LoadOp};
    use flowplan_core::func::FuncSpec;
    use flowplan_core::schema::DataType;

    fn field(name: &str, dt: DataType) -> FieldSchema {
        FieldSchema::new(name, dt)
    }

    #[test]
    fn opaque_fields_are_never_cast() {
        let f = field("raw", DataType::Bytearray);
        let determined = Schema::new(vec![field("raw", DataType::Bytearray)]);
        assert!(!needs_cast(&f, None, 0));
        assert!(!needs_cast(&f, Some(&determined), 0));
        assert!(!needs_rewrite(&f, None, 0));
        assert!(!needs_rewrite(&f, Some(&determined), 0));
    }

    #[test]
    fn policy_and_matcher_disagree_on_determined_schemas() {
        let f = field("a", DataType::Int);
        let same = Schema::new(vec![field("a", DataType::Int)]);
        let different = Schema::new(vec![field("a", DataType::Long)]);

        assert!(needs_cast(&f, None, 0));
        assert!(needs_rewrite(&f, None, 0));

        assert!(needs_cast(&f, Some(&same), 0));
        assert!(!needs_rewrite(&f, Some(&same), 0));

        assert!(!needs_cast(&f, Some(&different), 0));
        assert!(needs_rewrite(&f, Some(&different), 0));
    }

    #[test]
    fn for_kind_rejects_non_ingest_kinds() {
        let err = TypeCastInserter::for_kind("FilterCasts", OperatorKind::Filter).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let rule = TypeCastInserter::for_kind("Loads", OperatorKind::Load).unwrap();
        assert_eq!(rule.build_pattern(), Pattern::kind(OperatorKind::Load));
        assert_eq!(TypeCastInserter::new().build_pattern(), Pattern::ingest());
    }

    #[test]
    fn load_rule_ignores_streams_and_filters() {
        let mut plan = LogicalPlan::new();
        let filter = plan.add(LogicalOperator::Filter(FilterOp {
            alias: None,
            predicate: "true".into(),
        }));
        let load = plan.add(LogicalOperator::Load(LoadOp::new(
            FileSpec::new("in", FuncSpec::new("PigStorage")),
            Some(Schema::new(vec![field("a", DataType::Int)])),
        )));
        plan.connect(load, filter).unwrap();

        let rule = TypeCastInserter::for_stream();
        assert!(!rule.matches(&plan, load));
        assert!(!rule.matches(&plan, filter));
        assert!(!rule.matches(&plan, OpId::new(42)));
        assert!(TypeCastInserter::for_load().matches(&plan, load));
    }
}
