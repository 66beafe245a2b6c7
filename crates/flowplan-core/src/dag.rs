//! Logical operators and the plan graph they live in.
//!
//! Ingestion operators (`Load`, `Stream`) expose a declared schema, the
//! function spec of the component that produces their output, and a
//! cast-inserted marker that the type-cast pass flips once it has wrapped the
//! operator. `ForEach` owns a nested `InnerPlan` of generation and inner-load
//! nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::expr::ExpressionPlan;
use crate::func::FuncSpec;
use crate::graph::OperatorPlan;
use crate::schema::Schema;

/// The outer relational plan.
pub type LogicalPlan = OperatorPlan<LogicalOperator>;

/// The nested scope owned by a for-each operator.
pub type InnerPlan = OperatorPlan<InnerOperator>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorKind {
    Load,
    Stream,
    Filter,
    ForEach,
    Join,
    Store,
}

impl OperatorKind {
    /// Operators that read data from outside the plan.
    pub fn is_ingest(self) -> bool {
        matches!(self, OperatorKind::Load | OperatorKind::Stream)
    }

    pub fn name(self) -> &'static str {
        match self {
            OperatorKind::Load => "Load",
            OperatorKind::Stream => "Stream",
            OperatorKind::Filter => "Filter",
            OperatorKind::ForEach => "ForEach",
            OperatorKind::Join => "Join",
            OperatorKind::Store => "Store",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A file location plus the function spec that reads or writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    pub file_name: String,
    pub func_spec: FuncSpec,
}

impl FileSpec {
    pub fn new(file_name: impl Into<String>, func_spec: FuncSpec) -> Self {
        Self {
            file_name: file_name.into(),
            func_spec,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOp {
    pub alias: Option<String>,
    pub file_spec: FileSpec,
    /// Declared schema, if the script gave one.
    pub schema: Option<Schema>,
    /// Schema reported by the loader itself at bind time.
    pub determined_schema: Option<Schema>,
    pub cast_inserted: bool,
}

impl LoadOp {
    pub fn new(file_spec: FileSpec, schema: Option<Schema>) -> Self {
        Self {
            alias: None,
            file_spec,
            schema,
            determined_schema: None,
            cast_inserted: false,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Attach the loader-determined schema. It must line up field for field
    /// with the declared schema.
    pub fn with_determined_schema(mut self, determined: Schema) -> Result<Self> {
        let declared = self.schema.as_ref().ok_or_else(|| {
            Error::Schema("determined schema given for a load without declared schema".into())
        })?;
        if declared.size() != determined.size() {
            return Err(Error::Schema(format!(
                "determined schema has {} fields, declared schema has {}",
                determined.size(),
                declared.size()
            )));
        }
        self.determined_schema = Some(determined);
        Ok(self)
    }
}

/// The textual deserializer spec for a streaming command's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleSpec {
    pub spec: String,
}

impl HandleSpec {
    pub const DEFAULT: &'static str = "PigStreaming";

    pub fn new(spec: impl Into<String>) -> Self {
        Self { spec: spec.into() }
    }
}

impl Default for HandleSpec {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingCommand {
    pub executable: String,
    pub output_spec: HandleSpec,
}

impl StreamingCommand {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            output_spec: HandleSpec::default(),
        }
    }

    pub fn with_output_spec(mut self, spec: impl Into<String>) -> Self {
        self.output_spec = HandleSpec::new(spec);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOp {
    pub alias: Option<String>,
    pub command: StreamingCommand,
    pub schema: Option<Schema>,
    pub cast_inserted: bool,
}

impl StreamOp {
    pub fn new(command: StreamingCommand, schema: Option<Schema>) -> Self {
        Self {
            alias: None,
            command,
            schema,
            cast_inserted: false,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOp {
    pub alias: Option<String>,
    pub predicate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinOp {
    pub alias: Option<String>,
    /// Equi-join keys, `(left column, right column)`; inputs are ordered by port.
    pub on: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOp {
    pub alias: Option<String>,
    pub file_spec: FileSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForEachOp {
    pub alias: Option<String>,
    pub inner_plan: InnerPlan,
}

impl ForEachOp {
    pub fn new(alias: Option<String>, inner_plan: InnerPlan) -> Self {
        Self { alias, inner_plan }
    }

    /// The generation node of the nested scope, if any.
    pub fn generate(&self) -> Option<&GenerateOp> {
        self.inner_plan.iter().find_map(|(_, op)| match op {
            InnerOperator::Generate(g) => Some(g),
            InnerOperator::InnerLoad(_) => None,
        })
    }
}

/// Nodes of a for-each scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InnerOperator {
    Generate(GenerateOp),
    InnerLoad(InnerLoadOp),
}

/// Builds output rows from one expression tree per output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateOp {
    outputs: Vec<ExpressionPlan>,
    flatten: Vec<bool>,
}

impl GenerateOp {
    /// `outputs` and `flatten` describe the same columns and must be the same length.
    pub fn new(outputs: Vec<ExpressionPlan>, flatten: Vec<bool>) -> Result<Self> {
        if outputs.len() != flatten.len() {
            return Err(Error::Invariant(format!(
                "generate has {} output expressions but {} flatten flags",
                outputs.len(),
                flatten.len()
            )));
        }
        Ok(Self { outputs, flatten })
    }

    pub fn outputs(&self) -> &[ExpressionPlan] {
        &self.outputs
    }

    pub fn flatten(&self) -> &[bool] {
        &self.flatten
    }
}

/// Exposes column `column` of the for-each input inside the nested scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerLoadOp {
    pub column: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogicalOperator {
    Load(LoadOp),
    Stream(StreamOp),
    Filter(FilterOp),
    ForEach(ForEachOp),
    Join(JoinOp),
    Store(StoreOp),
}

impl LogicalOperator {
    pub fn kind(&self) -> OperatorKind {
        match self {
            LogicalOperator::Load(_) => OperatorKind::Load,
            LogicalOperator::Stream(_) => OperatorKind::Stream,
            LogicalOperator::Filter(_) => OperatorKind::Filter,
            LogicalOperator::ForEach(_) => OperatorKind::ForEach,
            LogicalOperator::Join(_) => OperatorKind::Join,
            LogicalOperator::Store(_) => OperatorKind::Store,
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            LogicalOperator::Load(op) => op.alias.as_deref(),
            LogicalOperator::Stream(op) => op.alias.as_deref(),
            LogicalOperator::Filter(op) => op.alias.as_deref(),
            LogicalOperator::ForEach(op) => op.alias.as_deref(),
            LogicalOperator::Join(op) => op.alias.as_deref(),
            LogicalOperator::Store(op) => op.alias.as_deref(),
        }
    }

    /// Resolved output schema. Only ingestion operators resolve one here;
    /// schema propagation through the other operators is not modelled.
    pub fn schema(&self) -> Option<&Schema> {
        match self {
            LogicalOperator::Load(op) => op.schema.as_ref(),
            LogicalOperator::Stream(op) => op.schema.as_ref(),
            _ => None,
        }
    }

    pub fn determined_schema(&self) -> Option<&Schema> {
        match self {
            LogicalOperator::Load(op) => op.determined_schema.as_ref(),
            _ => None,
        }
    }

    pub fn is_cast_inserted(&self) -> bool {
        match self {
            LogicalOperator::Load(op) => op.cast_inserted,
            LogicalOperator::Stream(op) => op.cast_inserted,
            _ => false,
        }
    }

    pub fn set_cast_inserted(&mut self) -> Result<()> {
        match self {
            LogicalOperator::Load(op) => op.cast_inserted = true,
            LogicalOperator::Stream(op) => op.cast_inserted = true,
            other => {
                return Err(Error::Config(format!(
                    "{} operator has no cast-inserted marker",
                    other.kind()
                )))
            }
        }
        Ok(())
    }

    /// Function spec of the component producing this operator's output: the
    /// loader for `Load`, the command's output handle for `Stream`.
    pub fn output_func_spec(&self) -> Result<FuncSpec> {
        match self {
            LogicalOperator::Load(op) => Ok(op.file_spec.func_spec.clone()),
            LogicalOperator::Stream(op) => FuncSpec::parse(&op.command.output_spec.spec),
            other => Err(Error::Config(format!(
                "{} operator does not ingest data and has no output function spec",
                other.kind()
            ))),
        }
    }
}
