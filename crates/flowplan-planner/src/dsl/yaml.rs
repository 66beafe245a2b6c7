//! Minimal YAML → LogicalPlan parser.
//!
//! Steps are chained: each step reads the previous one unless it names its
//! input(s) by alias. `load` starts a new chain.
//!
//! Example:
//! ```yaml
//! config:
//!   max_iterations: 10
//! steps:
//!   - op: load
//!     alias: raw
//!     source: "data/users.tsv"
//!     loader: "PigStorage('\t')"
//!     schema:
//!       - { name: id,   type: int }
//!       - { name: name, type: chararray }
//!       - { name: blob, type: bytearray }
//!   - op: filter
//!     expr: "id > 10"
//!   - op: store
//!     destination: "out/users"
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use flowplan_core::config::OptimizerConfig;
use flowplan_core::dag::{
    FileSpec, FilterOp, JoinOp, LoadOp, StoreOp, StreamOp, StreamingCommand,
};
use flowplan_core::func::FuncSpec;
use flowplan_core::id::OpId;
use flowplan_core::schema::{DataType, FieldSchema, Schema};

use crate::logical::{LogicalOperator as L, LogicalPlan};

const DEFAULT_LOADER: &str = "PigStorage";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid pipeline: {0}")]
    Invalid(String),

    #[error(transparent)]
    Model(#[from] flowplan_core::error::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub config: Option<PipelineConfig>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "op")]
pub enum Step {
    #[serde(rename = "load")]
    Load {
        #[serde(default)]
        alias: Option<String>,
        source: String,
        #[serde(default)]
        loader: Option<String>,
        #[serde(default)]
        schema: Option<Vec<FieldDef>>,
        #[serde(default)]
        determined_schema: Option<Vec<FieldDef>>,
    },

    #[serde(rename = "stream")]
    Stream {
        #[serde(default)]
        alias: Option<String>,
        #[serde(default)]
        input: Option<String>,
        command: String,
        #[serde(default)]
        output: Option<String>,
        #[serde(default)]
        schema: Option<Vec<FieldDef>>,
    },

    #[serde(rename = "filter")]
    Filter {
        #[serde(default)]
        alias: Option<String>,
        #[serde(default)]
        input: Option<String>,
        expr: String,
    },

    #[serde(rename = "join")]
    Join {
        #[serde(default)]
        alias: Option<String>,
        inputs: Vec<String>,
        on: Vec<(String, String)>,
    },

    #[serde(rename = "store")]
    Store {
        #[serde(default)]
        alias: Option<String>,
        #[serde(default)]
        input: Option<String>,
        destination: String,
        #[serde(default)]
        storer: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub fields: Option<Vec<FieldDef>>,
}

/// Optimizer overrides carried by the pipeline file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_iterations: Option<usize>,
    pub disabled_rules: Option<Vec<String>>,
}

impl PipelineConfig {
    /// Overlay the values set in the file onto `cfg`.
    pub fn apply_to(&self, cfg: &mut OptimizerConfig) {
        if let Some(max) = self.max_iterations {
            cfg.max_iterations = max;
        }
        if let Some(rules) = &self.disabled_rules {
            cfg.disabled_rules = rules.clone();
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParsedPipeline {
    pub plan: LogicalPlan,
    pub config: PipelineConfig,
}

fn to_field(def: &FieldDef) -> Result<FieldSchema, PipelineError> {
    let data_type: DataType = def.data_type.parse()?;
    match &def.fields {
        Some(members) => Ok(FieldSchema::nested(&def.name, data_type, to_schema(members)?)?),
        None => Ok(FieldSchema::new(&def.name, data_type)),
    }
}

fn to_schema(fields: &[FieldDef]) -> Result<Schema, PipelineError> {
    Ok(Schema::new(
        fields.iter().map(to_field).collect::<Result<Vec<_>, _>>()?,
    ))
}

fn to_optional_schema(fields: Option<&[FieldDef]>) -> Result<Option<Schema>, PipelineError> {
    fields.map(to_schema).transpose()
}

/// Tracks the chain head and the aliases defined so far.
struct Builder {
    plan: LogicalPlan,
    aliases: HashMap<String, OpId>,
    current: Option<OpId>,
}

impl Builder {
    fn resolve(&self, input: Option<&str>, step: &str) -> Result<OpId, PipelineError> {
        match input {
            Some(alias) => self.aliases.get(alias).copied().ok_or_else(|| {
                PipelineError::Invalid(format!("{step} reads unknown alias '{alias}'"))
            }),
            None => self.current.ok_or_else(|| {
                PipelineError::Invalid(format!("{step} has no input; start the pipeline with 'load'"))
            }),
        }
    }

    fn push(&mut self, op: L, inputs: &[OpId]) -> Result<OpId, PipelineError> {
        let alias = op.alias().map(str::to_string);
        let id = self.plan.add(op);
        for input in inputs {
            self.plan.connect(*input, id)?;
        }
        if let Some(alias) = alias {
            if self.aliases.insert(alias.clone(), id).is_some() {
                return Err(PipelineError::Invalid(format!("alias '{alias}' defined twice")));
            }
        }
        self.current = Some(id);
        Ok(id)
    }
}

/// Parse a YAML pipeline into a `LogicalPlan`.
pub fn parse_yaml_pipeline(yaml_src: &str) -> Result<ParsedPipeline, PipelineError> {
    let doc: Pipeline = serde_yaml::from_str(yaml_src)?;
    if doc.steps.is_empty() {
        return Err(PipelineError::Invalid("empty pipeline".into()));
    }

    let mut b = Builder {
        plan: LogicalPlan::new(),
        aliases: HashMap::new(),
        current: None,
    };

    for step in doc.steps {
        match step {
            Step::Load {
                alias,
                source,
                loader,
                schema,
                determined_schema,
            } => {
                let func_spec = FuncSpec::parse(loader.as_deref().unwrap_or(DEFAULT_LOADER))?;
                let mut load = LoadOp::new(
                    FileSpec::new(source, func_spec),
                    to_optional_schema(schema.as_deref())?,
                );
                load.alias = alias;
                if let Some(determined) = to_optional_schema(determined_schema.as_deref())? {
                    load = load.with_determined_schema(determined)?;
                }
                b.push(L::Load(load), &[])?;
            }
            Step::Stream {
                alias,
                input,
                command,
                output,
                schema,
            } => {
                let from = b.resolve(input.as_deref(), "stream")?;
                let mut cmd = StreamingCommand::new(command);
                if let Some(output) = output {
                    cmd = cmd.with_output_spec(output);
                }
                let mut stream = StreamOp::new(cmd, to_optional_schema(schema.as_deref())?);
                stream.alias = alias;
                b.push(L::Stream(stream), &[from])?;
            }
            Step::Filter { alias, input, expr } => {
                let from = b.resolve(input.as_deref(), "filter")?;
                b.push(
                    L::Filter(FilterOp {
                        alias,
                        predicate: expr,
                    }),
                    &[from],
                )?;
            }
            Step::Join { alias, inputs, on } => {
                if inputs.len() < 2 {
                    return Err(PipelineError::Invalid(format!(
                        "join needs at least two inputs, got {}",
                        inputs.len()
                    )));
                }
                let from = inputs
                    .iter()
                    .map(|a| b.resolve(Some(a.as_str()), "join"))
                    .collect::<Result<Vec<_>, _>>()?;
                b.push(L::Join(JoinOp { alias, on }), &from)?;
            }
            Step::Store {
                alias,
                input,
                destination,
                storer,
            } => {
                let from = b.resolve(input.as_deref(), "store")?;
                let func_spec = FuncSpec::parse(storer.as_deref().unwrap_or(DEFAULT_LOADER))?;
                b.push(
                    L::Store(StoreOp {
                        alias,
                        file_spec: FileSpec::new(destination, func_spec),
                    }),
                    &[from],
                )?;
            }
        }
    }

    Ok(ParsedPipeline {
        plan: b.plan,
        config: doc.config.unwrap_or_default(),
    })
}
