#![forbid(unsafe_code)]
//! flowplan-planner: (YAML) pipelines → `LogicalPlan` → rule-rewritten plan.
//!
//! Design:
//! - We reuse `flowplan-core`'s `LogicalPlan` graph and operator enums.
//! - This crate adds:
//!     * single-node `Pattern`s and the `Rule` contract (`pattern`, `rule`)
//!     * a fixed-point `Optimizer` that applies rules until nothing matches
//!     * the type-cast inserter for ingestion operators (`rules`)
//!     * a tiny YAML DSL → `LogicalPlan` (`dsl`)
//!     * a deterministic text rendering for EXPLAIN (`explain`)

pub mod driver;
pub mod dsl;
pub mod explain;
pub mod logical;
pub mod pattern;
pub mod rule;
pub mod rules;

pub use driver::{Application, OptimizeSummary, Optimizer};
pub use dsl::yaml::{parse_yaml_pipeline, ParsedPipeline, PipelineConfig, PipelineError};
pub use explain::explain;
pub use logical::{LogicalOperator, LogicalPlan};
pub use pattern::{OpMatcher, Pattern};
pub use rule::{Changes, Rule};
pub use rules::{default_rules, needs_cast, TypeCastInserter};
