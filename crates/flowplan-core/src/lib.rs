#![forbid(unsafe_code)]
//! flowplan-core: the data model shared by the planner and the CLI.
//!
//! Responsibilities:
//! - Typed field descriptors and schemas (`schema`).
//! - Function specs naming the (de)serializers bound to ingestion operators (`func`).
//! - Expression trees evaluated by generation nodes (`expr`).
//! - Logical operators, including the ingestion kinds `Load` and `Stream` (`dag`).
//! - An ordered, port-aware directed graph used for both the outer plan and
//!   nested for-each scopes (`graph`).
//!
//! **No IO, no logging** here. Rewrites live in `flowplan-planner`.

pub mod config;
pub mod dag;
pub mod error;
pub mod expr;
pub mod func;
pub mod graph;
pub mod id;
pub mod prelude;
pub mod schema;

pub use dag::{LogicalOperator, LogicalPlan, OperatorKind};
pub use error::{Error, Result};
pub use graph::{Edge, OperatorPlan};
pub use id::OpId;
pub use schema::{DataType, FieldSchema, Schema};

/// Crate version, surfaced by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
