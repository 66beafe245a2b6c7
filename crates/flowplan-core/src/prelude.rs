//! Convenient re-exports for downstream crates.

pub use crate::config::OptimizerConfig;
pub use crate::dag::{
    FileSpec, FilterOp, ForEachOp, GenerateOp, HandleSpec, InnerLoadOp, InnerOperator, InnerPlan,
    JoinOp, LoadOp, LogicalOperator, LogicalPlan, OperatorKind, StoreOp, StreamOp,
    StreamingCommand,
};
pub use crate::error::{Error, Result};
pub use crate::expr::{Expression, ExpressionPlan};
pub use crate::func::FuncSpec;
pub use crate::graph::{Edge, OperatorPlan};
pub use crate::id::OpId;
pub use crate::schema::{DataType, FieldSchema, Schema};
