//! Logical plan surface re-exported from core.
//!
//! Aliases of the core types, so rules and the driver name one plan type.

pub use flowplan_core::dag::{
    ForEachOp, GenerateOp, InnerLoadOp, InnerOperator, InnerPlan, LogicalOperator, LogicalPlan,
    OperatorKind,
};
pub use flowplan_core::schema::{DataType, FieldSchema, Schema};
