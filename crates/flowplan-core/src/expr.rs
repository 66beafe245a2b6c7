//! Expression trees evaluated by generation nodes.
//!
//! Each `ExpressionPlan` owns exactly one root. Leaves are projections of a
//! generation-node input; a cast wraps a sub-expression and records the target
//! field descriptor plus the function spec that knows how to produce it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::func::FuncSpec;
use crate::schema::FieldSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expression {
    /// Column `column` of generation input `input`.
    Project { input: usize, column: usize },
    Cast {
        input: Box<Expression>,
        to: FieldSchema,
        func_spec: Option<FuncSpec>,
    },
}

impl Expression {
    pub fn project(input: usize, column: usize) -> Self {
        Expression::Project { input, column }
    }

    /// Wrap `self` in a cast to `to`.
    pub fn cast(self, to: FieldSchema, func_spec: Option<FuncSpec>) -> Self {
        Expression::Cast {
            input: Box::new(self),
            to,
            func_spec,
        }
    }

    pub fn is_cast(&self) -> bool {
        matches!(self, Expression::Cast { .. })
    }

    /// The projection at the bottom of this tree as `(input, column)`.
    pub fn leaf(&self) -> (usize, usize) {
        match self {
            Expression::Project { input, column } => (*input, *column),
            Expression::Cast { input, .. } => input.leaf(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Project { input, column: 0 } => write!(f, "project({input})"),
            Expression::Project { input, column } => write!(f, "project({input}.{column})"),
            Expression::Cast {
                input,
                to,
                func_spec,
            } => {
                write!(f, "cast({input}) -> {}", to.data_type)?;
                if let Some(spec) = func_spec {
                    write!(f, " [{spec}]")?;
                }
                Ok(())
            }
        }
    }
}

/// A single-rooted expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionPlan {
    root: Expression,
}

impl ExpressionPlan {
    pub fn new(root: Expression) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Expression {
        &self.root
    }
}

impl fmt::Display for ExpressionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.fmt(f)
    }
}
