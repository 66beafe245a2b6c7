//! Single-node patterns used by the driver to find rule candidates.
//!
//! A rule declares the operator shape it can rewrite; the driver only calls
//! `Rule::matches` on vertices whose operator satisfies that shape.

use flowplan_core::id::OpId;

use crate::logical::{LogicalOperator, LogicalPlan, OperatorKind};

/// Matcher for operator kinds (without data).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpMatcher {
    Kind(OperatorKind),
    /// `Load` or `Stream`.
    AnyIngest,
    Any,
}

impl OpMatcher {
    pub fn matches(&self, op: &LogicalOperator) -> bool {
        match self {
            OpMatcher::Kind(kind) => op.kind() == *kind,
            OpMatcher::AnyIngest => op.kind().is_ingest(),
            OpMatcher::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub matcher: OpMatcher,
}

impl Pattern {
    pub fn single(matcher: OpMatcher) -> Self {
        Self { matcher }
    }

    /// Match any ingestion operator.
    pub fn ingest() -> Self {
        Self::single(OpMatcher::AnyIngest)
    }

    pub fn kind(kind: OperatorKind) -> Self {
        Self::single(OpMatcher::Kind(kind))
    }

    pub fn matches(&self, op: &LogicalOperator) -> bool {
        self.matcher.matches(op)
    }

    /// Ids of every vertex in `plan` this pattern matches, in id order.
    pub fn candidates(&self, plan: &LogicalPlan) -> Vec<OpId> {
        plan.iter()
            .filter(|(_, op)| self.matches(op))
            .map(|(id, _)| id)
            .collect()
    }
}
