//! The contract between rewrite rules and the fixed-point driver.

use flowplan_core::error::Result;
use flowplan_core::id::OpId;
use serde::Serialize;

use crate::logical::LogicalPlan;
use crate::pattern::Pattern;

/// What a successful `apply` touched, so the driver can scope re-matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Changes {
    touched: Vec<OpId>,
}

impl Changes {
    pub fn new(touched: Vec<OpId>) -> Self {
        Self { touched }
    }

    pub fn touched(&self) -> &[OpId] {
        &self.touched
    }
}

/// A logical-plan rewrite.
///
/// The driver calls `build_pattern` to find candidates, then `matches` on each
/// candidate, then `apply` on those that match. A rule must make `matches`
/// false for a vertex it has already rewritten, or the driver never settles.
pub trait Rule {
    fn name(&self) -> &str;

    fn build_pattern(&self) -> Pattern;

    /// Applicability check for `node`. Unknown ids never match.
    fn matches(&self, plan: &LogicalPlan, node: OpId) -> bool;

    /// Rewrite `plan` around `node`. The returned `Changes` is the rule's
    /// report of the subgraph it touched.
    fn apply(&self, plan: &mut LogicalPlan, node: OpId) -> Result<Changes>;
}
