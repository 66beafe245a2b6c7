//! Fixed-point rule driver.
//!
//! Each iteration walks the rules in order. For every rule it snapshots the
//! vertices matching the rule's pattern, asks the rule whether each one
//! applies, and rewrites those that do. Iteration stops once a full pass
//! applies nothing (the plan is stable) or `max_iterations` is reached.
//!
//! Errors from a rule abort optimization; the plan keeps whatever rewrites
//! were applied before the failing one.

use flowplan_core::config::OptimizerConfig;
use flowplan_core::error::Result;
use flowplan_core::id::OpId;
use serde::Serialize;

use crate::logical::LogicalPlan;
use crate::rule::Rule;
use crate::rules::default_rules;

/// One successful rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Application {
    pub rule: String,
    pub node: OpId,
    pub touched: Vec<OpId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptimizeSummary {
    pub iterations: usize,
    pub applications: Vec<Application>,
    /// False when the iteration cap stopped the driver while rules were still firing.
    pub reached_fixed_point: bool,
}

pub struct Optimizer {
    rules: Vec<Box<dyn Rule>>,
    config: OptimizerConfig,
}

impl Optimizer {
    /// An optimizer with no rules.
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            rules: Vec::new(),
            config,
        }
    }

    pub fn with_default_rules(config: OptimizerConfig) -> Self {
        Self {
            rules: default_rules(),
            config,
        }
    }

    pub fn add_rule<R: Rule + 'static>(&mut self, rule: R) {
        self.rules.push(Box::new(rule));
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Rewrite `plan` in place until no enabled rule matches.
    pub fn optimize(&self, plan: &mut LogicalPlan) -> Result<OptimizeSummary> {
        let mut summary = OptimizeSummary::default();

        while summary.iterations < self.config.max_iterations {
            summary.iterations += 1;
            let mut fired = false;

            for rule in &self.rules {
                if self.config.is_disabled(rule.name()) {
                    continue;
                }
                for node in rule.build_pattern().candidates(plan) {
                    if !rule.matches(plan, node) {
                        continue;
                    }
                    let changes = rule.apply(plan, node)?;

                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        rule = rule.name(),
                        %node,
                        touched = changes.touched().len(),
                        iteration = summary.iterations,
                        "applied rule"
                    );

                    summary.applications.push(Application {
                        rule: rule.name().to_string(),
                        node,
                        touched: changes.touched().to_vec(),
                    });
                    fired = true;
                }
            }

            if !fired {
                summary.reached_fixed_point = true;
                break;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            iterations = summary.iterations,
            applied = summary.applications.len(),
            fixed_point = summary.reached_fixed_point,
            "optimization finished"
        );

        Ok(summary)
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::with_default_rules(OptimizerConfig::default())
    }
}
