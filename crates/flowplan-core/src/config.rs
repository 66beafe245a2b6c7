//! Optimizer configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Upper bound on driver iterations. Each iteration runs every enabled
    /// rule once over the current plan.
    pub max_iterations: usize,

    /// Rule names the driver must skip.
    pub disabled_rules: Vec<String>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            disabled_rules: Vec::new(),
        }
    }
}

impl OptimizerConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `FLOWPLAN_MAX_ITERATIONS`: driver iteration cap
    /// - `FLOWPLAN_DISABLED_RULES`: comma-separated rule names
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(s) = lookup("FLOWPLAN_MAX_ITERATIONS") {
            if let Ok(v) = s.trim().parse::<usize>() {
                cfg.max_iterations = v;
            }
        }

        if let Some(s) = lookup("FLOWPLAN_DISABLED_RULES") {
            cfg.disabled_rules = s
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
        }

        cfg
    }

    pub fn is_disabled(&self, rule: &str) -> bool {
        self.disabled_rules.iter().any(|r| r == rule)
    }
}
