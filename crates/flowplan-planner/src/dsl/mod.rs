//! Pipeline description languages that build a `LogicalPlan`.

pub mod yaml;
