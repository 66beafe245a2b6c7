use thiserror::Error;

/// Canonical result for core and the planner.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A rule or operator was configured in a way it cannot run with, e.g. a
    /// cast inserter applied to an operator that does not ingest data.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(String),

    /// Graph-level problems: unknown node ids, missing edges, violated
    /// rewrite preconditions.
    #[error("Planning error: {0}")]
    Plan(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}
