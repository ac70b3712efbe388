use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    #[error("Problem is infeasible: no assignment satisfies all constraints")]
    Infeasible,
    #[error("Problem is unbounded: the objective has no finite optimum")]
    Unbounded,
    #[error("Node not found in graph: {0}")]
    NodeNotFound(String),
    #[error("No path from {from} to {to}")]
    NoPath { from: String, to: String },
    #[error("Negative weight {weight} on edge {from} -> {to}")]
    NegativeWeight { from: String, to: String, weight: f64 },
    #[error("Solver backend error: {0}")]
    Backend(String),
}
