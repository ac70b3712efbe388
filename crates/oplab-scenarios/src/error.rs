use oplab_solver::SolveError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
    #[error(transparent)]
    Solve(#[from] SolveError),
}
