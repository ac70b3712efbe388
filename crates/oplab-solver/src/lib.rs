mod error;
mod graph;
mod lp;
mod problem;
mod solution;

pub use error::SolveError;
pub use graph::{
    max_flow, network_stats, shortest_path, ArcFlow, Edge, MaxFlow, NetworkStats, PathLeg, ShortestPath,
    WeightedGraph,
};
pub use lp::LpSolver;
pub use problem::{Constraint, ConstraintOp, LinearExpr, Objective, OptimizationModel, Sense, VarKey, Variable};
pub use solution::{ConstraintActivity, SolveResult, SolveStatus};
