//! Operations-research demo scenarios: each module turns a small problem
//! description into a solver model or graph, solves it and derives the
//! figures a planner would look at.

pub mod demo;
mod error;
pub mod max_flow;
mod metrics;
pub mod min_cost_flow;
pub mod multi_product;
pub mod production;
mod sensitivity;
pub mod shortest_path;
pub mod transport;

pub use error::ScenarioError;
pub use metrics::{assign_shares, share_pct, utilization_pct, ResourceUsage, RouteCost, BOTTLENECK_PCT};
pub use sensitivity::{vary, Scenario, SensitivityPoint};
