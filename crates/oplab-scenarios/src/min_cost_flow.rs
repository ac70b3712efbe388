//! Capacitated distribution: ship from sources to sinks over routes
//! that each carry a unit cost and a capacity.

use log::info;
use oplab_solver::{ConstraintOp, LinearExpr, LpSolver, OptimizationModel, Sense, SolveResult, VarKey};

use crate::error::ScenarioError;
use crate::metrics::{assign_shares, check_amount, check_unique, ResourceUsage, RouteCost};
use crate::transport::Site;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub from: String,
    pub to: String,
    pub unit_cost: f64,
    pub capacity: f64,
}

impl Route {
    pub fn new(from: impl Into<String>, to: impl Into<String>, unit_cost: f64, capacity: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            unit_cost,
            capacity,
        }
    }

    fn label(&self) -> String {
        format!("{} -> {}", self.from, self.to)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MinCostFlowScenario {
    pub sources: Vec<Site>,
    pub sinks: Vec<Site>,
    pub routes: Vec<Route>,
}

impl MinCostFlowScenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        check_unique(
            "site",
            self.sources.iter().chain(&self.sinks).map(|s| s.name.as_str()),
        )?;
        for site in self.sources.iter().chain(&self.sinks) {
            check_amount(&format!("amount of {}", site.name), site.amount)?;
        }

        let labels: Vec<String> = self.routes.iter().map(Route::label).collect();
        check_unique("route", labels.iter().map(String::as_str))?;
        for route in &self.routes {
            if !self.sources.iter().any(|s| s.name == route.from) {
                return Err(ScenarioError::InvalidScenario(format!(
                    "route {} does not start at a source",
                    route.label()
                )));
            }
            if !self.sinks.iter().any(|s| s.name == route.to) {
                return Err(ScenarioError::InvalidScenario(format!(
                    "route {} does not end at a sink",
                    route.label()
                )));
            }
            check_amount(&format!("unit cost of {}", route.label()), route.unit_cost)?;
            check_amount(&format!("capacity of {}", route.label()), route.capacity)?;
        }
        Ok(())
    }

    pub fn total_supply(&self) -> f64 {
        self.sources.iter().map(|s| s.amount).sum()
    }

    pub fn total_demand(&self) -> f64 {
        self.sinks.iter().map(|s| s.amount).sum()
    }
}

pub fn variable(route: &Route) -> VarKey {
    VarKey::new([route.from.as_str(), route.to.as_str()])
}

/// Minimize shipping cost; each route variable is capped at the route capacity
pub fn build(scenario: &MinCostFlowScenario) -> Result<OptimizationModel, ScenarioError> {
    scenario.validate()?;

    let mut model = OptimizationModel::new("min_cost_flow", Sense::Minimize);
    for route in &scenario.routes {
        model.add_variable(variable(route), Some(route.capacity))?;
    }
    model.set_objective(
        scenario.routes.iter().map(|r| (variable(r), r.unit_cost)).collect(),
        Sense::Minimize,
    );

    for source in &scenario.sources {
        let expr = LinearExpr::sum(scenario.routes.iter().filter(|r| r.from == source.name).map(variable));
        model.add_constraint(format!("supply {}", source.name), expr, ConstraintOp::Le, source.amount);
    }
    for sink in &scenario.sinks {
        let expr = LinearExpr::sum(scenario.routes.iter().filter(|r| r.to == sink.name).map(variable));
        model.add_constraint(format!("demand {}", sink.name), expr, ConstraintOp::Ge, sink.amount);
    }
    Ok(model)
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MinCostFlowReport {
    pub result: SolveResult,
    /// Routes that carry flow
    pub routes: Vec<RouteCost>,
    /// Capacity usage of every route
    pub capacity_usage: Vec<ResourceUsage>,
    pub total_supply: f64,
    pub total_demand: f64,
    pub total_cost: f64,
    pub total_quantity: f64,
    pub average_unit_cost: f64,
}

pub fn extract(scenario: &MinCostFlowScenario, result: SolveResult) -> MinCostFlowReport {
    let mut routes = Vec::new();
    let mut capacity_usage = Vec::with_capacity(scenario.routes.len());
    for route in &scenario.routes {
        let quantity = result.value(&variable(route));
        capacity_usage.push(ResourceUsage::new(route.label(), quantity, route.capacity));
        if quantity > 0.0 {
            routes.push(RouteCost::new(route.from.clone(), route.to.clone(), quantity, route.unit_cost));
        }
    }
    let total_cost = assign_shares(&mut routes);
    let total_quantity: f64 = routes.iter().map(|r| r.quantity).sum();

    MinCostFlowReport {
        result,
        routes,
        capacity_usage,
        total_supply: scenario.total_supply(),
        total_demand: scenario.total_demand(),
        total_cost,
        total_quantity,
        average_unit_cost: if total_quantity > 0.0 { total_cost / total_quantity } else { 0.0 },
    }
}

pub fn run(scenario: &MinCostFlowScenario, solver: &LpSolver) -> Result<MinCostFlowReport, ScenarioError> {
    let model = build(scenario)?;
    let result = solver.solve(&model)?;
    info!("min-cost flow solved: cost {:.2}", result.objective_value);
    Ok(extract(scenario, result))
}
