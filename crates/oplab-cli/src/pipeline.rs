use log::info;
use oplab_scenarios::max_flow::{self, MaxFlowReport};
use oplab_scenarios::min_cost_flow::{self, MinCostFlowReport};
use oplab_scenarios::multi_product::{self, MultiProductReport};
use oplab_scenarios::production::{self, ProductionReport, ProductionScenario};
use oplab_scenarios::shortest_path::{self, ShortestPathReport};
use oplab_scenarios::transport::{self, RouteRef, TransportReport};
use oplab_scenarios::{vary, ScenarioError, SensitivityPoint};
use oplab_solver::LpSolver;
use serde::Serialize;

use crate::config::{NetworkConfig, TransportConfig};

/// One varied coefficient and the re-solved objective for each change
#[derive(Debug, Clone, Serialize)]
pub struct Sensitivity<D> {
    pub dimension: D,
    pub points: Vec<SensitivityPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductionOutput {
    pub report: ProductionReport,
    pub sensitivity: Vec<Sensitivity<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkOutput {
    pub max_flow: MaxFlowReport,
    pub min_cost_flow: MinCostFlowReport,
    pub shortest_path: ShortestPathReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransportOutput {
    pub basic: TransportReport,
    pub multi_product: MultiProductReport,
    pub sensitivity: Vec<Sensitivity<RouteRef>>,
}

/// Solve the plan, then vary each product's unit profit
pub fn run_production(
    scenario: &ProductionScenario,
    deltas: &[f64],
    solver: &LpSolver,
) -> Result<ProductionOutput, ScenarioError> {
    let report = production::run(scenario, solver)?;
    let sensitivity = scenario
        .products
        .iter()
        .map(|p| {
            Ok(Sensitivity {
                dimension: p.name.clone(),
                points: vary(scenario, &p.name, deltas, solver)?,
            })
        })
        .collect::<Result<Vec<_>, ScenarioError>>()?;
    info!("production demo finished");
    Ok(ProductionOutput { report, sensitivity })
}

pub fn run_network(config: &NetworkConfig, solver: &LpSolver) -> Result<NetworkOutput, ScenarioError> {
    let max_flow = max_flow::run(&config.max_flow)?;
    let min_cost_flow = min_cost_flow::run(&config.min_cost_flow, solver)?;
    let shortest_path = shortest_path::run(&config.shortest_path)?;
    info!("network demo finished");
    Ok(NetworkOutput {
        max_flow,
        min_cost_flow,
        shortest_path,
    })
}

/// Solve both transportation models, then vary the cost of the
/// first `key_routes` routes of the basic plan
pub fn run_transport(
    config: &TransportConfig,
    deltas: &[f64],
    solver: &LpSolver,
) -> Result<TransportOutput, ScenarioError> {
    let basic = transport::run(&config.basic, solver)?;
    let multi_product = multi_product::run(&config.multi_product, solver)?;

    let mut sensitivity = Vec::new();
    for route in basic.routes.iter().take(config.key_routes) {
        let dimension = RouteRef {
            origin: route.from.clone(),
            destination: route.to.clone(),
        };
        let points = vary(&config.basic, &dimension, deltas, solver)?;
        sensitivity.push(Sensitivity { dimension, points });
    }
    info!("transportation demo finished");
    Ok(TransportOutput {
        basic,
        multi_product,
        sensitivity,
    })
}
