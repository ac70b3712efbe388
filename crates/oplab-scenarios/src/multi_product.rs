//! Multi-commodity transportation: several products share the same
//! origins and destinations, each with its own supply, demand and costs.

use log::info;
use oplab_solver::{ConstraintOp, LinearExpr, LpSolver, OptimizationModel, Sense, SolveResult, VarKey};

use crate::error::ScenarioError;
use crate::metrics::{assign_shares, check_amount, check_len, check_unique, share_pct, RouteCost};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MultiProductScenario {
    pub origins: Vec<String>,
    pub products: Vec<String>,
    pub destinations: Vec<String>,
    /// `supply[origin][product]`
    pub supply: Vec<Vec<f64>>,
    /// `demand[destination][product]`
    pub demand: Vec<Vec<f64>>,
    /// `costs[origin][product][destination]`
    pub costs: Vec<Vec<Vec<f64>>>,
}

impl MultiProductScenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        check_unique("origin", self.origins.iter().map(String::as_str))?;
        check_unique("product", self.products.iter().map(String::as_str))?;
        check_unique("destination", self.destinations.iter().map(String::as_str))?;

        check_len("supply matrix", self.supply.len(), self.origins.len())?;
        for (o, row) in self.origins.iter().zip(&self.supply) {
            check_len(&format!("supply row of {}", o), row.len(), self.products.len())?;
            for (p, &v) in self.products.iter().zip(row) {
                check_amount(&format!("supply of {} at {}", p, o), v)?;
            }
        }

        check_len("demand matrix", self.demand.len(), self.destinations.len())?;
        for (d, row) in self.destinations.iter().zip(&self.demand) {
            check_len(&format!("demand row of {}", d), row.len(), self.products.len())?;
            for (p, &v) in self.products.iter().zip(row) {
                check_amount(&format!("demand of {} at {}", p, d), v)?;
            }
        }

        check_len("cost tensor", self.costs.len(), self.origins.len())?;
        for (o, per_product) in self.origins.iter().zip(&self.costs) {
            check_len(&format!("cost block of {}", o), per_product.len(), self.products.len())?;
            for (p, row) in self.products.iter().zip(per_product) {
                check_len(&format!("cost row of {} at {}", p, o), row.len(), self.destinations.len())?;
                for (d, &c) in self.destinations.iter().zip(row) {
                    check_amount(&format!("cost of {} {} -> {}", p, o, d), c)?;
                }
            }
        }
        Ok(())
    }
}

pub fn variable(origin: &str, product: &str, destination: &str) -> VarKey {
    VarKey::new([origin, product, destination])
}

/// Supply caps per (origin, product), demand floors per (destination, product)
pub fn build(scenario: &MultiProductScenario) -> Result<OptimizationModel, ScenarioError> {
    scenario.validate()?;
    let s = scenario;

    let mut model = OptimizationModel::new("multi_product_transportation", Sense::Minimize);
    let mut objective = LinearExpr::new();
    for (i, o) in s.origins.iter().enumerate() {
        for (p, product) in s.products.iter().enumerate() {
            for (j, d) in s.destinations.iter().enumerate() {
                let key = variable(o, product, d);
                model.add_variable(key.clone(), None)?;
                objective.add_term(key, s.costs[i][p][j]);
            }
        }
    }
    model.set_objective(objective, Sense::Minimize);

    for (i, o) in s.origins.iter().enumerate() {
        for (p, product) in s.products.iter().enumerate() {
            let expr = LinearExpr::sum(s.destinations.iter().map(|d| variable(o, product, d)));
            model.add_constraint(format!("supply {} {}", o, product), expr, ConstraintOp::Le, s.supply[i][p]);
        }
    }
    for (j, d) in s.destinations.iter().enumerate() {
        for (p, product) in s.products.iter().enumerate() {
            let expr = LinearExpr::sum(s.origins.iter().map(|o| variable(o, product, d)));
            model.add_constraint(format!("demand {} {}", d, product), expr, ConstraintOp::Ge, s.demand[j][p]);
        }
    }
    Ok(model)
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    pub product: String,
    pub quantity: f64,
    pub cost: f64,
    pub share_pct: f64,
    pub average_unit_cost: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MultiProductReport {
    pub result: SolveResult,
    pub routes: Vec<RouteCost>,
    pub products: Vec<ProductSummary>,
    pub total_cost: f64,
}

pub fn extract(scenario: &MultiProductScenario, result: SolveResult) -> MultiProductReport {
    let s = scenario;
    let mut routes = Vec::new();
    for (i, o) in s.origins.iter().enumerate() {
        for (p, product) in s.products.iter().enumerate() {
            for (j, d) in s.destinations.iter().enumerate() {
                let quantity = result.value(&variable(o, product, d));
                if quantity > 0.0 {
                    routes.push(RouteCost::new(o.clone(), d.clone(), quantity, s.costs[i][p][j]).for_product(product.clone()));
                }
            }
        }
    }
    let total_cost = assign_shares(&mut routes);

    let products = s
        .products
        .iter()
        .map(|product| {
            let own = routes.iter().filter(|r| r.product.as_deref() == Some(product.as_str()));
            let (quantity, cost) = own.fold((0.0, 0.0), |(q, c), r| (q + r.quantity, c + r.total_cost));
            ProductSummary {
                product: product.clone(),
                quantity,
                cost,
                share_pct: share_pct(cost, total_cost),
                average_unit_cost: if quantity > 0.0 { cost / quantity } else { 0.0 },
            }
        })
        .collect();

    MultiProductReport {
        result,
        routes,
        products,
        total_cost,
    }
}

pub fn run(scenario: &MultiProductScenario, solver: &LpSolver) -> Result<MultiProductReport, ScenarioError> {
    let model = build(scenario)?;
    let result = solver.solve(&model)?;
    info!("multi-product transportation solved: cost {:.2}", result.objective_value);
    Ok(extract(scenario, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use oplab_solver::SolveError;

    #[test]
    fn test_demo_multi_product() {
        let scenario = demo::multi_product();
        let report = run(&scenario, &LpSolver::new()).unwrap();
        assert!((report.result.objective_value - 4600.0).abs() < 1e-6, "cost = {}", report.result.objective_value);
        assert!((report.products[0].cost - 2280.0).abs() < 1e-6);
        assert!((report.products[1].cost - 2320.0).abs() < 1e-6);
        assert!((report.products[0].quantity - 380.0).abs() < 1e-6);
        assert!((report.products[1].quantity - 370.0).abs() < 1e-6);
    }

    #[test]
    fn test_demo_respects_supply_and_demand() {
        let scenario = demo::multi_product();
        let model = build(&scenario).unwrap();
        let result = LpSolver::new().solve(&model).unwrap();
        for activity in result.activities(&model, 1e-9) {
            assert!(activity.slack >= -1e-6, "{} violated: {:?}", activity.constraint, activity);
        }
    }

    #[test]
    fn test_variables_use_composite_keys() {
        let model = build(&demo::multi_product()).unwrap();
        // 2 factories x 2 products x 3 markets
        assert_eq!(model.num_variables(), 12);
        assert!(model.contains(&variable("Factory X", "Product P2", "Market M3")));
        // supply per (origin, product) + demand per (destination, product)
        assert_eq!(model.num_constraints(), 4 + 6);
    }

    #[test]
    fn test_short_supply_is_infeasible() {
        let mut scenario = demo::multi_product();
        scenario.supply[0][0] = 10.0;
        assert_eq!(
            run(&scenario, &LpSolver::new()),
            Err(ScenarioError::Solve(SolveError::Infeasible))
        );
    }

    #[test]
    fn test_cost_tensor_shape_checked() {
        let mut scenario = demo::multi_product();
        scenario.costs[1][0].pop();
        assert!(matches!(build(&scenario), Err(ScenarioError::InvalidScenario(_))));
    }
}
