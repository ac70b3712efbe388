//! Production planning: choose output quantities that maximize profit
//! within limited resources.

use log::info;
use oplab_solver::{ConstraintOp, LinearExpr, LpSolver, OptimizationModel, Sense, SolveResult, VarKey};

use crate::error::ScenarioError;
use crate::metrics::{check_amount, check_len, check_unique, share_pct, ResourceUsage};
use crate::sensitivity::Scenario;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub name: String,
    /// Display unit, e.g. "hours" or "kg"
    #[cfg_attr(feature = "serde", serde(default))]
    pub unit: Option<String>,
    pub available: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub name: String,
    /// Profit per unit produced
    pub profit: f64,
    /// Resource consumed per unit, one entry per scenario resource
    pub requirements: Vec<f64>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionScenario {
    pub resources: Vec<Resource>,
    pub products: Vec<Product>,
}

impl ProductionScenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        check_unique("resource", self.resources.iter().map(|r| r.name.as_str()))?;
        check_unique("product", self.products.iter().map(|p| p.name.as_str()))?;
        for r in &self.resources {
            check_amount(&format!("availability of {}", r.name), r.available)?;
        }
        for p in &self.products {
            check_amount(&format!("profit of {}", p.name), p.profit)?;
            check_len(
                &format!("requirements of {}", p.name),
                p.requirements.len(),
                self.resources.len(),
            )?;
            for (r, &req) in self.resources.iter().zip(&p.requirements) {
                check_amount(&format!("{} requirement of {}", r.name, p.name), req)?;
            }
        }
        Ok(())
    }

    pub fn product_index(&self, name: &str) -> Result<usize, ScenarioError> {
        self.products
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ScenarioError::InvalidScenario(format!("unknown product: {}", name)))
    }

    /// Copy of this scenario with one product's unit profit replaced
    pub fn with_profit(&self, product: &str, profit: f64) -> Result<Self, ScenarioError> {
        let i = self.product_index(product)?;
        let mut copy = self.clone();
        copy.products[i].profit = profit;
        Ok(copy)
    }
}

pub fn variable(product: &Product) -> VarKey {
    VarKey::new(["produce", product.name.as_str()])
}

/// Maximize total profit subject to one capacity constraint per resource
pub fn build(scenario: &ProductionScenario) -> Result<OptimizationModel, ScenarioError> {
    scenario.validate()?;

    let mut model = OptimizationModel::new("production_planning", Sense::Maximize);
    for p in &scenario.products {
        model.add_variable(variable(p), None)?;
    }
    model.set_objective(
        scenario.products.iter().map(|p| (variable(p), p.profit)).collect(),
        Sense::Maximize,
    );
    for (r, resource) in scenario.resources.iter().enumerate() {
        let expr: LinearExpr = scenario
            .products
            .iter()
            .map(|p| (variable(p), p.requirements[r]))
            .collect();
        model.add_constraint(resource.name.clone(), expr, ConstraintOp::Le, resource.available);
    }
    Ok(model)
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProductLine {
    pub product: String,
    pub quantity: f64,
    pub unit_profit: f64,
    pub contribution: f64,
    /// Share of total profit
    pub share_pct: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionReport {
    pub result: SolveResult,
    pub plan: Vec<ProductLine>,
    pub resources: Vec<ResourceUsage>,
    /// Resources with no slack at the optimum
    pub binding: Vec<String>,
    /// Product with the highest profit per unit
    pub most_profitable: Option<String>,
}

pub fn extract(scenario: &ProductionScenario, model: &OptimizationModel, result: SolveResult) -> ProductionReport {
    let mut plan: Vec<ProductLine> = scenario
        .products
        .iter()
        .map(|p| {
            let quantity = result.value(&variable(p));
            ProductLine {
                product: p.name.clone(),
                quantity,
                unit_profit: p.profit,
                contribution: quantity * p.profit,
                share_pct: 0.0,
            }
        })
        .collect();
    let total: f64 = plan.iter().map(|l| l.contribution).sum();
    for line in &mut plan {
        line.share_pct = share_pct(line.contribution, total);
    }

    let resources = scenario
        .resources
        .iter()
        .enumerate()
        .map(|(r, resource)| {
            let used = scenario
                .products
                .iter()
                .map(|p| p.requirements[r] * result.value(&variable(p)))
                .sum();
            ResourceUsage::new(resource.name.clone(), used, resource.available)
        })
        .collect();

    let binding = result.binding_constraints(model, 1e-6);
    let most_profitable = scenario
        .products
        .iter()
        .max_by(|a, b| a.profit.total_cmp(&b.profit))
        .map(|p| p.name.clone());

    ProductionReport {
        result,
        plan,
        resources,
        binding,
        most_profitable,
    }
}

/// Build, solve and extract in one go
pub fn run(scenario: &ProductionScenario, solver: &LpSolver) -> Result<ProductionReport, ScenarioError> {
    let model = build(scenario)?;
    let result = solver.solve(&model)?;
    info!("production plan solved: profit {:.2}", result.objective_value);
    Ok(extract(scenario, &model, result))
}

impl Scenario for ProductionScenario {
    /// Product name whose unit profit is varied
    type Dimension = String;

    fn build(&self) -> Result<OptimizationModel, ScenarioError> {
        build(self)
    }

    fn coefficient(&self, dimension: &String) -> Result<f64, ScenarioError> {
        Ok(self.products[self.product_index(dimension)?].profit)
    }

    fn with_coefficient(&self, dimension: &String, value: f64) -> Result<Self, ScenarioError> {
        self.with_profit(dimension, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use proptest::prelude::*;

    #[test]
    fn test_demo_plan_is_optimal() {
        let scenario = demo::production();
        let report = run(&scenario, &LpSolver::new()).unwrap();

        assert!((report.result.objective_value - 2200.0).abs() < 1e-6, "profit = {}", report.result.objective_value);
        assert!((report.plan[0].quantity - 40.0).abs() < 1e-6);
        assert!((report.plan[1].quantity - 20.0).abs() < 1e-6);
        assert!(report.plan[2].quantity.abs() < 1e-6);
        assert_eq!(report.most_profitable.as_deref(), Some("Product C"));
    }

    #[test]
    fn test_demo_respects_resources() {
        let scenario = demo::production();
        let report = run(&scenario, &LpSolver::new()).unwrap();

        let labor = &report.resources[0];
        let material = &report.resources[1];
        assert!(labor.used <= 100.0 + 1e-6);
        assert!(material.used <= 80.0 + 1e-6);
        for usage in &report.resources {
            assert!(usage.utilization_pct >= 0.0 && usage.utilization_pct <= 100.0 + 1e-6);
        }
        // Both resources are exhausted by the optimal plan
        assert!(labor.bottleneck && material.bottleneck);
        assert_eq!(report.binding, vec!["Labor".to_string(), "Material".to_string()]);
    }

    #[test]
    fn test_contribution_shares_sum_to_hundred() {
        let report = run(&demo::production(), &LpSolver::new()).unwrap();
        let total: f64 = report.plan.iter().map(|l| l.share_pct).sum();
        assert!((total - 100.0).abs() < 1e-6);
        let contribution: f64 = report.plan.iter().map(|l| l.contribution).sum();
        assert!((contribution - report.result.objective_value).abs() < 1e-6);
    }

    #[test]
    fn test_requirement_dimension_mismatch() {
        let mut scenario = demo::production();
        scenario.products[1].requirements.pop();
        assert!(matches!(build(&scenario), Err(ScenarioError::InvalidScenario(_))));
    }

    #[test]
    fn test_negative_availability_rejected() {
        let mut scenario = demo::production();
        scenario.resources[0].available = -1.0;
        assert!(matches!(build(&scenario), Err(ScenarioError::InvalidScenario(_))));
    }

    #[test]
    fn test_with_profit_leaves_original_untouched() {
        let scenario = demo::production();
        let changed = scenario.with_profit("Product A", 32.0).unwrap();
        assert_eq!(scenario.products[0].profit, 40.0);
        assert_eq!(changed.products[0].profit, 32.0);
        assert!(scenario.with_profit("Product Z", 1.0).is_err());
    }

    #[test]
    fn test_zero_capacity_resource() {
        let mut scenario = demo::production();
        scenario.resources[1].available = 0.0;
        let report = run(&scenario, &LpSolver::new()).unwrap();
        // Every product needs material, so nothing can be made
        assert!(report.result.objective_value.abs() < 1e-6);
        assert_eq!(report.resources[1].utilization_pct, 0.0);
    }

    proptest! {
        #[test]
        fn prop_utilization_within_capacity(
            labor in 1u32..500,
            material in 1u32..500,
            profits in prop::collection::vec(1u32..100, 3),
            needs in prop::collection::vec(1u32..10, 6),
        ) {
            let mut scenario = demo::production();
            scenario.resources[0].available = f64::from(labor);
            scenario.resources[1].available = f64::from(material);
            for (i, product) in scenario.products.iter_mut().enumerate() {
                product.profit = f64::from(profits[i]);
                product.requirements = vec![f64::from(needs[2 * i]), f64::from(needs[2 * i + 1])];
            }

            let report = run(&scenario, &LpSolver::new()).unwrap();
            for usage in &report.resources {
                prop_assert!(usage.utilization_pct >= -1e-6, "{:?}", usage);
                prop_assert!(usage.utilization_pct <= 100.0 + 1e-6, "{:?}", usage);
            }
            // With every product profitable, some resource is exhausted
            prop_assert!(report.resources.iter().any(|u| u.bottleneck));
        }
    }
}
