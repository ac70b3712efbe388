//! Classical transportation problem: ship from origins to destinations at
//! minimum cost. Unbalanced instances are closed with a zero-cost dummy
//! node before the model is built.

use log::{info, warn};
use oplab_solver::{ConstraintOp, LinearExpr, LpSolver, OptimizationModel, Sense, SolveResult, VarKey};

use crate::error::ScenarioError;
use crate::metrics::{assign_shares, check_amount, check_len, check_unique, RouteCost};
use crate::sensitivity::Scenario;

pub const DUMMY_ORIGIN: &str = "Dummy origin";
pub const DUMMY_DESTINATION: &str = "Dummy destination";

/// A supply or demand point
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub name: String,
    pub amount: f64,
}

impl Site {
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TransportScenario {
    pub origins: Vec<Site>,
    pub destinations: Vec<Site>,
    /// Unit cost, `costs[origin][destination]`
    pub costs: Vec<Vec<f64>>,
}

impl TransportScenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        check_unique("origin", self.origins.iter().map(|s| s.name.as_str()))?;
        check_unique("destination", self.destinations.iter().map(|s| s.name.as_str()))?;
        for s in &self.origins {
            check_amount(&format!("supply of {}", s.name), s.amount)?;
        }
        for d in &self.destinations {
            check_amount(&format!("demand of {}", d.name), d.amount)?;
        }
        check_len("cost matrix", self.costs.len(), self.origins.len())?;
        for (o, row) in self.origins.iter().zip(&self.costs) {
            check_len(&format!("cost row of {}", o.name), row.len(), self.destinations.len())?;
            for (d, &c) in self.destinations.iter().zip(row) {
                check_amount(&format!("cost {} -> {}", o.name, d.name), c)?;
            }
        }
        Ok(())
    }

    pub fn total_supply(&self) -> f64 {
        self.origins.iter().map(|s| s.amount).sum()
    }

    pub fn total_demand(&self) -> f64 {
        self.destinations.iter().map(|d| d.amount).sum()
    }

    fn route_index(&self, origin: &str, destination: &str) -> Result<(usize, usize), ScenarioError> {
        let i = self
            .origins
            .iter()
            .position(|s| s.name == origin)
            .ok_or_else(|| ScenarioError::InvalidScenario(format!("unknown origin: {}", origin)))?;
        let j = self
            .destinations
            .iter()
            .position(|d| d.name == destination)
            .ok_or_else(|| ScenarioError::InvalidScenario(format!("unknown destination: {}", destination)))?;
        Ok((i, j))
    }

    /// Copy of this scenario with one route's unit cost replaced
    pub fn with_cost(&self, origin: &str, destination: &str, cost: f64) -> Result<Self, ScenarioError> {
        let (i, j) = self.route_index(origin, destination)?;
        let mut copy = self.clone();
        copy.costs[i][j] = cost;
        Ok(copy)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DummySide {
    /// Added when demand exceeds supply; its shipments are unmet demand
    Origin,
    /// Added when supply exceeds demand; its receipts are unused supply
    Destination,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DummyNode {
    pub side: DummySide,
    pub name: String,
    pub amount: f64,
}

/// A scenario whose total supply equals its total demand
#[derive(Debug, Clone, PartialEq)]
pub struct BalancedTransport {
    pub scenario: TransportScenario,
    pub dummy: Option<DummyNode>,
}

/// Close the gap between supply and demand with a zero-cost dummy node.
///
/// The dummy amount is chosen so that `total_supply() == total_demand()`
/// holds exactly on the returned scenario for integer-valued amounts, and to
/// within one rounding step otherwise.
pub fn balance(scenario: &TransportScenario) -> Result<BalancedTransport, ScenarioError> {
    scenario.validate()?;
    let supply = scenario.total_supply();
    let demand = scenario.total_demand();
    if supply == demand {
        return Ok(BalancedTransport {
            scenario: scenario.clone(),
            dummy: None,
        });
    }

    let mut balanced = scenario.clone();
    let dummy = if supply > demand {
        warn!(
            "supply {} exceeds demand {}, adding {} to absorb the surplus",
            supply, demand, DUMMY_DESTINATION
        );
        let amount = closing_amount(demand, supply);
        balanced.destinations.push(Site::new(DUMMY_DESTINATION, amount));
        for row in &mut balanced.costs {
            row.push(0.0);
        }
        DummyNode {
            side: DummySide::Destination,
            name: DUMMY_DESTINATION.to_string(),
            amount,
        }
    } else {
        warn!(
            "demand {} exceeds supply {}, adding {} to cover the shortage",
            demand, supply, DUMMY_ORIGIN
        );
        let amount = closing_amount(supply, demand);
        balanced.origins.push(Site::new(DUMMY_ORIGIN, amount));
        balanced.costs.push(vec![0.0; balanced.destinations.len()]);
        DummyNode {
            side: DummySide::Origin,
            name: DUMMY_ORIGIN.to_string(),
            amount,
        }
    };

    Ok(BalancedTransport {
        scenario: balanced,
        dummy: Some(dummy),
    })
}

/// Amount `x` with `short + x == long` in floating point. When no such
/// value exists (rare, fractional inputs only) the closest one is returned.
fn closing_amount(short: f64, long: f64) -> f64 {
    let mut amount = long - short;
    let mut best = amount;
    for _ in 0..8 {
        let total = short + amount;
        if total == long {
            return amount;
        }
        if (total - long).abs() < (short + best - long).abs() {
            best = amount;
        }
        // step one ulp towards the target; `amount` is always positive here
        let bits = amount.to_bits();
        amount = if total < long {
            f64::from_bits(bits + 1)
        } else {
            f64::from_bits(bits - 1)
        };
    }
    best
}

pub fn variable(origin: &Site, destination: &Site) -> VarKey {
    VarKey::new([origin.name.as_str(), destination.name.as_str()])
}

/// Model for an already balanced scenario: equality supply and demand rows
pub fn build_balanced(balanced: &BalancedTransport) -> Result<OptimizationModel, ScenarioError> {
    let s = &balanced.scenario;
    let mut model = OptimizationModel::new("transportation", Sense::Minimize);
    for o in &s.origins {
        for d in &s.destinations {
            model.add_variable(variable(o, d), None)?;
        }
    }

    let mut objective = LinearExpr::new();
    for (o, row) in s.origins.iter().zip(&s.costs) {
        for (d, &c) in s.destinations.iter().zip(row) {
            objective.add_term(variable(o, d), c);
        }
    }
    model.set_objective(objective, Sense::Minimize);

    for o in &s.origins {
        let expr = LinearExpr::sum(s.destinations.iter().map(|d| variable(o, d)));
        model.add_constraint(format!("supply {}", o.name), expr, ConstraintOp::Eq, o.amount);
    }
    for d in &s.destinations {
        let expr = LinearExpr::sum(s.origins.iter().map(|o| variable(o, d)));
        model.add_constraint(format!("demand {}", d.name), expr, ConstraintOp::Eq, d.amount);
    }
    Ok(model)
}

/// Rebalance if needed, then build the model
pub fn build(scenario: &TransportScenario) -> Result<OptimizationModel, ScenarioError> {
    build_balanced(&balance(scenario)?)
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TransportReport {
    pub result: SolveResult,
    pub dummy: Option<DummyNode>,
    /// Real routes carrying goods, with cost shares
    pub routes: Vec<RouteCost>,
    /// Quantities moved to or from the dummy node
    pub dummy_routes: Vec<RouteCost>,
    pub total_cost: f64,
    pub total_quantity: f64,
    /// Real-route cost per unit shipped; zero when nothing moves
    pub average_unit_cost: f64,
    pub most_expensive_route: Option<RouteCost>,
    pub cheapest_route: Option<RouteCost>,
}

pub fn extract(balanced: &BalancedTransport, result: SolveResult) -> TransportReport {
    let s = &balanced.scenario;
    let dummy_name = balanced.dummy.as_ref().map(|d| d.name.as_str());

    let mut routes = Vec::new();
    let mut dummy_routes = Vec::new();
    for (o, row) in s.origins.iter().zip(&s.costs) {
        for (d, &c) in s.destinations.iter().zip(row) {
            let quantity = result.value(&variable(o, d));
            if quantity <= 0.0 {
                continue;
            }
            let route = RouteCost::new(o.name.clone(), d.name.clone(), quantity, c);
            if Some(o.name.as_str()) == dummy_name || Some(d.name.as_str()) == dummy_name {
                dummy_routes.push(route);
            } else {
                routes.push(route);
            }
        }
    }
    let total_cost = assign_shares(&mut routes);
    let total_quantity: f64 = routes.iter().map(|r| r.quantity).sum();
    let average_unit_cost = if total_quantity > 0.0 { total_cost / total_quantity } else { 0.0 };
    let most_expensive_route = routes.iter().max_by(|a, b| a.unit_cost.total_cmp(&b.unit_cost)).cloned();
    let cheapest_route = routes.iter().min_by(|a, b| a.unit_cost.total_cmp(&b.unit_cost)).cloned();

    TransportReport {
        result,
        dummy: balanced.dummy.clone(),
        routes,
        dummy_routes,
        total_cost,
        total_quantity,
        average_unit_cost,
        most_expensive_route,
        cheapest_route,
    }
}

pub fn run(scenario: &TransportScenario, solver: &LpSolver) -> Result<TransportReport, ScenarioError> {
    let balanced = balance(scenario)?;
    let model = build_balanced(&balanced)?;
    let result = solver.solve(&model)?;
    info!("transportation solved: cost {:.2}", result.objective_value);
    Ok(extract(&balanced, result))
}

/// An `(origin, destination)` route whose unit cost is varied
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRef {
    pub origin: String,
    pub destination: String,
}

impl Scenario for TransportScenario {
    type Dimension = RouteRef;

    fn build(&self) -> Result<OptimizationModel, ScenarioError> {
        build(self)
    }

    fn coefficient(&self, route: &RouteRef) -> Result<f64, ScenarioError> {
        let (i, j) = self.route_index(&route.origin, &route.destination)?;
        Ok(self.costs[i][j])
    }

    fn with_coefficient(&self, route: &RouteRef, value: f64) -> Result<Self, ScenarioError> {
        self.with_cost(&route.origin, &route.destination, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use proptest::prelude::*;

    fn small(supply: &[f64], demand: &[f64]) -> TransportScenario {
        TransportScenario {
            origins: supply
                .iter()
                .enumerate()
                .map(|(i, &a)| Site::new(format!("o{}", i), a))
                .collect(),
            destinations: demand
                .iter()
                .enumerate()
                .map(|(j, &a)| Site::new(format!("d{}", j), a))
                .collect(),
            costs: supply
                .iter()
                .enumerate()
                .map(|(i, _)| (0..demand.len()).map(|j| (1 + i + 2 * j) as f64).collect())
                .collect(),
        }
    }

    #[test]
    fn test_demo_basic_transport() {
        let report = run(&demo::transport(), &LpSolver::new()).unwrap();
        assert!(report.dummy.is_none());
        assert!((report.result.objective_value - 10700.0).abs() < 1e-6, "cost = {}", report.result.objective_value);
        assert!((report.total_cost - 10700.0).abs() < 1e-6);
        assert!((report.total_quantity - 1200.0).abs() < 1e-6);
        assert!((report.average_unit_cost - 10700.0 / 1200.0).abs() < 1e-9);
        let share: f64 = report.routes.iter().map(|r| r.share_pct).sum();
        assert!((share - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_balanced_needs_no_dummy() {
        let balanced = balance(&small(&[5.0, 5.0], &[4.0, 6.0])).unwrap();
        assert!(balanced.dummy.is_none());
        assert_eq!(balanced.scenario.destinations.len(), 2);
    }

    #[test]
    fn test_surplus_adds_dummy_destination() {
        let scenario = small(&[10.0, 8.0], &[5.0, 6.0]);
        let balanced = balance(&scenario).unwrap();
        let dummy = balanced.dummy.clone().unwrap();
        assert_eq!(dummy.side, DummySide::Destination);
        assert_eq!(dummy.amount, 7.0);
        assert!(balanced.scenario.costs.iter().all(|row| row.last() == Some(&0.0)));
        assert_eq!(balanced.scenario.total_supply(), balanced.scenario.total_demand());
        // The caller's scenario is untouched
        assert_eq!(scenario.destinations.len(), 2);

        let report = extract(&balanced, LpSolver::new().solve(&build_balanced(&balanced).unwrap()).unwrap());
        let absorbed: f64 = report.dummy_routes.iter().map(|r| r.quantity).sum();
        assert!((absorbed - 7.0).abs() < 1e-6);
        assert!(report.routes.iter().all(|r| r.to != DUMMY_DESTINATION));
    }

    #[test]
    fn test_shortage_adds_dummy_origin() {
        let balanced = balance(&small(&[3.0], &[2.0, 4.0])).unwrap();
        let dummy = balanced.dummy.unwrap();
        assert_eq!(dummy.side, DummySide::Origin);
        assert_eq!(dummy.amount, 3.0);
        assert_eq!(balanced.scenario.costs.last().unwrap(), &vec![0.0, 0.0]);
    }

    #[test]
    fn test_shortage_is_solved_with_unmet_demand() {
        // o0 ships 3 (costs 1 and 3), demand totals 6
        let report = run(&small(&[3.0], &[2.0, 4.0]), &LpSolver::new()).unwrap();
        let dummy = report.dummy.clone().unwrap();
        assert_eq!(dummy.side, DummySide::Origin);

        let unmet: f64 = report.dummy_routes.iter().map(|r| r.quantity).sum();
        assert!((unmet - 3.0).abs() < 1e-6, "unmet = {}", unmet);
        assert!(report.dummy_routes.iter().all(|r| r.from == DUMMY_ORIGIN));
        assert!(report.routes.iter().all(|r| r.from != DUMMY_ORIGIN));

        // Cheapest use of the real supply: 2 to d0 at 1, 1 to d1 at 3
        assert!((report.result.objective_value - 5.0).abs() < 1e-6);
        assert!((report.total_cost - report.result.objective_value).abs() < 1e-6);
        assert!((report.total_quantity - 3.0).abs() < 1e-6);
        assert!((report.average_unit_cost - 5.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_fractional_amounts_balance_exactly() {
        let balanced = balance(&small(&[0.1, 0.2, 0.7], &[0.3])).unwrap();
        assert_eq!(balanced.scenario.total_supply(), balanced.scenario.total_demand());
    }

    #[test]
    fn test_cost_matrix_shape_checked() {
        let mut scenario = small(&[1.0, 1.0], &[2.0]);
        scenario.costs.pop();
        assert!(matches!(build(&scenario), Err(ScenarioError::InvalidScenario(_))));

        let mut scenario = small(&[1.0, 1.0], &[2.0]);
        scenario.costs[0].push(3.0);
        assert!(matches!(build(&scenario), Err(ScenarioError::InvalidScenario(_))));
    }

    #[test]
    fn test_negative_supply_rejected() {
        let scenario = small(&[-1.0, 3.0], &[2.0]);
        assert!(matches!(balance(&scenario), Err(ScenarioError::InvalidScenario(_))));
    }

    proptest! {
        #[test]
        fn prop_balance_totals_match(
            supply in prop::collection::vec(0u32..10_000, 1..6),
            demand in prop::collection::vec(0u32..10_000, 1..6),
        ) {
            let supply: Vec<f64> = supply.into_iter().map(f64::from).collect();
            let demand: Vec<f64> = demand.into_iter().map(f64::from).collect();
            let balanced = balance(&small(&supply, &demand)).unwrap();
            prop_assert_eq!(balanced.scenario.total_supply(), balanced.scenario.total_demand());
            if let Some(dummy) = &balanced.dummy {
                match dummy.side {
                    DummySide::Destination => {
                        prop_assert!(balanced.scenario.costs.iter().all(|row| row.last() == Some(&0.0)));
                    }
                    DummySide::Origin => {
                        prop_assert!(balanced.scenario.costs.last().unwrap().iter().all(|&c| c == 0.0));
                    }
                }
            }
        }

        #[test]
        fn prop_fractional_balance_totals_match(
            supply in prop::collection::vec(0.0f64..1_000.0, 1..5),
            demand in prop::collection::vec(0.0f64..1_000.0, 1..5),
        ) {
            let balanced = balance(&small(&supply, &demand)).unwrap();
            let s = balanced.scenario.total_supply();
            let d = balanced.scenario.total_demand();
            prop_assert!((s - d).abs() <= f64::EPSILON * s.max(d).max(1.0), "{} vs {}", s, d);
        }
    }
}
