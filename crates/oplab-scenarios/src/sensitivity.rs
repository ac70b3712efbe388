use log::{debug, info};
use oplab_solver::{LpSolver, OptimizationModel, SolveResult};

use crate::error::ScenarioError;

/// A scenario whose objective coefficients can be varied one at a time.
///
/// `with_coefficient` must return an independent copy: the receiver is
/// never modified, so every variant gets its own model and solve.
pub trait Scenario: Clone {
    /// Which coefficient to vary (a product, a route, ...)
    type Dimension: std::fmt::Debug;

    fn build(&self) -> Result<OptimizationModel, ScenarioError>;

    fn coefficient(&self, dimension: &Self::Dimension) -> Result<f64, ScenarioError>;

    fn with_coefficient(&self, dimension: &Self::Dimension, value: f64) -> Result<Self, ScenarioError>;
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityPoint {
    /// Requested change of the coefficient, in percent
    pub delta_pct: f64,
    pub coefficient: f64,
    pub objective: f64,
    /// Objective change relative to the unmodified scenario
    pub change: f64,
    pub result: SolveResult,
}

/// Re-solve `scenario` once per percentage change of one objective coefficient.
///
/// Variants are solved in the order the deltas are given. An empty delta
/// list returns immediately without solving anything. Deltas below -100%
/// are rejected before the first solve.
pub fn vary<S: Scenario>(
    scenario: &S,
    dimension: &S::Dimension,
    deltas_pct: &[f64],
    solver: &LpSolver,
) -> Result<Vec<SensitivityPoint>, ScenarioError> {
    if deltas_pct.is_empty() {
        return Ok(Vec::new());
    }

    if let Some(delta) = deltas_pct.iter().find(|d| !d.is_finite() || **d < -100.0) {
        return Err(ScenarioError::InvalidScenario(format!(
            "a {}% change of the {:?} coefficient is below -100%",
            delta, dimension
        )));
    }

    let base_coefficient = scenario.coefficient(dimension)?;
    let baseline = solver.solve(&scenario.build()?)?;
    info!(
        "sensitivity of {:?}: baseline objective {:.4}, {} variants",
        dimension,
        baseline.objective_value,
        deltas_pct.len()
    );

    let mut points = Vec::with_capacity(deltas_pct.len());
    for &delta in deltas_pct {
        let coefficient = base_coefficient * (1.0 + delta / 100.0);
        let variant = scenario.with_coefficient(dimension, coefficient)?;
        let result = solver.solve(&variant.build()?)?;
        debug!(
            "{:?} {:+}% -> coefficient {:.4}, objective {:.4}",
            dimension, delta, coefficient, result.objective_value
        );
        points.push(SensitivityPoint {
            delta_pct: delta,
            coefficient,
            objective: result.objective_value,
            change: result.objective_value - baseline.objective_value,
            result,
        });
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use crate::transport::RouteRef;

    #[test]
    fn test_empty_deltas() {
        let scenario = demo::production();
        let points = vary(&scenario, &"Product A".to_string(), &[], &LpSolver::new()).unwrap();
        assert!(points.is_empty());
        assert_eq!(scenario, demo::production());
    }

    #[test]
    fn test_product_a_profit_drop() {
        let scenario = demo::production();
        let points = vary(&scenario, &"Product A".to_string(), &[-20.0], &LpSolver::new()).unwrap();
        let point = &points[0];
        assert!((point.coefficient - 32.0).abs() < 1e-9);
        assert!((point.objective - 2040.0).abs() < 1e-6, "objective = {}", point.objective);
        assert!((point.change + 160.0).abs() < 1e-6);
        // The base scenario keeps its original profit
        assert_eq!(scenario.products[0].profit, 40.0);
    }

    #[test]
    fn test_points_follow_delta_order() {
        let deltas = [20.0, -10.0, 10.0, -20.0];
        let points = vary(&demo::production(), &"Product B".to_string(), &deltas, &LpSolver::new()).unwrap();
        let order: Vec<f64> = points.iter().map(|p| p.delta_pct).collect();
        assert_eq!(order, deltas.to_vec());
    }

    #[test]
    fn test_route_cost_changes_move_total_cost() {
        let route = RouteRef {
            origin: "Factory C".to_string(),
            destination: "Warehouse 4".to_string(),
        };
        let points = vary(&demo::transport(), &route, &demo::DEFAULT_DELTAS, &LpSolver::new()).unwrap();
        assert_eq!(points.len(), 4);
        for p in &points {
            if p.delta_pct < 0.0 {
                assert!(p.change <= 1e-6, "{:?}", p);
            } else {
                assert!(p.change >= -1e-6, "{:?}", p);
            }
            assert_eq!(p.result.objective_value, p.objective);
        }
    }

    #[test]
    fn test_delta_below_minus_hundred_rejected() {
        let product = "Product A".to_string();
        let result = vary(&demo::production(), &product, &[10.0, -150.0], &LpSolver::new());
        match result {
            Err(ScenarioError::InvalidScenario(msg)) => assert!(msg.contains("-150"), "{}", msg),
            other => panic!("expected InvalidScenario, got {:?}", other.map(|p| p.len())),
        }

        // -100% drives the profit to zero, which is still a valid plan
        let points = vary(&demo::production(), &product, &[-100.0], &LpSolver::new()).unwrap();
        assert_eq!(points[0].coefficient, 0.0);
    }

    #[test]
    fn test_unknown_dimension() {
        let result = vary(&demo::production(), &"Product Z".to_string(), &[10.0], &LpSolver::new());
        assert!(matches!(result, Err(ScenarioError::InvalidScenario(_))));
    }
}
