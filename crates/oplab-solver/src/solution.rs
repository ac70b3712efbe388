use std::collections::BTreeMap;

use crate::problem::{ConstraintOp, OptimizationModel, VarKey};

/// The result of solving a model
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    pub status: SolveStatus,
    /// Optimal objective value
    pub objective_value: f64,
    /// Optimal value for each declared variable
    pub values: BTreeMap<VarKey, f64>,
}

/// Solver outcome. Only `Optimal` ever reaches callers; the other
/// outcomes are reported as [`crate::SolveError`].
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
}

/// How a constraint behaves at the solution
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintActivity {
    pub constraint: String,
    pub op: ConstraintOp,
    /// Left-hand side evaluated at the solution
    pub lhs: f64,
    pub rhs: f64,
    /// Distance to the bound; zero means the constraint is tight
    pub slack: f64,
    /// Tight at the optimum (a pinch point of the plan)
    pub binding: bool,
}

impl SolveResult {
    pub fn optimal(objective_value: f64, values: BTreeMap<VarKey, f64>) -> Self {
        Self {
            status: SolveStatus::Optimal,
            objective_value,
            values,
        }
    }

    /// Solved value of a variable; zero when the solver did not report it
    pub fn value(&self, key: &VarKey) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    /// Evaluate every constraint of `model` at this solution
    pub fn activities(&self, model: &OptimizationModel, tolerance: f64) -> Vec<ConstraintActivity> {
        model
            .constraints()
            .iter()
            .map(|c| {
                let lhs = c.expr.evaluate(&self.values);
                let slack = match c.op {
                    ConstraintOp::Le => c.rhs - lhs,
                    ConstraintOp::Ge => lhs - c.rhs,
                    ConstraintOp::Eq => (lhs - c.rhs).abs(),
                };
                let binding = match c.op {
                    ConstraintOp::Eq => true,
                    _ => slack.abs() <= tolerance * c.rhs.abs().max(1.0),
                };
                ConstraintActivity {
                    constraint: c.name.clone(),
                    op: c.op,
                    lhs,
                    rhs: c.rhs,
                    slack,
                    binding,
                }
            })
            .collect()
    }

    /// Names of the constraints that are tight at this solution
    pub fn binding_constraints(&self, model: &OptimizationModel, tolerance: f64) -> Vec<String> {
        self.activities(model, tolerance)
            .into_iter()
            .filter(|a| a.binding)
            .map(|a| a.constraint)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{LinearExpr, Sense};

    fn two_var_model() -> OptimizationModel {
        let mut model = OptimizationModel::new("activity", Sense::Maximize);
        model.add_variable(VarKey::from("x"), None).unwrap();
        model.add_variable(VarKey::from("y"), None).unwrap();
        model.add_constraint(
            "sum",
            LinearExpr::sum([VarKey::from("x"), VarKey::from("y")]),
            ConstraintOp::Le,
            4.0,
        );
        model.add_constraint(
            "x_min",
            LinearExpr::new().with_term(VarKey::from("x"), 1.0),
            ConstraintOp::Ge,
            1.0,
        );
        model
    }

    #[test]
    fn test_activities_report_slack_and_binding() {
        let model = two_var_model();
        let mut values = BTreeMap::new();
        values.insert(VarKey::from("x"), 3.0);
        values.insert(VarKey::from("y"), 1.0);
        let result = SolveResult::optimal(11.0, values);

        let activities = result.activities(&model, 1e-9);
        assert_eq!(activities.len(), 2);
        assert!(activities[0].binding);
        assert!(activities[0].slack.abs() < 1e-12);
        assert!(!activities[1].binding);
        assert!((activities[1].slack - 2.0).abs() < 1e-12);

        assert_eq!(result.binding_constraints(&model, 1e-9), vec!["sum".to_string()]);
    }

    #[test]
    fn test_value_defaults_to_zero() {
        let result = SolveResult::optimal(0.0, BTreeMap::new());
        assert!(result.is_optimal());
        assert_eq!(result.value(&VarKey::from("nothing")), 0.0);
    }
}
