use std::collections::BTreeMap;

use log::debug;
use microlp::{ComparisonOp, OptimizationDirection, Problem};

use crate::error::SolveError;
use crate::problem::{ConstraintOp, LinearExpr, OptimizationModel, Sense};
use crate::solution::SolveResult;

/// Linear-programming adapter over the `microlp` solver
pub struct LpSolver {
    /// Values within this distance of zero are reported as exactly zero
    tolerance: f64,
}

impl Default for LpSolver {
    fn default() -> Self {
        Self { tolerance: 1e-9 }
    }
}

impl LpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Solve the model. Infeasible and unbounded models are errors, never
    /// partial results.
    pub fn solve(&self, model: &OptimizationModel) -> Result<SolveResult, SolveError> {
        model.validate()?;
        debug!(
            "solving LP '{}': {} variables, {} constraints",
            model.name,
            model.num_variables(),
            model.num_constraints()
        );

        let direction = match model.objective().sense {
            Sense::Minimize => OptimizationDirection::Minimize,
            Sense::Maximize => OptimizationDirection::Maximize,
        };
        let mut problem = Problem::new(direction);

        let objective = self.dense_coefficients(model, &model.objective().expr);
        let vars: Vec<microlp::Variable> = model
            .variables()
            .iter()
            .zip(objective)
            .map(|(v, coef)| problem.add_var(coef, (0.0, v.upper.unwrap_or(f64::INFINITY))))
            .collect();

        for c in model.constraints() {
            // microlp rejects a variable repeated within one expression
            let terms: Vec<(microlp::Variable, f64)> = self
                .merged_terms(model, &c.expr)
                .into_iter()
                .map(|(i, coef)| (vars[i], coef))
                .collect();
            let op = match c.op {
                ConstraintOp::Le => ComparisonOp::Le,
                ConstraintOp::Ge => ComparisonOp::Ge,
                ConstraintOp::Eq => ComparisonOp::Eq,
            };
            problem.add_constraint(terms, op, c.rhs);
        }

        let solution = problem.solve().map_err(|e| match e {
            microlp::Error::Infeasible => SolveError::Infeasible,
            microlp::Error::Unbounded => SolveError::Unbounded,
            other => SolveError::Backend(other.to_string()),
        })?;

        let values: BTreeMap<_, _> = model
            .variables()
            .iter()
            .zip(&vars)
            .map(|(v, &var)| (v.key.clone(), self.clean(solution[var])))
            .collect();
        let objective_value = model.objective().expr.evaluate(&values);
        debug!("LP '{}' optimal, objective {:.6}", model.name, objective_value);

        Ok(SolveResult::optimal(objective_value, values))
    }

    fn dense_coefficients(&self, model: &OptimizationModel, expr: &LinearExpr) -> Vec<f64> {
        let mut coefficients = vec![0.0; model.num_variables()];
        for (i, coef) in self.merged_terms(model, expr) {
            coefficients[i] = coef;
        }
        coefficients
    }

    fn merged_terms(&self, model: &OptimizationModel, expr: &LinearExpr) -> BTreeMap<usize, f64> {
        let mut merged = BTreeMap::new();
        for (key, coef) in expr.terms() {
            if let Some(i) = model.position(key) {
                *merged.entry(i).or_insert(0.0) += coef;
            }
        }
        merged
    }

    fn clean(&self, value: f64) -> f64 {
        if value.abs() < self.tolerance { 0.0 } else { value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::VarKey;

    fn x() -> VarKey {
        VarKey::from("x")
    }

    fn y() -> VarKey {
        VarKey::from("y")
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=11
        let mut model = OptimizationModel::new("max", Sense::Maximize);
        model.add_variable(x(), None).unwrap();
        model.add_variable(y(), None).unwrap();
        model.set_objective(LinearExpr::new().with_term(x(), 3.0).with_term(y(), 2.0), Sense::Maximize);
        model.add_constraint("sum", LinearExpr::sum([x(), y()]), ConstraintOp::Le, 4.0);
        model.add_constraint("x_max", LinearExpr::sum([x()]), ConstraintOp::Le, 3.0);
        model.add_constraint("y_max", LinearExpr::sum([y()]), ConstraintOp::Le, 3.0);

        let result = LpSolver::new().solve(&model).unwrap();

        assert!(result.is_optimal());
        assert!((result.value(&x()) - 3.0).abs() < 1e-6, "x = {} (expected 3)", result.value(&x()));
        assert!((result.value(&y()) - 1.0).abs() < 1e-6, "y = {} (expected 1)", result.value(&y()));
        assert!((result.objective_value - 11.0).abs() < 1e-6, "obj = {} (expected 11)", result.objective_value);
    }

    #[test]
    fn test_minimization_with_ge_and_upper_bounds() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   0 <= x <= 3, 0 <= y <= 3 (variable bounds)
        // Optimal: x=3, y=1, obj=9
        let mut model = OptimizationModel::new("min", Sense::Minimize);
        model.add_variable(x(), Some(3.0)).unwrap();
        model.add_variable(y(), Some(3.0)).unwrap();
        model.set_objective(LinearExpr::new().with_term(x(), 2.0).with_term(y(), 3.0), Sense::Minimize);
        model.add_constraint("sum", LinearExpr::sum([x(), y()]), ConstraintOp::Ge, 4.0);

        let result = LpSolver::new().solve(&model).unwrap();

        assert!((result.value(&x()) - 3.0).abs() < 1e-6);
        assert!((result.value(&y()) - 1.0).abs() < 1e-6);
        assert!((result.objective_value - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_repeated_terms_are_merged() {
        // x + x <= 4 is 2x <= 4
        let mut model = OptimizationModel::new("merge", Sense::Maximize);
        model.add_variable(x(), None).unwrap();
        model.set_objective(LinearExpr::sum([x()]), Sense::Maximize);
        model.add_constraint("double", LinearExpr::sum([x(), x()]), ConstraintOp::Le, 4.0);

        let result = LpSolver::new().solve(&model).unwrap();
        assert!((result.value(&x()) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible() {
        // x >= 5
        // x <= 3
        let mut model = OptimizationModel::new("infeasible", Sense::Minimize);
        model.add_variable(x(), None).unwrap();
        model.set_objective(LinearExpr::sum([x()]), Sense::Minimize);
        model.add_constraint("lower", LinearExpr::sum([x()]), ConstraintOp::Ge, 5.0);
        model.add_constraint("upper", LinearExpr::sum([x()]), ConstraintOp::Le, 3.0);

        assert_eq!(LpSolver::new().solve(&model), Err(SolveError::Infeasible));
    }

    #[test]
    fn test_unbounded() {
        let mut model = OptimizationModel::new("unbounded", Sense::Maximize);
        model.add_variable(x(), None).unwrap();
        model.set_objective(LinearExpr::sum([x()]), Sense::Maximize);
        model.add_constraint("lower", LinearExpr::sum([x()]), ConstraintOp::Ge, 1.0);

        assert_eq!(LpSolver::new().solve(&model), Err(SolveError::Unbounded));
    }

    #[test]
    fn test_invalid_model_not_submitted() {
        let mut model = OptimizationModel::new("invalid", Sense::Maximize);
        model.add_variable(x(), None).unwrap();
        model.set_objective(LinearExpr::sum([y()]), Sense::Maximize);

        assert!(matches!(LpSolver::new().solve(&model), Err(SolveError::InvalidModel(_))));
    }
}
