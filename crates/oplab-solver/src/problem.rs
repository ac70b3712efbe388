use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::SolveError;

/// Composite index of a decision variable, e.g. `(origin, product, destination)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarKey(Vec<String>);

impl VarKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl From<&str> for VarKey {
    fn from(part: &str) -> Self {
        Self(vec![part.to_string()])
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for VarKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A non-negative continuous decision variable
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub key: VarKey,
    /// Optional upper bound; the lower bound is always zero
    pub upper: Option<f64>,
}

/// Linear combination of variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarKey, f64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of the given variables, each with coefficient 1
    pub fn sum<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = VarKey>,
    {
        keys.into_iter().map(|k| (k, 1.0)).collect()
    }

    pub fn with_term(mut self, key: VarKey, coefficient: f64) -> Self {
        self.add_term(key, coefficient);
        self
    }

    pub fn add_term(&mut self, key: VarKey, coefficient: f64) {
        self.terms.push((key, coefficient));
    }

    pub fn terms(&self) -> &[(VarKey, f64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value of the expression; missing variables count as zero
    pub fn evaluate(&self, values: &BTreeMap<VarKey, f64>) -> f64 {
        self.terms
            .iter()
            .map(|(k, c)| c * values.get(k).copied().unwrap_or(0.0))
            .sum()
    }
}

impl FromIterator<(VarKey, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarKey, f64)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub sense: Sense,
    pub expr: LinearExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    pub expr: LinearExpr,
    pub op: ConstraintOp,
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ConstraintOp::Le => "<=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Eq => "=",
        };
        write!(f, "{}", symbol)
    }
}

/// A linear optimization model: declared variables, one objective, linear constraints
#[derive(Debug, Clone)]
pub struct OptimizationModel {
    pub name: String,
    variables: Vec<Variable>,
    index: HashMap<VarKey, usize>,
    objective: Objective,
    constraints: Vec<Constraint>,
}

impl OptimizationModel {
    pub fn new(name: impl Into<String>, sense: Sense) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            index: HashMap::new(),
            objective: Objective {
                sense,
                expr: LinearExpr::new(),
            },
            constraints: Vec::new(),
        }
    }

    /// Declare a variable. Each key may be declared exactly once.
    pub fn add_variable(&mut self, key: VarKey, upper: Option<f64>) -> Result<(), SolveError> {
        if self.index.contains_key(&key) {
            return Err(SolveError::InvalidModel(format!(
                "variable {} declared twice",
                key
            )));
        }
        if let Some(ub) = upper {
            if !ub.is_finite() || ub < 0.0 {
                return Err(SolveError::InvalidModel(format!(
                    "variable {} has invalid upper bound {}",
                    key, ub
                )));
            }
        }
        self.index.insert(key.clone(), self.variables.len());
        self.variables.push(Variable { key, upper });
        Ok(())
    }

    pub fn set_objective(&mut self, expr: LinearExpr, sense: Sense) {
        self.objective = Objective { sense, expr };
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, expr: LinearExpr, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            expr,
            op,
            rhs,
        });
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Declaration position of a variable
    pub fn position(&self, key: &VarKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, key: &VarKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Check that every referenced variable is declared and all numbers are finite
    pub fn validate(&self) -> Result<(), SolveError> {
        self.check_expr("objective", &self.objective.expr)?;
        for c in &self.constraints {
            self.check_expr(&c.name, &c.expr)?;
            if !c.rhs.is_finite() {
                return Err(SolveError::InvalidModel(format!(
                    "constraint {} has non-finite right-hand side",
                    c.name
                )));
            }
        }
        Ok(())
    }

    fn check_expr(&self, owner: &str, expr: &LinearExpr) -> Result<(), SolveError> {
        for (key, coef) in expr.terms() {
            if !self.contains(key) {
                return Err(SolveError::InvalidModel(format!(
                    "{} references undeclared variable {}",
                    owner, key
                )));
            }
            if !coef.is_finite() {
                return Err(SolveError::InvalidModel(format!(
                    "{} has non-finite coefficient for {}",
                    owner, key
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_variable_rejected() {
        let mut model = OptimizationModel::new("dup", Sense::Minimize);
        model.add_variable(VarKey::from("x"), None).unwrap();
        let err = model.add_variable(VarKey::from("x"), Some(3.0)).unwrap_err();
        assert!(matches!(err, SolveError::InvalidModel(_)));
        assert_eq!(model.num_variables(), 1);
    }

    #[test]
    fn test_negative_upper_bound_rejected() {
        let mut model = OptimizationModel::new("ub", Sense::Minimize);
        assert!(model.add_variable(VarKey::from("x"), Some(-1.0)).is_err());
    }

    #[test]
    fn test_validate_undeclared_reference() {
        let mut model = OptimizationModel::new("undeclared", Sense::Maximize);
        model.add_variable(VarKey::from("x"), None).unwrap();
        model.set_objective(LinearExpr::new().with_term(VarKey::from("x"), 1.0), Sense::Maximize);
        assert!(model.validate().is_ok());

        model.add_constraint(
            "cap",
            LinearExpr::new().with_term(VarKey::from("y"), 1.0),
            ConstraintOp::Le,
            4.0,
        );
        let err = model.validate().unwrap_err();
        assert_eq!(
            err,
            SolveError::InvalidModel("cap references undeclared variable y".to_string())
        );
    }

    #[test]
    fn test_validate_non_finite_rhs() {
        let mut model = OptimizationModel::new("nan", Sense::Minimize);
        model.add_variable(VarKey::from("x"), None).unwrap();
        model.add_constraint("bad", LinearExpr::sum([VarKey::from("x")]), ConstraintOp::Ge, f64::NAN);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_evaluate_and_display() {
        let key = VarKey::new(["X", "P1", "M1"]);
        assert_eq!(key.to_string(), "X/P1/M1");

        let mut values = BTreeMap::new();
        values.insert(key.clone(), 2.0);
        let expr = LinearExpr::new()
            .with_term(key, 3.0)
            .with_term(VarKey::from("missing"), 10.0);
        assert!((expr.evaluate(&values) - 6.0).abs() < 1e-12);
    }
}
