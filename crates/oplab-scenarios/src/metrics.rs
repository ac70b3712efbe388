use std::collections::HashSet;

use crate::error::ScenarioError;

/// Utilization at or above this percentage marks a bottleneck
pub const BOTTLENECK_PCT: f64 = 99.9;

/// `used / available` as a percentage; zero when nothing is available
pub fn utilization_pct(used: f64, available: f64) -> f64 {
    if available > 0.0 {
        used / available * 100.0
    } else {
        0.0
    }
}

/// `part / total` as a percentage; zero when the total is zero
pub fn share_pct(part: f64, total: f64) -> f64 {
    if total != 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

/// Consumption of a capacity-limited resource (labor, material, a pipe, a lane)
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceUsage {
    pub name: String,
    pub used: f64,
    pub available: f64,
    pub utilization_pct: f64,
    pub bottleneck: bool,
}

impl ResourceUsage {
    pub fn new(name: impl Into<String>, used: f64, available: f64) -> Self {
        let utilization_pct = utilization_pct(used, available);
        Self {
            name: name.into(),
            used,
            available,
            utilization_pct,
            bottleneck: available > 0.0 && utilization_pct >= BOTTLENECK_PCT,
        }
    }
}

/// Cost of moving goods along one route
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCost {
    pub from: String,
    pub to: String,
    /// Set for multi-commodity problems
    pub product: Option<String>,
    pub quantity: f64,
    pub unit_cost: f64,
    pub total_cost: f64,
    /// Share of the total transport cost
    pub share_pct: f64,
}

impl RouteCost {
    pub fn new(from: impl Into<String>, to: impl Into<String>, quantity: f64, unit_cost: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            product: None,
            quantity,
            unit_cost,
            total_cost: quantity * unit_cost,
            share_pct: 0.0,
        }
    }

    pub fn for_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }
}

/// Fill in `share_pct` of every route relative to their combined cost
pub fn assign_shares(routes: &mut [RouteCost]) -> f64 {
    let total: f64 = routes.iter().map(|r| r.total_cost).sum();
    for r in routes.iter_mut() {
        r.share_pct = share_pct(r.total_cost, total);
    }
    total
}

pub(crate) fn check_amount(what: &str, value: f64) -> Result<(), ScenarioError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ScenarioError::InvalidScenario(format!(
            "{} must be a finite non-negative number, got {}",
            what, value
        )))
    }
}

pub(crate) fn check_len(what: &str, actual: usize, expected: usize) -> Result<(), ScenarioError> {
    if actual == expected {
        Ok(())
    } else {
        Err(ScenarioError::InvalidScenario(format!(
            "{} has {} entries, expected {}",
            what, actual, expected
        )))
    }
}

pub(crate) fn check_unique<'a>(what: &str, names: impl IntoIterator<Item = &'a str>) -> Result<(), ScenarioError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ScenarioError::InvalidScenario(format!(
                "duplicate {} name: {}",
                what, name
            )));
        }
    }
    Ok(())
}
