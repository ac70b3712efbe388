use log::info;
use oplab_solver::{network_stats, shortest_path, NetworkStats, ShortestPath, WeightedGraph};

use crate::error::ScenarioError;
use crate::metrics::{check_amount, check_unique};

/// Two-way road between cities
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Road {
    pub from: String,
    pub to: String,
    pub distance: f64,
}

impl Road {
    pub fn new(from: impl Into<String>, to: impl Into<String>, distance: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            distance,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RoadNetworkScenario {
    pub cities: Vec<String>,
    pub roads: Vec<Road>,
    pub origin: String,
    pub destination: String,
}

impl RoadNetworkScenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        check_unique("city", self.cities.iter().map(String::as_str))?;
        for road in &self.roads {
            check_amount(&format!("distance {} - {}", road.from, road.to), road.distance)?;
        }
        Ok(())
    }
}

/// Undirected graph weighted by road distance
pub fn build(scenario: &RoadNetworkScenario) -> Result<WeightedGraph, ScenarioError> {
    scenario.validate()?;
    let mut graph = WeightedGraph::undirected();
    for city in &scenario.cities {
        graph.add_node(city.as_str());
    }
    for road in &scenario.roads {
        if !graph.contains(&road.from) || !graph.contains(&road.to) {
            return Err(ScenarioError::InvalidScenario(format!(
                "road {} - {} references an unknown city",
                road.from, road.to
            )));
        }
        graph.add_edge(&road.from, &road.to, road.distance)?;
    }
    Ok(graph)
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPathReport {
    pub route: ShortestPath,
    pub stats: NetworkStats,
}

pub fn run(scenario: &RoadNetworkScenario) -> Result<ShortestPathReport, ScenarioError> {
    let graph = build(scenario)?;
    let route = shortest_path(&graph, &scenario.origin, &scenario.destination)?;
    let stats = network_stats(&graph)?;
    info!(
        "shortest path {} -> {}: {} over {} legs",
        scenario.origin,
        scenario.destination,
        route.distance,
        route.legs.len()
    );
    Ok(ShortestPathReport { route, stats })
}
