use log::info;
use oplab_solver::{max_flow, network_stats, MaxFlow, NetworkStats, WeightedGraph};

use crate::error::ScenarioError;
use crate::metrics::{check_amount, check_unique, utilization_pct, BOTTLENECK_PCT};

/// Directed pipe with a throughput limit
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Arc {
    pub from: String,
    pub to: String,
    pub capacity: f64,
}

impl Arc {
    pub fn new(from: impl Into<String>, to: impl Into<String>, capacity: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            capacity,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FlowNetworkScenario {
    pub nodes: Vec<String>,
    pub arcs: Vec<Arc>,
    pub source: String,
    pub sink: String,
}

impl FlowNetworkScenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        check_unique("node", self.nodes.iter().map(String::as_str))?;
        for arc in &self.arcs {
            check_amount(&format!("capacity of {} -> {}", arc.from, arc.to), arc.capacity)?;
        }
        Ok(())
    }
}

/// Directed graph weighted by arc capacity.
///
/// Source and sink are not checked here; the flow adapter reports them
/// as unknown nodes.
pub fn build(scenario: &FlowNetworkScenario) -> Result<WeightedGraph, ScenarioError> {
    scenario.validate()?;
    let mut graph = WeightedGraph::directed();
    for node in &scenario.nodes {
        graph.add_node(node.as_str());
    }
    for arc in &scenario.arcs {
        if !graph.contains(&arc.from) || !graph.contains(&arc.to) {
            return Err(ScenarioError::InvalidScenario(format!(
                "arc {} -> {} references an unknown node",
                arc.from, arc.to
            )));
        }
        graph.add_edge(&arc.from, &arc.to, arc.capacity)?;
    }
    Ok(graph)
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeFlow {
    pub from: String,
    pub to: String,
    pub flow: f64,
    pub capacity: f64,
    pub utilization_pct: f64,
    pub bottleneck: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MaxFlowReport {
    pub flow: MaxFlow,
    /// Arcs carrying flow, in declaration order
    pub edges: Vec<EdgeFlow>,
    /// Saturated arcs as "from -> to"
    pub bottlenecks: Vec<String>,
    pub min_cut_capacity: f64,
    pub stats: NetworkStats,
}

pub fn extract(flow: MaxFlow, stats: NetworkStats) -> MaxFlowReport {
    let edges: Vec<EdgeFlow> = flow
        .flows
        .iter()
        .filter(|f| f.flow > 0.0)
        .map(|f| {
            let utilization_pct = utilization_pct(f.flow, f.capacity);
            EdgeFlow {
                from: f.from.clone(),
                to: f.to.clone(),
                flow: f.flow,
                capacity: f.capacity,
                utilization_pct,
                bottleneck: utilization_pct >= BOTTLENECK_PCT,
            }
        })
        .collect();
    let bottlenecks = edges
        .iter()
        .filter(|e| e.bottleneck)
        .map(|e| format!("{} -> {}", e.from, e.to))
        .collect();
    let min_cut_capacity = flow.cut_capacity;

    MaxFlowReport {
        flow,
        edges,
        bottlenecks,
        min_cut_capacity,
        stats,
    }
}

pub fn run(scenario: &FlowNetworkScenario) -> Result<MaxFlowReport, ScenarioError> {
    let graph = build(scenario)?;
    let flow = max_flow(&graph, &scenario.source, &scenario.sink)?;
    let stats = network_stats(&graph)?;
    info!(
        "max flow {} -> {}: {} (min cut {})",
        scenario.source, scenario.sink, flow.value, flow.cut_capacity
    );
    Ok(extract(flow, stats))
}
