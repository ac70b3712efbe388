use std::collections::{HashMap, VecDeque};

use log::debug;
use petgraph::algo::{astar, connected_components, dijkstra, ford_fulkerson};
use petgraph::graph::{Graph, NodeIndex};
use petgraph::{Directed, EdgeType, Undirected};

use crate::error::SolveError;

/// Flows below this are treated as zero when reading the residual network
const FLOW_EPS: f64 = 1e-9;

/// Named, weighted graph handed to the graph-algorithm adapters.
/// Weights are capacities for max-flow and distances for shortest path.
#[derive(Debug, Clone)]
pub struct WeightedGraph {
    directed: bool,
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub weight: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ArcFlow {
    pub from: String,
    pub to: String,
    pub capacity: f64,
    pub flow: f64,
}

/// Maximum flow with the minimum cut that certifies it
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MaxFlow {
    pub source: String,
    pub sink: String,
    pub value: f64,
    /// One entry per graph edge, in insertion order
    pub flows: Vec<ArcFlow>,
    /// Nodes reachable from the source in the residual network
    pub source_side: Vec<String>,
    /// Arcs leaving the source side; all saturated
    pub cut: Vec<ArcFlow>,
    pub cut_capacity: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PathLeg {
    pub from: String,
    pub to: String,
    pub distance: f64,
    pub cumulative: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath {
    pub path: Vec<String>,
    pub distance: f64,
    pub legs: Vec<PathLeg>,
}

/// Structural summary of a graph
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkStats {
    pub nodes: usize,
    pub edges: usize,
    pub density: f64,
    /// Weakly connected for directed graphs
    pub connected: bool,
    /// Longest weighted shortest path; `None` unless every node reaches every other
    pub diameter: Option<f64>,
    /// Mean weighted shortest-path length over ordered pairs; same condition as `diameter`
    pub average_path_length: Option<f64>,
}

impl WeightedGraph {
    pub fn directed() -> Self {
        Self::with_direction(true)
    }

    pub fn undirected() -> Self {
        Self::with_direction(false)
    }

    fn with_direction(directed: bool) -> Self {
        Self {
            directed,
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
        }
    }

    /// Add a node; adding an existing name is a no-op
    pub fn add_node(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.index.contains_key(&name) {
            self.index.insert(name.clone(), self.nodes.len());
            self.nodes.push(name);
        }
    }

    /// Add an edge between two declared nodes
    pub fn add_edge(&mut self, from: &str, to: &str, weight: f64) -> Result<(), SolveError> {
        self.node(from)?;
        self.node(to)?;
        if !weight.is_finite() {
            return Err(SolveError::InvalidModel(format!(
                "edge {} -> {} has non-finite weight",
                from, to
            )));
        }
        self.edges.push(Edge {
            from: from.to_string(),
            to: to.to_string(),
            weight,
        });
        Ok(())
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn node(&self, name: &str) -> Result<NodeIndex, SolveError> {
        self.index
            .get(name)
            .map(|&i| NodeIndex::new(i))
            .ok_or_else(|| SolveError::NodeNotFound(name.to_string()))
    }

    fn check_non_negative(&self) -> Result<(), SolveError> {
        match self.edges.iter().find(|e| e.weight < 0.0) {
            Some(e) => Err(SolveError::NegativeWeight {
                from: e.from.clone(),
                to: e.to.clone(),
                weight: e.weight,
            }),
            None => Ok(()),
        }
    }

    /// Node and edge indices match the insertion order of this graph
    fn to_petgraph<Ty: EdgeType>(&self) -> Graph<String, f64, Ty> {
        let mut g = Graph::with_capacity(self.nodes.len(), self.edges.len());
        for name in &self.nodes {
            g.add_node(name.clone());
        }
        for e in &self.edges {
            g.add_edge(
                NodeIndex::new(self.index[&e.from]),
                NodeIndex::new(self.index[&e.to]),
                e.weight,
            );
        }
        g
    }

    /// Cheapest edge weight usable to step from `from` to `to`
    fn step_weight(&self, from: &str, to: &str) -> Option<f64> {
        self.edges
            .iter()
            .filter(|e| (e.from == from && e.to == to) || (!self.directed && e.from == to && e.to == from))
            .map(|e| e.weight)
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// Maximum flow from `source` to `sink` (augmenting-path method)
pub fn max_flow(graph: &WeightedGraph, source: &str, sink: &str) -> Result<MaxFlow, SolveError> {
    if !graph.is_directed() {
        return Err(SolveError::InvalidModel(
            "maximum flow needs a directed graph".to_string(),
        ));
    }
    let s = graph.node(source)?;
    let t = graph.node(sink)?;
    if s == t {
        return Err(SolveError::InvalidModel(format!(
            "source and sink are both {}",
            source
        )));
    }
    graph.check_non_negative()?;

    let g = graph.to_petgraph::<Directed>();
    let (value, edge_flows) = ford_fulkerson(&g, s, t);
    debug!("max flow {} -> {} = {}", source, sink, value);

    let flows: Vec<ArcFlow> = graph
        .edges
        .iter()
        .zip(edge_flows)
        .map(|(e, flow)| ArcFlow {
            from: e.from.clone(),
            to: e.to.clone(),
            capacity: e.weight,
            flow,
        })
        .collect();

    let reachable = residual_reachable(graph, &flows, s.index());
    let source_side = graph
        .nodes
        .iter()
        .enumerate()
        .filter(|(i, _)| reachable[*i])
        .map(|(_, n)| n.clone())
        .collect();
    let cut: Vec<ArcFlow> = flows
        .iter()
        .filter(|f| reachable[graph.index[&f.from]] && !reachable[graph.index[&f.to]])
        .cloned()
        .collect();
    let cut_capacity = cut.iter().map(|f| f.capacity).sum();

    Ok(MaxFlow {
        source: source.to_string(),
        sink: sink.to_string(),
        value,
        flows,
        source_side,
        cut,
        cut_capacity,
    })
}

/// Breadth-first search over the residual network of a flow
fn residual_reachable(graph: &WeightedGraph, flows: &[ArcFlow], start: usize) -> Vec<bool> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); graph.node_count()];
    for f in flows {
        let (u, v) = (graph.index[&f.from], graph.index[&f.to]);
        if f.capacity - f.flow > FLOW_EPS {
            adjacency[u].push(v);
        }
        if f.flow > FLOW_EPS {
            adjacency[v].push(u);
        }
    }

    let mut seen = vec![false; graph.node_count()];
    let mut queue = VecDeque::new();
    seen[start] = true;
    queue.push_back(start);
    while let Some(u) = queue.pop_front() {
        for &v in &adjacency[u] {
            if !seen[v] {
                seen[v] = true;
                queue.push_back(v);
            }
        }
    }
    seen
}

/// Shortest path between two nodes; weights must be non-negative
pub fn shortest_path(graph: &WeightedGraph, from: &str, to: &str) -> Result<ShortestPath, SolveError> {
    let s = graph.node(from)?;
    let t = graph.node(to)?;
    graph.check_non_negative()?;

    let found = if graph.is_directed() {
        route(&graph.to_petgraph::<Directed>(), s, t)
    } else {
        route(&graph.to_petgraph::<Undirected>(), s, t)
    };
    let (distance, nodes) = found.ok_or_else(|| SolveError::NoPath {
        from: from.to_string(),
        to: to.to_string(),
    })?;

    let path: Vec<String> = nodes.iter().map(|n| graph.nodes[n.index()].clone()).collect();
    let mut legs = Vec::with_capacity(path.len().saturating_sub(1));
    let mut cumulative = 0.0;
    for pair in path.windows(2) {
        let leg = graph
            .step_weight(&pair[0], &pair[1])
            .ok_or_else(|| SolveError::Backend(format!("path uses missing edge {} -> {}", pair[0], pair[1])))?;
        cumulative += leg;
        legs.push(PathLeg {
            from: pair[0].clone(),
            to: pair[1].clone(),
            distance: leg,
            cumulative,
        });
    }
    debug!("shortest path {} -> {}: {} ({} legs)", from, to, distance, legs.len());

    Ok(ShortestPath { path, distance, legs })
}

fn route<Ty: EdgeType>(g: &Graph<String, f64, Ty>, s: NodeIndex, t: NodeIndex) -> Option<(f64, Vec<NodeIndex>)> {
    astar(g, s, |n| n == t, |e| *e.weight(), |_| 0.0)
}

/// Size, density, connectivity and weighted distance summary
pub fn network_stats(graph: &WeightedGraph) -> Result<NetworkStats, SolveError> {
    if graph.is_directed() {
        stats(graph, &graph.to_petgraph::<Directed>())
    } else {
        stats(graph, &graph.to_petgraph::<Undirected>())
    }
}

fn stats<Ty: EdgeType>(graph: &WeightedGraph, g: &Graph<String, f64, Ty>) -> Result<NetworkStats, SolveError> {
    graph.check_non_negative()?;
    let n = graph.node_count();
    let m = graph.edge_count();
    let density = if n < 2 {
        0.0
    } else if graph.is_directed() {
        m as f64 / (n * (n - 1)) as f64
    } else {
        2.0 * m as f64 / (n * (n - 1)) as f64
    };
    let connected = n > 0 && connected_components(g) == 1;

    let mut all_reach = n > 1;
    let mut longest: f64 = 0.0;
    let mut total = 0.0;
    for start in g.node_indices() {
        let distances = dijkstra(g, start, None, |e| *e.weight());
        if distances.len() < n {
            all_reach = false;
            break;
        }
        for (&node, &d) in &distances {
            if node != start {
                longest = longest.max(d);
                total += d;
            }
        }
    }
    let pairs = (n * n.saturating_sub(1)) as f64;

    Ok(NetworkStats {
        nodes: n,
        edges: m,
        density,
        connected,
        diameter: all_reach.then_some(longest),
        average_path_length: all_reach.then(|| total / pairs),
    })
}
