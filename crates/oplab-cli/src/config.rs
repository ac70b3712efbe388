//! Scenario files that replace the built-in demo data.
//!
//! A file only needs the parts it changes; the network and transport
//! files fall back to the demo instance for every section they omit.

use std::path::Path;

use log::info;
use oplab_scenarios::demo;
use oplab_scenarios::max_flow::FlowNetworkScenario;
use oplab_scenarios::min_cost_flow::MinCostFlowScenario;
use oplab_scenarios::multi_product::MultiProductScenario;
use oplab_scenarios::production::ProductionScenario;
use oplab_scenarios::shortest_path::RoadNetworkScenario;
use oplab_scenarios::transport::TransportScenario;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::CliError;

/// Number of leading routes of the basic plan whose cost is varied
pub const DEFAULT_KEY_ROUTES: usize = 3;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    pub max_flow: FlowNetworkScenario,
    pub min_cost_flow: MinCostFlowScenario,
    pub shortest_path: RoadNetworkScenario,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_flow: demo::max_flow_network(),
            min_cost_flow: demo::min_cost_flow(),
            shortest_path: demo::road_network(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    pub basic: TransportScenario,
    pub multi_product: MultiProductScenario,
    pub key_routes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            basic: demo::transport(),
            multi_product: demo::multi_product(),
            key_routes: DEFAULT_KEY_ROUTES,
        }
    }
}

/// Read a JSON document from `path`
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let source = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_str(&source).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!("loaded scenario from {}", path.display());
    Ok(value)
}

/// The file's contents, or `fallback` when no file was given
pub fn load_or<T: DeserializeOwned>(path: Option<&Path>, fallback: impl FnOnce() -> T) -> Result<T, CliError> {
    match path {
        Some(p) => load(p),
        None => Ok(fallback()),
    }
}

pub fn production(path: Option<&Path>) -> Result<ProductionScenario, CliError> {
    load_or(path, demo::production)
}

pub fn network(path: Option<&Path>) -> Result<NetworkConfig, CliError> {
    load_or(path, NetworkConfig::default)
}

pub fn transport(path: Option<&Path>) -> Result<TransportConfig, CliError> {
    load_or(path, TransportConfig::default)
}
