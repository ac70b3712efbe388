use std::path::PathBuf;

use oplab_scenarios::ScenarioError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Error reading {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("Error parsing scenario file {}: {source}", path.display())]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("Error writing {}: {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },
    #[error("Error encoding results: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}
