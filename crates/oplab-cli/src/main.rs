mod config;
mod error;
mod pipeline;
mod report;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use oplab_scenarios::demo::DEFAULT_DELTAS;
use oplab_solver::LpSolver;
use serde::Serialize;

use crate::error::CliError;
use crate::pipeline::{NetworkOutput, ProductionOutput, TransportOutput};
use crate::report::{NetworkText, ProductionText, TransportText};

const PRODUCTION_ARTIFACT: &str = "linear_programming_results.json";
const NETWORK_ARTIFACT: &str = "network_flow_results.json";
const TRANSPORT_ARTIFACT: &str = "transportation_results.json";

#[derive(Parser)]
#[command(name = "oplab")]
#[command(about = "Operations-research demos: production planning, network flow and transportation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Pretty)]
    format: Format,
    /// Directory the result files are written to
    #[arg(long, global = true, default_value = ".")]
    out_dir: PathBuf,
    /// Do not write result files
    #[arg(long, global = true)]
    no_artifact: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Production planning with profit sensitivity
    Production(DemoArgs),
    /// Maximum flow, minimum-cost flow and shortest path
    Network {
        /// JSON file replacing the demo networks
        #[arg(long)]
        scenario: Option<PathBuf>,
    },
    /// Basic and multi-product transportation with route cost sensitivity
    Transport(DemoArgs),
    /// Run every demo
    All {
        /// Percentage changes for the sensitivity runs
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, value_parser = parse_delta)]
        deltas: Option<Vec<f64>>,
    },
}

#[derive(Args)]
struct DemoArgs {
    /// JSON file replacing the demo scenario
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Percentage changes for the sensitivity runs, e.g. -20,-10,10,20
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, value_parser = parse_delta)]
    deltas: Option<Vec<f64>>,
}

/// Solved demos of one invocation, kept until every solve has succeeded
#[derive(Default)]
struct Outputs {
    production: Option<ProductionOutput>,
    network: Option<NetworkOutput>,
    transport: Option<TransportOutput>,
}

/// A percentage change; below -100% a coefficient would change sign
fn parse_delta(s: &str) -> Result<f64, String> {
    let delta: f64 = s.trim().parse().map_err(|_| format!("'{}' is not a number", s))?;
    if !delta.is_finite() {
        return Err(format!("delta {} is not finite", s));
    }
    if delta < -100.0 {
        return Err(format!("delta {}% is below -100% and would make a coefficient negative", s));
    }
    Ok(delta)
}

fn deltas(given: Option<Vec<f64>>) -> Vec<f64> {
    given.unwrap_or_else(|| DEFAULT_DELTAS.to_vec())
}

fn execute(command: Commands, solver: &LpSolver) -> Result<Outputs, CliError> {
    let mut outputs = Outputs::default();
    match command {
        Commands::Production(args) => {
            let scenario = config::production(args.scenario.as_deref())?;
            outputs.production = Some(pipeline::run_production(&scenario, &deltas(args.deltas), solver)?);
        }
        Commands::Network { scenario } => {
            let network = config::network(scenario.as_deref())?;
            outputs.network = Some(pipeline::run_network(&network, solver)?);
        }
        Commands::Transport(args) => {
            let transport = config::transport(args.scenario.as_deref())?;
            outputs.transport = Some(pipeline::run_transport(&transport, &deltas(args.deltas), solver)?);
        }
        Commands::All { deltas: given } => {
            let deltas = deltas(given);
            outputs.production = Some(pipeline::run_production(&config::production(None)?, &deltas, solver)?);
            outputs.network = Some(pipeline::run_network(&config::network(None)?, solver)?);
            outputs.transport = Some(pipeline::run_transport(&config::transport(None)?, &deltas, solver)?);
        }
    }
    Ok(outputs)
}

fn print_outputs(outputs: &Outputs, format: Format) -> Result<(), CliError> {
    match format {
        Format::Pretty => {
            let mut first = true;
            let mut gap = || {
                if !std::mem::take(&mut first) {
                    println!();
                }
            };
            if let Some(p) = &outputs.production {
                gap();
                print!("{}", ProductionText(p));
            }
            if let Some(n) = &outputs.network {
                gap();
                print!("{}", NetworkText(n));
            }
            if let Some(t) = &outputs.transport {
                gap();
                print!("{}", TransportText(t));
            }
        }
        Format::Json => {
            #[derive(Serialize)]
            struct Combined<'a> {
                #[serde(skip_serializing_if = "Option::is_none")]
                production: Option<&'a ProductionOutput>,
                #[serde(skip_serializing_if = "Option::is_none")]
                network: Option<&'a NetworkOutput>,
                #[serde(skip_serializing_if = "Option::is_none")]
                transport: Option<&'a TransportOutput>,
            }
            let combined = Combined {
                production: outputs.production.as_ref(),
                network: outputs.network.as_ref(),
                transport: outputs.transport.as_ref(),
            };
            println!("{}", serde_json::to_string_pretty(&combined)?);
        }
    }
    Ok(())
}

fn write_artifact<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf, CliError> {
    let path = dir.join(name);
    let write_err = |source: std::io::Error| CliError::Write {
        path: path.clone(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;
    let file = File::create(&path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    let written = serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| {
            if e.is_io() {
                write_err(e.into())
            } else {
                CliError::Encode(e)
            }
        })
        .and_then(|()| writer.flush().map_err(write_err));
    if let Err(e) = written {
        let _ = std::fs::remove_file(&path);
        return Err(e);
    }
    info!("wrote {}", path.display());
    Ok(path)
}

fn write_artifacts(outputs: &Outputs, dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    let mut written = Vec::new();
    if let Some(p) = &outputs.production {
        written.push(write_artifact(dir, PRODUCTION_ARTIFACT, p)?);
    }
    if let Some(n) = &outputs.network {
        written.push(write_artifact(dir, NETWORK_ARTIFACT, n)?);
    }
    if let Some(t) = &outputs.transport {
        written.push(write_artifact(dir, TRANSPORT_ARTIFACT, t)?);
    }
    Ok(written)
}

fn run(cli: Cli) -> Result<(), CliError> {
    let solver = LpSolver::new();
    let outputs = execute(cli.command, &solver)?;
    print_outputs(&outputs, cli.format)?;
    if !cli.no_artifact {
        let written = write_artifacts(&outputs, &cli.out_dir)?;
        if cli.format == Format::Pretty {
            for path in written {
                println!("Results saved to {}", path.display());
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
