//! CLI entry point for the puzzle optimizer.
//!
//! Usage:
//!   puzzle-optimizer valves <scan.json> [options]
//!   puzzle-optimizer factory <blueprints.json> [options]
//!
//! Both subcommands read JSON (from a file or `--stdin`) and print the result
//! as JSON on stdout. Set `RUST_LOG=puzzle_optimizer=debug` for search
//! diagnostics on stderr.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, info};

use puzzle_optimizer::factory::{self, Blueprint, BlueprintScore};
use puzzle_optimizer::{
    logging, BlueprintSpec, PruningMode, SearchConfig, SearchStats, ValveNetwork, ValveScan,
};

#[derive(Parser)]
#[command(name = "puzzle-optimizer")]
#[command(about = "Branch-and-bound optimizer for valve and robot-factory puzzles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Maximize the pressure released from a valve network
    Valves {
        #[command(flatten)]
        input: InputArgs,

        /// Minutes available
        #[arg(long, default_value = "30")]
        time: u32,

        /// Number of agents opening valves
        #[arg(long, default_value = "1")]
        agents: usize,

        /// Valve where every agent starts
        #[arg(long, default_value = "AA")]
        start: String,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Maximize the geodes collected by each blueprint
    Factory {
        #[command(flatten)]
        input: InputArgs,

        /// Minutes available
        #[arg(long, default_value = "24")]
        time: u32,

        /// How blueprint results are combined
        #[arg(long, value_enum, default_value = "quality")]
        score: ScoreKind,

        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Path to the JSON input (use --stdin to read from stdin)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Read the input from stdin instead of a file
    #[arg(long)]
    stdin: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// Maximum number of memoized states
    #[arg(long)]
    cache_capacity: Option<usize>,

    /// Fraction of the cache dropped when it is full
    #[arg(long)]
    eviction_fraction: Option<f64>,

    /// Explore every child, ignoring bounds
    #[arg(long)]
    no_prune: bool,
}

impl SearchArgs {
    fn apply(&self, mut config: SearchConfig) -> Result<SearchConfig> {
        if let Some(capacity) = self.cache_capacity {
            config.cache_capacity = capacity;
        }
        if let Some(fraction) = self.eviction_fraction {
            config.eviction_fraction = fraction;
        }
        if self.no_prune {
            config.pruning = PruningMode::Disabled;
        }
        config.validate().context("invalid search configuration")?;
        Ok(config)
    }
}

#[derive(Clone, Copy, Debug, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
enum ScoreKind {
    /// Sum of blueprint id times geodes, over all blueprints
    Quality,
    /// Product of the geodes of the first three blueprints
    Product,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValvesOutput {
    best_value: u32,
    agents: usize,
    time: u32,
    stats: SearchStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FactoryOutput {
    score: u64,
    kind: ScoreKind,
    blueprints: Vec<BlueprintScore>,
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let json = match cli.command {
        Commands::Valves {
            input,
            time,
            agents,
            start,
            search,
        } => {
            let scan: ValveScan =
                serde_json::from_str(&read_input(&input)?).context("parsing valve scan JSON")?;
            let network = ValveNetwork::new(&scan, &start).context("invalid valve scan")?;
            let config = search.apply(SearchConfig::default())?;
            info!(valves = network.choice_count(), agents, time, "optimizing valve network");

            let result = network.max_pressure(time, agents, &config)?;
            debug!("{}", result.stats);
            serde_json::to_string_pretty(&ValvesOutput {
                best_value: result.best_value,
                agents,
                time,
                stats: result.stats,
            })?
        }
        Commands::Factory {
            input,
            time,
            score,
            search,
        } => {
            let specs: Vec<BlueprintSpec> =
                serde_json::from_str(&read_input(&input)?).context("parsing blueprint JSON")?;
            let mut blueprints = specs
                .iter()
                .map(Blueprint::try_from)
                .collect::<Result<Vec<_>, _>>()
                .context("invalid blueprint")?;
            if let ScoreKind::Product = score {
                blueprints.truncate(3);
            }
            let config = search.apply(factory::default_config())?;
            info!(blueprints = blueprints.len(), time, "optimizing blueprints");

            let scores = factory::evaluate(&blueprints, time, &config)?;
            let total = match score {
                ScoreKind::Quality => factory::quality_level(&scores),
                ScoreKind::Product => factory::geode_product(&scores),
            };
            serde_json::to_string_pretty(&FactoryOutput {
                score: total,
                kind: score,
                blueprints: scores,
            })?
        }
    };

    println!("{json}");
    Ok(())
}

fn read_input(input: &InputArgs) -> Result<String> {
    if input.stdin {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read from stdin")?;
        Ok(buffer)
    } else if let Some(path) = &input.file {
        fs::read_to_string(path).with_context(|| format!("failed to read file {}", path.display()))
    } else {
        bail!("must provide either a file path or --stdin")
    }
}
