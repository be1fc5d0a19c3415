//! edmsim CLI: simulate edge-server DDoS mitigation.

use clap::{Parser, Subcommand};
use edmsim_core::config::SimConfig;
use edmsim_core::metrics;
use edmsim_core::workload::{self, Workload};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "edmsim",
    about = "Simulate DDoS mitigation across capacity-bounded edge servers",
    version
)]
struct Cli {
    /// Log allocation decisions (repeat for more detail).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single simulation.
    Run {
        /// Path to TOML configuration file (defaults apply if omitted).
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Replay a workload file instead of generating one.
        #[arg(short, long)]
        workload: Option<PathBuf>,
        /// Override the configured seed.
        #[arg(short, long)]
        seed: Option<u64>,
        /// Allocation policy name.
        #[arg(short, long, default_value = "greedy_heap")]
        policy: String,
        /// Output the report to a JSON file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run independent simulations over a range of seeds.
    Sweep {
        /// Path to TOML configuration file (defaults apply if omitted).
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Seeds as `A..B`, `A..=B` or a comma-separated list.
        #[arg(long, value_parser = parse_seeds)]
        seeds: Seeds,
        /// Worker threads (defaults to available parallelism).
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Output all reports to a JSON file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate a workload file.
    GenWorkload {
        /// Path to TOML configuration file (defaults apply if omitted).
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the configured seed.
        #[arg(short, long)]
        seed: Option<u64>,
        /// Output file path.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List available allocation policies.
    ListPolicies,
}

#[derive(Debug, Clone)]
struct Seeds(Vec<u64>);

/// Longest seed list a single sweep accepts.
const MAX_SWEEP_SEEDS: u64 = 1_000_000;

fn parse_seeds(s: &str) -> Result<Seeds, String> {
    let parse = |v: &str| {
        v.trim()
            .parse::<u64>()
            .map_err(|e| format!("invalid seed {:?}: {}", v, e))
    };
    let check_len = |len: u128| {
        if len > MAX_SWEEP_SEEDS as u128 {
            Err(format!(
                "seed range {:?} has {} seeds, more than the limit of {}",
                s, len, MAX_SWEEP_SEEDS
            ))
        } else {
            Ok(())
        }
    };

    let seeds: Vec<u64> = if let Some((lo, hi)) = s.split_once("..=") {
        let (lo, hi) = (parse(lo)?, parse(hi)?);
        check_len((hi as u128 + 1).saturating_sub(lo as u128))?;
        (lo..=hi).collect()
    } else if let Some((lo, hi)) = s.split_once("..") {
        let (lo, hi) = (parse(lo)?, parse(hi)?);
        check_len((hi as u128).saturating_sub(lo as u128))?;
        (lo..hi).collect()
    } else {
        let list = s.split(',').map(parse).collect::<Result<Vec<_>, _>>()?;
        check_len(list.len() as u128)?;
        list
    };

    if seeds.is_empty() {
        return Err(format!("seed range {:?} is empty", s));
    }
    Ok(Seeds(seeds))
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            workload: workload_path,
            seed,
            policy,
            output,
        } => {
            let mut sim_config = load_config(config.as_deref());
            if let Some(seed) = seed {
                sim_config.simulation.seed = seed;
            }

            let (workload, seed) = match workload_path {
                Some(path) => {
                    let workload = workload::load_workload(&path).unwrap_or_else(|e| {
                        eprintln!("Error loading workload: {}", e);
                        std::process::exit(1);
                    });
                    (workload, None)
                }
                None => (
                    Workload::from_config(&sim_config),
                    Some(sim_config.simulation.seed),
                ),
            };

            let algo = edmsim_algorithms::policy_by_name(&policy).unwrap_or_else(|| {
                eprintln!(
                    "Unknown policy: {}. Available: {:?}",
                    policy,
                    edmsim_algorithms::available_policies()
                );
                std::process::exit(1);
            });

            let mut result =
                edmsim_core::run_workload(&sim_config, workload, algo).unwrap_or_else(|e| {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                });
            result.seed = seed;
            println!("{}", metrics::format_report(&result));

            if let Some(output_path) = output {
                write_json(&output_path, &result);
            }
        }
        Commands::Sweep {
            config,
            seeds,
            jobs,
            output,
        } => {
            let sim_config = load_config(config.as_deref());
            let jobs = jobs.unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            });

            let results =
                edmsim_core::sweep_seeds(&sim_config, &seeds.0, jobs).unwrap_or_else(|e| {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                });
            println!("{}", metrics::format_sweep_table(&results));

            if let Some(output_path) = output {
                write_json(&output_path, &results);
            }
        }
        Commands::GenWorkload {
            config,
            seed,
            output,
        } => {
            let sim_config = load_config(config.as_deref());
            let seed = seed.unwrap_or(sim_config.simulation.seed);
            let generated = Workload::from_config_with_seed(&sim_config, seed);

            workload::write_workload(&generated, &output).unwrap_or_else(|e| {
                eprintln!("Error writing workload: {}", e);
                std::process::exit(1);
            });
            println!(
                "Generated {} servers and {} requests ({} attacks) to {}",
                generated.servers.len(),
                generated.requests.len(),
                generated.attack_count(),
                output.display()
            );
        }
        Commands::ListPolicies => {
            println!("Available allocation policies:");
            for name in edmsim_algorithms::available_policies() {
                println!("  - {}", name);
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> SimConfig {
    match path {
        Some(p) => SimConfig::from_file(p).unwrap_or_else(|e| {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }),
        None => SimConfig::default(),
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error serializing results: {}", e);
        std::process::exit(1);
    });
    std::fs::write(path, json).unwrap_or_else(|e| {
        eprintln!("Error writing output: {}", e);
        std::process::exit(1);
    });
    println!("Results written to {}", path.display());
}
