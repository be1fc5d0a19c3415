//! edmsim: offline simulator for edge-server DDoS mitigation.
//!
//! A batch of benign and attack requests is allocated across a pool of
//! capacity-bounded edge servers by a cost-aware greedy policy, served for
//! one tick, then refined toward a best-response fixed point. Allocation
//! policies and the equilibrium solver live in `edmsim-algorithms`; this
//! crate provides configuration, workloads, the run session and metrics.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐     ┌────────────┐     ┌──────────────┐
//! │ Workload │────▶│  Session   │────▶│   Metrics    │
//! │Generator │     │ (Counters) │     │  Collection  │
//! └──────────┘     └─────┬──────┘     └──────────────┘
//!                        │
//!         ┌──────────────┼───────────────┐
//!         ▼              ▼               ▼
//!   ┌───────────┐  ┌───────────┐  ┌─────────────┐
//!   │ Allocation│  │  Request  │  │ Equilibrium │
//!   │  Policy   │  │ Processor │  │   Solver    │
//!   └───────────┘  └───────────┘  └─────────────┘
//! ```

pub mod config;
pub mod metrics;
pub mod processor;
pub mod session;
pub mod workload;

// Re-export key types for convenience.
pub use config::{ConfigError, SimConfig};
pub use edmsim_algorithms::{
    AllocationPolicy, BestResponseSolver, EdgeServer, EquilibriumOutcome, GreedyHeapAllocator,
    Request, RunCounters,
};
pub use metrics::{MetricsCollector, RunMetrics, SimulationReport};
pub use processor::RequestProcessor;
pub use session::{SessionError, SessionParams, SimulationSession};
pub use workload::{load_workload, write_workload, Workload, WorkloadGenerator};

use rayon::prelude::*;
use thiserror::Error;

impl From<&SimConfig> for SessionParams {
    fn from(config: &SimConfig) -> Self {
        SessionParams {
            iterations: config.simulation.iterations,
            hmax: config.simulation.hmax,
        }
    }
}

/// Run the full pipeline on an explicit workload.
pub fn run_workload(
    config: &SimConfig,
    workload: Workload,
    policy: Box<dyn AllocationPolicy>,
) -> Result<SimulationReport, SessionError> {
    let mut session = SimulationSession::new(
        workload.servers,
        workload.requests,
        SessionParams::from(config),
        policy,
    )?
    .with_name(config.simulation.name.clone());
    session.escalate_attacks(config.simulation.escalation_steps);

    let solver = BestResponseSolver::with_max_rounds(config.equilibrium.max_rounds);
    session.run(&solver)
}

/// Generate a workload from `config` with `seed` and run it with the
/// greedy heap allocator.
pub fn run_seeded(config: &SimConfig, seed: u64) -> Result<SimulationReport, SessionError> {
    let workload = Workload::from_config_with_seed(config, seed);
    let mut report = run_workload(config, workload, Box::new(GreedyHeapAllocator::new()))?;
    report.seed = Some(seed);
    Ok(report)
}

/// Run a complete simulation with the configured seed.
pub fn run_simulation(config: &SimConfig) -> Result<SimulationReport, SessionError> {
    run_seeded(config, config.simulation.seed)
}

/// Errors from a seed sweep.
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Failed to build sweep thread pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Run one independent simulation per seed on a pool of `jobs` threads.
///
/// Every run builds its own workload and session, so no state is shared.
/// Reports come back in the order of `seeds`.
pub fn sweep_seeds(
    config: &SimConfig,
    seeds: &[u64],
    jobs: usize,
) -> Result<Vec<SimulationReport>, SweepError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()?;
    let reports = pool.install(|| {
        seeds
            .par_iter()
            .map(|&seed| run_seeded(config, seed))
            .collect::<Result<Vec<_>, _>>()
    })?;
    Ok(reports)
}
