//! Workload generation and workload files.
//!
//! Synthetic workloads are drawn from a seedable random source so runs are
//! reproducible. A workload can also be written to and read back from a
//! JSON file, which lets the same snapshot be replayed against different
//! settings.

use crate::config::SimConfig;
use edmsim_algorithms::{EdgeServer, Request};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkloadError {
    #[error("Failed to access workload file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse workload JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// An in-memory snapshot of servers and requests for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub servers: Vec<EdgeServer>,
    pub requests: Vec<Request>,
}

impl Workload {
    /// Generate a workload from config using the configured seed.
    pub fn from_config(config: &SimConfig) -> Self {
        Self::from_config_with_seed(config, config.simulation.seed)
    }

    /// Generate a workload from config with an explicit seed.
    pub fn from_config_with_seed(config: &SimConfig, seed: u64) -> Self {
        let mut generator = WorkloadGenerator::seeded(seed);
        let servers = generator.servers(
            config.cluster.num_servers,
            config.cluster.capacity_min,
            config.cluster.capacity_max,
        );
        let requests = generator.requests(
            config.workload.num_requests,
            config.workload.attack_ratio,
            config.workload.max_attack_intensity,
        );
        Self { servers, requests }
    }

    pub fn attack_count(&self) -> usize {
        self.requests.iter().filter(|r| r.is_attack).count()
    }
}

/// Draws server pools and request batches from a random source.
pub struct WorkloadGenerator<R: Rng> {
    rng: R,
}

impl WorkloadGenerator<ChaCha8Rng> {
    /// Deterministic generator for the given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> WorkloadGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// `count` idle servers with ids `0..count` and capacities drawn
    /// uniformly from `capacity_min..=capacity_max`.
    pub fn servers(&mut self, count: u32, capacity_min: u32, capacity_max: u32) -> Vec<EdgeServer> {
        let hi = capacity_max.max(capacity_min);
        (0..count)
            .map(|id| EdgeServer::new(id, self.rng.gen_range(capacity_min..=hi)))
            .collect()
    }

    /// `count` requests with ids `0..count`. Each is an attack with
    /// probability `attack_ratio`; attacks draw intensity uniformly from
    /// `1..=max_attack_intensity`, benign requests have intensity 0.
    pub fn requests(
        &mut self,
        count: u32,
        attack_ratio: f64,
        max_attack_intensity: u32,
    ) -> Vec<Request> {
        let max_intensity = max_attack_intensity.max(1);
        (0..count as u64)
            .map(|id| {
                if self.rng.gen::<f64>() < attack_ratio {
                    Request::attack(id, self.rng.gen_range(1..=max_intensity))
                } else {
                    Request::benign(id)
                }
            })
            .collect()
    }
}

/// Load a workload from a JSON file.
pub fn load_workload(path: &Path) -> Result<Workload, WorkloadError> {
    let file = std::fs::File::open(path)?;
    let workload = serde_json::from_reader(BufReader::new(file))?;
    Ok(workload)
}

/// Write a workload to a JSON file.
pub fn write_workload(workload: &Workload, path: &Path) -> Result<(), WorkloadError> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), workload)?;
    Ok(())
}
