//! TOML configuration parsing for edmsim.
//!
//! Defines the configuration schema for a simulation run: server pool
//! shape, workload mix, run parameters and the equilibrium round cap.

use edmsim_algorithms::MAX_ROUNDS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub simulation: SimulationSection,
    #[serde(default)]
    pub cluster: ClusterSection,
    #[serde(default)]
    pub workload: WorkloadSection,
    #[serde(default)]
    pub equilibrium: EquilibriumSection,
}

/// General simulation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSection {
    /// Human-readable name for this simulation.
    #[serde(default = "default_sim_name")]
    pub name: String,
    /// Random seed for workload generation.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Run count used as the throughput divisor.
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    /// Maximum hop count. Accepted and reported but never consulted.
    #[serde(default = "default_hmax")]
    pub hmax: u32,
    /// Times every attack request is escalated by one unit before allocation.
    #[serde(default)]
    pub escalation_steps: u32,
}

fn default_sim_name() -> String {
    "simulation".to_string()
}

fn default_seed() -> u64 {
    42
}

fn default_iterations() -> u64 {
    100
}

fn default_hmax() -> u32 {
    3
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            name: default_sim_name(),
            seed: default_seed(),
            iterations: default_iterations(),
            hmax: default_hmax(),
            escalation_steps: 0,
        }
    }
}

/// Server pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSection {
    /// Number of edge servers.
    #[serde(default = "default_num_servers")]
    pub num_servers: u32,
    /// Smallest capacity drawn for a server.
    #[serde(default = "default_capacity_min")]
    pub capacity_min: u32,
    /// Largest capacity drawn for a server (inclusive).
    #[serde(default = "default_capacity_max")]
    pub capacity_max: u32,
}

fn default_num_servers() -> u32 {
    10
}
fn default_capacity_min() -> u32 {
    3
}
fn default_capacity_max() -> u32 {
    5
}

impl Default for ClusterSection {
    fn default() -> Self {
        Self {
            num_servers: default_num_servers(),
            capacity_min: default_capacity_min(),
            capacity_max: default_capacity_max(),
        }
    }
}

/// Workload mix configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadSection {
    /// Requests in the batch.
    #[serde(default = "default_num_requests")]
    pub num_requests: u32,
    /// Fraction of requests flagged as attacks.
    #[serde(default = "default_attack_ratio")]
    pub attack_ratio: f64,
    /// Upper bound (inclusive) for attack intensity draws.
    #[serde(default = "default_max_attack_intensity")]
    pub max_attack_intensity: u32,
}

fn default_num_requests() -> u32 {
    100
}
fn default_attack_ratio() -> f64 {
    0.9
}
fn default_max_attack_intensity() -> u32 {
    10
}

impl Default for WorkloadSection {
    fn default() -> Self {
        Self {
            num_requests: default_num_requests(),
            attack_ratio: default_attack_ratio(),
            max_attack_intensity: default_max_attack_intensity(),
        }
    }
}

/// Equilibrium search parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquilibriumSection {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

fn default_max_rounds() -> u32 {
    MAX_ROUNDS
}

impl Default for EquilibriumSection {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster.num_servers == 0 {
            return Err(ConfigError::Validation(
                "num_servers must be > 0".to_string(),
            ));
        }
        if self.cluster.capacity_min == 0 {
            return Err(ConfigError::Validation(
                "capacity_min must be > 0".to_string(),
            ));
        }
        if self.cluster.capacity_min > self.cluster.capacity_max {
            return Err(ConfigError::Validation(format!(
                "capacity_min ({}) must not exceed capacity_max ({})",
                self.cluster.capacity_min, self.cluster.capacity_max,
            )));
        }
        if self.workload.num_requests == 0 {
            return Err(ConfigError::Validation(
                "num_requests must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.workload.attack_ratio) {
            return Err(ConfigError::Validation(format!(
                "attack_ratio must be within [0, 1], got {}",
                self.workload.attack_ratio
            )));
        }
        if self.workload.max_attack_intensity == 0 {
            return Err(ConfigError::Validation(
                "max_attack_intensity must be >= 1".to_string(),
            ));
        }
        if self.simulation.iterations == 0 {
            return Err(ConfigError::Validation(
                "iterations must be > 0".to_string(),
            ));
        }
        if self.equilibrium.max_rounds == 0 {
            return Err(ConfigError::Validation(
                "max_rounds must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
