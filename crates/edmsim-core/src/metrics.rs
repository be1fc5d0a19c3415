//! Metrics derivation and report formatting for simulation runs.
//!
//! Throughput, average latency and aggregate load are derived from the
//! final server states and the run counters. Per-server load fairness is
//! reported alongside them.

use crate::session::SessionError;
use edmsim_algorithms::{EdgeServer, EquilibriumOutcome, RunCounters};
use serde::{Deserialize, Serialize};

/// Ratios derived from one finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Drain operations per externally supplied iteration.
    pub throughput: f64,
    /// Latency-penalty units per request in the batch.
    pub average_latency: f64,
    /// Total load over `num_servers * max capacity`.
    pub load: f64,
    /// Coefficient of variation of per-server load.
    pub load_cv: f64,
    /// Jain's fairness index of per-server load.
    pub jains_fairness_index: f64,
    /// Servers whose load exceeds their capacity.
    pub overloaded_servers: u32,
}

/// Everything reported about one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub name: String,
    pub policy: String,
    /// Workload seed, if the workload was generated.
    pub seed: Option<u64>,
    pub num_servers: usize,
    pub num_requests: usize,
    /// Inert; carried for interface compatibility.
    pub hmax: u32,
    pub counters: RunCounters,
    pub equilibrium: EquilibriumOutcome,
    pub metrics: RunMetrics,
    /// Final `current_load` per server, in pool order.
    pub final_loads: Vec<u32>,
}

/// Derives [`RunMetrics`] from final state.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    /// Throughput divisor, supplied by the caller.
    iterations: u64,
}

impl MetricsCollector {
    pub fn new(iterations: u64) -> Self {
        Self { iterations }
    }

    /// Compute run metrics.
    ///
    /// Every divisor is checked first; a zero divisor is a configuration
    /// error, reported rather than turned into NaN or infinity.
    pub fn collect(
        &self,
        servers: &[EdgeServer],
        counters: &RunCounters,
        num_requests: usize,
    ) -> Result<RunMetrics, SessionError> {
        if self.iterations == 0 {
            return Err(SessionError::ZeroIterations);
        }
        if num_requests == 0 {
            return Err(SessionError::NoRequests);
        }
        if servers.is_empty() {
            return Err(SessionError::NoServers);
        }
        let max_capacity = servers.iter().map(|s| s.capacity).max().unwrap_or(0);
        if max_capacity == 0 {
            return Err(SessionError::ZeroCapacity);
        }

        let loads: Vec<u64> = servers.iter().map(|s| s.current_load as u64).collect();
        let total_load: u64 = loads.iter().sum();

        Ok(RunMetrics {
            throughput: counters.total_processed_requests as f64 / self.iterations as f64,
            average_latency: counters.extra_service_latency as f64 / num_requests as f64,
            load: total_load as f64 / (servers.len() as f64 * max_capacity as f64),
            load_cv: coefficient_of_variation(&loads),
            jains_fairness_index: jains_fairness_index(&loads),
            overloaded_servers: servers
                .iter()
                .filter(|s| s.current_load > s.capacity)
                .count() as u32,
        })
    }
}

/// Coefficient of variation (std / mean).
fn coefficient_of_variation(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<u64>() as f64 / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    variance.sqrt() / mean
}

/// Jain's fairness index: (sum(x_i))^2 / (n * sum(x_i^2)).
fn jains_fairness_index(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    let n = values.len() as f64;
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    let sum_sq: f64 = values.iter().map(|&v| (v as f64).powi(2)).sum();
    if sum_sq == 0.0 {
        return 1.0;
    }
    (sum * sum) / (n * sum_sq)
}

/// Format a report as a human-readable block.
pub fn format_report(report: &SimulationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n{:=<70}\n",
        format!("  {} Results  ", report.name)
    ));
    out.push_str(&format!(
        "  Policy: {} | Servers: {} | Requests: {}",
        report.policy, report.num_servers, report.num_requests
    ));
    if let Some(seed) = report.seed {
        out.push_str(&format!(" | Seed: {}", seed));
    }
    out.push('\n');
    out.push_str(&format!("{:-<70}\n", "  Allocation  "));
    out.push_str(&format!(
        "Mitigation Cost: {}\n",
        report.counters.mitigation_cost
    ));
    out.push_str(&format!(
        "Extra Service Latency: {}\n",
        report.counters.extra_service_latency
    ));
    out.push_str(&format!("{:-<70}\n", "  Equilibrium  "));
    if report.equilibrium.converged {
        out.push_str(&format!(
            "Nash Equilibrium reached in {} iterations.\n",
            report.equilibrium.iterations
        ));
    } else {
        out.push_str(&format!(
            "Equilibrium search hit the round cap after {} iterations.\n",
            report.equilibrium.iterations
        ));
    }
    out.push_str(&format!("{:-<70}\n", "  Metrics  "));
    out.push_str(&format!("Throughput: {:.2}\n", report.metrics.throughput));
    out.push_str(&format!(
        "Average Latency: {:.2}\n",
        report.metrics.average_latency
    ));
    out.push_str(&format!("Load: {:.2}\n", report.metrics.load));
    out.push_str(&format!(
        "  Load CV: {:.3}  Jain's index: {:.4}  Overloaded: {}/{}\n",
        report.metrics.load_cv,
        report.metrics.jains_fairness_index,
        report.metrics.overloaded_servers,
        report.num_servers,
    ));
    out.push_str(&format!("{:=<70}\n", ""));
    out
}

/// Format a table of runs, one row per report, with a mean row.
pub fn format_sweep_table(reports: &[SimulationReport]) -> String {
    if reports.is_empty() {
        return String::from("No results to summarize.\n");
    }

    let mut out = String::new();
    out.push_str(&format!("\n{:=<84}\n", "  Seed Sweep  "));
    out.push_str(&format!(
        "{:<10} {:>10} {:>10} {:>10} {:>12} {:>12} {:>10}\n",
        "Seed", "Cost", "Latency", "Eq iters", "Throughput", "Avg lat", "Load"
    ));
    out.push_str(&format!("{:-<84}\n", ""));

    for r in reports {
        let seed = r
            .seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<10} {:>10} {:>10} {:>10} {:>12.2} {:>12.2} {:>10.2}\n",
            seed,
            r.counters.mitigation_cost,
            r.counters.extra_service_latency,
            r.equilibrium.iterations,
            r.metrics.throughput,
            r.metrics.average_latency,
            r.metrics.load,
        ));
    }

    out.push_str(&format!("{:-<84}\n", ""));
    out.push_str(&format!(
        "{:<10} {:>10.1} {:>10.1} {:>10.1} {:>12.2} {:>12.2} {:>10.2}\n",
        "mean",
        mean(reports, |r| r.counters.mitigation_cost as f64),
        mean(reports, |r| r.counters.extra_service_latency as f64),
        mean(reports, |r| r.equilibrium.iterations as f64),
        mean(reports, |r| r.metrics.throughput),
        mean(reports, |r| r.metrics.average_latency),
        mean(reports, |r| r.metrics.load),
    ));
    out.push_str(&format!("{:=<84}\n", ""));
    out
}

fn mean(reports: &[SimulationReport], f: impl Fn(&SimulationReport) -> f64) -> f64 {
    reports.iter().map(f).sum::<f64>() / reports.len() as f64
}
