//! Simulation session.
//!
//! A [`SimulationSession`] owns one run's server pool, request batch and
//! [`RunCounters`]. Input is validated once at construction. Only metric
//! collection returns a `Result`; the other phases cannot fail.

use crate::metrics::{MetricsCollector, RunMetrics, SimulationReport};
use crate::processor::RequestProcessor;
use edmsim_algorithms::{
    AllocationPolicy, BestResponseSolver, EdgeServer, EquilibriumOutcome, Request, RunCounters,
};
use std::collections::HashSet;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid session: no servers")]
    NoServers,
    #[error("Invalid session: no requests")]
    NoRequests,
    #[error("Invalid session: iterations must be > 0")]
    ZeroIterations,
    #[error("Invalid session: every server has zero capacity")]
    ZeroCapacity,
    #[error("Invalid session: duplicate server id {0}")]
    DuplicateServerId(u32),
}

/// Run parameters that are not part of the workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionParams {
    /// Throughput divisor.
    pub iterations: u64,
    /// Accepted for interface compatibility; no phase reads it.
    pub hmax: u32,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            iterations: 100,
            hmax: 3,
        }
    }
}

/// One simulation run.
pub struct SimulationSession {
    servers: Vec<EdgeServer>,
    requests: Vec<Request>,
    counters: RunCounters,
    params: SessionParams,
    policy: Box<dyn AllocationPolicy>,
    name: String,
    seed: Option<u64>,
}

impl std::fmt::Debug for SimulationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationSession")
            .field("name", &self.name)
            .field("policy", &self.policy.name())
            .field("servers", &self.servers.len())
            .field("requests", &self.requests.len())
            .field("counters", &self.counters)
            .finish()
    }
}

impl SimulationSession {
    /// Validate input and create a session.
    pub fn new(
        servers: Vec<EdgeServer>,
        requests: Vec<Request>,
        params: SessionParams,
        policy: Box<dyn AllocationPolicy>,
    ) -> Result<Self, SessionError> {
        if servers.is_empty() {
            return Err(SessionError::NoServers);
        }
        if requests.is_empty() {
            return Err(SessionError::NoRequests);
        }
        if params.iterations == 0 {
            return Err(SessionError::ZeroIterations);
        }
        if servers.iter().all(|s| s.capacity == 0) {
            return Err(SessionError::ZeroCapacity);
        }
        let mut seen = HashSet::with_capacity(servers.len());
        for server in &servers {
            if !seen.insert(server.id) {
                return Err(SessionError::DuplicateServerId(server.id));
            }
        }

        Ok(Self {
            servers,
            requests,
            counters: RunCounters::new(),
            params,
            policy,
            name: "simulation".to_string(),
            seed: None,
        })
    }

    /// Set the name shown in reports.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Record the seed the workload was generated from.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn servers(&self) -> &[EdgeServer] {
        &self.servers
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    /// Escalate every attack request by `steps` intensity units.
    ///
    /// Not part of the default pipeline. Returns the number of requests
    /// escalated.
    pub fn escalate_attacks(&mut self, steps: u32) -> usize {
        if steps == 0 {
            return 0;
        }
        let mut escalated = 0;
        for request in self.requests.iter_mut().filter(|r| r.is_attack) {
            for _ in 0..steps {
                request.increase_intensity();
            }
            escalated += 1;
        }
        info!(escalated, steps, "attack requests escalated");
        escalated
    }

    /// Allocate the request batch with the session's policy.
    pub fn allocate_requests(&mut self) {
        self.policy
            .allocate(&mut self.servers, &mut self.requests, &mut self.counters);
        info!(
            policy = self.policy.name(),
            mitigation_cost = self.counters.mitigation_cost,
            extra_service_latency = self.counters.extra_service_latency,
            "allocation complete"
        );
    }

    /// One service tick across the pool.
    pub fn process_requests(&mut self) -> u64 {
        let drained = RequestProcessor::tick(&mut self.servers, &mut self.counters);
        info!(drained, "service tick complete");
        drained
    }

    /// Refine the allocation toward a best-response fixed point.
    pub fn find_equilibrium(&mut self, solver: &BestResponseSolver) -> EquilibriumOutcome {
        let outcome = solver.solve(&mut self.servers, &self.requests);
        info!(
            iterations = outcome.iterations,
            converged = outcome.converged,
            "equilibrium search complete"
        );
        outcome
    }

    /// Derive metrics from the current state.
    pub fn collect_metrics(&self) -> Result<RunMetrics, SessionError> {
        MetricsCollector::new(self.params.iterations).collect(
            &self.servers,
            &self.counters,
            self.requests.len(),
        )
    }

    /// Allocate, process one tick, search for equilibrium, and report.
    pub fn run(mut self, solver: &BestResponseSolver) -> Result<SimulationReport, SessionError> {
        self.allocate_requests();
        self.process_requests();
        let equilibrium = self.find_equilibrium(solver);
        let metrics = self.collect_metrics()?;

        Ok(SimulationReport {
            name: self.name,
            policy: self.policy.name().to_string(),
            seed: self.seed,
            num_servers: self.servers.len(),
            num_requests: self.requests.len(),
            hmax: self.params.hmax,
            counters: self.counters,
            equilibrium,
            metrics,
            final_loads: self.servers.iter().map(|s| s.current_load).collect(),
        })
    }
}
