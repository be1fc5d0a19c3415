//! Allocation policy trait definitions.
//!
//! All allocation policies implement [`AllocationPolicy`], which receives the
//! server pool and a request batch and records its outcome in the run's
//! [`RunCounters`].

use crate::request::Request;
use crate::server::EdgeServer;
use serde::{Deserialize, Serialize};

/// Counters owned by one simulation run.
///
/// Passed by `&mut` into each phase so independent runs never share state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    /// Sum of intensities of requests that were admitted.
    pub mitigation_cost: u64,
    /// Allocation attempts that found no server or failed admission.
    pub extra_service_latency: u64,
    /// Drain operations performed by the request processor.
    pub total_processed_requests: u64,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful admission.
    pub fn record_admission(&mut self, intensity: u32) {
        self.mitigation_cost += intensity as u64;
    }

    /// Record one latency-penalty unit.
    pub fn record_miss(&mut self) {
        self.extra_service_latency += 1;
    }

    /// Record one drain cycle.
    pub fn record_processed(&mut self) {
        self.total_processed_requests += 1;
    }
}

/// The core allocation policy trait.
///
/// Implementations assign each request to at most one server, mutating
/// server loads through [`EdgeServer::add_request`] and recording
/// admissions and misses in `counters`. They may reorder `requests` in
/// place; later phases observe that order.
pub trait AllocationPolicy: Send + Sync {
    fn allocate(
        &mut self,
        servers: &mut [EdgeServer],
        requests: &mut [Request],
        counters: &mut RunCounters,
    );

    /// Human-readable name for reports.
    fn name(&self) -> &str;
}
