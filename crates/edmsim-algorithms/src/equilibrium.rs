//! Bounded best-response equilibrium search.
//!
//! Each round, every server scans the whole request batch, speculatively
//! admitting each request and recording the one whose admission leaves its
//! cost strictly below the round's baseline. A trial is undone with
//! [`EdgeServer::remove_request`], which drains a single unit, so trials of
//! intensity > 1 leave residual load behind and zero-intensity trials drain
//! the server below its baseline. That residue is the only way the strict
//! comparison can succeed; the rule is reproduced as-is rather than reduced
//! to a no-op.
//!
//! The search stops at the first round in which no server recorded a
//! candidate, or after `max_rounds` rounds.

use crate::request::Request;
use crate::server::EdgeServer;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default cap on best-response rounds.
pub const MAX_ROUNDS: u32 = 1000;

/// Where the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquilibriumOutcome {
    /// Rounds executed, in `1..=max_rounds`.
    pub iterations: u32,
    /// True if a round finished with no server changing state.
    pub converged: bool,
}

/// Best-response fixed-point search over an allocated server pool.
#[derive(Debug, Clone)]
pub struct BestResponseSolver {
    max_rounds: u32,
}

impl BestResponseSolver {
    pub fn new() -> Self {
        Self {
            max_rounds: MAX_ROUNDS,
        }
    }

    /// Solver with a custom round cap. A cap of 0 is treated as 1.
    pub fn with_max_rounds(max_rounds: u32) -> Self {
        Self {
            max_rounds: max_rounds.max(1),
        }
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Run the search, mutating server loads in place.
    ///
    /// `requests` is the original batch in the order the allocator left it.
    pub fn solve(&self, servers: &mut [EdgeServer], requests: &[Request]) -> EquilibriumOutcome {
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_rounds {
            iterations += 1;
            let mut changed = false;

            for server in servers.iter_mut() {
                if let Some(candidate) = best_response(server, requests) {
                    // Committed even if the server has since filled up.
                    server.add_request(candidate.intensity);
                    changed = true;
                }
            }

            if !changed {
                converged = true;
                break;
            }
        }

        debug!(iterations, converged, "equilibrium search finished");
        EquilibriumOutcome {
            iterations,
            converged,
        }
    }
}

impl Default for BestResponseSolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan the batch for the request whose trial admission yields the lowest
/// cost strictly below the server's cost at the start of the scan.
fn best_response<'a>(server: &mut EdgeServer, requests: &'a [Request]) -> Option<&'a Request> {
    let mut best_cost = server.cost();
    let mut best = None;

    for request in requests {
        if server.add_request(request.intensity) {
            let cost = server.cost();
            if cost < best_cost {
                best_cost = cost;
                best = Some(request);
            }
            server.remove_request();
        }
    }

    best
}
