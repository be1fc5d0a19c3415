//! Service-completion model.
//!
//! One [`RequestProcessor::tick`] is one simulated time step: every server
//! carrying load drains a single unit.

use edmsim_algorithms::{EdgeServer, RunCounters};

pub struct RequestProcessor;

impl RequestProcessor {
    /// Drain one unit from each loaded server. Returns the number drained.
    pub fn tick(servers: &mut [EdgeServer], counters: &mut RunCounters) -> u64 {
        let mut drained = 0;
        for server in servers.iter_mut().filter(|s| s.current_load > 0) {
            counters.record_processed();
            server.process_request();
            drained += 1;
        }
        drained
    }
}
