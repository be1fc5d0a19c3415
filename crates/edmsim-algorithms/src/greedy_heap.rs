//! Greedy, priority-ordered heap allocation.
//!
//! Requests are served highest intensity first, each going to the server
//! with the lowest current load. Only servers that are available when the
//! call starts take part; a server is never pruned from the heap mid-call,
//! so a server that fills up keeps being popped and keeps failing, and each
//! failure costs one unit of extra service latency.

use crate::request::Request;
use crate::server::{EdgeServer, LoadKey};
use crate::traits::*;
use std::collections::BinaryHeap;
use tracing::{debug, trace};

/// Greedy min-load allocator.
pub struct GreedyHeapAllocator;

impl GreedyHeapAllocator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GreedyHeapAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationPolicy for GreedyHeapAllocator {
    fn allocate(
        &mut self,
        servers: &mut [EdgeServer],
        requests: &mut [Request],
        counters: &mut RunCounters,
    ) {
        let mut heap: BinaryHeap<LoadKey> = servers
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_available())
            .map(|(i, s)| s.load_key(i))
            .collect();

        // Stable: equal intensities keep their original relative order.
        requests.sort_by(|a, b| b.intensity.cmp(&a.intensity));

        debug!(
            requests = requests.len(),
            eligible_servers = heap.len(),
            "allocating requests"
        );

        for request in requests.iter() {
            let key = match heap.pop() {
                Some(key) => key,
                None => {
                    counters.record_miss();
                    trace!(request = request.id, "no eligible server");
                    continue;
                }
            };

            let server = &mut servers[key.index];
            if server.add_request(request.intensity) {
                counters.record_admission(request.intensity);
                debug!(
                    request = request.id,
                    server = server.id,
                    load = server.current_load,
                    "request allocated"
                );
            } else {
                counters.record_miss();
                trace!(
                    request = request.id,
                    server = server.id,
                    load = server.current_load,
                    "admission refused"
                );
            }

            heap.push(server.load_key(key.index));
        }
    }

    fn name(&self) -> &str {
        "greedy_heap"
    }
}
