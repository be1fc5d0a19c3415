//! Capacity-bounded edge server model.
//!
//! An [`EdgeServer`] accumulates load as requests are admitted and sheds it
//! one unit at a time as it services backlog. Admission and drain are
//! deliberately asymmetric: admitting a request adds its full intensity,
//! while every drain removes exactly one unit regardless of which request
//! contributed it. It is not documented whether this models partial service
//! or is an accident of the heuristic this simulator reproduces, so it is
//! kept literally. The equilibrium search depends on it.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single edge server in the mitigation pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeServer {
    /// Unique, stable identifier. Also the heap tie-break key.
    pub id: u32,
    /// Maximum simultaneous load units.
    pub capacity: u32,
    /// Load currently carried by the server.
    #[serde(default)]
    pub current_load: u32,
}

impl EdgeServer {
    /// Create an idle server.
    pub fn new(id: u32, capacity: u32) -> Self {
        Self {
            id,
            capacity,
            current_load: 0,
        }
    }

    /// Create a server that already carries `current_load` units.
    pub fn with_load(id: u32, capacity: u32, current_load: u32) -> Self {
        Self {
            id,
            capacity,
            current_load,
        }
    }

    /// Whether the server can take at least one more admission.
    pub fn is_available(&self) -> bool {
        self.current_load < self.capacity
    }

    /// Admit a request of the given intensity.
    ///
    /// Availability is checked once, before the full intensity is added, so
    /// a single admission may push `current_load` past `capacity`. Returns
    /// `false` and leaves the load untouched if the server is full.
    pub fn add_request(&mut self, intensity: u32) -> bool {
        if !self.is_available() {
            return false;
        }
        self.current_load = self.current_load.saturating_add(intensity);
        true
    }

    /// Drain exactly one unit of load, if any.
    ///
    /// This does not revert an admission of intensity > 1.
    pub fn remove_request(&mut self) {
        if self.current_load > 0 {
            self.current_load -= 1;
        }
    }

    /// One service cycle; equivalent to [`remove_request`](Self::remove_request).
    pub fn process_request(&mut self) {
        self.remove_request();
    }

    /// The server's own cost: its current load.
    pub fn cost(&self) -> u32 {
        self.current_load
    }

    /// Load as a fraction of capacity (0.0 for a zero-capacity server).
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.current_load as f64 / self.capacity as f64
    }

    /// Heap key for this server at its current load.
    pub fn load_key(&self, index: usize) -> LoadKey {
        LoadKey {
            load: self.current_load,
            id: self.id,
            index,
        }
    }
}

/// Ordering key used by the allocator's min-heap.
///
/// Servers order by ascending `current_load`, then by ascending `id`, so pop
/// order is fully deterministic. `index` locates the server in the caller's
/// slice and takes no part in the ordering beyond breaking identical
/// `(load, id)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadKey {
    pub load: u32,
    pub id: u32,
    pub index: usize,
}

impl PartialOrd for LoadKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LoadKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; we want min-heap
        other
            .load
            .cmp(&self.load)
            .then(other.id.cmp(&self.id))
            .then(other.index.cmp(&self.index))
    }
}
