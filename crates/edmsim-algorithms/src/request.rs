//! Traffic unit model.
//!
//! A [`Request`] is one unit of incoming traffic, either benign or part of
//! the attack. It carries no back-reference to the server that admits it;
//! an assignment is visible only through server load and run counters.

use serde::{Deserialize, Serialize};

/// A single incoming request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Unique request identifier.
    pub id: u64,
    /// Whether the request is classified as attack traffic.
    #[serde(default)]
    pub is_attack: bool,
    /// Load units imposed on the admitting server.
    pub intensity: u32,
}

impl Request {
    pub fn new(id: u64, is_attack: bool, intensity: u32) -> Self {
        Self {
            id,
            is_attack,
            intensity,
        }
    }

    /// An attack request of the given intensity.
    pub fn attack(id: u64, intensity: u32) -> Self {
        Self::new(id, true, intensity)
    }

    /// A benign request. Benign traffic imposes no load.
    pub fn benign(id: u64) -> Self {
        Self::new(id, false, 0)
    }

    /// Escalate this request by one intensity unit.
    ///
    /// Never called by the allocator or the solver; exposed for adaptive
    /// attacker experiments driven from outside a run.
    pub fn increase_intensity(&mut self) {
        self.intensity = self.intensity.saturating_add(1);
    }
}
