//! Allocation policies and equilibrium search for edmsim.
//!
//! This crate holds the simulation's data contracts ([`EdgeServer`],
//! [`Request`], [`RunCounters`]), the [`AllocationPolicy`] trait and the
//! built-in algorithms:
//!
//! | Component | Strategy |
//! |-----------|----------|
//! | [`GreedyHeapAllocator`] | Highest intensity first onto the least-loaded server |
//! | [`BestResponseSolver`] | Bounded best-response search for a local fixed point |

pub mod equilibrium;
pub mod greedy_heap;
pub mod request;
pub mod server;
pub mod traits;

pub use equilibrium::{BestResponseSolver, EquilibriumOutcome, MAX_ROUNDS};
pub use greedy_heap::GreedyHeapAllocator;
pub use request::Request;
pub use server::{EdgeServer, LoadKey};
pub use traits::*;

/// Create an allocation policy by name.
pub fn policy_by_name(name: &str) -> Option<Box<dyn AllocationPolicy>> {
    match name {
        "greedy_heap" | "greedy" => Some(Box::new(GreedyHeapAllocator::new())),
        _ => None,
    }
}

/// List all available built-in policy names.
pub fn available_policies() -> Vec<&'static str> {
    vec!["greedy_heap"]
}
