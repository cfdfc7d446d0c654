//! Vendor allocation: who can take an order, in which order they are tried,
//! and the capacity counters that keep a slot from being overbooked.

mod assigner;
pub mod capacity;
pub mod directory;
pub mod eligibility;
pub mod ranker;
mod strategy;

pub use assigner::*;
pub use strategy::*;
