//! meshplace: the policy-placement solver and conflict detector.
//!
//! Callers hand policies, a call graph, a dataplane catalog, and a
//! pre-assignment to a [`orchestrate::PlacementOrchestrator`], which drives
//! one or more [`encode`]/[`solve`] round trips against an external SMT
//! backend and returns a [`model::PlacementResult`]. [`conflict`] is a
//! sibling capability, not a dependency of the orchestrator.

pub mod conflict;
pub mod config;
pub mod encode;
pub mod expand;
pub mod model;
pub mod orchestrate;
pub mod solve;

pub use config::SolverConfig;
pub use model::error::{PlacementError, Result};
