//! # roster-backend
//!
//! Season roster planner: assigns four players to every match of a club's season,
//! fairly and with partner preferences, behind a single-writer [`Planner`].

pub mod audit;
pub mod config;
pub mod error;
pub mod overrides;
pub mod persistence;
pub mod planner;
pub mod regeneration;
pub mod scoring;
pub mod state;
pub mod store;
pub mod undo;

pub use config::PlannerConfig;
pub use error::PlannerError;
pub use planner::{Planner, RegenerateRequest};
pub use regeneration::CancelHandle;
pub use store::{MemoryStore, PlanStore, StoreError};

#[cfg(test)]
pub mod tests;
