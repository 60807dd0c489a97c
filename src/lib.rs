//! install-scheduler core
//!
//! Assigns installation jobs to field technicians under geographic,
//! capacity, deadline and compatibility constraints, then detects and
//! resolves scheduling conflicts.

pub mod traits;
pub mod haversine;
pub mod osrm;
pub mod models;
pub mod schedule;
pub mod error;
pub mod config;
pub mod distance;
pub mod cluster;
pub mod route;
pub mod context;
pub mod assignment;
pub mod strategy;
pub mod conflict;
pub mod pairing;
pub mod balancer;
pub mod metrics;
pub mod engine;

pub use config::EngineConfig;
pub use engine::SchedulingEngine;
pub use error::EngineError;
pub use models::{Installation, OptimizationGoal, SchedulingRequest, TeamMember};
pub use schedule::SchedulingResult;
