//! Seams between the scheduling core and its travel-data collaborators.
//!
//! The engine only needs pairwise travel estimates between locations. How
//! those are produced (straight-line math, a road router) is up to the
//! provider. Assignment heuristics plug in behind `AssignmentStrategy`.

use serde::{Deserialize, Serialize};

use crate::context::PlanningContext;
use crate::strategy::StrategyOutcome;

/// Travel estimate between two locations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TravelLeg {
    /// Distance in miles.
    pub distance_miles: f64,
    /// Driving time in minutes.
    pub duration_minutes: f64,
}

impl TravelLeg {
    pub const ZERO: TravelLeg = TravelLeg {
        distance_miles: 0.0,
        duration_minutes: 0.0,
    };
}

/// Provides a distance/time matrix for a set of locations.
///
/// The matrix is indexed by the provided location order. Providers that fail
/// return an empty matrix; callers are expected to fall back.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Vec<Vec<TravelLeg>>;
}

/// A job-to-technician assignment heuristic.
///
/// Implementations must account for every job in `ctx.jobs` exactly once,
/// either as a placement or as an unassigned job.
pub trait AssignmentStrategy {
    fn assign<'a>(&self, ctx: &PlanningContext<'a>) -> StrategyOutcome<'a>;
}
