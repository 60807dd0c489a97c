//! Job-to-job distance matrix built once per optimization run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::haversine::HaversineMatrix;
use crate::models::{Installation, TeamMember};
use crate::traits::{DistanceMatrixProvider, TravelLeg};

/// A single matrix lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceEntry {
    pub distance_miles: f64,
    pub duration_minutes: f64,
    /// Human-readable label, `"<from> -> <to>"`.
    pub route: String,
}

/// Read-only lookup of travel legs between jobs, keyed by job id.
#[derive(Debug, Clone, Default)]
pub struct DistanceMatrix {
    index: HashMap<String, usize>,
    legs: Vec<Vec<TravelLeg>>,
}

impl DistanceMatrix {
    /// Build the matrix from a provider, falling back to straight-line
    /// estimates when the provider returns something unusable.
    pub fn build<M>(jobs: &[&Installation], provider: &M, fallback: &HaversineMatrix) -> Self
    where
        M: DistanceMatrixProvider + ?Sized,
    {
        let locations: Vec<(f64, f64)> = jobs.iter().map(|job| job.location().as_tuple()).collect();
        let mut legs = provider.matrix_for(&locations);

        if !is_square(&legs, locations.len()) {
            tracing::warn!(
                expected = locations.len(),
                rows = legs.len(),
                "distance provider returned an unusable matrix, using haversine estimates"
            );
            legs = fallback.matrix_for(&locations);
        }

        // Unroutable pairs fall back to straight-line estimates one by one.
        for (i, row) in legs.iter_mut().enumerate() {
            for (j, leg) in row.iter_mut().enumerate() {
                if !leg.distance_miles.is_finite() || !leg.duration_minutes.is_finite() {
                    *leg = fallback.leg(locations[i], locations[j]);
                }
            }
        }

        let index = jobs
            .iter()
            .enumerate()
            .map(|(i, job)| (job.id.clone(), i))
            .collect();

        Self { index, legs }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Travel leg between two jobs, if both are in the matrix.
    pub fn leg(&self, from: &str, to: &str) -> Option<TravelLeg> {
        let i = *self.index.get(from)?;
        let j = *self.index.get(to)?;
        Some(self.legs[i][j])
    }

    pub fn entry(&self, from: &str, to: &str) -> Option<DistanceEntry> {
        self.leg(from, to).map(|leg| DistanceEntry {
            distance_miles: leg.distance_miles,
            duration_minutes: leg.duration_minutes,
            route: format!("{} -> {}", from, to),
        })
    }
}

/// Travel estimates for route building: matrix lookups between jobs,
/// straight-line estimates from a technician's base.
#[derive(Debug, Clone, Copy)]
pub struct TravelEstimator<'a> {
    matrix: &'a DistanceMatrix,
    straight_line: &'a HaversineMatrix,
}

impl<'a> TravelEstimator<'a> {
    pub fn new(matrix: &'a DistanceMatrix, straight_line: &'a HaversineMatrix) -> Self {
        Self {
            matrix,
            straight_line,
        }
    }

    pub fn between_jobs(&self, from: &Installation, to: &Installation) -> TravelLeg {
        self.matrix.leg(&from.id, &to.id).unwrap_or_else(|| {
            self.straight_line
                .leg(from.location().as_tuple(), to.location().as_tuple())
        })
    }

    pub fn from_base(&self, member: &TeamMember, to: &Installation) -> TravelLeg {
        self.straight_line
            .leg(member.base_location().as_tuple(), to.location().as_tuple())
    }

    /// Leg to `to` from the previous stop, or from base when there is none.
    pub fn leg(&self, member: &TeamMember, previous: Option<&Installation>, to: &Installation) -> TravelLeg {
        match previous {
            Some(from) => self.between_jobs(from, to),
            None => self.from_base(member, to),
        }
    }
}

fn is_square(legs: &[Vec<TravelLeg>], n: usize) -> bool {
    legs.len() == n && legs.iter().all(|row| row.len() == n)
}
